//! Before/after comparison of module sets

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::AlignmentConfig;
use crate::model::{Artifact, ArtifactKind, ArtifactSets, GroupArtifact, Module};
use crate::property::resolve;
use crate::relocation::RelocationEntry;
use crate::wildcard::WildcardMap;

/// Where an artifact is declared: one of the four lists, optionally inside a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub kind: ArtifactKind,
    pub profile: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.label())?;
        if let Some(profile) = &self.profile {
            write!(f, " in profile {profile}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
    /// The module's own version changed
    Version { from: String, to: String },
    Property {
        profile: Option<String>,
        name: String,
        from: Option<String>,
        to: String,
    },
    Aligned {
        location: Location,
        coordinate: GroupArtifact,
        from: String,
        to: String,
    },
    Relocated {
        location: Location,
        from: GroupArtifact,
        to: GroupArtifact,
        version: Option<String>,
    },
    /// Matched on both sides without a version change
    NonAligned {
        location: Location,
        coordinate: GroupArtifact,
        version: String,
    },
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportEntry::Version { from, to } => write!(f, "Project version : {from} ---> {to}"),
            ReportEntry::Property {
                profile,
                name,
                from,
                to,
            } => {
                match profile {
                    Some(profile) => write!(f, "Profile {profile} property : {name}")?,
                    None => write!(f, "Property : {name}")?,
                }
                write!(f, "  {} ---> {to}", from.as_deref().unwrap_or("<none>"))
            }
            ReportEntry::Aligned {
                location,
                coordinate,
                from,
                to,
            } => write!(f, "{location} : {coordinate}  {from} ---> {to}"),
            ReportEntry::Relocated {
                location,
                from,
                to,
                version,
            } => {
                write!(f, "Relocated {location} : {from} ---> {to}")?;
                if let Some(version) = version {
                    write!(f, " ({version})")?;
                }
                Ok(())
            }
            ReportEntry::NonAligned {
                location,
                coordinate,
                version,
            } => write!(f, "Non-aligned {location} : {coordinate}  {version}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    pub module: GroupArtifact,
    pub entries: Vec<ReportEntry>,
}

impl fmt::Display for ModuleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------------------- project {}", self.module)?;
        for entry in &self.entries {
            writeln!(f, "\t{entry}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonReport {
    pub modules: Vec<ModuleReport>,
}

impl ComparisonReport {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, key: &GroupArtifact) -> Option<&ModuleReport> {
        self.modules.iter().find(|report| &report.module == key)
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for module in &self.modules {
            write!(f, "{module}")?;
        }
        Ok(())
    }
}

/// Diff `after` against `before`, matching modules by `groupId:artifactId`.
///
/// Artifact versions are compared fully resolved against each side's own
/// inheritance chain. Modules present on one side only are not reported.
pub fn compare_projects(
    config: &AlignmentConfig,
    relocations: &WildcardMap<RelocationEntry>,
    before: &[Module],
    after: &[Module],
) -> ComparisonReport {
    let before_index: IndexMap<GroupArtifact, &Module> =
        before.iter().map(|m| (m.group_artifact(), m)).collect();
    let after_index: IndexMap<GroupArtifact, &Module> =
        after.iter().map(|m| (m.group_artifact(), m)).collect();

    let mut report = ComparisonReport::default();
    for (key, &new) in &after_index {
        let Some(&old) = before_index.get(key) else {
            debug!("Module {} has no counterpart to compare against", key);
            continue;
        };

        let sides = Sides {
            old: Side {
                module: old,
                chain: lineage(&before_index, old),
            },
            new: Side {
                module: new,
                chain: lineage(&after_index, new),
            },
        };
        let entries = sides.diff(config, relocations);
        if entries.is_empty() {
            continue;
        }

        let module = ModuleReport {
            module: key.clone(),
            entries,
        };
        for line in module.to_string().lines() {
            info!("{}", line);
        }
        report.modules.push(module);
    }
    report
}

struct Side<'a> {
    module: &'a Module,
    chain: Vec<&'a Module>,
}

impl Side<'_> {
    fn resolve(&self, value: &str) -> String {
        resolve(value, &self.chain).unwrap_or_else(|err| {
            warn!("Unable to resolve {}: {}", value, err);
            value.to_string()
        })
    }
}

struct Sides<'a> {
    old: Side<'a>,
    new: Side<'a>,
}

impl Sides<'_> {
    fn diff(
        &self,
        config: &AlignmentConfig,
        relocations: &WildcardMap<RelocationEntry>,
    ) -> Vec<ReportEntry> {
        let mut entries = Vec::new();
        let (old, new) = (self.old.module, self.new.module);

        if old.version != new.version {
            entries.push(ReportEntry::Version {
                from: old.version.clone(),
                to: new.version.clone(),
            });
        }

        diff_properties(None, &old.properties, &new.properties, &mut entries);
        self.diff_artifacts(config, relocations, None, &old.artifacts, &new.artifacts, &mut entries);

        for profile in new.active_profiles() {
            let Some(previous) = old.profiles.iter().find(|p| p.id == profile.id) else {
                continue;
            };
            diff_properties(
                Some(&profile.id),
                &previous.properties,
                &profile.properties,
                &mut entries,
            );
            self.diff_artifacts(
                config,
                relocations,
                Some(&profile.id),
                &previous.artifacts,
                &profile.artifacts,
                &mut entries,
            );
        }

        entries
    }

    fn diff_artifacts(
        &self,
        config: &AlignmentConfig,
        relocations: &WildcardMap<RelocationEntry>,
        profile: Option<&str>,
        old: &ArtifactSets,
        new: &ArtifactSets,
        entries: &mut Vec<ReportEntry>,
    ) {
        for kind in ArtifactKind::ALL {
            let location = Location {
                kind,
                profile: profile.map(str::to_string),
            };
            let previous = old.get(kind);

            for artifact in new.get(kind) {
                let coordinate = artifact.group_artifact();
                match previous.iter().find(|p| p.group_artifact() == coordinate) {
                    Some(matched) => {
                        let (Some(from), Some(to)) = (
                            matched.version.as_deref().map(|v| self.old.resolve(v)),
                            artifact.version.as_deref().map(|v| self.new.resolve(v)),
                        ) else {
                            continue;
                        };
                        if from != to {
                            entries.push(ReportEntry::Aligned {
                                location: location.clone(),
                                coordinate,
                                from,
                                to,
                            });
                        } else if config.report_non_aligned {
                            entries.push(ReportEntry::NonAligned {
                                location: location.clone(),
                                coordinate,
                                version: to,
                            });
                        }
                    }
                    None => {
                        if let Some(from) = relocated_from(relocations, previous, &coordinate) {
                            entries.push(ReportEntry::Relocated {
                                location: location.clone(),
                                from,
                                to: coordinate,
                                version: artifact.version.as_deref().map(|v| self.new.resolve(v)),
                            });
                        }
                    }
                }
            }
        }
    }
}

fn diff_properties(
    profile: Option<&str>,
    old: &IndexMap<String, String>,
    new: &IndexMap<String, String>,
    entries: &mut Vec<ReportEntry>,
) {
    for (name, value) in new {
        let previous = old.get(name);
        if previous == Some(value) {
            continue;
        }
        entries.push(ReportEntry::Property {
            profile: profile.map(str::to_string),
            name: name.clone(),
            from: previous.cloned(),
            to: value.clone(),
        });
    }
}

/// The previous coordinate that relocates onto `coordinate`, if any.
fn relocated_from(
    relocations: &WildcardMap<RelocationEntry>,
    previous: &[Artifact],
    coordinate: &GroupArtifact,
) -> Option<GroupArtifact> {
    previous.iter().map(Artifact::group_artifact).find(|old| {
        relocations
            .get(old)
            .is_some_and(|entry| &entry.relocate(old) == coordinate)
    })
}

/// `module` preceded by its ancestors within `index` (least specific first).
fn lineage<'a>(index: &IndexMap<GroupArtifact, &'a Module>, module: &'a Module) -> Vec<&'a Module> {
    let mut chain = vec![module];
    let mut seen = HashSet::from([module.group_artifact()]);
    let mut current = module;
    while let Some(parent) = current.parent.as_ref().and_then(|p| index.get(p).copied()) {
        if !seen.insert(parent.group_artifact()) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Profile;
    use crate::relocation::parse_relocations;

    fn dep(group: &str, artifact: &str, version: &str) -> Artifact {
        Artifact::new(group, artifact, Some(version))
    }

    fn app(version: &str) -> Module {
        Module::new("org.foo", "app", version)
    }

    fn entries(report: &ComparisonReport) -> &[ReportEntry] {
        &report.modules[0].entries
    }

    #[test]
    fn reports_version_property_and_artifact_changes() {
        let before = vec![
            app("1.0")
                .with_property("bar.version", "2.0")
                .with_artifact(ArtifactKind::Dependency, dep("org.bar", "bar", "${bar.version}")),
        ];
        let after = vec![
            app("1.0.redhat-1")
                .with_property("bar.version", "2.0.redhat-1")
                .with_artifact(ArtifactKind::Dependency, dep("org.bar", "bar", "${bar.version}")),
        ];

        let report = compare_projects(
            &AlignmentConfig::default(),
            &WildcardMap::new(),
            &before,
            &after,
        );

        assert_eq!(
            entries(&report),
            &[
                ReportEntry::Version {
                    from: "1.0".to_string(),
                    to: "1.0.redhat-1".to_string()
                },
                ReportEntry::Property {
                    profile: None,
                    name: "bar.version".to_string(),
                    from: Some("2.0".to_string()),
                    to: "2.0.redhat-1".to_string()
                },
                ReportEntry::Aligned {
                    location: Location {
                        kind: ArtifactKind::Dependency,
                        profile: None
                    },
                    coordinate: GroupArtifact::new("org.bar", "bar"),
                    from: "2.0".to_string(),
                    to: "2.0.redhat-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn unchanged_entries_reported_only_when_requested() {
        let modules =
            vec![app("1.0").with_artifact(ArtifactKind::Plugin, dep("org.p", "plugin", "3"))];
        let config = AlignmentConfig {
            report_non_aligned: true,
            ..Default::default()
        };

        let quiet = compare_projects(
            &AlignmentConfig::default(),
            &WildcardMap::new(),
            &modules,
            &modules,
        );
        let verbose = compare_projects(&config, &WildcardMap::new(), &modules, &modules);

        assert!(quiet.is_empty());
        assert_eq!(
            entries(&verbose),
            &[ReportEntry::NonAligned {
                location: Location {
                    kind: ArtifactKind::Plugin,
                    profile: None
                },
                coordinate: GroupArtifact::new("org.p", "plugin"),
                version: "3".to_string(),
            }]
        );
    }

    #[test]
    fn relocations_are_reported_separately() {
        let relocations = parse_relocations(["org.old:@org.new:="]).unwrap();
        let before = vec![app("1.0").with_artifact(
            ArtifactKind::ManagedDependency,
            dep("org.old", "lib", "1.0"),
        )];
        let after = vec![app("1.0").with_artifact(
            ArtifactKind::ManagedDependency,
            dep("org.new", "lib", "1.0.redhat-1"),
        )];

        let report = compare_projects(&AlignmentConfig::default(), &relocations, &before, &after);

        assert_eq!(
            entries(&report),
            &[ReportEntry::Relocated {
                location: Location {
                    kind: ArtifactKind::ManagedDependency,
                    profile: None
                },
                from: GroupArtifact::new("org.old", "lib"),
                to: GroupArtifact::new("org.new", "lib"),
                version: Some("1.0.redhat-1".to_string()),
            }]
        );
    }

    #[test]
    fn profiles_are_matched_by_id() {
        let profile = |version: &str| {
            let mut profile = Profile::new("prod", true);
            profile
                .properties
                .insert("p.version".to_string(), version.to_string());
            profile
                .artifacts
                .dependency_management
                .push(dep("org.bar", "bar", version));
            profile
        };
        let before = vec![app("1.0").with_profile(profile("1.0"))];
        let after = vec![app("1.0").with_profile(profile("1.0.redhat-1"))];

        let report = compare_projects(
            &AlignmentConfig::default(),
            &WildcardMap::new(),
            &before,
            &after,
        );

        let lines: Vec<String> = entries(&report).iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "Profile prod property : p.version  1.0 ---> 1.0.redhat-1".to_string(),
                "Managed dependency in profile prod : org.bar:bar  1.0 ---> 1.0.redhat-1"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn artifact_versions_resolve_through_parent() {
        let root = |version: &str| {
            Module::new("org.foo", "root", "1").with_property("bar.version", version)
        };
        let child = Module::new("org.foo", "child", "1")
            .with_parent(GroupArtifact::new("org.foo", "root"))
            .with_artifact(ArtifactKind::Dependency, dep("org.bar", "bar", "${bar.version}"));
        let before = vec![root("2.0"), child.clone()];
        let after = vec![root("2.0.redhat-1"), child];

        let report = compare_projects(
            &AlignmentConfig::default(),
            &WildcardMap::new(),
            &before,
            &after,
        );

        let child_report = report
            .module(&GroupArtifact::new("org.foo", "child"))
            .unwrap();
        assert_eq!(
            child_report.entries[0].to_string(),
            "Dependency : org.bar:bar  2.0 ---> 2.0.redhat-1"
        );
    }

    #[test]
    fn display_renders_module_header() {
        let before = vec![app("1.0")];
        let after = vec![app("1.0.redhat-1")];

        let report = compare_projects(
            &AlignmentConfig::default(),
            &WildcardMap::new(),
            &before,
            &after,
        );

        assert_eq!(
            report.to_string(),
            "------------------- project org.foo:app\n\tProject version : 1.0 ---> 1.0.redhat-1\n"
        );
    }
}
