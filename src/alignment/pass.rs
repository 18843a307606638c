//! One complete alignment pass over a module forest
//!
//! The pass runs strictly in order:
//! 1. relocate artifacts matching the relocation table
//! 2. set module versions that have a target
//! 3. rewrite literal artifact versions and cache property-backed ones
//! 4. verify every property-backed artifact took part in its property's rewrite
//! 5. apply the cached property rewrites where the properties are declared
//! 6. optionally inject the remaining targets into root dependency management
//!
//! Any error aborts the pass; callers should discard the forest in that case.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::alignment::clash::{cache_property, verify_property_mapping};
use crate::alignment::error::AlignmentError;
use crate::alignment::strict::is_strictly_compatible;
use crate::alignment::target::{Target, TargetSource};
use crate::alignment::update::{PropertyUpdate, update_properties};
use crate::config::AlignmentConfig;
use crate::model::{Artifact, ArtifactSlot, Coordinate, GroupArtifact, ModuleForest, ModuleId};
use crate::property::{PropertyMappings, bare_placeholder, is_compound};
use crate::relocation::RelocationEntry;
use crate::wildcard::WildcardMap;

/// A version rewritten during the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub module: GroupArtifact,
    /// What changed: a coordinate or a property name
    pub subject: String,
    pub from: String,
    pub to: String,
}

/// An artifact moved to another group/artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub module: GroupArtifact,
    pub from: GroupArtifact,
    pub to: GroupArtifact,
}

/// A cached property rewrite whose property no module in the chain declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedProperty {
    pub module: GroupArtifact,
    pub property: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentOutcome {
    pub module_versions: Vec<VersionChange>,
    pub literal_updates: Vec<VersionChange>,
    pub property_updates: Vec<VersionChange>,
    pub unresolved_properties: Vec<UnresolvedProperty>,
    pub relocations: Vec<Relocation>,
    pub injected: Vec<Coordinate>,
}

impl AlignmentOutcome {
    pub fn change_count(&self) -> usize {
        self.module_versions.len()
            + self.literal_updates.len()
            + self.property_updates.len()
            + self.relocations.len()
            + self.injected.len()
    }
}

/// Align every module of `forest` to the versions supplied by `targets`.
pub fn align(
    forest: &mut ModuleForest,
    config: &AlignmentConfig,
    targets: &dyn TargetSource,
    relocations: &WildcardMap<RelocationEntry>,
) -> Result<AlignmentOutcome, AlignmentError> {
    let mut outcome = AlignmentOutcome::default();
    let slots = forest.artifact_slots();

    apply_relocations(forest, &slots, relocations, &mut outcome);
    align_module_versions(forest, config, targets, &mut outcome)?;

    let mut mappings = PropertyMappings::new();
    align_artifacts(forest, config, targets, &slots, &mut mappings, &mut outcome)?;
    verify_mappings(forest, config, &slots, &mut mappings)?;
    apply_mappings(forest, config, &mappings, &mut outcome)?;

    if config.override_transitive {
        inject_transitive(forest, targets, &mut outcome);
    }

    info!(
        "Alignment pass finished: {} module version(s), {} artifact version(s), {} property update(s), {} relocation(s), {} injected",
        outcome.module_versions.len(),
        outcome.literal_updates.len(),
        outcome.property_updates.len(),
        outcome.relocations.len(),
        outcome.injected.len()
    );
    Ok(outcome)
}

fn apply_relocations(
    forest: &mut ModuleForest,
    slots: &[ArtifactSlot],
    relocations: &WildcardMap<RelocationEntry>,
    outcome: &mut AlignmentOutcome,
) {
    if relocations.is_empty() {
        return;
    }

    for slot in slots {
        let module = forest.module(slot.module).group_artifact();
        let Some(artifact) = forest.artifact_mut(*slot) else {
            continue;
        };
        let from = artifact.group_artifact();
        let Some(entry) = relocations.get(&from) else {
            continue;
        };

        let to = entry.relocate(&from);
        info!("Relocating {} to {} in {}", from, to, module);
        artifact.group_id = to.group_id.clone();
        artifact.artifact_id = to.artifact_id.clone();
        if let Some(version) = &entry.version {
            artifact.version = Some(version.clone());
        }
        outcome.relocations.push(Relocation { module, from, to });
    }
}

fn align_module_versions(
    forest: &mut ModuleForest,
    config: &AlignmentConfig,
    targets: &dyn TargetSource,
    outcome: &mut AlignmentOutcome,
) -> Result<(), AlignmentError> {
    for id in forest.ids() {
        let module = forest.module_mut(id);
        let identity = module.group_artifact();
        let Some(target) = targets.target_for(&identity) else {
            continue;
        };
        if module.version == target.version {
            continue;
        }
        if !accept_literal(config, &identity.to_string(), &module.version, &target)? {
            continue;
        }

        info!(
            "Updating version of module {} from {} to {}",
            identity, module.version, target.version
        );
        let from = std::mem::replace(&mut module.version, target.version.clone());
        outcome.module_versions.push(VersionChange {
            subject: identity.to_string(),
            module: identity,
            from,
            to: target.version,
        });
    }
    Ok(())
}

/// An artifact declaration with a version, in a scope that takes part in alignment.
fn alignable(config: &AlignmentConfig, artifact: &Artifact) -> Option<String> {
    if config.is_scope_excluded(artifact.scope.as_deref()) {
        debug!(
            "Skipping {} in excluded scope {:?}",
            artifact.group_artifact(),
            artifact.scope
        );
        return None;
    }
    artifact.version.clone()
}

fn align_artifacts(
    forest: &mut ModuleForest,
    config: &AlignmentConfig,
    targets: &dyn TargetSource,
    slots: &[ArtifactSlot],
    mappings: &mut PropertyMappings,
    outcome: &mut AlignmentOutcome,
) -> Result<(), AlignmentError> {
    for slot in slots {
        let Some(artifact) = forest.artifact(*slot) else {
            continue;
        };
        let Some(version) = alignable(config, artifact) else {
            continue;
        };
        let coordinate = artifact.group_artifact();
        let Some(target) = targets.target_for(&coordinate) else {
            continue;
        };

        if bare_placeholder(&version).is_some() {
            cache_property(
                forest,
                mappings,
                config,
                slot.module,
                &version,
                &target.version,
                &coordinate,
                target.forced,
            )?;
            continue;
        }

        if is_compound(&version) {
            warn!(
                "Skipping {} in {}: version {} mixes properties with other text",
                coordinate,
                forest.module(slot.module).group_artifact(),
                version
            );
            continue;
        }

        if version == target.version {
            continue;
        }

        let label = format!("{} {}", slot.kind.label(), coordinate);
        if !accept_literal(config, &label, &version, &target)? {
            continue;
        }

        let module = forest.module(slot.module).group_artifact();
        info!(
            "Updating {} in {} from {} to {}",
            label, module, version, target.version
        );
        if let Some(artifact) = forest.artifact_mut(*slot) {
            artifact.version = Some(target.version.clone());
        }
        outcome.literal_updates.push(VersionChange {
            module,
            subject: coordinate.to_string(),
            from: version,
            to: target.version,
        });
    }
    Ok(())
}

/// Strict gate for a literal version; `false` means skip without failing.
fn accept_literal(
    config: &AlignmentConfig,
    subject: &str,
    current: &str,
    target: &Target,
) -> Result<bool, AlignmentError> {
    if !config.strict_alignment
        || target.forced
        || is_strictly_compatible(current, &target.version, config)
    {
        return Ok(true);
    }

    if config.strict_violation_fails {
        return Err(AlignmentError::StrictViolation {
            subject: subject.to_string(),
            old_value: current.to_string(),
            new_value: target.version.clone(),
        });
    }
    warn!(
        "Replacing original version {} of {} with {} violates the strict version-alignment rule!",
        current, subject, target.version
    );
    Ok(false)
}

fn verify_mappings(
    forest: &ModuleForest,
    config: &AlignmentConfig,
    slots: &[ArtifactSlot],
    mappings: &mut PropertyMappings,
) -> Result<(), AlignmentError> {
    for slot in slots {
        let Some(artifact) = forest.artifact(*slot) else {
            continue;
        };
        let Some(version) = alignable(config, artifact) else {
            continue;
        };
        let Some(property) = bare_placeholder(&version) else {
            continue;
        };
        verify_property_mapping(
            forest,
            config,
            slot.module,
            mappings,
            &artifact.group_artifact(),
            property,
        )?;
    }
    Ok(())
}

fn apply_mappings(
    forest: &mut ModuleForest,
    config: &AlignmentConfig,
    mappings: &PropertyMappings,
    outcome: &mut AlignmentOutcome,
) -> Result<(), AlignmentError> {
    let pending: Vec<(ModuleId, String, String, String, bool)> = mappings
        .iter()
        .filter(|(_, _, mapper)| !mapper.is_reverted())
        .filter_map(|(module, property, mapper)| {
            Some((
                module,
                property.to_string(),
                mapper.original_version()?.to_string(),
                mapper.new_version()?.to_string(),
                mapper.is_forced(),
            ))
        })
        .collect();

    for (module, property, original, new_version, forced) in pending {
        let identity = forest.module(module).group_artifact();
        match update_properties(forest, config, module, forced, &property, &new_version)? {
            PropertyUpdate::Found => outcome.property_updates.push(VersionChange {
                module: identity,
                subject: property,
                from: original,
                to: new_version,
            }),
            PropertyUpdate::NotFound => {
                warn!(
                    "Unable to update property {} of {}: not declared in its inheritance chain",
                    property, identity
                );
                outcome.unresolved_properties.push(UnresolvedProperty {
                    module: identity,
                    property,
                });
            }
            PropertyUpdate::Ignore => {
                debug!("Property {} of {} needs no update", property, identity);
            }
        }
    }
    Ok(())
}

fn inject_transitive(
    forest: &mut ModuleForest,
    targets: &dyn TargetSource,
    outcome: &mut AlignmentOutcome,
) {
    let declared: HashSet<GroupArtifact> = forest
        .artifact_slots()
        .into_iter()
        .filter_map(|slot| forest.artifact(slot).map(Artifact::group_artifact))
        .chain(forest.modules().iter().map(|m| m.group_artifact()))
        .collect();
    let roots = forest.roots();

    for (coordinate, target) in targets.targets() {
        if coordinate.is_wildcard() || declared.contains(&coordinate) {
            continue;
        }
        for root in &roots {
            let module = forest.module_mut(*root);
            debug!(
                "Injecting {}:{} into dependency management of {}",
                coordinate,
                target.version,
                module.group_artifact()
            );
            module.artifacts.dependency_management.push(Artifact::new(
                &coordinate.group_id,
                &coordinate.artifact_id,
                Some(&target.version),
            ));
        }
        if !roots.is_empty() {
            outcome
                .injected
                .push(Coordinate::new(coordinate, Some(target.version)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::target::MockTargetSource;
    use crate::model::{ArtifactKind, Module};

    fn dep(artifact: &str, version: &str) -> Artifact {
        Artifact::new("org.dep", artifact, Some(version))
    }

    fn ga(artifact: &str) -> GroupArtifact {
        GroupArtifact::new("org.dep", artifact)
    }

    fn targets(entries: Vec<(GroupArtifact, Target)>) -> MockTargetSource {
        let mut mock = MockTargetSource::new();
        let lookup = entries.clone();
        mock.expect_target_for().returning(move |coordinate| {
            lookup
                .iter()
                .find(|(candidate, _)| candidate == coordinate)
                .map(|(_, target)| target.clone())
        });
        mock.expect_targets().returning(move || entries.clone());
        mock
    }

    fn single(module: Module) -> ModuleForest {
        ModuleForest::new(vec![module]).unwrap()
    }

    #[test]
    fn literal_and_property_versions_are_aligned() {
        let mut forest = single(
            Module::new("org.foo", "app", "1.0")
                .with_property("b.version", "2.0")
                .with_artifact(ArtifactKind::Dependency, dep("a", "1.0"))
                .with_artifact(ArtifactKind::ManagedDependency, dep("b", "${b.version}")),
        );
        let source = targets(vec![
            (ga("a"), Target::aligned("1.0.0.redhat-1")),
            (ga("b"), Target::aligned("2.0.0.redhat-1")),
        ]);

        let outcome = align(
            &mut forest,
            &AlignmentConfig::default(),
            &source,
            &WildcardMap::new(),
        )
        .unwrap();

        let module = &forest.modules()[0];
        assert_eq!(
            module.artifacts.dependencies[0].version.as_deref(),
            Some("1.0.0.redhat-1")
        );
        assert_eq!(
            module.artifacts.dependency_management[0].version.as_deref(),
            Some("${b.version}")
        );
        assert_eq!(module.properties["b.version"], "2.0.0.redhat-1");
        assert_eq!(outcome.literal_updates.len(), 1);
        assert_eq!(outcome.property_updates.len(), 1);
    }

    #[test]
    fn excluded_scope_is_left_alone() {
        let mut forest = single(Module::new("org.foo", "app", "1.0").with_artifact(
            ArtifactKind::Dependency,
            dep("a", "1.0").with_scope("test"),
        ));
        let source = targets(vec![(ga("a"), Target::aligned("1.0.0.redhat-1"))]);
        let config = AlignmentConfig {
            excluded_scopes: vec!["test".to_string()],
            ..Default::default()
        };

        let outcome = align(&mut forest, &config, &source, &WildcardMap::new()).unwrap();

        assert_eq!(outcome.change_count(), 0);
        assert_eq!(
            forest.modules()[0].artifacts.dependencies[0].version.as_deref(),
            Some("1.0")
        );
    }

    #[test]
    fn module_version_is_set_from_target() {
        let mut forest = single(Module::new("org.foo", "app", "1.0"));
        let source = targets(vec![(
            GroupArtifact::new("org.foo", "app"),
            Target::aligned("1.0.0.redhat-1"),
        )]);

        let outcome = align(
            &mut forest,
            &AlignmentConfig::default(),
            &source,
            &WildcardMap::new(),
        )
        .unwrap();

        assert_eq!(forest.modules()[0].version, "1.0.0.redhat-1");
        assert_eq!(outcome.module_versions[0].from, "1.0");
    }

    #[test]
    fn strict_violation_on_literal_is_skipped_or_fatal() {
        let module = Module::new("org.foo", "app", "1.0")
            .with_artifact(ArtifactKind::Dependency, dep("a", "1.0"));
        let source = targets(vec![(ga("a"), Target::aligned("2.0.0.redhat-1"))]);
        let warn_only = AlignmentConfig {
            strict_alignment: true,
            version_suffix: Some("redhat".to_string()),
            ..Default::default()
        };
        let fatal = AlignmentConfig {
            strict_violation_fails: true,
            ..warn_only.clone()
        };

        let mut forest = single(module.clone());
        let outcome = align(&mut forest, &warn_only, &source, &WildcardMap::new()).unwrap();
        assert!(outcome.literal_updates.is_empty());

        let mut forest = single(module);
        let result = align(&mut forest, &fatal, &source, &WildcardMap::new());
        assert!(matches!(result, Err(AlignmentError::StrictViolation { .. })));
    }

    #[test]
    fn forced_target_bypasses_strict_check() {
        let mut forest = single(
            Module::new("org.foo", "app", "1.0")
                .with_artifact(ArtifactKind::Dependency, dep("a", "1.0")),
        );
        let source = targets(vec![(ga("a"), Target::forced("3.0"))]);
        let config = AlignmentConfig {
            strict_alignment: true,
            strict_violation_fails: true,
            version_suffix: Some("redhat".to_string()),
            ..Default::default()
        };

        align(&mut forest, &config, &source, &WildcardMap::new()).unwrap();

        assert_eq!(
            forest.modules()[0].artifacts.dependencies[0].version.as_deref(),
            Some("3.0")
        );
    }

    #[test]
    fn relocation_rewrites_coordinates_before_alignment() {
        let mut forest = single(
            Module::new("org.foo", "app", "1.0")
                .with_artifact(ArtifactKind::Dependency, dep("a", "1.0")),
        );
        let mut relocations = WildcardMap::new();
        let entry: RelocationEntry = "org.dep:@org.moved:=1.1".parse().unwrap();
        relocations.put(&entry.from.clone(), entry);
        let source = targets(vec![(
            GroupArtifact::new("org.moved", "a"),
            Target::aligned("1.1.0.redhat-1"),
        )]);

        let outcome = align(&mut forest, &AlignmentConfig::default(), &source, &relocations).unwrap();

        let artifact = &forest.modules()[0].artifacts.dependencies[0];
        assert_eq!(artifact.group_artifact(), GroupArtifact::new("org.moved", "a"));
        assert_eq!(artifact.version.as_deref(), Some("1.1.0.redhat-1"));
        assert_eq!(outcome.relocations.len(), 1);
    }

    #[test]
    fn override_transitive_injects_unmatched_targets_into_roots() {
        let mut forest = single(
            Module::new("org.foo", "app", "1.0")
                .with_artifact(ArtifactKind::Dependency, dep("a", "1.0.0.redhat-1")),
        );
        let source = targets(vec![
            (ga("a"), Target::aligned("1.0.0.redhat-1")),
            (ga("transitive"), Target::aligned("4.0.0.redhat-2")),
        ]);
        let config = AlignmentConfig {
            override_transitive: true,
            ..Default::default()
        };

        let outcome = align(&mut forest, &config, &source, &WildcardMap::new()).unwrap();

        assert_eq!(
            forest.modules()[0].artifacts.dependency_management,
            vec![dep("transitive", "4.0.0.redhat-2")]
        );
        assert_eq!(outcome.injected.len(), 1);
    }

    #[test]
    fn undeclared_property_is_reported_as_unresolved() {
        let mut forest = single(
            Module::new("org.foo", "app", "1.0")
                .with_artifact(ArtifactKind::Dependency, dep("a", "${missing.version}")),
        );
        let source = targets(vec![(ga("a"), Target::aligned("1.0.0.redhat-1"))]);

        let outcome = align(
            &mut forest,
            &AlignmentConfig::default(),
            &source,
            &WildcardMap::new(),
        )
        .unwrap();

        assert_eq!(
            outcome.unresolved_properties,
            vec![UnresolvedProperty {
                module: GroupArtifact::new("org.foo", "app"),
                property: "missing.version".to_string(),
            }]
        );
    }
}
