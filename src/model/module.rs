//! Modules, profiles and the artifacts they declare

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::coordinate::{Coordinate, GroupArtifact};

/// A dependency or plugin declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Artifact {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group_id, &self.artifact_id)
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.group_artifact(), self.version.clone())
    }
}

/// The four places a module or profile declares artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Dependency,
    ManagedDependency,
    Plugin,
    ManagedPlugin,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Dependency,
        ArtifactKind::ManagedDependency,
        ArtifactKind::Plugin,
        ArtifactKind::ManagedPlugin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Dependency => "Dependency",
            ArtifactKind::ManagedDependency => "Managed dependency",
            ArtifactKind::Plugin => "Plugin",
            ArtifactKind::ManagedPlugin => "Managed plugin",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtifactSets {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Artifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependency_management: Vec<Artifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Artifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugin_management: Vec<Artifact>,
}

impl ArtifactSets {
    pub fn get(&self, kind: ArtifactKind) -> &Vec<Artifact> {
        match kind {
            ArtifactKind::Dependency => &self.dependencies,
            ArtifactKind::ManagedDependency => &self.dependency_management,
            ArtifactKind::Plugin => &self.plugins,
            ArtifactKind::ManagedPlugin => &self.plugin_management,
        }
    }

    pub fn get_mut(&mut self, kind: ArtifactKind) -> &mut Vec<Artifact> {
        match kind {
            ArtifactKind::Dependency => &mut self.dependencies,
            ArtifactKind::ManagedDependency => &mut self.dependency_management,
            ArtifactKind::Plugin => &mut self.plugins,
            ArtifactKind::ManagedPlugin => &mut self.plugin_management,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &Artifact)> {
        ArtifactKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |a| (kind, a)))
    }
}

/// A conditional overlay of properties and artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,
    #[serde(flatten)]
    pub artifacts: ArtifactSets,
}

impl Profile {
    pub fn new(id: &str, active: bool) -> Self {
        Self {
            id: id.to_string(),
            active,
            ..Default::default()
        }
    }
}

/// Where within a module a property table or artifact list lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Main,
    /// Index into [`Module::profiles`]
    Profile(usize),
}

/// One project unit of the build forest.
///
/// `parent` names the parent module by identity; the forest resolves it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<GroupArtifact>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
    #[serde(flatten)]
    pub artifacts: ArtifactSets,
}

impl Module {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            ..Default::default()
        }
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group_id, &self.artifact_id)
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.group_artifact(), Some(self.version.clone()))
    }

    pub fn active_profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter().filter(|p| p.active)
    }

    /// The main section followed by every active profile.
    pub fn sections(&self) -> Vec<Section> {
        std::iter::once(Section::Main)
            .chain(
                self.profiles
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.active)
                    .map(|(i, _)| Section::Profile(i)),
            )
            .collect()
    }

    pub fn properties_in(&self, section: Section) -> Option<&IndexMap<String, String>> {
        match section {
            Section::Main => Some(&self.properties),
            Section::Profile(i) => self.profiles.get(i).map(|p| &p.properties),
        }
    }

    pub fn properties_in_mut(&mut self, section: Section) -> Option<&mut IndexMap<String, String>> {
        match section {
            Section::Main => Some(&mut self.properties),
            Section::Profile(i) => self.profiles.get_mut(i).map(|p| &mut p.properties),
        }
    }

    pub fn artifacts_in(&self, section: Section) -> Option<&ArtifactSets> {
        match section {
            Section::Main => Some(&self.artifacts),
            Section::Profile(i) => self.profiles.get(i).map(|p| &p.artifacts),
        }
    }

    pub fn artifacts_in_mut(&mut self, section: Section) -> Option<&mut ArtifactSets> {
        match section {
            Section::Main => Some(&mut self.artifacts),
            Section::Profile(i) => self.profiles.get_mut(i).map(|p| &mut p.artifacts),
        }
    }

    /// The scope declaring `key`: active profiles are checked before the main table.
    ///
    /// Later active profiles win, as they do during resolution.
    pub fn declaring_section(&self, key: &str) -> Option<Section> {
        self.profiles
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, p)| p.active)
            .find(|(_, p)| p.properties.contains_key(key))
            .map(|(i, _)| Section::Profile(i))
            .or_else(|| self.properties.contains_key(key).then_some(Section::Main))
    }

    pub fn with_parent(mut self, parent: GroupArtifact) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_artifact(mut self, kind: ArtifactKind, artifact: Artifact) -> Self {
        self.artifacts.get_mut(kind).push(artifact);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaring_section_prefers_active_profile_over_main_table() {
        let mut profile = Profile::new("prod", true);
        profile
            .properties
            .insert("foo.version".to_string(), "2.0".to_string());

        let module = Module::new("org.foo", "root", "1")
            .with_property("foo.version", "1.0")
            .with_profile(Profile::new("dev", false))
            .with_profile(profile);

        assert_eq!(
            module.declaring_section("foo.version"),
            Some(Section::Profile(1))
        );
        assert_eq!(module.declaring_section("missing"), None);
    }

    #[test]
    fn declaring_section_picks_last_active_profile() {
        let mut first = Profile::new("p1", true);
        first
            .properties
            .insert("foo".to_string(), "1.0".to_string());
        let mut second = Profile::new("p2", true);
        second
            .properties
            .insert("foo".to_string(), "2.0".to_string());

        let module = Module::new("org.foo", "root", "1")
            .with_profile(first)
            .with_profile(second);

        assert_eq!(module.declaring_section("foo"), Some(Section::Profile(1)));
    }

    #[test]
    fn declaring_section_skips_inactive_profiles() {
        let mut profile = Profile::new("dev", false);
        profile
            .properties
            .insert("foo.version".to_string(), "2.0".to_string());

        let module = Module::new("org.foo", "root", "1").with_profile(profile);

        assert_eq!(module.declaring_section("foo.version"), None);
    }

    #[test]
    fn sections_lists_main_then_active_profiles() {
        let module = Module::new("org.foo", "root", "1")
            .with_profile(Profile::new("a", true))
            .with_profile(Profile::new("b", false))
            .with_profile(Profile::new("c", true));

        assert_eq!(
            module.sections(),
            vec![Section::Main, Section::Profile(0), Section::Profile(2)]
        );
    }

    #[test]
    fn module_deserializes_flattened_artifacts() {
        let module: Module = serde_json::from_value(serde_json::json!({
            "groupId": "org.foo",
            "artifactId": "child",
            "version": "1.0",
            "parent": "org.foo:root",
            "properties": { "bar.version": "2.0" },
            "dependencies": [
                { "groupId": "org.bar", "artifactId": "bar", "version": "${bar.version}" }
            ],
            "profiles": [
                { "id": "extra", "active": true, "pluginManagement": [
                    { "groupId": "org.plugins", "artifactId": "p", "version": "3" }
                ] }
            ]
        }))
        .unwrap();

        assert_eq!(module.parent, Some(GroupArtifact::new("org.foo", "root")));
        assert_eq!(
            module.artifacts.dependencies,
            vec![Artifact::new("org.bar", "bar", Some("${bar.version}"))]
        );
        assert_eq!(module.profiles[0].artifacts.plugin_management.len(), 1);
    }
}
