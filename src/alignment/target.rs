//! Where aligned versions come from

#[cfg(test)]
use mockall::automock;

use indexmap::IndexMap;

use crate::model::GroupArtifact;

/// Version a coordinate should be aligned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub version: String,
    /// Explicit per-coordinate override: wins property clashes and bypasses
    /// the strict check
    pub forced: bool,
}

impl Target {
    pub fn aligned(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            forced: false,
        }
    }

    pub fn forced(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            forced: true,
        }
    }
}

/// Supplies target versions for coordinates
#[cfg_attr(test, automock)]
pub trait TargetSource {
    /// Target for `coordinate`, if any
    fn target_for(&self, coordinate: &GroupArtifact) -> Option<Target>;

    /// Every known target, in a stable order
    fn targets(&self) -> Vec<(GroupArtifact, Target)>;
}

/// Targets held in memory: aligned versions plus explicit overrides.
///
/// An override shadows an aligned version for the same coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticTargets {
    versions: IndexMap<GroupArtifact, String>,
    overrides: IndexMap<GroupArtifact, String>,
}

impl StaticTargets {
    pub fn new(
        versions: IndexMap<GroupArtifact, String>,
        overrides: IndexMap<GroupArtifact, String>,
    ) -> Self {
        Self {
            versions,
            overrides,
        }
    }

    pub fn with_version(mut self, coordinate: GroupArtifact, version: &str) -> Self {
        self.versions.insert(coordinate, version.to_string());
        self
    }

    pub fn with_override(mut self, coordinate: GroupArtifact, version: &str) -> Self {
        self.overrides.insert(coordinate, version.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty() && self.overrides.is_empty()
    }
}

impl TargetSource for StaticTargets {
    fn target_for(&self, coordinate: &GroupArtifact) -> Option<Target> {
        self.overrides
            .get(coordinate)
            .map(Target::forced)
            .or_else(|| self.versions.get(coordinate).map(Target::aligned))
    }

    fn targets(&self) -> Vec<(GroupArtifact, Target)> {
        let overridden = self
            .overrides
            .iter()
            .map(|(coordinate, version)| (coordinate.clone(), Target::forced(version)));
        let aligned = self
            .versions
            .iter()
            .filter(|(coordinate, _)| !self.overrides.contains_key(*coordinate))
            .map(|(coordinate, version)| (coordinate.clone(), Target::aligned(version)));
        overridden.chain(aligned).collect()
    }
}
