//! Group/artifact relocation rules
//!
//! Rule grammar: `<oldGroup>:[<oldArtifact>]@<newGroup>:[<newArtifact>]=[<newVersion>]`.
//! An empty artifact on either side means every artifact of the group; both
//! sides must agree on that.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::model::GroupArtifact;
use crate::wildcard::WildcardMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationEntry {
    pub from: GroupArtifact,
    pub to: GroupArtifact,
    pub version: Option<String>,
}

impl RelocationEntry {
    /// Where `artifact` moves to; wildcard rules keep the artifact id.
    pub fn relocate(&self, artifact: &GroupArtifact) -> GroupArtifact {
        if self.to.is_wildcard() {
            GroupArtifact::new(&self.to.group_id, &artifact.artifact_id)
        } else {
            self.to.clone()
        }
    }
}

impl fmt::Display for RelocationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.from, self.to)?;
        if let Some(version) = &self.version {
            write!(f, "={version}")?;
        }
        Ok(())
    }
}

impl FromStr for RelocationEntry {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rule = s.trim();
        let invalid = |reason: &str| ConfigError::InvalidRelocation {
            rule: rule.to_string(),
            reason: reason.to_string(),
        };

        let (old, rest) = rule
            .split_once('@')
            .ok_or_else(|| invalid("missing '@' separator"))?;
        let (new, version) = match rest.split_once('=') {
            Some((new, version)) => (new, Some(version.trim()).filter(|v| !v.is_empty())),
            None => (rest, None),
        };

        let from = parse_side(old).ok_or_else(|| invalid("old side must be <group>:[<artifact>]"))?;
        let to = parse_side(new).ok_or_else(|| invalid("new side must be <group>:[<artifact>]"))?;

        if from.is_wildcard() != to.is_wildcard() {
            return Err(ConfigError::RelocationWildcardMismatch(rule.to_string()));
        }

        Ok(Self {
            from,
            to,
            version: version.map(str::to_string),
        })
    }
}

fn parse_side(side: &str) -> Option<GroupArtifact> {
    let (group, artifact) = side.trim().split_once(':')?;
    if group.is_empty() || artifact.contains(':') {
        return None;
    }
    Some(if artifact.is_empty() {
        GroupArtifact::wildcard(group)
    } else {
        GroupArtifact::new(group, artifact)
    })
}

/// Parse relocation rules into a table keyed by the old coordinates.
///
/// Each item may hold several comma separated rules.
pub fn parse_relocations<I, S>(rules: I) -> Result<WildcardMap<RelocationEntry>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut table = WildcardMap::new();
    for item in rules {
        for rule in item.as_ref().split(',').filter(|r| !r.trim().is_empty()) {
            let entry: RelocationEntry = rule.parse()?;
            table.put(&entry.from.clone(), entry);
        }
    }
    Ok(table)
}
