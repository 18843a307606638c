//! Two-level lookup keyed by group and artifact, with per-group wildcards
//!
//! Within one group the map holds either a single `*` entry or any number of
//! explicit artifact entries, never both. Iteration follows insertion order.

use indexmap::IndexMap;
use tracing::warn;

use crate::model::{GroupArtifact, WILDCARD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardMap<T> {
    groups: IndexMap<String, IndexMap<String, T>>,
}

impl<T> Default for WildcardMap<T> {
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<T> WildcardMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` for `key`.
    ///
    /// A wildcard key discards every explicit entry of its group. An explicit
    /// key is ignored when its group already has a wildcard.
    pub fn put(&mut self, key: &GroupArtifact, value: T) {
        if key.is_wildcard() {
            let artifacts = self.groups.entry(key.group_id.clone()).or_default();
            let explicit: Vec<&str> = artifacts
                .keys()
                .map(String::as_str)
                .filter(|artifact| *artifact != WILDCARD)
                .collect();
            if !explicit.is_empty() {
                warn!(
                    "Replacing explicit entries {:?} of group {} with a wildcard",
                    explicit, key.group_id
                );
            }
            artifacts.clear();
            artifacts.insert(WILDCARD.to_string(), value);
            return;
        }

        match self.groups.get_mut(&key.group_id) {
            Some(artifacts) if artifacts.contains_key(WILDCARD) => {
                warn!(
                    "Ignoring {} as group {} already has a wildcard entry",
                    key, key.group_id
                );
            }
            Some(artifacts) => {
                artifacts.insert(key.artifact_id.clone(), value);
            }
            None => {
                self.groups.insert(
                    key.group_id.clone(),
                    IndexMap::from([(key.artifact_id.clone(), value)]),
                );
            }
        }
    }

    pub fn get(&self, key: &GroupArtifact) -> Option<&T> {
        let artifacts = self.groups.get(&key.group_id)?;
        artifacts
            .get(WILDCARD)
            .or_else(|| artifacts.get(&key.artifact_id))
    }

    pub fn contains_key(&self, key: &GroupArtifact) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in insertion order; wildcard entries are yielded with a `*` artifact.
    pub fn iter(&self) -> impl Iterator<Item = (GroupArtifact, &T)> {
        self.groups.iter().flat_map(|(group, artifacts)| {
            artifacts
                .iter()
                .map(move |(artifact, value)| (GroupArtifact::new(group, artifact), value))
        })
    }
}
