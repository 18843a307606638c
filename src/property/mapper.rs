//! Pending property rewrites for one alignment pass

use indexmap::{IndexMap, IndexSet};

use crate::model::{GroupArtifact, ModuleId};

/// One property's pending rewrite and the coordinates asking for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMapper {
    original_version: Option<String>,
    new_version: Option<String>,
    contributors: IndexSet<GroupArtifact>,
    forced: bool,
}

impl PropertyMapper {
    /// Fully resolved value before alignment
    pub fn original_version(&self) -> Option<&str> {
        self.original_version.as_deref()
    }

    pub fn new_version(&self) -> Option<&str> {
        self.new_version.as_deref()
    }

    pub fn contributors(&self) -> &IndexSet<GroupArtifact> {
        &self.contributors
    }

    /// Whether an explicit override contributed the new version
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// True once the new value equals the original, e.g. after a rollback.
    pub fn is_reverted(&self) -> bool {
        self.original_version.is_some() && self.original_version == self.new_version
    }

    pub(crate) fn record(
        &mut self,
        original: &str,
        new_version: &str,
        contributor: GroupArtifact,
        forced: bool,
    ) {
        if self.original_version.is_none() {
            self.original_version = Some(original.to_string());
        }
        self.new_version = Some(new_version.to_string());
        self.contributors.insert(contributor);
        self.forced |= forced;
    }

    fn revert(&mut self) {
        self.new_version = self.original_version.clone();
    }
}

/// Mappers keyed by (declaring module, property name), created lazily.
///
/// A purged property stays purged for the rest of the pass so that later
/// contributors cannot re-create it.
#[derive(Debug, Clone, Default)]
pub struct PropertyMappings {
    by_module: IndexMap<ModuleId, IndexMap<String, PropertyMapper>>,
    purged: IndexSet<(ModuleId, String)>,
}

impl PropertyMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: ModuleId, property: &str) -> Option<&PropertyMapper> {
        self.by_module.get(&module)?.get(property)
    }

    pub fn get_or_create(&mut self, module: ModuleId, property: &str) -> &mut PropertyMapper {
        self.by_module
            .entry(module)
            .or_default()
            .entry(property.to_string())
            .or_default()
    }

    pub fn module(&self, module: ModuleId) -> Option<&IndexMap<String, PropertyMapper>> {
        self.by_module.get(&module)
    }

    /// Drop the pending rewrite of `property` in `module` for the rest of the pass.
    pub fn purge(&mut self, module: ModuleId, property: &str) {
        if let Some(properties) = self.by_module.get_mut(&module) {
            properties.shift_remove(property);
        }
        self.purged.insert((module, property.to_string()));
    }

    pub fn is_purged(&self, module: ModuleId, property: &str) -> bool {
        self.purged.contains(&(module, property.to_string()))
    }

    /// Roll back every mapper, in any module, whose original value is `original`.
    ///
    /// Returns the number of mappers touched.
    pub fn revert_matching(&mut self, original: &str) -> usize {
        let mut reverted = 0;
        for mapper in self.by_module.values_mut().flat_map(IndexMap::values_mut) {
            if mapper.original_version() == Some(original) {
                mapper.revert();
                reverted += 1;
            }
        }
        reverted
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &str, &PropertyMapper)> {
        self.by_module.iter().flat_map(|(module, properties)| {
            properties
                .iter()
                .map(move |(name, mapper)| (*module, name.as_str(), mapper))
        })
    }

    pub fn len(&self) -> usize {
        self.by_module.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
