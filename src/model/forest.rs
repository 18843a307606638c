//! The module forest: modules with their parent back-links resolved

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::model::coordinate::GroupArtifact;
use crate::model::module::{Artifact, ArtifactKind, Module, Section};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForestError {
    #[error("Module {0} is declared more than once")]
    DuplicateModule(GroupArtifact),

    #[error("Module {0} is part of an inheritance cycle")]
    InheritanceCycle(GroupArtifact),
}

/// Index of a module within its [`ModuleForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

impl ModuleId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Location of a single artifact declaration within the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactSlot {
    pub module: ModuleId,
    pub section: Section,
    pub kind: ArtifactKind,
    pub index: usize,
}

/// Owns every module; parents are non-owning indices into the same arena.
///
/// A parent that is not part of the forest is external and the module is
/// treated as a root.
#[derive(Debug, Clone)]
pub struct ModuleForest {
    modules: Vec<Module>,
    parents: Vec<Option<ModuleId>>,
    index: HashMap<GroupArtifact, ModuleId>,
}

impl ModuleForest {
    pub fn new(modules: Vec<Module>) -> Result<Self, ForestError> {
        let mut index = HashMap::with_capacity(modules.len());
        for (i, module) in modules.iter().enumerate() {
            let key = module.group_artifact();
            if index.insert(key.clone(), ModuleId(i)).is_some() {
                return Err(ForestError::DuplicateModule(key));
            }
        }

        let parents = modules
            .iter()
            .map(|module| {
                let parent = module.parent.as_ref()?;
                let id = index.get(parent).copied();
                if id.is_none() {
                    debug!(
                        "Parent {} of {} is external to the forest",
                        parent,
                        module.group_artifact()
                    );
                }
                id
            })
            .collect();

        let forest = Self {
            modules,
            parents,
            index,
        };
        forest.check_acyclic()?;

        Ok(forest)
    }

    fn check_acyclic(&self) -> Result<(), ForestError> {
        for start in self.ids() {
            let mut current = self.parent(start);
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if id == start || steps > self.modules.len() {
                    return Err(ForestError::InheritanceCycle(
                        self.module(start).group_artifact(),
                    ));
                }
                current = self.parent(id);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + use<> {
        (0..self.modules.len()).map(ModuleId)
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn into_modules(self) -> Vec<Module> {
        self.modules
    }

    pub fn find(&self, key: &GroupArtifact) -> Option<ModuleId> {
        self.index.get(key).copied()
    }

    pub fn parent(&self, id: ModuleId) -> Option<ModuleId> {
        self.parents[id.0]
    }

    pub fn roots(&self) -> Vec<ModuleId> {
        self.ids().filter(|id| self.parent(*id).is_none()).collect()
    }

    /// `id` followed by its parent, grandparent and so on (most specific first).
    pub fn ancestors(&self, id: ModuleId) -> Vec<ModuleId> {
        std::iter::successors(Some(id), |current| self.parent(*current)).collect()
    }

    /// The inheritance chain ending at `id` (least specific first).
    pub fn lineage(&self, id: ModuleId) -> Vec<&Module> {
        self.ancestors(id)
            .into_iter()
            .rev()
            .map(|ancestor| self.module(ancestor))
            .collect()
    }

    /// Every artifact declared in a main section or an active profile.
    pub fn artifact_slots(&self) -> Vec<ArtifactSlot> {
        let mut slots = Vec::new();
        for module in self.ids() {
            for section in self.module(module).sections() {
                let Some(artifacts) = self.module(module).artifacts_in(section) else {
                    continue;
                };
                for kind in ArtifactKind::ALL {
                    slots.extend((0..artifacts.get(kind).len()).map(|index| ArtifactSlot {
                        module,
                        section,
                        kind,
                        index,
                    }));
                }
            }
        }
        slots
    }

    pub fn artifact(&self, slot: ArtifactSlot) -> Option<&Artifact> {
        self.module(slot.module)
            .artifacts_in(slot.section)?
            .get(slot.kind)
            .get(slot.index)
    }

    pub fn artifact_mut(&mut self, slot: ArtifactSlot) -> Option<&mut Artifact> {
        self.module_mut(slot.module)
            .artifacts_in_mut(slot.section)?
            .get_mut(slot.kind)
            .get_mut(slot.index)
    }
}
