//! Build model consumed and mutated by the alignment engine
//! - coordinate.rs: `GroupArtifact` and `Coordinate`
//! - module.rs: `Module`, `Profile`, `Artifact`
//! - forest.rs: `ModuleForest` arena with resolved parent links

pub mod coordinate;
pub mod forest;
pub mod module;

pub use coordinate::{Coordinate, CoordinateError, GroupArtifact, WILDCARD};
pub use forest::{ArtifactSlot, ForestError, ModuleForest, ModuleId};
pub use module::{Artifact, ArtifactKind, ArtifactSets, Module, Profile, Section};
