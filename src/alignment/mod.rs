//! The alignment engine
//!
//! # Modules
//!
//! - [`update`]: rewrites a property in the scope that declares it
//! - [`strict`]: decides whether a version change is an acceptable alignment
//! - [`clash`]: caches shared-property rewrites, detects clashes, verifies contributors
//! - [`target`]: the `TargetSource` seam supplying aligned versions
//! - [`pass`]: runs a complete pass over a module forest

pub mod clash;
pub mod error;
pub mod pass;
pub mod strict;
pub mod target;
pub mod update;

pub use clash::{cache_property, verify_property_mapping};
pub use error::{AlignmentError, ConflictError};
pub use pass::{AlignmentOutcome, Relocation, UnresolvedProperty, VersionChange, align};
pub use strict::is_strictly_compatible;
pub use target::{StaticTargets, Target, TargetSource};
pub use update::{PropertyUpdate, update_properties};
