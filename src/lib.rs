//! Version alignment for multi-module builds
//!
//! # Modules
//!
//! - [`model`]: modules, profiles, artifacts and the module forest
//! - [`version`]: version string arithmetic
//! - [`wildcard`]: group/artifact lookup with per-group wildcards
//! - [`relocation`]: relocation rules
//! - [`property`]: placeholder resolution and pending property rewrites
//! - [`alignment`]: the alignment engine
//! - [`report`]: before/after comparison
//! - [`config`]: alignment switches and data paths
//! - [`session`]: JSON session documents

pub mod alignment;
pub mod config;
pub mod model;
pub mod property;
pub mod relocation;
pub mod report;
pub mod session;
pub mod version;
pub mod wildcard;
