//! Before/after comparison of a module set
//!
//! # Modules
//!
//! - [`compare`]: matches modules by identity and diffs versions, properties and artifacts

pub mod compare;

pub use compare::{ComparisonReport, Location, ModuleReport, ReportEntry, compare_projects};
