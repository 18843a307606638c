//! Version string parsing and manipulation
//!
//! # Modules
//!
//! - [`osgi`]: [`Version`], numeric components, qualifier, build number and
//!   OSGi rendering

pub mod osgi;

pub use osgi::Version;
