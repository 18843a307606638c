//! Property resolution and rewrite bookkeeping
//!
//! # Modules
//!
//! - [`interpolator`]: resolves `${name}` placeholders over a module chain
//! - [`mapper`]: per (module, property) record of a pending rewrite

pub mod interpolator;
pub mod mapper;

pub use interpolator::{InterpolationError, PropertyInterpolator, resolve};
pub use mapper::{PropertyMapper, PropertyMappings};

/// The module's own version; never rewritten through a property.
pub const PROJECT_VERSION: &str = "project.version";

/// Returns `name` when `value` is exactly one `${name}` placeholder.
pub fn bare_placeholder(value: &str) -> Option<&str> {
    let name = value.strip_prefix("${")?.strip_suffix('}')?;
    let plain = !name.is_empty() && !name.contains("${") && !name.contains('}');
    plain.then_some(name)
}

pub fn has_placeholder(value: &str) -> bool {
    value.contains("${")
}

/// A placeholder mixed with literal text, or more than one placeholder.
pub fn is_compound(value: &str) -> bool {
    has_placeholder(value) && bare_placeholder(value).is_none()
}

pub fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}
