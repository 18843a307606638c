//! Rewriting a property where it is declared

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::alignment::error::AlignmentError;
use crate::alignment::strict::is_strictly_compatible;
use crate::config::AlignmentConfig;
use crate::model::{ModuleForest, ModuleId, Section};
use crate::property::{PROJECT_VERSION, bare_placeholder, is_compound, placeholder, resolve};

/// Outcome of [`update_properties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyUpdate {
    /// The property was declared in the chain; it was rewritten, or a strict
    /// violation was tolerated and it was left alone.
    Found,
    /// Nothing in the inheritance chain declares the property. The caller
    /// decides how severe that is.
    NotFound,
    /// Nothing to do: the property is the module version, or it already
    /// resolves to the requested value.
    Ignore,
}

/// Set `key` to `new_value` as seen from `module`.
///
/// The most specific declaring scope in the inheritance chain is mutated
/// (active profiles before the main table). A value that is itself a bare
/// `${other}` reference is followed instead of overwritten.
pub fn update_properties(
    forest: &mut ModuleForest,
    config: &AlignmentConfig,
    module: ModuleId,
    ignore_strict: bool,
    key: &str,
    new_value: &str,
) -> Result<PropertyUpdate, AlignmentError> {
    if key == PROJECT_VERSION {
        return Ok(PropertyUpdate::Ignore);
    }

    let resolved = resolve(&placeholder(key), &forest.lineage(module))?;
    if resolved == new_value {
        debug!(
            "Property {} of {} already resolves to {}",
            key,
            forest.module(module).group_artifact(),
            new_value
        );
        return Ok(PropertyUpdate::Ignore);
    }

    let Some((owner, section, old_value)) = find_declaration(forest, module, key) else {
        return Ok(PropertyUpdate::NotFound);
    };

    if let Some(other) = bare_placeholder(&old_value) {
        debug!("Following property {} to {}", key, other);
        let other = other.to_string();
        let result = update_properties(forest, config, module, ignore_strict, &other, new_value)?;
        if result == PropertyUpdate::NotFound {
            error!(
                "Property {} references {} which is not declared for {}",
                key,
                other,
                forest.module(module).group_artifact()
            );
        }
        return Ok(result);
    }

    if config.strict_alignment
        && !ignore_strict
        && !is_strictly_compatible(&resolved, new_value, config)
    {
        if config.strict_violation_fails {
            return Err(AlignmentError::StrictViolation {
                subject: format!("property {key}"),
                old_value: resolved,
                new_value: new_value.to_string(),
            });
        }
        warn!(
            "Replacing original property version {} (fully resolved: {}) with new version {} for {} violates the strict version-alignment rule!",
            old_value, resolved, new_value, key
        );
        return Ok(PropertyUpdate::Found);
    }

    let updated = if is_compound(&old_value) {
        if ignore_strict {
            return Err(AlignmentError::UnsupportedPattern {
                property: key.to_string(),
                value: old_value,
            });
        }
        match new_value.strip_prefix(resolved.as_str()) {
            Some(tail) => format!("{old_value}{tail}"),
            None => {
                warn!(
                    "Unable to keep the placeholders of {} ({}) when updating to {}; writing the literal value",
                    key, old_value, new_value
                );
                new_value.to_string()
            }
        }
    } else {
        new_value.to_string()
    };

    let owner_module = forest.module_mut(owner);
    info!(
        "Updating property {} in {} from {} to {}",
        key,
        owner_module.group_artifact(),
        old_value,
        updated
    );
    if let Some(properties) = owner_module.properties_in_mut(section) {
        properties.insert(key.to_string(), updated);
    }

    Ok(PropertyUpdate::Found)
}

/// The module and property that a rewrite of `key`, as seen from `module`,
/// finally lands on.
///
/// Bare `${other}` values are followed while `other` is declared. When
/// nothing declares `key` the result is `module` itself.
pub(crate) fn declaring_scope(
    forest: &ModuleForest,
    module: ModuleId,
    key: &str,
) -> (ModuleId, String) {
    let mut scope = (module, key.to_string());
    let mut next = key.to_string();
    let mut seen = HashSet::new();

    while seen.insert(next.clone()) {
        let Some((owner, _, value)) = find_declaration(forest, module, &next) else {
            break;
        };
        scope = (owner, next);
        match bare_placeholder(&value) {
            Some(other) if other != PROJECT_VERSION => next = other.to_string(),
            _ => break,
        }
    }
    scope
}

/// The most specific scope declaring `key`, walking from `module` upwards.
fn find_declaration(
    forest: &ModuleForest,
    module: ModuleId,
    key: &str,
) -> Option<(ModuleId, Section, String)> {
    forest.ancestors(module).into_iter().find_map(|id| {
        let declaring = forest.module(id);
        let section = declaring.declaring_section(key)?;
        let value = declaring.properties_in(section)?.get(key)?.clone();
        Some((id, section, value))
    })
}
