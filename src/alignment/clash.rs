//! Shared-property bookkeeping: clash detection, caching and verification

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::alignment::error::{AlignmentError, ConflictError};
use crate::alignment::update::declaring_scope;
use crate::config::{AlignmentConfig, StrictPropertyValidation};
use crate::model::{GroupArtifact, ModuleForest, ModuleId};
use crate::property::{PROJECT_VERSION, PropertyMappings, bare_placeholder, resolve};

/// Register `source`'s wish to move the property behind `old_value` to `new_value`.
///
/// The mapper is keyed by the module declaring the property, so every
/// coordinate sharing an inherited property meets in one place.
///
/// Returns `false` when nothing was cached: the value is not a bare
/// placeholder, names the module version, or its property was purged by an
/// earlier clash.
#[allow(clippy::too_many_arguments)]
pub fn cache_property(
    forest: &ModuleForest,
    mappings: &mut PropertyMappings,
    config: &AlignmentConfig,
    module: ModuleId,
    old_value: &str,
    new_value: &str,
    source: &GroupArtifact,
    force: bool,
) -> Result<bool, AlignmentError> {
    let Some(property) = bare_placeholder(old_value) else {
        debug!("{} of {} is not a bare property reference", old_value, source);
        return Ok(false);
    };
    if property == PROJECT_VERSION {
        return Ok(false);
    }
    let original = resolve(old_value, &forest.lineage(module))?;
    let (owner, property) = declaring_scope(forest, module, property);
    if mappings.is_purged(owner, &property) {
        debug!(
            "Property {} was purged after a clash; leaving {} alone",
            property, source
        );
        return Ok(false);
    }

    let mapper = mappings.get_or_create(owner, &property);

    if let Some(existing) = mapper.new_version().map(str::to_string) {
        if existing != new_value {
            if force {
                debug!(
                    "Explicit override {} of {} replaces {} for property {}",
                    new_value, source, existing, property
                );
            } else if mapper.is_forced() {
                debug!(
                    "Property {} keeps explicit override {} over {} from {}",
                    property, existing, new_value, source
                );
                mapper.record(&original, &existing, source.clone(), false);
                return Ok(true);
            } else if config.property_clash_fails {
                return Err(ConflictError::PropertyClash {
                    module: forest.module(owner).group_artifact(),
                    property,
                    existing_value: existing,
                    existing_contributors: join_contributors(mapper.contributors()),
                    proposed_value: new_value.to_string(),
                    contributor: source.clone(),
                }
                .into());
            } else {
                warn!(
                    "Property {} of {} is wanted as {} by {} and as {} by {}; leaving it unmodified",
                    property,
                    forest.module(owner).group_artifact(),
                    existing,
                    join_contributors(mapper.contributors()),
                    new_value,
                    source
                );
                mappings.purge(owner, &property);
                return Ok(false);
            }
        }
    }

    mapper.record(&original, new_value, source.clone(), force);
    Ok(true)
}

/// Check that `coordinate`, which references `property` in `module`, took
/// part in the rewrite of that property.
pub fn verify_property_mapping(
    forest: &ModuleForest,
    config: &AlignmentConfig,
    module: ModuleId,
    mappings: &mut PropertyMappings,
    coordinate: &GroupArtifact,
    property: &str,
) -> Result<(), ConflictError> {
    if config.strict_property_validation == StrictPropertyValidation::Disabled {
        return Ok(());
    }

    let (owner, property) = declaring_scope(forest, module, property);
    let Some(mapper) = mappings.get(owner, &property) else {
        return Ok(());
    };
    if mapper.is_reverted() || mapper.contributors().contains(coordinate) {
        return Ok(());
    }

    match config.strict_property_validation {
        StrictPropertyValidation::Revert => {
            let Some(original) = mapper.original_version().map(str::to_string) else {
                return Ok(());
            };
            let reverted = mappings.revert_matching(&original);
            warn!(
                "Property {} of {} was not updated for {}; reverted {} mapping(s) back to {}",
                property,
                forest.module(owner).group_artifact(),
                coordinate,
                reverted,
                original
            );
            Ok(())
        }
        _ => Err(ConflictError::UnregisteredContributor {
            module: forest.module(owner).group_artifact(),
            property,
            coordinate: coordinate.clone(),
        }),
    }
}

fn join_contributors(contributors: &IndexSet<GroupArtifact>) -> String {
    contributors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
