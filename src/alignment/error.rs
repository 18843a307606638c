use thiserror::Error;

use crate::model::GroupArtifact;
use crate::property::InterpolationError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    #[error(
        "Property replacement clash in {module}: '{property}' requested as {existing_value} by {existing_contributors} and as {proposed_value} by {contributor}"
    )]
    PropertyClash {
        module: GroupArtifact,
        property: String,
        existing_value: String,
        existing_contributors: String,
        proposed_value: String,
        contributor: GroupArtifact,
    },

    #[error("Property '{property}' in {module} was updated but {coordinate} was not")]
    UnregisteredContributor {
        module: GroupArtifact,
        property: String,
        coordinate: GroupArtifact,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignmentError {
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(
        "Replacing original version {old_value} of {subject} with {new_value} violates the strict version-alignment rule"
    )]
    StrictViolation {
        subject: String,
        old_value: String,
        new_value: String,
    },

    #[error(
        "Not yet implemented: explicit override of property '{property}' whose value '{value}' mixes placeholders with other text"
    )]
    UnsupportedPattern { property: String, value: String },
}
