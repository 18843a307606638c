//! Dependency and plugin coordinates

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Artifact token that matches every artifact within a group.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("Invalid coordinate '{0}': expected groupId:artifactId[:version]")]
    Invalid(String),
}

/// A `groupId:artifactId` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupArtifact {
    pub group_id: String,
    pub artifact_id: String,
}

impl GroupArtifact {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Key matching every artifact of `group_id`
    pub fn wildcard(group_id: impl Into<String>) -> Self {
        Self::new(group_id, WILDCARD)
    }

    pub fn is_wildcard(&self) -> bool {
        self.artifact_id == WILDCARD
    }
}

impl fmt::Display for GroupArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for GroupArtifact {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split(':').collect::<Vec<_>>().as_slice() {
            [group, artifact] if !group.is_empty() && !artifact.is_empty() => {
                Ok(Self::new(*group, *artifact))
            }
            _ => Err(CoordinateError::Invalid(s.to_string())),
        }
    }
}

impl TryFrom<String> for GroupArtifact {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupArtifact> for String {
    fn from(value: GroupArtifact) -> Self {
        value.to_string()
    }
}

/// A `groupId:artifactId[:version]` coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group_artifact: GroupArtifact,
    pub version: Option<String>,
}

impl Coordinate {
    pub fn new(group_artifact: GroupArtifact, version: Option<String>) -> Self {
        Self {
            group_artifact,
            version,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}", self.group_artifact, version),
            None => write!(f, "{}", self.group_artifact),
        }
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordinateError::Invalid(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').collect();

        match parts.as_slice() {
            [group, artifact] | [group, artifact, ""] if !group.is_empty() && !artifact.is_empty() => {
                Ok(Self::new(GroupArtifact::new(*group, *artifact), None))
            }
            [group, artifact, version] if !group.is_empty() && !artifact.is_empty() => Ok(
                Self::new(GroupArtifact::new(*group, *artifact), Some(version.to_string())),
            ),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("org.foo:bar", Some(GroupArtifact::new("org.foo", "bar")))]
    #[case(" org.foo:* ", Some(GroupArtifact::wildcard("org.foo")))]
    #[case("org.foo", None)]
    #[case("org.foo:", None)]
    #[case(":bar", None)]
    #[case("org.foo:bar:1.0", None)]
    fn group_artifact_from_str_returns_expected(
        #[case] input: &str,
        #[case] expected: Option<GroupArtifact>,
    ) {
        assert_eq!(input.parse::<GroupArtifact>().ok(), expected);
    }

    #[rstest]
    #[case("org.foo:bar", None)]
    #[case("org.foo:bar:", None)]
    #[case("org.foo:bar:1.0", Some("1.0"))]
    fn coordinate_from_str_parses_optional_version(
        #[case] input: &str,
        #[case] version: Option<&str>,
    ) {
        let coordinate: Coordinate = input.parse().unwrap();
        assert_eq!(coordinate.group_artifact, GroupArtifact::new("org.foo", "bar"));
        assert_eq!(coordinate.version.as_deref(), version);
    }

    #[test]
    fn coordinate_from_str_rejects_extra_segments() {
        assert_eq!(
            "a:b:c:d".parse::<Coordinate>(),
            Err(CoordinateError::Invalid("a:b:c:d".to_string()))
        );
    }

    #[test]
    fn group_artifact_serializes_as_string() {
        let value = serde_json::to_value(GroupArtifact::new("org.foo", "bar")).unwrap();
        assert_eq!(value, serde_json::json!("org.foo:bar"));

        let parsed: GroupArtifact = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, GroupArtifact::new("org.foo", "bar"));
    }
}
