use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for configuration key '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid relocation '{rule}': {reason}")]
    InvalidRelocation { rule: String, reason: String },

    #[error(
        "Invalid relocation '{0}': old and new artifact must both be wildcards or both be explicit"
    )]
    RelocationWildcardMismatch(String),
}

/// Policy of the verification pass over shared properties
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ValidationSetting")]
pub enum StrictPropertyValidation {
    #[default]
    Disabled,
    /// An unregistered contributor is fatal
    Enabled,
    /// An unregistered contributor rolls the shared value back
    Revert,
}

impl FromStr for StrictPropertyValidation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "false" => Ok(Self::Disabled),
            "true" => Ok(Self::Enabled),
            "revert" => Ok(Self::Revert),
            _ => Err(ConfigError::InvalidValue {
                key: "strictPropertyValidation".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValidationSetting {
    Flag(bool),
    Text(String),
}

impl TryFrom<ValidationSetting> for StrictPropertyValidation {
    type Error = ConfigError;

    fn try_from(value: ValidationSetting) -> Result<Self, Self::Error> {
        match value {
            ValidationSetting::Flag(true) => Ok(Self::Enabled),
            ValidationSetting::Flag(false) => Ok(Self::Disabled),
            ValidationSetting::Text(text) => text.parse(),
        }
    }
}

/// Alignment switches, loaded once and passed explicitly into every operation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AlignmentConfig {
    /// Unmatched targets are injected into root dependency management
    pub override_transitive: bool,
    /// Conflicting proposals for one property are fatal instead of purged
    pub property_clash_fails: bool,
    pub strict_alignment: bool,
    /// Tolerate forward moves between accepted suffix schemes
    pub strict_alignment_ignore_suffix: bool,
    /// Strict violations are fatal instead of skipped
    pub strict_violation_fails: bool,
    #[serde(deserialize_with = "string_list")]
    pub excluded_scopes: Vec<String>,
    pub strict_property_validation: StrictPropertyValidation,
    /// Primary alignment suffix, e.g. `redhat`
    pub version_suffix: Option<String>,
    /// Legacy suffixes still accepted by the strict check
    #[serde(deserialize_with = "string_list")]
    pub version_suffix_alternatives: Vec<String>,
    pub preserve_snapshot: bool,
    /// Also report matched entries that kept their version
    pub report_non_aligned: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            override_transitive: false,
            property_clash_fails: true,
            strict_alignment: false,
            strict_alignment_ignore_suffix: false,
            strict_violation_fails: false,
            excluded_scopes: Vec::new(),
            strict_property_validation: StrictPropertyValidation::Disabled,
            version_suffix: None,
            version_suffix_alternatives: Vec::new(),
            preserve_snapshot: false,
            report_non_aligned: false,
        }
    }
}

impl AlignmentConfig {
    /// Build a configuration from flat `key=value` pairs on top of the defaults.
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::default().with_properties(properties)
    }

    /// Apply flat `key=value` pairs over this configuration.
    pub fn with_properties<I, K, V>(mut self, properties: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in properties {
            self.apply(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "overrideTransitive" => self.override_transitive = parse_bool(key, value)?,
            "propertyClashFails" => self.property_clash_fails = parse_bool(key, value)?,
            "strictAlignment" => self.strict_alignment = parse_bool(key, value)?,
            "strictAlignmentIgnoreSuffix" => {
                self.strict_alignment_ignore_suffix = parse_bool(key, value)?
            }
            "strictViolationFails" => self.strict_violation_fails = parse_bool(key, value)?,
            "excludedScopes" => self.excluded_scopes = split_list(value),
            "strictPropertyValidation" => self.strict_property_validation = value.parse()?,
            "versionSuffix" => {
                self.version_suffix = Some(value.trim().to_string()).filter(|s| !s.is_empty())
            }
            "versionSuffixAlternatives" => self.version_suffix_alternatives = split_list(value),
            "preserveSnapshot" => self.preserve_snapshot = parse_bool(key, value)?,
            "reportNonAligned" => self.report_non_aligned = parse_bool(key, value)?,
            _ => debug!("Ignoring unknown configuration key {}", key),
        }
        Ok(())
    }

    /// Accepted alignment suffixes, primary first.
    ///
    /// A trailing build number on the primary suffix (`redhat-1`) is dropped.
    pub fn accepted_suffixes(&self) -> Vec<&str> {
        let primary = self.version_suffix.as_deref().map(|suffix| {
            match suffix.rsplit_once('-') {
                Some((base, build))
                    if !base.is_empty() && build.chars().all(|c| c.is_ascii_digit()) =>
                {
                    base
                }
                _ => suffix,
            }
        });

        primary
            .into_iter()
            .chain(self.version_suffix_alternatives.iter().map(String::as_str))
            .filter(|suffix| !suffix.is_empty())
            .collect()
    }

    /// An undeclared scope counts as `compile`.
    pub fn is_scope_excluded(&self, scope: Option<&str>) -> bool {
        let scope = scope.unwrap_or("compile");
        self.excluded_scopes.iter().any(|s| s == scope)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts either a comma separated string or an array of strings.
fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringList {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match StringList::deserialize(deserializer)? {
        StringList::Joined(joined) => split_list(&joined),
        StringList::List(list) => list,
    })
}

/// Returns the path to the data directory for version-align.
/// Uses $XDG_DATA_HOME/version-align if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/version-align,
/// or ./version-align if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("version-align.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("version-align")
}
