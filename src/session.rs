//! JSON session documents consumed by the command line
//!
//! A session bundles everything one alignment pass needs:
//!
//! ```json
//! {
//!   "config": { "strictAlignment": true, "versionSuffix": "redhat" },
//!   "modules": [ { "groupId": "org.foo", "artifactId": "app", "version": "1.0" } ],
//!   "targets": { "org.bar:bar": "2.0.0.redhat-1" },
//!   "overrides": { "org.baz:baz": "3.1" },
//!   "relocations": [ "org.old:@org.new:=" ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::alignment::StaticTargets;
use crate::config::{AlignmentConfig, ConfigError};
use crate::model::{ForestError, GroupArtifact, Module, ModuleForest};
use crate::relocation::{RelocationEntry, parse_relocations};
use crate::wildcard::WildcardMap;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid session JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Forest(#[from] ForestError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionDocument {
    pub config: AlignmentConfig,
    pub modules: Vec<Module>,
    /// Aligned versions keyed by `groupId:artifactId`
    pub targets: IndexMap<GroupArtifact, String>,
    /// Explicit overrides; they win clashes and skip the strict check
    pub overrides: IndexMap<GroupArtifact, String>,
    /// Relocation rules, each item possibly holding several comma separated rules
    pub relocations: Vec<String>,
}

impl SessionDocument {
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = read(path)?;
        let session = Self::from_json(&content)?;
        debug!(
            "Loaded session {} with {} module(s) and {} target(s)",
            path.display(),
            session.modules.len(),
            session.targets.len() + session.overrides.len()
        );
        Ok(session)
    }

    pub fn from_json(content: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn target_source(&self) -> StaticTargets {
        StaticTargets::new(self.targets.clone(), self.overrides.clone())
    }

    pub fn relocation_table(&self) -> Result<WildcardMap<RelocationEntry>, ConfigError> {
        parse_relocations(&self.relocations)
    }

    pub fn forest(&self) -> Result<ModuleForest, ForestError> {
        ModuleForest::new(self.modules.clone())
    }
}

/// Read a JSON array of modules.
pub fn load_modules(path: &Path) -> Result<Vec<Module>, SessionError> {
    let content = read(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write `modules` as a pretty-printed JSON array.
pub fn write_modules(path: &Path, modules: &[Module]) -> Result<(), SessionError> {
    let content = serde_json::to_string_pretty(modules)?;
    fs::write(path, content).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, SessionError> {
    fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })
}
