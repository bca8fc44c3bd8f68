//! Phase contexts: the optional JSON inputs that narrow a phase.
//!
//! Every field defaults to empty, so `{}` is a valid context for any phase.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors raised while loading a context file.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The file cannot be read.
    #[error("cannot read context {path}: {source}")]
    Read {
        /// Context path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid JSON for the phase.
    #[error("invalid context {path}: {source}")]
    Parse {
        /// Context path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Reads a phase context from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match `T`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ContextError> {
    let text = std::fs::read_to_string(path).map_err(|source| ContextError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ContextError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// What one implementation target delivers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetContext {
    /// Model classes.
    pub models: Vec<String>,
    /// View classes.
    pub views: Vec<String>,
    /// URL fragments routed in `urls.py`.
    pub urls: Vec<String>,
    /// Files (path suffixes) that must exist.
    pub files: Vec<String>,
    /// Server-side templates.
    pub templates: Vec<String>,
    /// Frontend components.
    pub components: Vec<String>,
    /// Settings keys.
    pub settings: Vec<String>,
}

impl TargetContext {
    /// Returns true when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
            && self.views.is_empty()
            && self.urls.is_empty()
            && self.files.is_empty()
            && self.templates.is_empty()
            && self.components.is_empty()
            && self.settings.is_empty()
    }
}

/// What an integration phase wires together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationContext {
    /// Modules that must import one another.
    pub modules: Vec<String>,
    /// Interface classes.
    pub interfaces: Vec<String>,
    /// Contract classes.
    pub contracts: Vec<String>,
    /// Communication patterns (`signal`, `event`, `message_queue`, `api_call`).
    pub communication_patterns: Vec<String>,
    /// Database operations (`create_table`, `add_field`).
    pub database_operations: Vec<String>,
    /// Internal endpoints routed in `urls.py`.
    pub api_endpoints: Vec<String>,
    /// External services the code must call.
    pub external_apis: Vec<String>,
    /// Integration test scenarios.
    pub test_scenarios: Vec<String>,
    /// Settings keys introduced by the integration.
    pub config_keys: Vec<String>,
}

/// What changed in an evolution cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionContext {
    /// Breaking changes that the changelog must describe.
    pub breaking_changes: Vec<String>,
    /// Classes or functions that must carry deprecation markers.
    pub deprecated_features: Vec<String>,
    /// Components that were refactored.
    pub refactored_components: Vec<String>,
    /// Modules whose tests must be maintained.
    pub modified_modules: Vec<String>,
    /// Optimizations (`database_indexing`, `caching`, `lazy_loading`, ...).
    pub performance_optimizations: Vec<String>,
    /// Data migrations (names or text that must appear in migrations).
    pub data_migrations: Vec<String>,
    /// Settings keys introduced by the change.
    pub new_config_keys: Vec<String>,
}
