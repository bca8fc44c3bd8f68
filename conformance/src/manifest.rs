//! The validator manifest: the standalone artifact produced by the compiler
//! and executed by `agv-validate`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rule::Rule;
use crate::scorer::ScoringWeights;

/// Format identifier written into every manifest.
pub const MANIFEST_FORMAT: &str = "agv-validator/1";

/// Errors raised while reading or writing a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file cannot be read.
    #[error("cannot read manifest {path}: {source}")]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The manifest is not valid JSON or names an unknown check kind.
    #[error("invalid manifest: {0}")]
    Parse(#[source] serde_json::Error),
    /// The manifest declares a format this runtime does not execute.
    #[error("unsupported manifest format `{0}` (expected `{MANIFEST_FORMAT}`)")]
    UnsupportedFormat(String),
    /// The manifest cannot be serialized.
    #[error("cannot serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A compiled validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorManifest {
    /// Always [`MANIFEST_FORMAT`].
    pub format: String,
    /// Validator name (e.g. `validate_scaffold`).
    pub name: String,
    /// What the validator checks.
    pub description: String,
    /// Phase label (`scaffold`, `target_3`, `integration_t1`, `evolution`).
    pub phase: String,
    /// RFC 3339 generation timestamp.
    pub generated_at: String,
    /// Where `agv-validate` writes results when not told otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_path: Option<String>,
    /// Weight tables baked in at generation time.
    #[serde(default)]
    pub weights: ScoringWeights,
    /// Rules in generation order.
    pub rules: Vec<Rule>,
}

impl ValidatorManifest {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, an unknown check kind, or an
    /// unsupported format identifier.
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(text).map_err(ManifestError::Parse)?;
        if manifest.format != MANIFEST_FORMAT {
            return Err(ManifestError::UnsupportedFormat(manifest.format));
        }
        Ok(manifest)
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Serializes the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)
    }
}
