//! Writes compiled validators to disk.

use std::fs;
use std::path::{Path, PathBuf};

use agv_conformance::ValidatorManifest;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Where one generation run writes its validator and where the validator
/// writes its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// `<out>/validators/<stem>_<timestamp>.json`.
    pub validator: PathBuf,
    /// `<out>/results/results_<phase>_<timestamp>.json`.
    pub results: PathBuf,
}

/// Computes the artifact paths for a run at `at`.
#[must_use]
pub fn artifact_paths(out_dir: &Path, stem: &str, phase: &str, at: DateTime<Utc>) -> ArtifactPaths {
    let stamp = at.format("%Y%m%d_%H%M%S");
    ArtifactPaths {
        validator: out_dir.join("validators").join(format!("{stem}_{stamp}.json")),
        results: out_dir.join("results").join(format!("results_{phase}_{stamp}.json")),
    }
}

/// Writes a text file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}

/// Serializes `manifest` and writes it to `path`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be serialized or written.
pub fn write_validator(path: &Path, manifest: &ValidatorManifest) -> Result<()> {
    let json = manifest
        .to_json_pretty()
        .with_context(|| format!("Failed to serialize validator {}", manifest.name))?;
    write_text(path, &json)
}
