//! Blueprint extraction.
//!
//! [`extract`] never fails: every sub-step defaults to empty and records an
//! [`ExtractionWarning`] when its section is missing or unparseable.
//! [`extract_file`] fails only when the Blueprint cannot be read.

pub mod facts;
pub mod markdown;
pub mod models;
pub mod tree;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::Specification;

/// Headings that introduce the directory layout.
const TREE_HEADINGS: &[&str] = &["directory structure", "estrutura de diretórios", "project layout"];

/// Fatal extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The Blueprint file does not exist.
    #[error("Blueprint not found: {0}")]
    NotFound(PathBuf),
    /// The Blueprint file exists but could not be read.
    #[error("cannot read Blueprint {path}: {source}")]
    Read {
        /// Blueprint path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A Blueprint section that was absent or could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExtractionWarning {
    /// No level-1 heading; the project name is empty.
    MissingTitle,
    /// No heading introduces a directory layout.
    MissingDirectorySection,
    /// The layout section has no code block or the block has no tree glyphs.
    UnparseableDirectoryTree,
    /// No `python` block declares a model.
    NoModels,
    /// No dependency with a version could be recognized.
    NoDependencies,
    /// No application modules could be determined.
    NoApps,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ExtractionWarning::MissingTitle => "no level-1 heading; project name left empty",
            ExtractionWarning::MissingDirectorySection => "no directory structure section",
            ExtractionWarning::UnparseableDirectoryTree => {
                "directory structure section has no tree diagram"
            }
            ExtractionWarning::NoModels => "no model classes found in python blocks",
            ExtractionWarning::NoDependencies => "no versioned dependencies found",
            ExtractionWarning::NoApps => "no application modules found",
        };
        f.write_str(msg)
    }
}

/// A Specification plus the warnings raised while building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// The extracted Specification.
    pub spec: Specification,
    /// Sections that fell back to empty defaults.
    pub warnings: Vec<ExtractionWarning>,
}

/// Extracts a [`Specification`] from Blueprint text.
#[must_use]
pub fn extract(text: &str) -> Extraction {
    let doc = markdown::scan(text);
    let mut warnings = Vec::new();
    let mut spec = Specification::default();

    let (name, description) = facts::project_info(&doc);
    if name.is_empty() {
        warnings.push(ExtractionWarning::MissingTitle);
    }
    spec.project_name = name;
    spec.project_description = description;
    spec.outline = facts::outline(&doc);

    let (backend, frontend, database, architecture, testing) = facts::technology(text);
    spec.backend_framework = backend;
    spec.frontend_framework = frontend;
    spec.database = database;
    spec.architecture = architecture;
    spec.testing_framework = testing;

    match doc.find_heading(TREE_HEADINGS) {
        Some(idx) => match doc.first_block_in_section(idx) {
            Some(block) if tree::has_tree_glyphs(&block.text) => {
                spec.directory_tree = tree::parse_tree(&block.text);
            }
            _ => warnings.push(ExtractionWarning::UnparseableDirectoryTree),
        },
        None => warnings.push(ExtractionWarning::MissingDirectorySection),
    }

    for block in doc.blocks_tagged("python") {
        for model in models::extract_models(&block.text) {
            match spec.models.iter_mut().find(|m| m.name == model.name) {
                Some(existing) => *existing = model,
                None => spec.models.push(model),
            }
        }
    }
    for model in &spec.models {
        if !model.relations.is_empty() {
            spec.relationships
                .insert(model.name.clone(), model.relations.clone());
        }
    }
    if spec.models.is_empty() {
        warnings.push(ExtractionWarning::NoModels);
    }

    spec.apps = facts::apps(text, &spec.directory_tree);
    if spec.apps.is_empty() {
        warnings.push(ExtractionWarning::NoApps);
    }

    spec.dependencies = facts::dependencies(text, &doc);
    if spec.dependencies.backend.is_empty() && spec.dependencies.frontend.is_empty() {
        warnings.push(ExtractionWarning::NoDependencies);
    }

    let (tenancy, base_model) = facts::multi_tenancy(text);
    spec.multi_tenancy = tenancy;
    spec.base_model_class = base_model;
    spec.authentication = facts::authentication(text);
    spec.config_files = facts::config_files(text);
    spec.doc_files = facts::doc_files(text);
    spec.docker_files = facts::docker_files(text);
    spec.api_patterns = facts::api_patterns(text);
    spec.ci_cd = facts::ci_cd(text);
    spec.content_expectations = facts::content_expectations(spec.multi_tenancy, &spec.database);

    debug!(
        models = spec.models.len(),
        apps = spec.apps.len(),
        paths = spec.directory_tree.paths().len(),
        "Blueprint extracted"
    );

    Extraction { spec, warnings }
}

/// Reads and extracts a Blueprint file.
///
/// # Errors
///
/// Returns [`ExtractError::NotFound`] if `path` does not exist and
/// [`ExtractError::Read`] if it cannot be read as UTF-8 text.
pub fn extract_file(path: &Path) -> Result<Extraction, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let extraction = extract(&text);
    for warning in &extraction.warnings {
        warn!(blueprint = %path.display(), "{warning}");
    }
    info!(
        blueprint = %path.display(),
        project = %extraction.spec.project_name,
        "Blueprint loaded"
    );
    Ok(extraction)
}
