//! Typed checks.
//!
//! Every rule in a validator manifest carries a [`CheckSpec`]: a check kind
//! (the serde `kind` tag, the stable identifier) plus the literal parameters
//! baked in at generation time. Linking turns a `CheckSpec` into a
//! `Box<dyn Check>`; running a check never consults anything but its own
//! parameters and the filesystem under the run root.

pub mod api;
pub mod content;
pub mod dependencies;
pub mod evolution;
pub mod fs;
pub mod models;
pub mod structure;
pub mod testing;

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::report::{Issue, Severity};

/// Errors raised while evaluating a check.
///
/// The executor converts any of these into a single CRITICAL
/// `validation_error` issue for the failing rule.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The run root does not exist or is not a directory.
    #[error("run root {0} is not a directory")]
    RootMissing(PathBuf),
    /// A pattern baked into the check does not compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
    /// Any other evaluation failure.
    #[error("{0}")]
    Other(String),
}

/// A single executable predicate over a target tree.
pub trait Check: Debug + Send + Sync {
    /// Evaluates the check against `root`; an empty list means it passed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] if the check cannot be evaluated at all.
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError>;
}

/// A text requirement: satisfied when any needle is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequirement {
    /// What the requirement means, shown as the issue's expectation.
    pub description: String,
    /// Alternative substrings; one match satisfies the requirement.
    pub any_of: Vec<String>,
    /// Severity when unmet.
    pub severity: Severity,
}

impl ContentRequirement {
    /// Creates a requirement.
    pub fn new(description: impl Into<String>, any_of: &[&str], severity: Severity) -> Self {
        Self {
            description: description.into(),
            any_of: any_of.iter().map(|s| (*s).to_string()).collect(),
            severity,
        }
    }

    /// Returns true if `text` contains any of the needles.
    #[must_use]
    pub fn is_met_by(&self, text: &str) -> bool {
        self.any_of.iter().any(|n| text.contains(n.as_str()))
    }
}

/// Serializable description of a check: kind identifier plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckSpec {
    /// Paths that must exist relative to the root.
    RequiredPaths(structure::RequiredPaths),
    /// File-name patterns that must match somewhere in the tree.
    FilePatterns(structure::FilePatterns),
    /// Per-application module layout.
    AppStructure(structure::AppStructure),
    /// CI workflow presence and steps.
    CiPipeline(structure::CiPipeline),
    /// Requirements on one file's contents.
    FileContent(content::FileContent),
    /// Requirements satisfied by any file among several patterns.
    TextPresent(content::TextPresent),
    /// Module docstrings on matching Python files.
    ModuleDocstrings(content::ModuleDocstrings),
    /// README title and section headings.
    ReadmeSections(content::ReadmeSections),
    /// Model classes that must be declared.
    ModelClasses(models::ModelClasses),
    /// Fields one model must declare.
    ModelFields(models::ModelFields),
    /// Relationship fields between models.
    ModelRelationships(models::ModelRelationships),
    /// Abstract tenant base model and its use.
    TenantBaseModel(models::TenantBaseModel),
    /// Migration presence, operations and reversibility.
    Migrations(models::Migrations),
    /// Packages declared in dependency manifests.
    DeclaredDependencies(dependencies::DeclaredDependencies),
    /// Modules that must exist and be imported elsewhere.
    ModuleCoupling(api::ModuleCoupling),
    /// Classes or functions that must be defined.
    DefinitionsPresent(api::DefinitionsPresent),
    /// Per-application test layout.
    TestLayout(testing::TestLayout),
    /// Minimum test count per module.
    TestCoverage(testing::TestCoverage),
    /// Integration test suite and scenarios.
    IntegrationTests(testing::IntegrationTests),
    /// Breaking changes recorded in the changelog.
    BreakingChanges(evolution::BreakingChanges),
    /// Deprecated features carrying deprecation markers.
    DeprecationMarkers(evolution::DeprecationMarkers),
    /// Refactored components that still exist and are tested.
    RefactoredComponents(evolution::RefactoredComponents),
    /// README/CHANGELOG freshness and docstring ratio.
    DocumentationFreshness(evolution::DocumentationFreshness),
    /// Semantic version string and release tags.
    VersionFormat(evolution::VersionFormat),
}

impl CheckSpec {
    /// Returns the stable kind identifier (the serialized `kind` tag).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            CheckSpec::RequiredPaths(_) => "required_paths",
            CheckSpec::FilePatterns(_) => "file_patterns",
            CheckSpec::AppStructure(_) => "app_structure",
            CheckSpec::CiPipeline(_) => "ci_pipeline",
            CheckSpec::FileContent(_) => "file_content",
            CheckSpec::TextPresent(_) => "text_present",
            CheckSpec::ModuleDocstrings(_) => "module_docstrings",
            CheckSpec::ReadmeSections(_) => "readme_sections",
            CheckSpec::ModelClasses(_) => "model_classes",
            CheckSpec::ModelFields(_) => "model_fields",
            CheckSpec::ModelRelationships(_) => "model_relationships",
            CheckSpec::TenantBaseModel(_) => "tenant_base_model",
            CheckSpec::Migrations(_) => "migrations",
            CheckSpec::DeclaredDependencies(_) => "declared_dependencies",
            CheckSpec::ModuleCoupling(_) => "module_coupling",
            CheckSpec::DefinitionsPresent(_) => "definitions_present",
            CheckSpec::TestLayout(_) => "test_layout",
            CheckSpec::TestCoverage(_) => "test_coverage",
            CheckSpec::IntegrationTests(_) => "integration_tests",
            CheckSpec::BreakingChanges(_) => "breaking_changes",
            CheckSpec::DeprecationMarkers(_) => "deprecation_markers",
            CheckSpec::RefactoredComponents(_) => "refactored_components",
            CheckSpec::DocumentationFreshness(_) => "documentation_freshness",
            CheckSpec::VersionFormat(_) => "version_format",
        }
    }

    /// Resolves the spec into an executable check.
    #[must_use]
    pub fn into_check(self) -> Box<dyn Check> {
        match self {
            CheckSpec::RequiredPaths(c) => Box::new(c),
            CheckSpec::FilePatterns(c) => Box::new(c),
            CheckSpec::AppStructure(c) => Box::new(c),
            CheckSpec::CiPipeline(c) => Box::new(c),
            CheckSpec::FileContent(c) => Box::new(c),
            CheckSpec::TextPresent(c) => Box::new(c),
            CheckSpec::ModuleDocstrings(c) => Box::new(c),
            CheckSpec::ReadmeSections(c) => Box::new(c),
            CheckSpec::ModelClasses(c) => Box::new(c),
            CheckSpec::ModelFields(c) => Box::new(c),
            CheckSpec::ModelRelationships(c) => Box::new(c),
            CheckSpec::TenantBaseModel(c) => Box::new(c),
            CheckSpec::Migrations(c) => Box::new(c),
            CheckSpec::DeclaredDependencies(c) => Box::new(c),
            CheckSpec::ModuleCoupling(c) => Box::new(c),
            CheckSpec::DefinitionsPresent(c) => Box::new(c),
            CheckSpec::TestLayout(c) => Box::new(c),
            CheckSpec::TestCoverage(c) => Box::new(c),
            CheckSpec::IntegrationTests(c) => Box::new(c),
            CheckSpec::BreakingChanges(c) => Box::new(c),
            CheckSpec::DeprecationMarkers(c) => Box::new(c),
            CheckSpec::RefactoredComponents(c) => Box::new(c),
            CheckSpec::DocumentationFreshness(c) => Box::new(c),
            CheckSpec::VersionFormat(c) => Box::new(c),
        }
    }
}
