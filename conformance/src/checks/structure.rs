//! Layout checks: required paths, file patterns, application modules and
//! CI workflows.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fs;
use super::{Check, CheckError};
use crate::report::{Issue, Severity};

/// Paths that must exist relative to the root.
///
/// A path ending in `/` is a directory (`missing_directory`, HIGH); any
/// other path is a file (`missing_file`, MEDIUM).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPaths {
    /// Relative paths in declaration order.
    pub paths: Vec<String>,
}

impl Check for RequiredPaths {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        fs::ensure_root(root)?;
        let mut issues = Vec::new();
        for path in &self.paths {
            if let Some(dir) = path.strip_suffix('/') {
                if !root.join(dir).is_dir() {
                    issues.push(Issue::new(
                        path.as_str(),
                        "missing_directory",
                        format!("Required directory not found: {path}"),
                        format!("Directory {path} must exist"),
                        "Directory does not exist",
                        Severity::High,
                    ));
                }
            } else if !root.join(path).exists() {
                issues.push(Issue::new(
                    path.as_str(),
                    "missing_file",
                    format!("Required file not found: {path}"),
                    format!("File {path} must exist"),
                    "File does not exist",
                    Severity::Medium,
                ));
            }
        }
        Ok(issues)
    }
}

/// File patterns that must each match at least one file in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatterns {
    /// Glob patterns (see [`fs::PathPattern`]).
    pub patterns: Vec<String>,
    /// Issue type for an unmatched pattern.
    pub issue_type: String,
    /// Severity for an unmatched pattern.
    pub severity: Severity,
}

impl Check for FilePatterns {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let compiled = fs::compile_patterns(&self.patterns)?;
        let files = fs::walk_files(root)?;
        let issues = self
            .patterns
            .iter()
            .zip(&compiled)
            .filter(|(_, glob)| !files.iter().any(|f| glob.matches(root, f)))
            .map(|(pattern, _)| {
                Issue::new(
                    pattern.as_str(),
                    self.issue_type.as_str(),
                    format!("No file matches {pattern}"),
                    format!("A file matching {pattern} must exist"),
                    "No matching file",
                    self.severity,
                )
            })
            .collect();
        Ok(issues)
    }
}

/// Locates application packages: directories named `app` that contain
/// `__init__.py`.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory.
pub fn find_app_dirs(root: &Path, app: &str) -> Result<Vec<PathBuf>, CheckError> {
    Ok(fs::walk_dirs(root)?
        .into_iter()
        .filter(|d| d.file_name().is_some_and(|n| n == app) && d.join("__init__.py").is_file())
        .collect())
}

/// Every declared application exists as a package with the required files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStructure {
    /// Application names.
    pub apps: Vec<String>,
    /// Files each application package must contain.
    pub required_files: Vec<String>,
    /// Whether each application needs a `tests/` directory.
    pub require_tests_dir: bool,
}

impl Check for AppStructure {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let mut issues = Vec::new();
        for app in &self.apps {
            let dirs = find_app_dirs(root, app)?;
            let Some(dir) = dirs.first() else {
                issues.push(Issue::new(
                    app.as_str(),
                    "missing_app",
                    format!("Application not found: {app}"),
                    format!("Application {app} must be implemented as a package"),
                    "No package directory with __init__.py",
                    Severity::High,
                ));
                continue;
            };
            for file in &self.required_files {
                let path = dir.join(file);
                if !path.exists() {
                    issues.push(Issue::new(
                        fs::relative(root, &path),
                        "missing_app_file",
                        format!("Application {app} is missing {file}"),
                        format!("{file} must exist in application {app}"),
                        "File does not exist",
                        Severity::High,
                    ));
                }
            }
            if self.require_tests_dir && !dir.join("tests").is_dir() {
                issues.push(Issue::new(
                    fs::relative(root, &dir.join("tests")),
                    "missing_tests_directory",
                    format!("Application {app} has no tests/ directory"),
                    "tests/ directory must exist in the application",
                    "Directory does not exist",
                    Severity::Medium,
                ));
            }
        }
        Ok(issues)
    }
}

/// A CI workflow exists under `.github/workflows/` and mentions each step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiPipeline {
    /// Step keywords (`test`, `lint`, `build`) that must appear.
    pub steps: Vec<String>,
}

impl Check for CiPipeline {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let workflows = fs::find_files(root, ".github/workflows/*.{yml,yaml}")?;

        if workflows.is_empty() {
            return Ok(vec![Issue::new(
                ".github/workflows/",
                "missing_ci_pipeline",
                "No CI workflow found",
                "A GitHub Actions workflow must be configured",
                "No workflow file",
                Severity::Medium,
            )]);
        }

        let texts: Vec<(PathBuf, String)> = workflows
            .into_iter()
            .filter_map(|p| fs::read_text(&p).map(|t| (p, t.to_lowercase())))
            .collect();
        let main = texts
            .iter()
            .find(|(_, t)| t.contains("python") || t.contains("node"))
            .or_else(|| texts.first());
        let Some((path, text)) = main else {
            return Ok(Vec::new());
        };

        let issues = self
            .steps
            .iter()
            .filter(|step| !text.contains(&step.to_lowercase()))
            .map(|step| {
                Issue::new(
                    fs::relative(root, path),
                    "missing_ci_step",
                    format!("CI workflow has no {step} step"),
                    format!("Step '{step}' must be configured in the workflow"),
                    "Step not configured",
                    Severity::Medium,
                )
            })
            .collect();
        Ok(issues)
    }
}
