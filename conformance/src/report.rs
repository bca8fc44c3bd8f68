//! Conformance report types: issue severities, categories, issues, and the
//! aggregated [`Results`] of one validation run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Severity of a single issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Blocks conformance outright.
    Critical,
    /// Major deviation from the Blueprint.
    High,
    /// Noticeable deviation.
    Medium,
    /// Cosmetic or advisory.
    Low,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Returns the uppercase label used in reports and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring category of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Directory and file layout.
    Structure,
    /// File contents and configuration.
    Content,
    /// Data models.
    Models,
    /// Declared packages.
    Dependencies,
    /// API surface.
    Api,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 5] = [
        Category::Structure,
        Category::Content,
        Category::Models,
        Category::Dependencies,
        Category::Api,
    ];

    /// Returns the uppercase label used in reports and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Structure => "STRUCTURE",
            Category::Content => "CONTENT",
            Category::Models => "MODELS",
            Category::Dependencies => "DEPENDENCIES",
            Category::Api => "API",
        }
    }

    /// Infers a category from an issue type by keyword.
    ///
    /// Used only for issues built outside a rule; issues produced during a
    /// run carry their rule's category.
    #[must_use]
    pub fn from_issue_type(issue_type: &str) -> Self {
        let t = issue_type.to_ascii_lowercase();
        if t.contains("model") {
            Category::Models
        } else if t.contains("content") || t.contains("config") {
            Category::Content
        } else if t.contains("api") {
            Category::Api
        } else if t.contains("dependency") {
            Category::Dependencies
        } else {
            Category::Structure
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing condition found by a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Path (relative to the run root where possible) the issue refers to.
    pub file_path: String,
    /// Machine-readable issue type (e.g. `missing_file`).
    pub issue_type: String,
    /// Human-readable description.
    pub description: String,
    /// What the Blueprint expects.
    pub expected: String,
    /// What was found.
    pub actual: String,
    /// Issue severity.
    pub severity: Severity,
    /// Canonical scoring category.
    pub category: Category,
}

impl Issue {
    /// Creates an issue whose category is inferred from `issue_type`.
    pub fn new(
        file_path: impl Into<String>,
        issue_type: impl Into<String>,
        description: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let issue_type = issue_type.into();
        let category = Category::from_issue_type(&issue_type);
        Self {
            file_path: file_path.into(),
            issue_type,
            description: description.into(),
            expected: expected.into(),
            actual: actual.into(),
            severity,
            category,
        }
    }

    /// Replaces the issue's category.
    #[must_use]
    pub fn in_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

/// Errors raised while writing a results file.
#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    /// The results cannot be serialized.
    #[error("cannot serialize results: {0}")]
    Serialize(#[source] serde_json::Error),
    /// The results file or its directory cannot be written.
    #[error("cannot write results {path}: {source}")]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Aggregated outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    /// Number of rules executed.
    pub total_checks: usize,
    /// Rules that produced no issues.
    pub passed_checks: usize,
    /// Rules that produced at least one issue.
    pub failed_checks: usize,
    /// Every issue in rule execution order.
    pub issues: Vec<Issue>,
    /// Conformity score, 0 to 100.
    pub score: f64,
    /// Issue count per category; all categories are present.
    pub categories: BTreeMap<Category, usize>,
}

impl Results {
    /// Creates an empty result set with every category bucket at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_checks: 0,
            passed_checks: 0,
            failed_checks: 0,
            issues: Vec::new(),
            score: 0.0,
            categories: Category::ALL.iter().map(|c| (*c, 0)).collect(),
        }
    }

    /// Records a passing rule.
    pub fn record_pass(&mut self) {
        self.total_checks += 1;
        self.passed_checks += 1;
    }

    /// Records a failing rule and its issues.
    pub fn record_failure(&mut self, issues: Vec<Issue>) {
        self.total_checks += 1;
        self.failed_checks += 1;
        for issue in &issues {
            *self.categories.entry(issue.category).or_insert(0) += 1;
        }
        self.issues.extend(issues);
    }

    /// Returns the number of issues with the given severity.
    #[must_use]
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Returns true if no rule failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_checks == 0
    }

    /// Writes the results as pretty JSON to `path`, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ResultsError`] if serialization or any write fails.
    pub fn write_json(&self, path: &Path) -> Result<(), ResultsError> {
        let json = serde_json::to_string_pretty(self).map_err(ResultsError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ResultsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| ResultsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for Results {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn category_inference_keywords() {
        assert_eq!(Category::from_issue_type("missing_model_field"), Category::Models);
        assert_eq!(Category::from_issue_type("missing_content"), Category::Content);
        assert_eq!(Category::from_issue_type("missing_config_key"), Category::Content);
        assert_eq!(Category::from_issue_type("missing_api_endpoint"), Category::Api);
        assert_eq!(Category::from_issue_type("missing_dependency"), Category::Dependencies);
        assert_eq!(Category::from_issue_type("missing_file"), Category::Structure);
    }

    #[test]
    fn new_results_seed_all_categories() {
        let results = Results::new();
        assert_eq!(results.categories.len(), 5);
        assert!(results.categories.values().all(|n| *n == 0));
    }

    #[test]
    fn failure_updates_buckets() {
        let mut results = Results::new();
        results.record_pass();
        results.record_failure(vec![
            Issue::new("a", "missing_file", "", "", "", Severity::Medium),
            Issue::new("b", "missing_file", "", "", "", Severity::High)
                .in_category(Category::Models),
        ]);
        assert_eq!(results.total_checks, 2);
        assert_eq!(results.passed_checks, 1);
        assert_eq!(results.failed_checks, 1);
        assert_eq!(results.categories[&Category::Structure], 1);
        assert_eq!(results.categories[&Category::Models], 1);
    }

    #[test]
    fn results_json_uses_uppercase_keys() {
        let json = serde_json::to_value(Results::new()).unwrap();
        assert_eq!(json["categories"]["STRUCTURE"], 0);
        assert_eq!(json["categories"]["API"], 0);
    }

    #[test]
    fn results_json_lands_in_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agv-outputs/results/run.json");
        let mut results = Results::new();
        results.record_pass();
        results.score = 100.0;
        results.write_json(&path).unwrap();

        let back: Results = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, results);
        assert_eq!(back.categories.len(), Category::ALL.len());
    }

    #[test]
    fn results_write_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = Results::new().write_json(&blocker.join("run.json")).unwrap_err();
        assert!(matches!(err, ResultsError::Write { .. }));
    }
}
