//! Test-suite checks: per-application test layout, test counts per module
//! and integration scenarios.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fs;
use super::structure::find_app_dirs;
use super::{Check, CheckError};
use crate::report::{Issue, Severity};

/// Returns true for Python test modules (`test_*.py`, `*_test.py`,
/// `tests.py` or anything under a `tests/` directory).
#[must_use]
pub fn is_test_file(root: &Path, path: &Path) -> bool {
    if path.extension().is_none_or(|e| e != "py") {
        return false;
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name.starts_with("test_")
        || name.ends_with("_test.py")
        || name == "tests.py"
        || fs::relative(root, path).split('/').any(|c| c == "tests")
}

fn test_files(root: &Path) -> Result<Vec<PathBuf>, CheckError> {
    Ok(fs::walk_files(root)?
        .into_iter()
        .filter(|f| is_test_file(root, f))
        .collect())
}

/// Counts `def test_*` functions in Python source.
#[must_use]
pub fn count_tests(text: &str) -> usize {
    text.lines()
        .map(str::trim_start)
        .map(|l| l.strip_prefix("async ").unwrap_or(l))
        .filter(|l| l.starts_with("def test"))
        .count()
}

/// Every application carries a `tests/` package with the listed files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLayout {
    /// Application names.
    pub apps: Vec<String>,
    /// Files each `tests/` package must contain besides `__init__.py`.
    pub required_files: Vec<String>,
}

impl Check for TestLayout {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let mut issues = Vec::new();
        for app in &self.apps {
            // Missing applications are reported by the app-structure rule.
            let Some(dir) = find_app_dirs(root, app)?.into_iter().next() else {
                continue;
            };
            let tests = dir.join("tests");
            if !tests.is_dir() {
                issues.push(Issue::new(
                    fs::relative(root, &tests),
                    "missing_tests_directory",
                    format!("Application {app} has no tests/ package"),
                    "tests/ package must exist in the application",
                    "Directory does not exist",
                    Severity::Medium,
                ));
                continue;
            }
            let wanted = std::iter::once("__init__.py").chain(self.required_files.iter().map(String::as_str));
            for file in wanted {
                let path = tests.join(file);
                if !path.is_file() {
                    issues.push(Issue::new(
                        fs::relative(root, &path),
                        "missing_test_file",
                        format!("{app}/tests/{file} not found"),
                        format!("{file} must exist in {app}/tests/"),
                        "File does not exist",
                        Severity::Medium,
                    ));
                }
            }
        }
        Ok(issues)
    }
}

/// Each module needs a minimum number of test functions.
///
/// A test file counts toward a module when the module name appears in its
/// relative path or in its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCoverage {
    /// Module names.
    pub modules: Vec<String>,
    /// Required test functions per module.
    pub min_tests_per_module: usize,
}

impl Check for TestCoverage {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let files: Vec<(String, String)> = test_files(root)?
            .into_iter()
            .filter_map(|f| fs::read_text(&f).map(|t| (fs::relative(root, &f), t)))
            .collect();
        let mut issues = Vec::new();
        for module in &self.modules {
            let count: usize = files
                .iter()
                .filter(|(rel, text)| rel.contains(module.as_str()) || text.contains(module.as_str()))
                .map(|(_, text)| count_tests(text))
                .sum();
            if count == 0 {
                issues.push(Issue::new(
                    module.as_str(),
                    "missing_tests",
                    format!("Module {module} has no tests"),
                    format!("At least {} tests for {module}", self.min_tests_per_module),
                    "0 tests",
                    Severity::High,
                ));
            } else if count < self.min_tests_per_module {
                issues.push(Issue::new(
                    module.as_str(),
                    "insufficient_tests",
                    format!("Module {module} has only {count} tests"),
                    format!("At least {} tests for {module}", self.min_tests_per_module),
                    format!("{count} tests"),
                    Severity::Medium,
                ));
            }
        }
        Ok(issues)
    }
}

/// An integration test suite exists and names each scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationTests {
    /// Scenario descriptions; matched case-insensitively with spaces read
    /// as underscores.
    pub scenarios: Vec<String>,
}

/// Normalizes a scenario name into its test-identifier form.
#[must_use]
pub fn scenario_key(scenario: &str) -> String {
    scenario
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

impl Check for IntegrationTests {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let texts: Vec<String> = test_files(root)?
            .into_iter()
            .filter(|f| fs::relative(root, f).contains("integration"))
            .filter_map(|f| fs::read_text(&f).map(|t| t.to_lowercase()))
            .collect();

        if texts.is_empty() {
            return Ok(vec![Issue::new(
                "tests/integration/",
                "missing_integration_tests",
                "No integration tests found",
                "Integration tests must cover cross-module flows",
                "No test file under an integration path",
                Severity::High,
            )]);
        }

        Ok(self
            .scenarios
            .iter()
            .filter(|s| {
                let key = scenario_key(s);
                let plain = s.trim().to_lowercase();
                !texts.iter().any(|t| t.contains(&key) || t.contains(&plain))
            })
            .map(|s| {
                Issue::new(
                    "tests/integration/",
                    "missing_test_scenario",
                    format!("Integration scenario not covered: {s}"),
                    format!("A test covering '{s}'"),
                    "Scenario not found in integration tests",
                    Severity::Medium,
                )
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};

    #[test]
    fn test_file_detection() {
        let root = Path::new("/r");
        assert!(is_test_file(root, Path::new("/r/core/tests/factories.py")));
        assert!(is_test_file(root, Path::new("/r/test_api.py")));
        assert!(is_test_file(root, Path::new("/r/app/tests.py")));
        assert!(!is_test_file(root, Path::new("/r/app/models.py")));
        assert!(!is_test_file(root, Path::new("/r/tests/README.md")));
    }

    #[test]
    fn counts_sync_and_async_tests() {
        let text = "def test_a():\n    pass\nasync def test_b():\n    pass\ndef helper():\n    pass\n";
        assert_eq!(count_tests(text), 2);
    }

    #[test]
    fn test_layout() {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("core/tests")).unwrap();
        write(dir.path().join("core/__init__.py"), "").unwrap();
        write(dir.path().join("core/tests/__init__.py"), "").unwrap();
        write(dir.path().join("core/tests/test_models.py"), "").unwrap();
        create_dir_all(dir.path().join("loans")).unwrap();
        write(dir.path().join("loans/__init__.py"), "").unwrap();
        let check = TestLayout {
            apps: vec!["core".into(), "loans".into(), "ghost".into()],
            required_files: vec!["test_models.py".into(), "factories.py".into()],
        };
        let issues = check.run(dir.path()).unwrap();
        let paths: Vec<&str> = issues.iter().map(|i| i.file_path.as_str()).collect();
        assert_eq!(paths, vec!["core/tests/factories.py", "loans/tests"]);
    }

    #[test]
    fn test_coverage_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("tests")).unwrap();
        write(
            dir.path().join("tests/test_payments.py"),
            "def test_charge():\n    pass\n",
        )
        .unwrap();
        let check = TestCoverage {
            modules: vec!["payments".into(), "ledger".into()],
            min_tests_per_module: 2,
        };
        let issues = check.run(dir.path()).unwrap();
        let types: Vec<&str> = issues.iter().map(|i| i.issue_type.as_str()).collect();
        assert_eq!(types, vec!["insufficient_tests", "missing_tests"]);
    }

    #[test]
    fn integration_scenarios() {
        let dir = tempfile::tempdir().unwrap();
        let check = IntegrationTests {
            scenarios: vec!["Loan approval flow".into(), "Payment refund".into()],
        };
        assert_eq!(
            check.run(dir.path()).unwrap()[0].issue_type,
            "missing_integration_tests"
        );

        create_dir_all(dir.path().join("tests/integration")).unwrap();
        write(
            dir.path().join("tests/integration/test_flows.py"),
            "def test_loan_approval_flow():\n    pass\n",
        )
        .unwrap();
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.contains("Payment refund"));
    }
}
