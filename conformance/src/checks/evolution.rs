//! Evolution checks: breaking changes, deprecations, refactors,
//! documentation freshness and versioning.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::api::defines;
use super::content::starts_with_docstring;
use super::fs;
use super::testing::is_test_file;
use super::{Check, CheckError};
use crate::report::{Issue, Severity};

fn missing_changelog(changelog: &str) -> Issue {
    Issue::new(
        changelog,
        "missing_changelog",
        format!("{changelog} not found"),
        format!("{changelog} must record the evolution"),
        "File does not exist",
        Severity::Medium,
    )
}

/// Each breaking change is mentioned in the changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakingChanges {
    /// Change descriptions.
    pub changes: Vec<String>,
    /// Changelog file name.
    pub changelog: String,
}

impl Check for BreakingChanges {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let Some(path) = fs::find_files(root, &self.changelog)?.into_iter().next() else {
            return Ok(vec![missing_changelog(&self.changelog)]);
        };
        let text = fs::read_text(&path).unwrap_or_default().to_lowercase();
        let rel = fs::relative(root, &path);
        Ok(self
            .changes
            .iter()
            .filter(|c| !text.contains(&c.trim().to_lowercase()))
            .map(|c| {
                Issue::new(
                    rel.as_str(),
                    "undocumented_breaking_change",
                    format!("Breaking change not documented: {c}"),
                    format!("{rel} must describe '{c}'"),
                    "Not mentioned",
                    Severity::High,
                )
            })
            .collect())
    }
}

/// Lines around a definition searched for a deprecation marker.
const DEPRECATION_WINDOW: usize = 5;

/// Returns true if a deprecation marker appears within the window around
/// line `at`.
#[must_use]
pub fn marked_deprecated(lines: &[&str], at: usize) -> bool {
    let start = at.saturating_sub(DEPRECATION_WINDOW);
    let end = (at + DEPRECATION_WINDOW + 1).min(lines.len());
    lines[start..end].iter().any(|l| {
        let l = l.to_lowercase();
        l.contains("deprecat") || l.contains("warnings.warn")
    })
}

/// Deprecated features still defined in the code carry a deprecation
/// marker near their definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationMarkers {
    /// Class or function names.
    pub features: Vec<String>,
}

impl Check for DeprecationMarkers {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let sources: Vec<(String, String)> = fs::walk_files(root)?
            .into_iter()
            .filter(|f| f.extension().is_some_and(|e| e == "py") && !is_test_file(root, f))
            .filter_map(|f| fs::read_text(&f).map(|t| (fs::relative(root, &f), t)))
            .collect();

        let mut issues = Vec::new();
        for feature in &self.features {
            for (rel, text) in &sources {
                let lines: Vec<&str> = text.lines().collect();
                // Removed features have no definition and need no marker.
                let Some(at) = lines.iter().position(|l| defines(l, feature)) else {
                    continue;
                };
                if !marked_deprecated(&lines, at) {
                    issues.push(Issue::new(
                        rel.as_str(),
                        "missing_deprecation_warning",
                        format!("{feature} is deprecated but not marked"),
                        "warnings.warn(..., DeprecationWarning) or a deprecation notice",
                        format!("No marker near line {}", at + 1),
                        Severity::Medium,
                    ));
                }
            }
        }
        Ok(issues)
    }
}

/// Refactored components still exist and are exercised by tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoredComponents {
    /// Component names (class, function or module).
    pub components: Vec<String>,
}

impl Check for RefactoredComponents {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let files = fs::walk_files(root)?;
        let mut sources = Vec::new();
        let mut tests = Vec::new();
        for file in files.iter().filter(|f| f.extension().is_some_and(|e| e == "py")) {
            let Some(text) = fs::read_text(file) else {
                continue;
            };
            if is_test_file(root, file) {
                tests.push(text);
            } else {
                sources.push((file, text));
            }
        }

        let mut issues = Vec::new();
        for component in &self.components {
            let module_file = format!("{component}.py");
            let exists = sources.iter().any(|(path, text)| {
                defines(text, component)
                    || path.file_name().is_some_and(|n| n == module_file.as_str())
                    || path.parent().and_then(Path::file_name).is_some_and(|n| n == component.as_str())
            });
            if !exists {
                issues.push(Issue::new(
                    component.as_str(),
                    "missing_refactored_component",
                    format!("Refactored component not found: {component}"),
                    format!("{component} must exist after the refactor"),
                    "No definition or module",
                    Severity::High,
                ));
            } else if !tests.iter().any(|t| t.contains(component.as_str())) {
                issues.push(Issue::new(
                    component.as_str(),
                    "untested_refactoring",
                    format!("Refactored component has no tests: {component}"),
                    format!("Tests must exercise {component}"),
                    "Not referenced by any test",
                    Severity::Medium,
                ));
            }
        }
        Ok(issues)
    }
}

/// README/CHANGELOG recency and module docstring coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentationFreshness {
    /// Changelog file name.
    pub changelog: String,
    /// Markers of a recent entry (`unreleased`, current and previous year);
    /// matched case-insensitively.
    pub recent_markers: Vec<String>,
    /// Minimum share of Python modules opening with a docstring.
    pub min_docstring_ratio: f64,
}

/// Share of non-test, non-migration, non-empty Python modules with a
/// module docstring. `None` when there are no such modules.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory.
pub fn docstring_ratio(root: &Path) -> Result<Option<f64>, CheckError> {
    let texts: Vec<String> = fs::walk_files(root)?
        .into_iter()
        .filter(|f| f.extension().is_some_and(|e| e == "py"))
        .filter(|f| !is_test_file(root, f) && !fs::relative(root, f).contains("migrations/"))
        .filter_map(|f| fs::read_text(&f))
        .filter(|t| !t.trim().is_empty())
        .collect();
    if texts.is_empty() {
        return Ok(None);
    }
    let documented = texts.iter().filter(|t| starts_with_docstring(t)).count();
    Ok(Some(documented as f64 / texts.len() as f64))
}

impl Check for DocumentationFreshness {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let mut issues = Vec::new();
        match fs::find_files(root, &self.changelog)?.into_iter().next() {
            None => issues.push(missing_changelog(&self.changelog)),
            Some(path) => {
                let text = fs::read_text(&path).unwrap_or_default().to_lowercase();
                if !self.recent_markers.iter().any(|m| text.contains(&m.to_lowercase())) {
                    issues.push(Issue::new(
                        fs::relative(root, &path),
                        "outdated_documentation",
                        "Changelog has no recent entry",
                        format!("An entry marked one of {}", self.recent_markers.join(", ")),
                        "No recent marker",
                        Severity::Medium,
                    ));
                }
            }
        }

        if let Some(ratio) = docstring_ratio(root)? {
            if ratio < self.min_docstring_ratio {
                issues.push(Issue::new(
                    "*.py",
                    "insufficient_documentation",
                    format!("Only {:.0}% of modules carry a docstring", ratio * 100.0),
                    format!("At least {:.0}%", self.min_docstring_ratio * 100.0),
                    format!("{:.0}%", ratio * 100.0),
                    Severity::Low,
                ));
            }
        }
        Ok(issues)
    }
}

/// Returns true for `MAJOR.MINOR.PATCH` with optional pre-release/build.
#[must_use]
pub fn is_semver(version: &str) -> bool {
    regex!(r"^\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$")
        .is_some_and(|re| re.is_match(version))
}

/// Reads the project version from `[project]` or `[tool.poetry]`.
#[must_use]
pub fn project_version(pyproject: &str) -> Option<String> {
    let doc: toml::Value = toml::from_str(pyproject).ok()?;
    doc.get("project")
        .and_then(|p| p.get("version"))
        .or_else(|| {
            doc.get("tool")
                .and_then(|t| t.get("poetry"))
                .and_then(|p| p.get("version"))
        })
        .and_then(toml::Value::as_str)
        .map(str::to_string)
}

/// Lists tag names from `.git/refs/tags` and `.git/packed-refs`.
#[must_use]
pub fn git_tags(root: &Path) -> Vec<String> {
    let git = root.join(".git");
    let mut tags: Vec<String> = std::fs::read_dir(git.join("refs/tags"))
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    if let Some(packed) = fs::read_text(&git.join("packed-refs")) {
        tags.extend(
            packed
                .lines()
                .filter_map(|l| l.split_once(" refs/tags/").map(|(_, t)| t.to_string())),
        );
    }
    tags.sort();
    tags.dedup();
    tags
}

/// The project version is semantic and, in a git checkout, so are tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFormat {
    /// File declaring the version (`pyproject.toml`).
    pub file: String,
    /// Also inspect release tags when `.git` exists.
    pub check_tags: bool,
}

impl Check for VersionFormat {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let mut issues = Vec::new();
        match fs::find_files(root, &self.file)?.into_iter().next() {
            None => issues.push(Issue::new(
                self.file.as_str(),
                "missing_file",
                format!("{} not found", self.file),
                format!("{} must declare the project version", self.file),
                "File does not exist",
                Severity::Medium,
            )),
            Some(path) => {
                let rel = fs::relative(root, &path);
                let text = fs::read_text(&path).unwrap_or_default();
                match project_version(&text) {
                    None => issues.push(Issue::new(
                        rel.as_str(),
                        "missing_version",
                        format!("{rel} declares no version"),
                        "version = \"MAJOR.MINOR.PATCH\"",
                        "No version key",
                        Severity::Medium,
                    )),
                    Some(v) if !is_semver(&v) => issues.push(Issue::new(
                        rel.as_str(),
                        "invalid_version_format",
                        format!("Version {v} is not semantic"),
                        "MAJOR.MINOR.PATCH",
                        v.clone(),
                        Severity::Medium,
                    )),
                    Some(_) => {}
                }
            }
        }

        if self.check_tags && root.join(".git").is_dir() {
            let tags = git_tags(root);
            if tags.is_empty() {
                issues.push(Issue::new(
                    ".git/refs/tags",
                    "missing_release_tags",
                    "No release tags found",
                    "Releases must be tagged vMAJOR.MINOR.PATCH",
                    "No tags",
                    Severity::Low,
                ));
            }
            for tag in tags.iter().filter(|t| !is_semver(t.trim_start_matches('v'))) {
                issues.push(Issue::new(
                    ".git/refs/tags",
                    "invalid_tag_format",
                    format!("Tag {tag} is not a semantic version"),
                    "vMAJOR.MINOR.PATCH",
                    tag.as_str(),
                    Severity::Low,
                ));
            }
        }
        Ok(issues)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};

    #[test]
    fn breaking_changes_against_changelog() {
        let dir = tempfile::tempdir().unwrap();
        let check = BreakingChanges {
            changes: vec!["Removed legacy auth endpoint".into(), "Renamed Loan.value".into()],
            changelog: "CHANGELOG.md".into(),
        };
        assert_eq!(check.run(dir.path()).unwrap()[0].issue_type, "missing_changelog");

        write(
            dir.path().join("CHANGELOG.md"),
            "## Unreleased\n### BREAKING\n- removed legacy auth endpoint\n",
        )
        .unwrap();
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "undocumented_breaking_change");
    }

    #[test]
    fn deprecation_window() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path().join("legacy.py"),
            "import warnings\n\ndef old_rate():\n    warnings.warn('old', DeprecationWarning)\n\n\n\n\n\n\n\n\ndef old_fee():\n    return 1\n",
        )
        .unwrap();
        let check = DeprecationMarkers {
            features: vec!["old_rate".into(), "old_fee".into(), "gone".into()],
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.starts_with("old_fee"));
    }

    #[test]
    fn refactored_components() {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("tests")).unwrap();
        write(dir.path().join("services.py"), "class InterestCalculator:\n    pass\n").unwrap();
        write(dir.path().join("pricing.py"), "RATE = 1\n").unwrap();
        write(
            dir.path().join("tests/test_services.py"),
            "from services import InterestCalculator\n",
        )
        .unwrap();
        let check = RefactoredComponents {
            components: vec!["InterestCalculator".into(), "pricing".into(), "Scheduler".into()],
        };
        let types: Vec<String> = check
            .run(dir.path())
            .unwrap()
            .into_iter()
            .map(|i| i.issue_type)
            .collect();
        assert_eq!(types, vec!["untested_refactoring", "missing_refactored_component"]);
    }

    #[test]
    fn documentation_freshness() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("CHANGELOG.md"), "## 1.0.0 - 2019-01-01\n").unwrap();
        write(dir.path().join("a.py"), "\"\"\"A.\"\"\"\n").unwrap();
        write(dir.path().join("b.py"), "import os\n").unwrap();
        let check = DocumentationFreshness {
            changelog: "CHANGELOG.md".into(),
            recent_markers: vec!["unreleased".into(), "2026".into()],
            min_docstring_ratio: 0.8,
        };
        let types: Vec<String> = check
            .run(dir.path())
            .unwrap()
            .into_iter()
            .map(|i| i.issue_type)
            .collect();
        assert_eq!(types, vec!["outdated_documentation", "insufficient_documentation"]);
    }

    #[test]
    fn semver_forms() {
        assert!(is_semver("1.2.3"));
        assert!(is_semver("0.1.0-rc.1+build.5"));
        assert!(!is_semver("1.2"));
        assert!(!is_semver("v1.2.3"));
    }

    #[test]
    fn version_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path().join("pyproject.toml"),
            "[tool.poetry]\nname = \"iabank\"\nversion = \"1.0\"\n",
        )
        .unwrap();
        create_dir_all(dir.path().join(".git/refs/tags")).unwrap();
        write(dir.path().join(".git/refs/tags/v1.0.0"), "abc\n").unwrap();
        write(
            dir.path().join(".git/packed-refs"),
            "# pack-refs with: peeled\ndef refs/tags/release-2\n",
        )
        .unwrap();
        let check = VersionFormat {
            file: "pyproject.toml".into(),
            check_tags: true,
        };
        let issues = check.run(dir.path()).unwrap();
        let types: Vec<&str> = issues.iter().map(|i| i.issue_type.as_str()).collect();
        assert_eq!(types, vec!["invalid_version_format", "invalid_tag_format"]);
        assert_eq!(issues[1].actual, "release-2");
    }
}
