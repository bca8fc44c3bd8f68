//! Declared-dependency checks over `pyproject.toml`, requirements files and
//! `package.json`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::fs;
use super::{Check, CheckError};
use crate::report::{Issue, Severity};

/// A package that must be declared, optionally at a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequirement {
    /// Package name as published.
    pub name: String,
    /// Version text that must appear next to the declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Severity when the package is not declared.
    pub severity: Severity,
}

/// Packages that must be declared in one of the dependency manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependencies {
    /// Manifest file patterns (`pyproject.toml`, `requirements*.txt`).
    pub manifests: Vec<String>,
    /// Required packages.
    pub packages: Vec<DependencyRequirement>,
}

/// Normalizes a package name: case-folded, `_` and `.` read as `-`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '.' { '-' } else { c })
        .collect()
}

/// Splits a manifest line into a leading package token and the rest.
///
/// Handles `django>=4.2`, `"django>=4.2",`, `django = "^4.2"`,
/// `"react": "^18.2.0"` and `psycopg2-binary==2.9.9`. Extras in brackets
/// are dropped from the name.
#[must_use]
pub fn declaration(line: &str) -> Option<(String, &str)> {
    let line = line.trim().trim_start_matches(['"', '\'']);
    if line.starts_with('#') || line.starts_with('[') {
        return None;
    }
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || "-_.@/".contains(c)))
        .unwrap_or(line.len());
    if end == 0 {
        return None;
    }
    let name = normalize_name(&line[..end]);
    let rest = &line[end..];
    let rest = match rest.strip_prefix('[') {
        Some(extras) => extras.split_once(']').map_or("", |(_, after)| after),
        None => rest,
    };
    Some((name, rest))
}

impl Check for DeclaredDependencies {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let manifests: Vec<(String, String)> = fs::files_matching(root, &self.manifests)?
            .into_iter()
            .filter_map(|f| fs::read_text(&f).map(|t| (fs::relative(root, &f), t)))
            .collect();

        if manifests.is_empty() {
            return Ok(vec![Issue::new(
                self.manifests.join(", "),
                "missing_dependency_manifest",
                "No dependency manifest found",
                format!("One of {} must exist", self.manifests.join(", ")),
                "No manifest file",
                Severity::High,
            )]);
        }

        let mut issues = Vec::new();
        for package in &self.packages {
            let wanted = normalize_name(&package.name);
            let found = manifests.iter().find_map(|(file, text)| {
                text.lines()
                    .filter_map(declaration)
                    .find(|(name, _)| *name == wanted)
                    .map(|(_, rest)| (file, rest))
            });
            match (found, &package.version) {
                (None, _) => issues.push(Issue::new(
                    manifests[0].0.as_str(),
                    "missing_dependency",
                    format!("Dependency not declared: {}", package.name),
                    format!("{} must be declared", package.name),
                    "Not found in any manifest",
                    package.severity,
                )),
                (Some((file, rest)), Some(version)) if !rest.contains(version.as_str()) => {
                    issues.push(Issue::new(
                        file.as_str(),
                        "dependency_version_mismatch",
                        format!("{} is not declared at {version}", package.name),
                        format!("{} {version}", package.name),
                        format!("{}{}", package.name, rest.trim().trim_end_matches(',')),
                        Severity::Medium,
                    ));
                }
                _ => {}
            }
        }
        Ok(issues)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs::write;

    #[test]
    fn declaration_forms() {
        assert_eq!(declaration("django>=4.2").unwrap().0, "django");
        assert_eq!(declaration("  \"Django>=4.2\",").unwrap().0, "django");
        assert_eq!(declaration("psycopg2_binary = \"^2.9\"").unwrap().0, "psycopg2-binary");
        assert_eq!(declaration("\"@tanstack/react-query\": \"^5\"").unwrap().0, "@tanstack/react-query");
        let (name, rest) = declaration("celery[redis]==5.3.0").unwrap();
        assert_eq!(name, "celery");
        assert_eq!(rest, "==5.3.0");
        assert!(declaration("[project]").is_none());
        assert!(declaration("# django").is_none());
    }

    fn requirement(name: &str, version: Option<&str>) -> DependencyRequirement {
        DependencyRequirement {
            name: name.into(),
            version: version.map(Into::into),
            severity: Severity::High,
        }
    }

    #[test]
    fn declared_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path().join("pyproject.toml"),
            "[project]\ndependencies = [\n  \"django>=4.2\",\n  \"djangorestframework>=3.14\",\n]\n",
        )
        .unwrap();
        let check = DeclaredDependencies {
            manifests: vec!["pyproject.toml".into(), "requirements*.txt".into()],
            packages: vec![
                requirement("Django", None),
                requirement("djangorestframework", Some("3.15")),
                requirement("psycopg2-binary", None),
            ],
        };
        let issues = check.run(dir.path()).unwrap();
        let types: Vec<&str> = issues.iter().map(|i| i.issue_type.as_str()).collect();
        assert_eq!(types, vec!["dependency_version_mismatch", "missing_dependency"]);
        assert_eq!(issues[1].severity, Severity::High);
    }

    #[test]
    fn no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let check = DeclaredDependencies {
            manifests: vec!["package.json".into()],
            packages: vec![requirement("react", None)],
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "missing_dependency_manifest");
    }
}
