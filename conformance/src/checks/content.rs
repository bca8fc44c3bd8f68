//! Content checks over file text.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fs;
use super::{Check, CheckError, ContentRequirement};
use crate::report::{Issue, Severity};

/// Requirements on the first file matching `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Glob pattern locating the file (see [`fs::PathPattern`]).
    pub file: String,
    /// Severity of the `missing_file` issue when nothing matches.
    pub missing_severity: Severity,
    /// Text requirements on the file.
    pub requirements: Vec<ContentRequirement>,
}

impl Check for FileContent {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let Some(path) = fs::find_files(root, &self.file)?.into_iter().next() else {
            return Ok(vec![Issue::new(
                self.file.as_str(),
                "missing_file",
                format!("File not found: {}", self.file),
                format!("{} must exist", self.file),
                "File does not exist",
                self.missing_severity,
            )]);
        };
        let text = fs::read_text(&path).unwrap_or_default();
        let rel = fs::relative(root, &path);
        Ok(self
            .requirements
            .iter()
            .filter(|req| !req.is_met_by(&text))
            .map(|req| {
                Issue::new(
                    rel.as_str(),
                    "missing_content",
                    format!("{rel}: {}", req.description),
                    req.description.as_str(),
                    format!("None of {:?} found", req.any_of),
                    req.severity,
                )
            })
            .collect())
    }
}

/// Requirements satisfied by any file matching any of `files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPresent {
    /// Glob patterns selecting the searched files.
    pub files: Vec<String>,
    /// Issue type for an unmet requirement.
    pub issue_type: String,
    /// Text requirements.
    pub requirements: Vec<ContentRequirement>,
}

impl Check for TextPresent {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let texts: Vec<String> = fs::files_matching(root, &self.files)?
            .into_iter()
            .filter_map(|f| fs::read_text(&f))
            .collect();
        let location = self.files.join(", ");
        Ok(self
            .requirements
            .iter()
            .filter(|req| !texts.iter().any(|t| req.is_met_by(t)))
            .map(|req| {
                Issue::new(
                    location.as_str(),
                    self.issue_type.as_str(),
                    format!("Not found in {location}: {}", req.description),
                    req.description.as_str(),
                    if texts.is_empty() {
                        "No matching files".to_string()
                    } else {
                        format!("None of {:?} found", req.any_of)
                    },
                    req.severity,
                )
            })
            .collect())
    }
}

/// Returns true if the first meaningful line opens a docstring.
///
/// Shebang and encoding comments before the docstring are allowed.
#[must_use]
pub fn starts_with_docstring(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .is_some_and(|l| {
            let l = l.trim_start_matches(['r', 'R', 'u', 'U']);
            l.starts_with("\"\"\"") || l.starts_with("'''")
        })
}

/// Python files matching `pattern` must open with a module docstring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDocstrings {
    /// File-name pattern (`models.py`, `*.py`).
    pub pattern: String,
    /// Only consider files inside a package (sibling `__init__.py`).
    pub packages_only: bool,
    /// When set, report `missing_file` at this severity if nothing matches.
    pub missing_severity: Option<Severity>,
    /// Severity of `missing_docstring` and `empty_file` issues.
    pub severity: Severity,
}

impl Check for ModuleDocstrings {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let files: Vec<PathBuf> = fs::find_files(root, &self.pattern)?
            .into_iter()
            .filter(|f| {
                !self.packages_only || f.parent().is_some_and(|p| p.join("__init__.py").is_file())
            })
            .collect();

        if files.is_empty() {
            return Ok(self
                .missing_severity
                .map(|severity| {
                    Issue::new(
                        self.pattern.as_str(),
                        "missing_file",
                        format!("No {} found", self.pattern),
                        format!("{} must exist", self.pattern),
                        "File does not exist",
                        severity,
                    )
                })
                .into_iter()
                .collect());
        }

        let mut issues = Vec::new();
        for file in &files {
            let rel = fs::relative(root, file);
            let text = fs::read_text(file).unwrap_or_default();
            if text.trim().is_empty() {
                issues.push(Issue::new(
                    rel.as_str(),
                    "empty_file",
                    format!("{rel} is empty"),
                    "File must at least carry a module docstring",
                    "Empty file",
                    self.severity,
                ));
            } else if !starts_with_docstring(&text) {
                issues.push(Issue::new(
                    rel.as_str(),
                    "missing_docstring",
                    format!("{rel} has no module docstring"),
                    "File must open with a module docstring",
                    "First statement is not a docstring",
                    self.severity,
                ));
            }
        }
        Ok(issues)
    }
}

/// README title, critical elements and section count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeSections {
    /// README file name.
    pub file: String,
    /// Elements that must each appear (HIGH when absent).
    pub critical: Vec<String>,
    /// Elements of which at most `max_missing_important` may be absent.
    pub important: Vec<String>,
    /// Tolerated number of absent important elements.
    pub max_missing_important: usize,
    /// Minimum number of `## ` sections.
    pub min_sections: usize,
}

impl Check for ReadmeSections {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        // Presence is reported by a separate rule.
        let Some(path) = fs::find_files(root, &self.file)?.into_iter().next() else {
            return Ok(Vec::new());
        };
        let text = fs::read_text(&path).unwrap_or_default();
        let rel = fs::relative(root, &path);
        let mut issues = Vec::new();

        for element in self.critical.iter().filter(|e| !text.contains(e.as_str())) {
            issues.push(Issue::new(
                rel.as_str(),
                "missing_readme_section",
                format!("README lacks required element: {element}"),
                format!("'{element}' must appear in the README"),
                "Element not found",
                Severity::High,
            ));
        }

        let missing_important: Vec<&str> = self
            .important
            .iter()
            .filter(|e| !text.contains(e.as_str()))
            .map(String::as_str)
            .collect();
        if missing_important.len() > self.max_missing_important {
            issues.push(Issue::new(
                rel.as_str(),
                "incomplete_documentation",
                format!("README incomplete: {} elements absent", missing_important.len()),
                "README must cover the Blueprint's stack and setup",
                format!("Missing: {}", missing_important.join(", ")),
                Severity::Medium,
            ));
        }

        let has_title = text.lines().any(|l| l.starts_with("# "));
        if !has_title {
            issues.push(Issue::new(
                rel.as_str(),
                "missing_readme_title",
                "README has no level-1 title",
                "README must open with a '# ' title",
                "No H1 heading",
                Severity::High,
            ));
        }

        let sections = text.lines().filter(|l| l.starts_with("## ")).count();
        if sections < self.min_sections {
            issues.push(Issue::new(
                rel.as_str(),
                "insufficient_documentation",
                format!("README has only {sections} sections"),
                format!("At least {} '## ' sections", self.min_sections),
                format!("{sections} sections"),
                Severity::Medium,
            ));
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
    fn file_content_reports_unmet_requirements() {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("backend/app")).unwrap();
        write(
            dir.path().join("backend/app/settings.py"),
            "INSTALLED_APPS = ['core']\nDATABASES = {'ENGINE': 'sqlite3'}\n",
        )
        .unwrap();
        let check = FileContent {
            file: "settings.py".into(),
            missing_severity: Severity::High,
            requirements: vec![
                ContentRequirement::new("apps", &["INSTALLED_APPS"], Severity::High),
                ContentRequirement::new("postgres", &["postgresql"], Severity::High),
            ],
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].file_path, "backend/app/settings.py");
        assert_eq!(issues[0].expected, "postgres");
    }

    #[test]
    fn file_content_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let check = FileContent {
            file: ".gitignore".into(),
            missing_severity: Severity::Critical,
            requirements: vec![],
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues[0].issue_type, "missing_file");
        assert_eq!(issues[0].severity, Severity::Critical);
    }

    #[test]
    fn docstring_detection() {
        assert!(starts_with_docstring("\"\"\"Models.\"\"\"\n"));
        assert!(starts_with_docstring("#!/usr/bin/env python\n'''x'''"));
        assert!(!starts_with_docstring("import os\n\"\"\"late\"\"\""));
    }

    #[test]
    fn module_docstrings_in_packages() {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("core")).unwrap();
        write(dir.path().join("core/__init__.py"), "").unwrap();
        write(dir.path().join("core/models.py"), "from django.db import models\n").unwrap();
        write(dir.path().join("models.py"), "").unwrap();
        let check = ModuleDocstrings {
            pattern: "models.py".into(),
            packages_only: true,
            missing_severity: None,
            severity: Severity::Medium,
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "missing_docstring");
        assert_eq!(issues[0].file_path, "core/models.py");
    }

    #[test]
    fn readme_sections() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("README.md"), "# Demo\n\n## Setup\n\nUses Docker.\n").unwrap();
        let check = ReadmeSections {
            file: "README.md".into(),
            critical: vec!["# Demo".into(), "docker-compose".into()],
            important: vec!["Python".into(), "React".into()],
            max_missing_important: 1,
            min_sections: 2,
        };
        let types: Vec<String> = check
            .run(dir.path())
            .unwrap()
            .into_iter()
            .map(|i| i.issue_type)
            .collect();
        assert_eq!(
            types,
            vec![
                "missing_readme_section",
                "incomplete_documentation",
                "insufficient_documentation"
            ]
        );
    }

    #[test]
    fn text_present_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("settings.py"), "CELERY_BROKER_URL = env('X')").unwrap();
        write(dir.path().join(".env.example"), "SECRET_KEY=").unwrap();
        let check = TextPresent {
            files: vec!["settings.py".into(), ".env.example".into()],
            issue_type: "missing_config_key".into(),
            requirements: vec![
                ContentRequirement::new("SECRET_KEY", &["SECRET_KEY"], Severity::Medium),
                ContentRequirement::new("CELERY_BROKER_URL", &["CELERY_BROKER_URL"], Severity::Medium),
                ContentRequirement::new("SENTRY_DSN", &["SENTRY_DSN"], Severity::Medium),
            ],
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].expected, "SENTRY_DSN");
    }
}
