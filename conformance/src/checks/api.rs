//! Module and interface checks: modules that must exist and be wired into
//! the rest of the code, and classes or functions that must be defined.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fs;
use super::{Check, CheckError};
use crate::report::{Issue, Severity};

/// Modules that must exist and be imported from outside themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCoupling {
    /// Python module names (package directory or `name.py`).
    pub modules: Vec<String>,
}

fn locate_module(files: &[PathBuf], module: &str) -> Option<PathBuf> {
    let file_name = format!("{module}.py");
    files.iter().find_map(|f| {
        if f.file_name().is_some_and(|n| n == "__init__.py")
            && f.parent().and_then(Path::file_name).is_some_and(|n| n == module)
        {
            f.parent().map(Path::to_path_buf)
        } else if f.file_name().is_some_and(|n| n == file_name.as_str()) {
            Some(f.clone())
        } else {
            None
        }
    })
}

/// Returns true if `text` imports `module` (bare or as a dotted component).
#[must_use]
pub fn imports_module(text: &str, module: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        let target = line
            .strip_prefix("from ")
            .or_else(|| line.strip_prefix("import "))
            .and_then(|rest| rest.split_whitespace().next());
        target.is_some_and(|t| {
            t.trim_end_matches(',')
                .split('.')
                .any(|component| component == module)
        })
    })
}

impl Check for ModuleCoupling {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let files: Vec<PathBuf> = fs::walk_files(root)?
            .into_iter()
            .filter(|f| f.extension().is_some_and(|e| e == "py"))
            .collect();
        let mut issues = Vec::new();

        for module in &self.modules {
            let Some(location) = locate_module(&files, module) else {
                issues.push(Issue::new(
                    module.as_str(),
                    "missing_module",
                    format!("Module not found: {module}"),
                    format!("Module {module} must be implemented"),
                    "No package or module file",
                    Severity::High,
                ));
                continue;
            };
            let imported = files
                .iter()
                .filter(|f| !f.starts_with(&location) && **f != location)
                .filter_map(|f| fs::read_text(f))
                .any(|text| imports_module(&text, module));
            if !imported {
                issues.push(Issue::new(
                    fs::relative(root, &location),
                    "isolated_module",
                    format!("Module {module} is never imported by other modules"),
                    format!("{module} must be integrated with the rest of the system"),
                    "No importers found",
                    Severity::Medium,
                ));
            }
        }
        Ok(issues)
    }
}

/// Classes or functions that must be defined in matching files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionsPresent {
    /// File patterns to search.
    pub files: Vec<String>,
    /// Class or function names.
    pub names: Vec<String>,
    /// Issue type for an undefined name.
    pub issue_type: String,
    /// Severity for an undefined name.
    pub severity: Severity,
}

/// Returns true if `text` defines `name` as a class or (async) function.
#[must_use]
pub fn defines(text: &str, name: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        let line = line.strip_prefix("async ").unwrap_or(line);
        ["class ", "def "].iter().any(|kw| {
            line.strip_prefix(kw)
                .and_then(|rest| rest.strip_prefix(name))
                .is_some_and(|rest| rest.starts_with(['(', ':']) || rest.starts_with(char::is_whitespace))
        })
    })
}

impl Check for DefinitionsPresent {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let texts: Vec<String> = fs::files_matching(root, &self.files)?
            .into_iter()
            .filter_map(|f| fs::read_text(&f))
            .collect();
        let location = self.files.join(", ");
        Ok(self
            .names
            .iter()
            .filter(|name| !texts.iter().any(|t| defines(t, name)))
            .map(|name| {
                Issue::new(
                    location.as_str(),
                    self.issue_type.as_str(),
                    format!("{name} is not defined"),
                    format!("{name} must be defined in {location}"),
                    "Definition not found",
                    self.severity,
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
    fn import_detection() {
        assert!(imports_module("from payments.services import charge", "payments"));
        assert!(imports_module("import iabank.payments as p", "payments"));
        assert!(!imports_module("from payments_v2 import x", "payments"));
        assert!(!imports_module("# from payments import x", "payments"));
    }

    #[test]
    fn definition_detection() {
        let text = "class LoanViewSet(viewsets.ModelViewSet):\n    async def list(self):\n        pass\n";
        assert!(defines(text, "LoanViewSet"));
        assert!(defines(text, "list"));
        assert!(!defines(text, "Loan"));
    }

    #[test]
    fn module_coupling() {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("payments")).unwrap();
        write(dir.path().join("payments/__init__.py"), "").unwrap();
        write(dir.path().join("payments/services.py"), "from payments import models").unwrap();
        write(dir.path().join("notifications.py"), "").unwrap();
        write(dir.path().join("api.py"), "from notifications import send").unwrap();
        let check = ModuleCoupling {
            modules: vec!["payments".into(), "notifications".into(), "ledger".into()],
        };
        let issues = check.run(dir.path()).unwrap();
        let types: Vec<&str> = issues.iter().map(|i| i.issue_type.as_str()).collect();
        assert_eq!(types, vec!["isolated_module", "missing_module"]);
        assert_eq!(issues[0].file_path, "payments");
    }

    #[test]
    fn definitions_present() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("views.py"), "class LoanViewSet:\n    pass\n").unwrap();
        let check = DefinitionsPresent {
            files: vec!["views.py".into()],
            names: vec!["LoanViewSet".into(), "CustomerViewSet".into()],
            issue_type: "missing_view".into(),
            severity: Severity::High,
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].description, "CustomerViewSet is not defined");
    }
}
