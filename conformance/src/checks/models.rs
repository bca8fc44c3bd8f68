//! Data-model checks over Python model modules and migrations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fs;
use super::{Check, CheckError};
use crate::report::{Issue, Severity};

/// A top-level Python class found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyClass {
    /// Class name.
    pub name: String,
    /// Base-class list as written.
    pub bases: String,
    /// Indented body text.
    pub body: String,
    /// File the class was found in, relative to the root.
    pub file: String,
}

/// Extracts top-level classes from Python source.
#[must_use]
pub fn python_classes(text: &str, file: &str) -> Vec<PyClass> {
    let mut out: Vec<PyClass> = Vec::new();
    let mut open = false;
    for line in text.lines() {
        let header = regex!(r"^class\s+(\w+)\s*(?:\(([^)]*)\))?\s*:").and_then(|re| re.captures(line));
        if let Some(caps) = header {
            out.push(PyClass {
                name: caps[1].to_string(),
                bases: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                body: String::new(),
                file: file.to_string(),
            });
            open = true;
            continue;
        }
        if !line.is_empty() && !line.starts_with(char::is_whitespace) {
            open = false;
            continue;
        }
        if let Some(class) = out.last_mut().filter(|_| open) {
            class.body.push_str(line);
            class.body.push('\n');
        }
    }
    out
}

/// Collects classes from every file matching any of `patterns`.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory or a pattern is
/// invalid.
pub fn classes_in(root: &Path, patterns: &[String]) -> Result<Vec<PyClass>, CheckError> {
    let mut out = Vec::new();
    for file in fs::files_matching(root, patterns)? {
        if let Some(text) = fs::read_text(&file) {
            out.extend(python_classes(&text, &fs::relative(root, &file)));
        }
    }
    Ok(out)
}

fn missing_model(model: &str, patterns: &[String]) -> Issue {
    Issue::new(
        patterns.join(", "),
        "missing_model",
        format!("Model {model} is not defined"),
        format!("class {model} must be declared"),
        "Class not found",
        Severity::High,
    )
}

fn default_model_files() -> Vec<String> {
    vec!["models.py".to_string(), "models/*.py".to_string()]
}

/// Declared models must exist as classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelClasses {
    /// Patterns selecting model modules.
    #[serde(default = "default_model_files")]
    pub files: Vec<String>,
    /// Model class names.
    pub models: Vec<String>,
}

impl Check for ModelClasses {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let classes = classes_in(root, &self.files)?;
        Ok(self
            .models
            .iter()
            .filter(|m| !classes.iter().any(|c| &c.name == *m))
            .map(|m| missing_model(m, &self.files))
            .collect())
    }
}

fn declares_field(body: &str, field: &str) -> bool {
    body.lines().any(|line| {
        let line = line.trim_start();
        line.strip_prefix(field).is_some_and(|rest| {
            let rest = rest.trim_start();
            rest.starts_with('=') || rest.starts_with(':')
        })
    })
}

/// One model must declare the listed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFields {
    /// Patterns selecting model modules.
    #[serde(default = "default_model_files")]
    pub files: Vec<String>,
    /// Model class name.
    pub model: String,
    /// Required field names.
    pub fields: Vec<String>,
}

impl Check for ModelFields {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let classes = classes_in(root, &self.files)?;
        let Some(class) = classes.iter().find(|c| c.name == self.model) else {
            return Ok(vec![missing_model(&self.model, &self.files)]);
        };
        Ok(self
            .fields
            .iter()
            .filter(|f| !declares_field(&class.body, f))
            .map(|f| {
                Issue::new(
                    class.file.as_str(),
                    "missing_model_field",
                    format!("{}.{f} is not declared", self.model),
                    format!("Field {f} must be declared on {}", self.model),
                    "Field not found",
                    Severity::Medium,
                )
            })
            .collect())
    }
}

/// A relationship one model must hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRequirement {
    /// Declaring model.
    pub model: String,
    /// Target model (bare or `app.Model`).
    pub target: String,
}

/// Declared relationships must appear as relationship fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRelationships {
    /// Patterns selecting model modules.
    #[serde(default = "default_model_files")]
    pub files: Vec<String>,
    /// Required relationships.
    pub relations: Vec<RelationRequirement>,
}

fn relates_to(body: &str, target: &str) -> bool {
    let bare = target.rsplit('.').next().unwrap_or(target);
    let Some(re) = regex!(r#"(?:ForeignKey|OneToOneField|ManyToManyField)\s*\(\s*['"]?([\w.]+)"#) else {
        return false;
    };
    re.captures_iter(body).any(|caps| {
        let found = &caps[1];
        found == target || found.rsplit('.').next() == Some(bare)
    })
}

impl Check for ModelRelationships {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let classes = classes_in(root, &self.files)?;
        let mut issues = Vec::new();
        for rel in &self.relations {
            // Absent models are reported by the model-class rule.
            let Some(class) = classes.iter().find(|c| c.name == rel.model) else {
                continue;
            };
            if !relates_to(&class.body, &rel.target) {
                issues.push(Issue::new(
                    class.file.as_str(),
                    "missing_model_relationship",
                    format!("{} has no relationship to {}", rel.model, rel.target),
                    format!("{} must reference {}", rel.model, rel.target),
                    "No ForeignKey/OneToOneField/ManyToManyField to target",
                    Severity::Medium,
                ));
            }
        }
        Ok(issues)
    }
}

/// Abstract tenant base model and the models that must inherit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantBaseModel {
    /// Patterns selecting model modules.
    #[serde(default = "default_model_files")]
    pub files: Vec<String>,
    /// Base class name (e.g. `BaseTenantModel`).
    pub base_class: String,
    /// Field carrying the tenant reference.
    pub tenant_field: String,
    /// Models that must inherit the base class.
    pub models: Vec<String>,
}

impl Check for TenantBaseModel {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let classes = classes_in(root, &self.files)?;
        let mut issues = Vec::new();

        match classes.iter().find(|c| c.name == self.base_class) {
            None => issues.push(Issue::new(
                self.files.join(", "),
                "missing_base_model",
                format!("{} is not defined", self.base_class),
                format!("Abstract {} must be defined", self.base_class),
                "Class not found",
                Severity::High,
            )),
            Some(base) => {
                if !declares_field(&base.body, &self.tenant_field) {
                    issues.push(Issue::new(
                        base.file.as_str(),
                        "missing_model_field",
                        format!("{} has no {} field", self.base_class, self.tenant_field),
                        format!("{} must declare {}", self.base_class, self.tenant_field),
                        "Field not found",
                        Severity::High,
                    ));
                }
                let is_abstract =
                    regex!(r"abstract\s*=\s*True").is_some_and(|re| re.is_match(&base.body));
                if !is_abstract {
                    issues.push(Issue::new(
                        base.file.as_str(),
                        "base_model_not_abstract",
                        format!("{} is not abstract", self.base_class),
                        "Meta.abstract = True",
                        "Concrete base model",
                        Severity::Medium,
                    ));
                }
            }
        }

        for model in &self.models {
            if let Some(class) = classes.iter().find(|c| &c.name == model) {
                if !class.bases.contains(self.base_class.as_str()) {
                    issues.push(Issue::new(
                        class.file.as_str(),
                        "model_not_tenant_scoped",
                        format!("{model} does not inherit {}", self.base_class),
                        format!("class {model}({})", self.base_class),
                        format!("class {model}({})", class.bases),
                        Severity::Medium,
                    ));
                }
            }
        }
        Ok(issues)
    }
}

/// Migration presence, required operations and reversibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migrations {
    /// Applications that must each have at least one migration.
    pub apps: Vec<String>,
    /// Operation names (`CreateModel`, `AddField`) that must appear.
    pub operations: Vec<String>,
    /// Report `RunPython` calls without a reverse function.
    pub require_reversible: bool,
}

fn migration_files(root: &Path) -> Result<Vec<PathBuf>, CheckError> {
    Ok(fs::find_files(root, "migrations/*.py")?
        .into_iter()
        .filter(|f| f.file_name().is_some_and(|n| n != "__init__.py"))
        .collect())
}

/// Returns the argument text of each `RunPython(...)` call.
#[must_use]
pub fn run_python_calls(text: &str) -> Vec<String> {
    let mut calls = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("RunPython(") {
        let args_start = start + "RunPython(".len();
        let mut depth = 1usize;
        let mut end = None;
        for (i, c) in rest[args_start..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(args_start + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(end) = end else {
            calls.push(rest[args_start..].to_string());
            break;
        };
        calls.push(rest[args_start..end].to_string());
        rest = &rest[end..];
    }
    calls
}

fn is_reversible(args: &str) -> bool {
    if args.contains("reverse_code") {
        return true;
    }
    let mut depth = 0i32;
    for c in args.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

impl Check for Migrations {
    fn run(&self, root: &Path) -> Result<Vec<Issue>, CheckError> {
        let files = migration_files(root)?;
        let mut issues = Vec::new();

        for app in &self.apps {
            let has_migration = files.iter().any(|f| {
                f.parent()
                    .and_then(Path::parent)
                    .and_then(Path::file_name)
                    .is_some_and(|n| n == app.as_str())
            });
            if !has_migration {
                issues.push(Issue::new(
                    format!("{app}/migrations/"),
                    "missing_migrations",
                    format!("Application {app} has no migrations"),
                    format!("{app}/migrations/ must contain at least one migration"),
                    "No migration files",
                    Severity::Medium,
                ));
            }
        }

        let texts: Vec<(String, String)> = files
            .iter()
            .filter_map(|f| fs::read_text(f).map(|t| (fs::relative(root, f), t)))
            .collect();

        for op in &self.operations {
            if !texts.iter().any(|(_, t)| t.contains(op.as_str())) {
                issues.push(Issue::new(
                    "migrations/",
                    "missing_migration_operation",
                    format!("No migration performs {op}"),
                    format!("A migration must contain migrations.{op}"),
                    "Operation not found",
                    Severity::Medium,
                ));
            }
        }

        if self.require_reversible {
            for (rel, text) in &texts {
                for call in run_python_calls(text) {
                    if !is_reversible(&call) {
                        issues.push(Issue::new(
                            rel.as_str(),
                            "irreversible_migration",
                            format!("{rel}: RunPython without reverse_code"),
                            "RunPython(forward, reverse_code=backward)",
                            format!("RunPython({})", call.trim()),
                            Severity::High,
                        ));
                    }
                }
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

    const MODELS: &str = r#""""Loan models."""
from django.db import models

class BaseTenantModel(models.Model):
    tenant = models.ForeignKey("core.Tenant", on_delete=models.CASCADE)

    class Meta:
        abstract = True

class Loan(BaseTenantModel):
    customer = models.ForeignKey("customers.Customer", on_delete=models.PROTECT)
    amount = models.DecimalField(max_digits=12, decimal_places=2)

def helper():
    status = 1

class Payment(models.Model):
    value: int = 0
"#;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("loans")).unwrap();
        write(dir.path().join("loans/models.py"), MODELS).unwrap();
        dir
    }

    #[test]
    fn classes_close_at_top_level_statements() {
        let classes = python_classes(MODELS, "m.py");
        let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["BaseTenantModel", "Loan", "Payment"]);
        assert!(!classes[1].body.contains("status"));
        assert_eq!(classes[1].bases, "BaseTenantModel");
    }

    #[test]
    fn model_classes_and_fields() {
        let dir = tree();
        let classes = ModelClasses {
            files: default_model_files(),
            models: vec!["Loan".into(), "Installment".into()],
        };
        let issues = classes.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "missing_model");

        let fields = ModelFields {
            files: default_model_files(),
            model: "Loan".into(),
            fields: vec!["amount".into(), "status".into()],
        };
        let issues = fields.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].description, "Loan.status is not declared");

        let annotated = ModelFields {
            files: default_model_files(),
            model: "Payment".into(),
            fields: vec!["value".into()],
        };
        assert!(annotated.run(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn relationships_match_qualified_targets() {
        let dir = tree();
        let check = ModelRelationships {
            files: default_model_files(),
            relations: vec![
                RelationRequirement {
                    model: "Loan".into(),
                    target: "Customer".into(),
                },
                RelationRequirement {
                    model: "Loan".into(),
                    target: "Installment".into(),
                },
            ],
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.contains("Installment"));
    }

    #[test]
    fn tenant_base_model() {
        let dir = tree();
        let check = TenantBaseModel {
            files: default_model_files(),
            base_class: "BaseTenantModel".into(),
            tenant_field: "tenant".into(),
            models: vec!["Loan".into(), "Payment".into()],
        };
        let issues = check.run(dir.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "model_not_tenant_scoped");
    }

    #[test]
    fn run_python_reversibility() {
        let calls = run_python_calls(
            "ops = [migrations.RunPython(forwards), migrations.RunPython(fwd, back), migrations.RunPython(f(x), reverse_code=b)]",
        );
        assert_eq!(calls.len(), 3);
        assert!(!is_reversible(&calls[0]));
        assert!(is_reversible(&calls[1]));
        assert!(is_reversible(&calls[2]));
    }

    #[test]
    fn migrations_check() {
        let dir = tempfile::tempdir().unwrap();
        create_dir_all(dir.path().join("loans/migrations")).unwrap();
        write(dir.path().join("loans/migrations/__init__.py"), "").unwrap();
        write(
            dir.path().join("loans/migrations/0001_initial.py"),
            "operations = [migrations.CreateModel(name='Loan'), migrations.RunPython(seed)]",
        )
        .unwrap();
        let check = Migrations {
            apps: vec!["loans".into(), "customers".into()],
            operations: vec!["CreateModel".into(), "AddField".into()],
            require_reversible: true,
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
                "missing_migrations",
                "missing_migration_operation",
                "irreversible_migration"
            ]
        );
    }
}
