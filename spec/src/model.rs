//! Core Blueprint model types.
//!
//! A [`Specification`] is built once per Blueprint read and is immutable
//! afterwards. Every field defaults to empty when the corresponding section
//! of the Blueprint is absent; missing content is reported through
//! [`ExtractionWarning`](crate::extractor::ExtractionWarning) rather than
//! through errors.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Authentication mechanism declared by the Blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthMethod {
    /// JSON Web Tokens (including `simplejwt`).
    Jwt,
    /// Opaque API tokens.
    Token,
    /// Server-side sessions (the fallback).
    #[default]
    Session,
}

impl AuthMethod {
    /// Returns the canonical display label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::Jwt => "JWT",
            AuthMethod::Token => "Token",
            AuthMethod::Session => "Session",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a relationship field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// `models.ForeignKey`.
    ForeignKey,
    /// `models.OneToOneField`.
    OneToOne,
    /// `models.ManyToManyField`.
    ManyToMany,
}

impl RelationKind {
    /// Parses the ORM constructor name (e.g. `"ForeignKey"`).
    #[must_use]
    pub fn from_constructor(name: &str) -> Option<Self> {
        match name {
            "ForeignKey" => Some(RelationKind::ForeignKey),
            "OneToOneField" => Some(RelationKind::OneToOne),
            "ManyToManyField" => Some(RelationKind::ManyToMany),
            _ => None,
        }
    }
}

/// The declared type of a model field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A plain column such as `CharField` or `DecimalField`.
    Plain {
        /// ORM constructor name.
        constructor: String,
    },
    /// A relationship to another model.
    Relation {
        /// Relationship cardinality.
        relation: RelationKind,
        /// Target model name as written (may be `app.Model`).
        target: String,
    },
}

/// One data model declared in a Blueprint code block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    /// Class name (e.g. `"Loan"`).
    pub name: String,
    /// Base classes as written between the parentheses.
    pub bases: String,
    /// Field names in declaration order, de-duplicated.
    pub fields: Vec<String>,
    /// Field name to declared kind.
    pub field_kinds: BTreeMap<String, FieldKind>,
    /// Relationship targets in declaration order, de-duplicated.
    pub relations: Vec<String>,
    /// Public method names.
    pub methods: Vec<String>,
    /// True when the model declares `abstract = True`.
    pub is_abstract: bool,
}

impl ModelSpec {
    /// Returns true if the model declares a field with this name.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}

/// Nested directory layout: names map to `None` (file) or a nested tree
/// (directory). Serialized as `null` or a nested JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryTree(pub BTreeMap<String, Option<DirectoryTree>>);

impl DirectoryTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flattens the tree into relative paths, directories suffixed with `/`.
    ///
    /// Parents always precede their children.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, node) in &self.0 {
            let path = format!("{prefix}{name}");
            match node {
                Some(child) => {
                    out.push(format!("{path}/"));
                    child.collect_paths(&format!("{path}/"), out);
                }
                None => out.push(path),
            }
        }
    }

    /// Returns the names of directories that directly contain `file_name`.
    #[must_use]
    pub fn dirs_containing(&self, file_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_dirs_containing(file_name, &mut out);
        out
    }

    fn collect_dirs_containing(&self, file_name: &str, out: &mut Vec<String>) {
        for (name, node) in &self.0 {
            if let Some(child) = node {
                if matches!(child.0.get(file_name), Some(None)) && !out.contains(name) {
                    out.push(name.clone());
                }
                child.collect_dirs_containing(file_name, out);
            }
        }
    }
}

/// Declared dependencies split by tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependencies {
    /// Backend package names in first-seen order.
    pub backend: Vec<String>,
    /// Frontend package names in first-seen order.
    pub frontend: Vec<String>,
    /// Pinned versions for any package whose version the Blueprint states.
    pub pinned: BTreeMap<String, String>,
}

/// A numbered Blueprint section heading (`## 7. Directory Structure`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading level (1 for `#`, 2 for `##`, ...).
    pub level: u8,
    /// Leading section number when present.
    pub number: Option<u32>,
    /// Heading text without the number.
    pub title: String,
}

/// The structured view of a Blueprint document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Specification {
    /// Project name from the first level-1 heading.
    pub project_name: String,
    /// One-sentence project description.
    pub project_description: String,
    /// Backend framework (lowercase, e.g. `"django"`), empty if unknown.
    pub backend_framework: String,
    /// Frontend framework (lowercase, e.g. `"react"`), empty if unknown.
    pub frontend_framework: String,
    /// Database engine (lowercase, e.g. `"postgresql"`), empty if unknown.
    pub database: String,
    /// Architecture style (`"monolith"` or `"microservices"`).
    pub architecture: String,
    /// Test framework (`"pytest"` or `"vitest"`), empty if unknown.
    pub testing_framework: String,
    /// Declared application modules in first-seen order.
    pub apps: Vec<String>,
    /// Declared data models in declaration order.
    pub models: Vec<ModelSpec>,
    /// Model name to relationship targets.
    pub relationships: BTreeMap<String, Vec<String>>,
    /// Declared directory layout.
    pub directory_tree: DirectoryTree,
    /// Declared dependencies.
    pub dependencies: Dependencies,
    /// Configuration files mentioned by the Blueprint.
    pub config_files: Vec<String>,
    /// Documentation files mentioned by the Blueprint.
    pub doc_files: Vec<String>,
    /// Container files mentioned by the Blueprint.
    pub docker_files: Vec<String>,
    /// API style markers (`REST`, `versioned`, `DRF`).
    pub api_patterns: Vec<String>,
    /// CI/CD hints (`github actions`, `deploy`, ...).
    pub ci_cd: Vec<String>,
    /// True when the Blueprint describes a multi-tenant system.
    pub multi_tenancy: bool,
    /// Abstract base model every tenant-scoped model inherits from.
    pub base_model_class: String,
    /// Authentication mechanism.
    pub authentication: AuthMethod,
    /// File name to free-text content expectations.
    pub content_expectations: BTreeMap<String, Vec<String>>,
    /// Outline of headings in document order.
    pub outline: Vec<Section>,
}

impl Specification {
    /// Looks up a model by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Returns the names of all declared models in declaration order.
    #[must_use]
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Returns true if the backend framework is Django.
    #[must_use]
    pub fn is_django(&self) -> bool {
        self.backend_framework == "django"
    }

    /// Returns true if the Blueprint mentions a documentation file with
    /// this name (case-insensitive).
    #[must_use]
    pub fn mentions_doc(&self, name: &str) -> bool {
        self.doc_files.iter().any(|d| d.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tree() -> DirectoryTree {
        let mut core = DirectoryTree::new();
        core.0.insert("models.py".into(), None);
        core.0.insert("apps.py".into(), None);
        let mut backend = DirectoryTree::new();
        backend.0.insert("core".into(), Some(core));
        backend.0.insert("manage.py".into(), None);
        let mut root = DirectoryTree::new();
        root.0.insert("backend".into(), Some(backend));
        root
    }

    #[test]
    fn paths_list_parents_first() {
        let paths = tree().paths();
        assert_eq!(
            paths,
            vec![
                "backend/",
                "backend/core/",
                "backend/core/apps.py",
                "backend/core/models.py",
                "backend/manage.py",
            ]
        );
    }

    #[test]
    fn dirs_containing_finds_apps() {
        assert_eq!(tree().dirs_containing("models.py"), vec!["core"]);
        assert!(tree().dirs_containing("views.py").is_empty());
    }

    #[test]
    fn tree_serializes_files_as_null() {
        let json = serde_json::to_value(tree()).unwrap();
        assert!(json["backend"]["manage.py"].is_null());
        assert!(json["backend"]["core"].is_object());
    }
}
