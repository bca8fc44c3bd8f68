//! Keyword heuristics over the whole Blueprint text.
//!
//! Each function here reads the raw text (or the scanned [`Document`]) and
//! is independent of the others.

use std::collections::BTreeMap;

use super::markdown::Document;
use crate::model::{AuthMethod, Dependencies, DirectoryTree, Section};

/// Application names recognized when the Blueprint has no explicit list.
const WELL_KNOWN_APPS: &[&str] = &["core", "users", "customers", "operations", "finance"];

/// Backend packages worth tracking; anything else in `name = "1.0"` form is noise.
const KNOWN_BACKEND_DEPS: &[&str] = &[
    "django",
    "djangorestframework",
    "psycopg2-binary",
    "django-environ",
    "celery",
    "redis",
    "gunicorn",
    "structlog",
    "django-filter",
    "djangorestframework-simplejwt",
    "pytest",
    "pytest-django",
    "factory-boy",
    "pytest-cov",
    "black",
    "ruff",
    "pre-commit",
];

const BACKEND_FRAMEWORKS: &[&str] = &["django", "fastapi", "flask", "express", "rails", "spring"];
const FRONTEND_FRAMEWORKS: &[&str] = &["react", "vue", "angular", "svelte"];
const DATABASES: &[&str] = &["postgresql", "mysql", "sqlite", "mongodb"];

const TENANCY_MARKERS: &[&str] = &["multi-tenant", "tenant", "basetenantmodel", "tenant_id"];

const CONFIG_FILES: &[(&str, &str)] = &[
    (r"\.env(\.example)?", ".env.example"),
    (r"pyproject\.toml", "pyproject.toml"),
    (r"requirements\.txt", "requirements.txt"),
    (r"package\.json", "package.json"),
    (r"tsconfig\.json", "tsconfig.json"),
    (r"vite\.config\.[jt]s", "vite.config"),
    (r"settings\.py", "settings.py"),
    (r"\.gitignore", ".gitignore"),
    (r"\.pre-commit-config\.yaml", ".pre-commit-config.yaml"),
    (r"docker-compose\.ya?ml", "docker-compose.yml"),
    (r"\.github/workflows/", ".github/workflows"),
];

const DOC_FILES: &[(&str, &str)] = &[
    (r"README\.md", "README.md"),
    (r"CHANGELOG\.md", "CHANGELOG.md"),
    (r"CONTRIBUTING\.md", "CONTRIBUTING.md"),
    (r"\bLICENSE\b", "LICENSE"),
    (r"\bdocs/", "docs/"),
];

const DOCKER_FILES: &[(&str, &str)] = &[
    (r"Dockerfile", "Dockerfile"),
    (r"docker-compose\.ya?ml", "docker-compose.yml"),
    (r"\.dockerignore", ".dockerignore"),
];

const CI_HINTS: &[&str] = &[
    "github actions",
    "gitlab ci",
    "jenkins",
    "docker build",
    "docker push",
    "deploy",
];

fn contains_ci(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(&needle.to_lowercase())
}

fn push_unique(list: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Returns the project name and description.
#[must_use]
pub fn project_info(doc: &Document) -> (String, String) {
    let Some(title_idx) = doc.headings.iter().position(|h| h.level == 1) else {
        return (String::new(), String::new());
    };
    let raw = doc.headings[title_idx].text.as_str();
    let name = regex!(r"\s*\([^)]*\)\s*$")
        .map_or_else(|| raw.to_string(), |re| re.replace(raw, "").into_owned())
        .trim()
        .replace(':', " -");

    let description = doc
        .paragraphs
        .iter()
        .find(|p| p.heading.is_some_and(|h| h >= title_idx) && !p.text.is_empty())
        .map(|p| first_sentence(&p.text))
        .unwrap_or_default();

    (name, description)
}

fn first_sentence(text: &str) -> String {
    match text.find(". ") {
        Some(end) => text[..=end].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Returns the numbered outline of all headings.
#[must_use]
pub fn outline(doc: &Document) -> Vec<Section> {
    doc.headings
        .iter()
        .map(|h| {
            let numbered = regex!(r"^(\d+)\.?\s+(.+)$").and_then(|re| re.captures(&h.text));
            match numbered {
                Some(caps) => Section {
                    level: h.level,
                    number: caps[1].parse().ok(),
                    title: caps[2].trim().to_string(),
                },
                None => Section {
                    level: h.level,
                    number: None,
                    title: h.text.clone(),
                },
            }
        })
        .collect()
}

/// Technology stack: `(backend, frontend, database, architecture, testing)`.
#[must_use]
pub fn technology(text: &str) -> (String, String, String, String, String) {
    let lower = text.to_lowercase();
    let first_of = |candidates: &[&str]| {
        candidates
            .iter()
            .find(|c| word_present(&lower, c))
            .map(|c| (*c).to_string())
            .unwrap_or_default()
    };
    let architecture = if lower.contains("monolith") || lower.contains("monolito") {
        "monolith".to_string()
    } else if lower.contains("microservice") {
        "microservices".to_string()
    } else {
        String::new()
    };
    let testing = if lower.contains("pytest") {
        "pytest".to_string()
    } else if lower.contains("vitest") {
        "vitest".to_string()
    } else {
        String::new()
    };
    (
        first_of(BACKEND_FRAMEWORKS),
        first_of(FRONTEND_FRAMEWORKS),
        first_of(DATABASES),
        architecture,
        testing,
    )
}

fn word_present(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + word.len()..].chars().next();
        let boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
        boundary(before) && boundary(after)
    })
}

/// Declared application modules.
///
/// An explicit `backend_apps = [...]` list wins; otherwise directories in
/// the declared tree that hold `models.py` or `apps.py`; otherwise the
/// well-known names quoted in the text.
#[must_use]
pub fn apps(text: &str, tree: &DirectoryTree) -> Vec<String> {
    let explicit = regex!(r"(?s)backend_apps.*?\[([^\]]+)\]").and_then(|re| re.captures(text));
    if let Some(caps) = explicit {
        let mut apps = Vec::new();
        if let Some(re) = regex!(r#"['"](\w+)['"]"#) {
            for name in re.captures_iter(&caps[1]) {
                push_unique(&mut apps, &name[1]);
            }
        }
        return apps;
    }

    let mut from_tree = tree.dirs_containing("models.py");
    for dir in tree.dirs_containing("apps.py") {
        push_unique(&mut from_tree, dir);
    }
    if !from_tree.is_empty() {
        return from_tree;
    }

    let mut apps = Vec::new();
    if let Some(re) = regex!(r#"['"/](\w+)['"/]"#) {
        for caps in re.captures_iter(text) {
            let name = &caps[1];
            if WELL_KNOWN_APPS.contains(&name) {
                push_unique(&mut apps, name);
            }
        }
    }
    apps
}

/// Backend and frontend dependencies with pinned versions.
#[must_use]
pub fn dependencies(text: &str, doc: &Document) -> Dependencies {
    let mut deps = Dependencies::default();
    let record_backend = |deps: &mut Dependencies, name: &str, version: &str| {
        if KNOWN_BACKEND_DEPS.contains(&name.to_lowercase().as_str()) {
            let name = name.to_lowercase();
            push_unique(&mut deps.backend, name.clone());
            deps.pinned.insert(name, version.trim_end_matches('.').to_string());
        }
    };

    if let Some(re) = regex!(r#"(?m)^\s*"?(\w[\w-]*)"?\s*=\s*["^~>=]*([0-9][0-9.]*)"#) {
        for block in doc.blocks_tagged("toml") {
            for caps in re.captures_iter(&block.text) {
                record_backend(&mut deps, &caps[1], &caps[2]);
            }
        }
    }
    if let Some(re) = regex!(r#"([a-z][\w-]+)\s*[=:]\s*["^~>=]*([0-9][0-9.]*)"#) {
        for caps in re.captures_iter(text) {
            record_backend(&mut deps, &caps[1], &caps[2]);
        }
    }

    let dep_table = regex!(r#"(?s)"dependencies"\s*:\s*\{([^}]*)\}"#);
    let dep_entry = regex!(r#""([^"]+)"\s*:\s*"[\^~]*([0-9][0-9.]*)"#);
    if let (Some(table), Some(entry)) = (dep_table, dep_entry) {
        for block in doc.blocks_tagged("json") {
            for caps in table.captures_iter(&block.text) {
                for dep in entry.captures_iter(&caps[1]) {
                    push_unique(&mut deps.frontend, &dep[1]);
                    deps.pinned.insert(dep[1].to_string(), dep[2].to_string());
                }
            }
        }
    }

    deps
}

/// Multi-tenancy flag and the base model class it implies.
#[must_use]
pub fn multi_tenancy(text: &str) -> (bool, String) {
    let lower = text.to_lowercase();
    if TENANCY_MARKERS.iter().any(|m| lower.contains(m)) {
        (true, "BaseTenantModel".to_string())
    } else {
        (false, String::new())
    }
}

/// Authentication mechanism: JWT beats token beats session.
#[must_use]
pub fn authentication(text: &str) -> AuthMethod {
    let lower = text.to_lowercase();
    if lower.contains("jwt") || lower.contains("simplejwt") {
        AuthMethod::Jwt
    } else if lower.contains("token") {
        AuthMethod::Token
    } else {
        AuthMethod::Session
    }
}

fn mentioned(text: &str, table: &[(&str, &str)]) -> Vec<String> {
    let mut out = Vec::new();
    for (pattern, name) in table {
        let hit = regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .is_ok_and(|re| re.is_match(text));
        if hit {
            push_unique(&mut out, *name);
        }
    }
    out
}

/// Configuration files the Blueprint mentions.
#[must_use]
pub fn config_files(text: &str) -> Vec<String> {
    mentioned(text, CONFIG_FILES)
}

/// Documentation files the Blueprint mentions.
#[must_use]
pub fn doc_files(text: &str) -> Vec<String> {
    mentioned(text, DOC_FILES)
}

/// Container files the Blueprint mentions.
#[must_use]
pub fn docker_files(text: &str) -> Vec<String> {
    mentioned(text, DOCKER_FILES)
}

/// API style markers.
#[must_use]
pub fn api_patterns(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let lower = text.to_lowercase();
    if word_present(&lower, "rest") || lower.contains("restful") {
        out.push("REST".to_string());
    }
    if regex!(r"(?i)api/v\d+").is_some_and(|re| re.is_match(text)) {
        out.push("versioned".to_string());
    }
    if text.contains("DRF") || lower.contains("django rest framework") {
        out.push("DRF".to_string());
    }
    out
}

/// CI/CD hints.
#[must_use]
pub fn ci_cd(text: &str) -> Vec<String> {
    CI_HINTS
        .iter()
        .filter(|hint| contains_ci(text, hint))
        .map(|hint| (*hint).to_string())
        .collect()
}

/// Free-text expectations on key files.
#[must_use]
pub fn content_expectations(multi_tenancy: bool, database: &str) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();

    let mut settings = vec![
        "INSTALLED_APPS includes the project apps".to_string(),
        "REST_FRAMEWORK is configured".to_string(),
    ];
    if !database.is_empty() {
        settings.insert(1, format!("DATABASES uses {database}"));
    }
    if multi_tenancy {
        settings.push("tenancy middleware is configured".to_string());
    }
    out.insert("settings.py".to_string(), settings);

    if multi_tenancy {
        out.insert(
            "models.py".to_string(),
            vec![
                "BaseTenantModel is defined".to_string(),
                "models inherit from BaseTenantModel".to_string(),
                "tenant field is present".to_string(),
            ],
        );
    }

    out.insert(
        "pyproject.toml".to_string(),
        vec![
            "framework dependency is declared".to_string(),
            "REST framework dependency is declared".to_string(),
            "database driver is declared".to_string(),
            "development dependencies are configured".to_string(),
        ],
    );

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extractor::markdown::scan;

    #[test]
    fn project_info_strips_parenthetical() {
        let doc = scan("# IABANK: Loans (v1.0)\n\nA lending platform. It has tenants.\n");
        let (name, desc) = project_info(&doc);
        assert_eq!(name, "IABANK - Loans");
        assert_eq!(desc, "A lending platform.");
    }

    #[test]
    fn technology_detects_stack() {
        let (backend, frontend, db, arch, testing) =
            technology("Django + React on PostgreSQL, a modular monolith tested with pytest.");
        assert_eq!(backend, "django");
        assert_eq!(frontend, "react");
        assert_eq!(db, "postgresql");
        assert_eq!(arch, "monolith");
        assert_eq!(testing, "pytest");
    }

    #[test]
    fn explicit_app_list_wins() {
        let apps = apps("backend_apps = ['core', 'loans']\n'users'", &DirectoryTree::new());
        assert_eq!(apps, vec!["core", "loans"]);
    }

    #[test]
    fn well_known_apps_fallback() {
        let apps = apps("INSTALLED_APPS = ['users', 'core', 'other']", &DirectoryTree::new());
        assert_eq!(apps, vec!["users", "core"]);
    }

    #[test]
    fn dependencies_from_toml_and_json() {
        let text = "```toml\n[tool.poetry.dependencies]\ndjango = \"^4.2\"\nnumpy = \"1.0\"\n```\n\n```json\n{ \"dependencies\": { \"react\": \"^18.2.0\" } }\n```\n";
        let doc = scan(text);
        let deps = dependencies(text, &doc);
        assert_eq!(deps.backend, vec!["django"]);
        assert_eq!(deps.frontend, vec!["react"]);
        assert_eq!(deps.pinned.get("django").map(String::as_str), Some("4.2"));
        assert_eq!(deps.pinned.get("react").map(String::as_str), Some("18.2.0"));
    }

    #[test]
    fn authentication_precedence() {
        assert_eq!(authentication("uses simplejwt"), AuthMethod::Jwt);
        assert_eq!(authentication("API Token auth"), AuthMethod::Token);
        assert_eq!(authentication("cookies"), AuthMethod::Session);
    }

    #[test]
    fn tenancy_sets_base_model() {
        assert_eq!(
            multi_tenancy("Every row carries tenant_id"),
            (true, "BaseTenantModel".to_string())
        );
        assert!(!multi_tenancy("single customer").0);
    }

    #[test]
    fn outline_reads_numbers() {
        let doc = scan("# T\n\n## 7. Directory Structure\n\n## Appendix\n");
        let sections = outline(&doc);
        assert_eq!(sections[1].number, Some(7));
        assert_eq!(sections[1].title, "Directory Structure");
        assert_eq!(sections[2].number, None);
    }
}
