//! Scaffold phase: the project skeleton the Blueprint lays out.
//!
//! Scaffold rules check presence and shape only (files, directories,
//! configuration content, module docstrings). Implemented behavior is left
//! to the target phases.

use agv_conformance::checks::content::{FileContent, ModuleDocstrings, ReadmeSections, TextPresent};
use agv_conformance::checks::dependencies::{DeclaredDependencies, DependencyRequirement};
use agv_conformance::checks::models::TenantBaseModel;
use agv_conformance::checks::structure::{AppStructure, CiPipeline, FilePatterns, RequiredPaths};
use agv_conformance::checks::testing::TestLayout;
use agv_conformance::{Category, CheckSpec, ContentRequirement, Rule, Severity};
use agv_spec::Specification;

use crate::generator::{clean_name, requirement, RuleGenerator};

/// Documentation files checked when the Blueprint mentions them.
const ESSENTIAL_DOCS: &[&str] = &["README.md", "LICENSE", "CHANGELOG.md", "CONTRIBUTING.md"];

/// Dependency manifests searched for declared packages.
const DEPENDENCY_MANIFESTS: &[&str] = &["pyproject.toml", "requirements*.txt"];

/// Generates scaffold rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaffoldGenerator;

impl RuleGenerator for ScaffoldGenerator {
    fn generate_rules(&self, spec: &Specification) -> Vec<Rule> {
        let mut rules = Vec::new();
        rules.extend(directory_structure(spec));
        rules.push(gitignore(spec));
        if spec.is_django() || spec.config_files.iter().any(|f| f == "pyproject.toml") {
            rules.push(pyproject());
        }
        rules.push(precommit());
        rules.push(env_example());
        rules.extend(content_expectations(spec));
        rules.extend(critical_dependencies(spec));
        if spec.is_django() {
            rules.push(settings_module());
        }
        rules.extend(multi_tenancy(spec));
        rules.extend(app_models(spec));
        rules.extend(app_structure(spec));
        rules.extend(ci_pipeline(spec));
        rules.extend(test_structure(spec));
        rules.extend(documentation(spec));
        rules.extend(docker(spec));
        rules.push(quality_tools());
        rules
    }
}

fn directory_structure(spec: &Specification) -> Option<Rule> {
    let paths = spec.directory_tree.paths();
    if paths.is_empty() {
        return None;
    }
    Some(Rule::new(
        "validate_directory_structure",
        "Directory layout declared by the Blueprint",
        Severity::High,
        Category::Structure,
        CheckSpec::RequiredPaths(RequiredPaths { paths }),
    ))
}

fn needles(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn gitignore(spec: &Specification) -> Rule {
    let mut requirements = vec![
        ContentRequirement::new("Python bytecode caches are ignored", &["__pycache__"], Severity::Medium),
        ContentRequirement::new("Compiled Python files are ignored", &["*.py[cod]", "*.pyc"], Severity::Medium),
        ContentRequirement::new("Local environment files are ignored", &[".env"], Severity::High),
    ];
    if !spec.frontend_framework.is_empty() {
        requirements.push(ContentRequirement::new(
            "Frontend dependencies are ignored",
            &["node_modules"],
            Severity::Medium,
        ));
    }
    Rule::new(
        "validate_gitignore_content",
        ".gitignore covers build artifacts and secrets",
        Severity::High,
        Category::Content,
        CheckSpec::FileContent(FileContent {
            file: ".gitignore".into(),
            missing_severity: Severity::Critical,
            requirements,
        }),
    )
}

fn pyproject() -> Rule {
    Rule::new(
        "validate_pyproject_content",
        "pyproject.toml configures the code-quality tools",
        Severity::High,
        Category::Content,
        CheckSpec::FileContent(FileContent {
            file: "pyproject.toml".into(),
            missing_severity: Severity::High,
            requirements: vec![
                ContentRequirement::new("Linter is configured", &["[tool.ruff]"], Severity::Medium),
                ContentRequirement::new("Formatter is configured", &["[tool.black]"], Severity::Medium),
                ContentRequirement::new("Line length is set", &["line-length"], Severity::Medium),
            ],
        }),
    )
}

fn precommit() -> Rule {
    let hooks = ["pre-commit-hooks", "trailing-whitespace", "end-of-file-fixer", "black", "ruff"];
    Rule::new(
        "validate_precommit_config_content",
        ".pre-commit-config.yaml declares the standard hooks",
        Severity::Medium,
        Category::Content,
        CheckSpec::FileContent(FileContent {
            file: ".pre-commit-config.yaml".into(),
            missing_severity: Severity::Medium,
            requirements: hooks
                .iter()
                .map(|h| requirement(format!("Hook {h} is configured"), needles(&[*h]), Severity::Medium))
                .collect(),
        }),
    )
}

fn env_example() -> Rule {
    let vars = ["DEBUG", "SECRET_KEY", "DATABASE_URL"];
    Rule::new(
        "validate_env_example_file",
        ".env.example documents the basic environment variables",
        Severity::Medium,
        Category::Content,
        CheckSpec::FileContent(FileContent {
            file: ".env.example".into(),
            missing_severity: Severity::Medium,
            requirements: vars
                .iter()
                .map(|v| requirement(format!("{v} is documented"), needles(&[*v]), Severity::Medium))
                .collect(),
        }),
    )
}

/// Maps a free-text content expectation onto the text that satisfies it.
/// Expectations the Specification cannot make concrete yield `None`.
fn expectation_needles(expectation: &str, spec: &Specification) -> Option<Vec<String>> {
    let e = expectation.to_lowercase();
    let base = spec.base_model_class.as_str();
    let found = if e.contains("installed_apps") {
        needles(&["INSTALLED_APPS"])
    } else if e.starts_with("databases uses") {
        vec![spec.database.clone()]
    } else if e.contains("rest_framework") {
        needles(&["REST_FRAMEWORK"])
    } else if e.contains("tenancy middleware") {
        needles(&["TenantMiddleware", "tenancy.middleware", "tenants.middleware"])
    } else if e.contains("inherit from") && !base.is_empty() {
        vec![format!("({base})")]
    } else if e.ends_with("is defined") && !base.is_empty() {
        vec![format!("class {base}")]
    } else if e.contains("tenant field") {
        needles(&["tenant =", "tenant="])
    } else if e.contains("rest framework dependency") {
        if !spec.is_django() {
            return None;
        }
        needles(&["djangorestframework"])
    } else if e.contains("framework dependency") {
        if spec.backend_framework.is_empty() {
            return None;
        }
        vec![spec.backend_framework.clone()]
    } else if e.contains("database driver") {
        match spec.database.as_str() {
            "postgresql" => needles(&["psycopg"]),
            "mysql" => needles(&["mysqlclient", "pymysql"]),
            _ => return None,
        }
    } else if e.contains("development dependencies") {
        needles(&[
            "[tool.poetry.group.dev",
            "[tool.poetry.dev-dependencies]",
            "[project.optional-dependencies]",
            "[dependency-groups]",
        ])
    } else {
        return None;
    };
    (!found.iter().any(String::is_empty)).then_some(found)
}

fn content_expectations(spec: &Specification) -> Vec<Rule> {
    spec.content_expectations
        .iter()
        .filter_map(|(file, expectations)| {
            let requirements: Vec<ContentRequirement> = expectations
                .iter()
                .filter_map(|e| {
                    expectation_needles(e, spec).map(|n| requirement(e.as_str(), n, Severity::High))
                })
                .collect();
            if requirements.is_empty() {
                return None;
            }
            // Several copies of the file (one models.py per app): any copy may satisfy.
            let check = if spec.directory_tree.dirs_containing(file).len() > 1 {
                CheckSpec::TextPresent(TextPresent {
                    files: vec![file.clone()],
                    issue_type: "missing_content".into(),
                    requirements,
                })
            } else {
                CheckSpec::FileContent(FileContent {
                    file: file.clone(),
                    missing_severity: Severity::High,
                    requirements,
                })
            };
            Some(Rule::new(
                format!("validate_content_{}", clean_name(file)),
                format!("Content expected in {file}"),
                Severity::High,
                Category::Content,
                check,
            ))
        })
        .collect()
}

/// Declared backend packages, or the framework's defaults when the
/// Blueprint lists none.
fn critical_packages(spec: &Specification) -> Vec<String> {
    let declared: Vec<String> = spec
        .dependencies
        .backend
        .iter()
        .filter(|d| !d.eq_ignore_ascii_case("python"))
        .cloned()
        .collect();
    if !declared.is_empty() || !spec.is_django() {
        return declared;
    }
    let mut defaults = needles(&["django", "djangorestframework"]);
    match spec.database.as_str() {
        "postgresql" => defaults.push("psycopg2-binary".into()),
        "mysql" => defaults.push("mysqlclient".into()),
        _ => {}
    }
    defaults
}

fn critical_dependencies(spec: &Specification) -> Vec<Rule> {
    critical_packages(spec)
        .into_iter()
        .map(|name| {
            let version = spec.dependencies.pinned.get(&name).cloned();
            Rule::new(
                format!("validate_dependency_{}", clean_name(&name)),
                format!("Critical dependency {name} is declared"),
                Severity::High,
                Category::Dependencies,
                CheckSpec::DeclaredDependencies(DeclaredDependencies {
                    manifests: needles(DEPENDENCY_MANIFESTS),
                    packages: vec![DependencyRequirement {
                        name,
                        version,
                        severity: Severity::High,
                    }],
                }),
            )
        })
        .collect()
}

fn settings_module() -> Rule {
    Rule::new(
        "validate_django_settings_advanced",
        "settings.py exists and opens with a module docstring",
        Severity::High,
        Category::Content,
        CheckSpec::ModuleDocstrings(ModuleDocstrings {
            pattern: "settings.py".into(),
            packages_only: false,
            missing_severity: Some(Severity::High),
            severity: Severity::Medium,
        }),
    )
}

fn multi_tenancy(spec: &Specification) -> Option<Rule> {
    if !spec.multi_tenancy || spec.base_model_class.is_empty() {
        return None;
    }
    let base = spec.base_model_class.as_str();
    let models = spec
        .models
        .iter()
        .filter(|m| m.name != base && m.bases.split(',').any(|b| b.trim() == base))
        .map(|m| m.name.clone())
        .collect();
    Some(Rule::new(
        "validate_multi_tenancy_implementation",
        format!("Abstract {base} carries the tenant and scopes the models"),
        Severity::High,
        Category::Models,
        CheckSpec::TenantBaseModel(TenantBaseModel {
            files: needles(&["models.py", "models/*.py"]),
            base_class: base.to_string(),
            tenant_field: "tenant".into(),
            models,
        }),
    ))
}

fn app_models(spec: &Specification) -> Vec<Rule> {
    if !spec.is_django() || spec.apps.is_empty() {
        return Vec::new();
    }
    vec![
        Rule::new(
            "validate_django_models",
            "Every application has a models module",
            Severity::High,
            Category::Models,
            CheckSpec::FilePatterns(FilePatterns {
                patterns: spec.apps.iter().map(|a| format!("{a}/models.py")).collect(),
                issue_type: "missing_file".into(),
                severity: Severity::High,
            }),
        ),
        Rule::new(
            "validate_model_files_docstrings",
            "Model modules open with a docstring",
            Severity::Medium,
            Category::Content,
            CheckSpec::ModuleDocstrings(ModuleDocstrings {
                pattern: "models.py".into(),
                packages_only: true,
                missing_severity: None,
                severity: Severity::Medium,
            }),
        ),
    ]
}

fn app_structure(spec: &Specification) -> Option<Rule> {
    if !spec.is_django() || spec.apps.is_empty() {
        return None;
    }
    Some(Rule::new(
        "validate_django_apps_structure",
        "Applications carry the standard modules and a tests package",
        Severity::High,
        Category::Structure,
        CheckSpec::AppStructure(AppStructure {
            apps: spec.apps.clone(),
            required_files: needles(&["models.py", "views.py", "apps.py", "__init__.py"]),
            require_tests_dir: true,
        }),
    ))
}

fn ci_pipeline(spec: &Specification) -> Option<Rule> {
    if spec.ci_cd.is_empty() {
        return None;
    }
    Some(Rule::new(
        "validate_github_actions_pipeline",
        "CI workflow runs tests, lint and build",
        Severity::Medium,
        Category::Structure,
        CheckSpec::CiPipeline(CiPipeline {
            steps: needles(&["test", "lint", "build"]),
        }),
    ))
}

fn test_structure(spec: &Specification) -> Option<Rule> {
    if !spec.is_django() || spec.apps.is_empty() {
        return None;
    }
    Some(Rule::new(
        "validate_complete_test_structure",
        "Each application has factories and model/view tests",
        Severity::Medium,
        Category::Structure,
        CheckSpec::TestLayout(TestLayout {
            apps: spec.apps.clone(),
            required_files: needles(&["factories.py", "test_models.py", "test_views.py"]),
        }),
    ))
}

/// README elements derived from the project name and stack.
fn readme_sections(spec: &Specification) -> ReadmeSections {
    let mut critical = Vec::new();
    if let Some(first) = spec.project_name.split([' ', ':']).find(|w| !w.is_empty()) {
        critical.push(format!("# {first}"));
    }
    if !spec.docker_files.is_empty() {
        critical.push("Docker".into());
    }
    let mut important: Vec<String> = [
        spec.backend_framework.as_str(),
        spec.frontend_framework.as_str(),
        spec.database.as_str(),
        spec.testing_framework.as_str(),
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .map(|s| capitalize(s))
    .collect();
    important.push("git clone".into());
    if spec.multi_tenancy {
        important.push("multi-tenant".into());
    }
    ReadmeSections {
        file: "README.md".into(),
        critical,
        important,
        max_missing_important: 3,
        min_sections: 3,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn documentation(spec: &Specification) -> Vec<Rule> {
    let mut rules: Vec<Rule> = ESSENTIAL_DOCS
        .iter()
        .filter(|doc| spec.mentions_doc(doc))
        .map(|doc| {
            Rule::new(
                format!("validate_{}", clean_name(doc)),
                format!("{doc} is present"),
                Severity::Medium,
                Category::Content,
                CheckSpec::FilePatterns(FilePatterns {
                    patterns: vec![(*doc).to_string()],
                    issue_type: "missing_documentation".into(),
                    severity: Severity::Medium,
                }),
            )
        })
        .collect();
    if spec.mentions_doc("README.md") {
        rules.push(Rule::new(
            "validate_readme_content_specific",
            "README covers the project and its stack",
            Severity::High,
            Category::Content,
            CheckSpec::ReadmeSections(readme_sections(spec)),
        ));
    }
    rules
}

fn docker(spec: &Specification) -> Vec<Rule> {
    spec.docker_files
        .iter()
        .map(|file| {
            Rule::new(
                format!("validate_{}", clean_name(file)),
                format!("{file} is present"),
                Severity::Medium,
                Category::Structure,
                CheckSpec::FilePatterns(FilePatterns {
                    patterns: vec![file.clone()],
                    issue_type: "missing_docker_file".into(),
                    severity: Severity::Medium,
                }),
            )
        })
        .collect()
}

fn quality_tools() -> Rule {
    Rule::new(
        "validate_development_quality_tools",
        "Pre-commit and gitignore are set up",
        Severity::Medium,
        Category::Structure,
        CheckSpec::FilePatterns(FilePatterns {
            patterns: needles(&[".pre-commit-config.yaml", ".gitignore"]),
            issue_type: "missing_file".into(),
            severity: Severity::Medium,
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spec() -> Specification {
        let text = include_str!("../../spec/tests/fixtures/blueprint.md");
        agv_spec::extract(text).spec
    }

    fn names(rules: &[Rule]) -> Vec<&str> {
        rules.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn covers_the_skeleton() {
        let rules = ScaffoldGenerator.generate_rules(&spec());
        let names = names(&rules);
        for expected in [
            "validate_directory_structure",
            "validate_gitignore_content",
            "validate_pyproject_content",
            "validate_precommit_config_content",
            "validate_env_example_file",
            "validate_content_settings_py",
            "validate_content_pyproject_toml",
            "validate_dependency_django",
            "validate_django_settings_advanced",
            "validate_multi_tenancy_implementation",
            "validate_django_models",
            "validate_django_apps_structure",
            "validate_github_actions_pipeline",
            "validate_readme_md",
            "validate_readme_content_specific",
            "validate_development_quality_tools",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn pinned_versions_are_baked_in() {
        let rules = ScaffoldGenerator.generate_rules(&spec());
        let rule = rules.iter().find(|r| r.name == "validate_dependency_django").unwrap();
        let CheckSpec::DeclaredDependencies(check) = &rule.check else {
            unreachable!("dependency rule carries a dependency check")
        };
        assert_eq!(check.packages[0].version.as_deref(), Some("4.2"));
        assert_eq!(rule.category, Category::Dependencies);
    }

    #[test]
    fn tenant_models_are_listed() {
        let rules = ScaffoldGenerator.generate_rules(&spec());
        let rule = rules
            .iter()
            .find(|r| r.name == "validate_multi_tenancy_implementation")
            .unwrap();
        let CheckSpec::TenantBaseModel(check) = &rule.check else {
            unreachable!("tenancy rule carries a tenant check")
        };
        assert_eq!(check.base_class, "BaseTenantModel");
        assert_eq!(check.models, vec!["Customer", "Loan"]);
    }

    #[test]
    fn empty_specification_still_checks_hygiene() {
        let rules = ScaffoldGenerator.generate_rules(&Specification::default());
        let names = names(&rules);
        assert!(names.contains(&"validate_gitignore_content"));
        assert!(!names.contains(&"validate_directory_structure"));
        assert!(!names.contains(&"validate_django_models"));
        assert!(!names.iter().any(|n| n.starts_with("validate_dependency_")));
    }

    #[test]
    fn expectations_map_to_needles() {
        let spec = spec();
        assert_eq!(
            expectation_needles("DATABASES uses postgresql", &spec),
            Some(vec!["postgresql".to_string()])
        );
        assert_eq!(
            expectation_needles("models inherit from BaseTenantModel", &spec),
            Some(vec!["(BaseTenantModel)".to_string()])
        );
        assert_eq!(expectation_needles("something unrelated", &spec), None);
    }
}
