//! Evolution phase: an existing codebase changes without regressing.

use agv_conformance::checks::content::TextPresent;
use agv_conformance::checks::evolution::{
    BreakingChanges, DeprecationMarkers, DocumentationFreshness, RefactoredComponents, VersionFormat,
};
use agv_conformance::checks::models::Migrations;
use agv_conformance::checks::testing::TestCoverage;
use agv_conformance::{Category, CheckSpec, Rule, Severity};
use agv_spec::Specification;
use chrono::Datelike;

use crate::context::EvolutionContext;
use crate::generator::{literal_requirements, requirement, RuleGenerator};

/// Minimum test functions per modified module.
const MIN_TESTS_PER_MODULE: usize = 2;

/// Minimum share of Python modules with a module docstring.
const MIN_DOCSTRING_RATIO: f64 = 0.5;

/// Generates evolution rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionGenerator {
    /// What changed.
    pub context: EvolutionContext,
    /// Year treated as current for changelog freshness.
    pub year: i32,
}

/// Text that shows an optimization is in place.
fn optimization_needles(optimization: &str) -> Vec<String> {
    let known: &[&str] = match optimization {
        "database_indexing" => &["db_index=True", "Index("],
        "caching" => &["@cache", "cache."],
        "lazy_loading" => &["select_related", "prefetch_related"],
        "pagination" => &["Paginator", "PageNumberPagination"],
        "async_operations" => &["async def", "await "],
        _ => &[],
    };
    if known.is_empty() {
        vec![optimization.to_string()]
    } else {
        known.iter().map(|s| (*s).to_string()).collect()
    }
}

impl EvolutionGenerator {
    /// Creates a generator dated to the current year.
    #[must_use]
    pub fn new(context: EvolutionContext) -> Self {
        Self::with_year(context, chrono::Utc::now().year())
    }

    /// Creates a generator dated to `year`.
    #[must_use]
    pub fn with_year(context: EvolutionContext, year: i32) -> Self {
        Self { context, year }
    }
}

impl RuleGenerator for EvolutionGenerator {
    fn generate_rules(&self, spec: &Specification) -> Vec<Rule> {
        let ctx = &self.context;
        let mut rules = vec![Rule::new(
            "validate_backward_compatibility",
            "Breaking changes are documented in the changelog",
            Severity::High,
            Category::Content,
            CheckSpec::BreakingChanges(BreakingChanges {
                changes: ctx.breaking_changes.clone(),
                changelog: "CHANGELOG.md".into(),
            }),
        )];

        if !ctx.deprecated_features.is_empty() {
            rules.push(Rule::new(
                "validate_deprecation_markers",
                "Deprecated features warn their callers",
                Severity::Medium,
                Category::Content,
                CheckSpec::DeprecationMarkers(DeprecationMarkers {
                    features: ctx.deprecated_features.clone(),
                }),
            ));
        }

        if !ctx.refactored_components.is_empty() {
            rules.push(Rule::new(
                "validate_refactoring_safety",
                "Refactored components still exist and are tested",
                Severity::High,
                Category::Structure,
                CheckSpec::RefactoredComponents(RefactoredComponents {
                    components: ctx.refactored_components.clone(),
                }),
            ));
        }

        let modules = if ctx.modified_modules.is_empty() {
            spec.apps.clone()
        } else {
            ctx.modified_modules.clone()
        };
        rules.push(Rule::new(
            "validate_test_maintenance",
            "Modified modules keep their tests",
            Severity::High,
            Category::Content,
            CheckSpec::TestCoverage(TestCoverage {
                modules,
                min_tests_per_module: MIN_TESTS_PER_MODULE,
            }),
        ));

        if !ctx.performance_optimizations.is_empty() {
            rules.push(Rule::new(
                "validate_performance_improvements",
                "Planned optimizations are in the code",
                Severity::Medium,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: vec!["*.py".into()],
                    issue_type: "missing_performance_optimization".into(),
                    requirements: ctx
                        .performance_optimizations
                        .iter()
                        .map(|o| {
                            requirement(
                                format!("Optimization {o} is applied"),
                                optimization_needles(o),
                                Severity::Medium,
                            )
                        })
                        .collect(),
                }),
            ));
        }

        rules.push(Rule::new(
            "validate_documentation_updates",
            "README and changelog follow the code",
            Severity::Medium,
            Category::Content,
            CheckSpec::DocumentationFreshness(DocumentationFreshness {
                changelog: "CHANGELOG.md".into(),
                recent_markers: vec![
                    "unreleased".into(),
                    self.year.to_string(),
                    (self.year - 1).to_string(),
                ],
                min_docstring_ratio: MIN_DOCSTRING_RATIO,
            }),
        ));

        rules.push(Rule::new(
            "validate_versioning",
            "The project version is semantic and tagged",
            Severity::Medium,
            Category::Content,
            CheckSpec::VersionFormat(VersionFormat {
                file: "pyproject.toml".into(),
                check_tags: true,
            }),
        ));

        if !ctx.data_migrations.is_empty() {
            rules.push(Rule::new(
                "validate_data_migrations",
                "Data migrations exist",
                Severity::High,
                Category::Models,
                CheckSpec::TextPresent(TextPresent {
                    files: vec!["migrations/*.py".into()],
                    issue_type: "missing_data_migration".into(),
                    requirements: literal_requirements(
                        &ctx.data_migrations,
                        |m| format!("Migration {m} exists"),
                        Severity::High,
                    ),
                }),
            ));
            rules.push(Rule::new(
                "validate_migration_reversibility",
                "Data migrations can be reversed",
                Severity::High,
                Category::Models,
                CheckSpec::Migrations(Migrations {
                    apps: Vec::new(),
                    operations: Vec::new(),
                    require_reversible: true,
                }),
            ));
        }

        if !ctx.new_config_keys.is_empty() {
            rules.push(Rule::new(
                "validate_configuration_evolution",
                "New settings are configured",
                Severity::Medium,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: vec!["settings.py".into()],
                    issue_type: "missing_new_config".into(),
                    requirements: literal_requirements(
                        &ctx.new_config_keys,
                        |k| format!("{k} is configured"),
                        Severity::Medium,
                    ),
                }),
            ));
            rules.push(Rule::new(
                "validate_env_example_evolution",
                "New settings are documented in .env.example",
                Severity::Low,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: vec![".env.example".into()],
                    issue_type: "missing_env_example".into(),
                    requirements: literal_requirements(
                        &ctx.new_config_keys,
                        |k| format!("{k} is documented"),
                        Severity::Low,
                    ),
                }),
            ));
        }

        rules
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(rules: &[Rule]) -> Vec<&str> {
        rules.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn always_emitted() {
        let rules = EvolutionGenerator::with_year(EvolutionContext::default(), 2026)
            .generate_rules(&Specification::default());
        assert_eq!(
            names(&rules),
            vec![
                "validate_backward_compatibility",
                "validate_test_maintenance",
                "validate_documentation_updates",
                "validate_versioning",
            ]
        );
    }

    #[test]
    fn recent_markers_are_literal() {
        let rules = EvolutionGenerator::with_year(EvolutionContext::default(), 2026)
            .generate_rules(&Specification::default());
        let CheckSpec::DocumentationFreshness(check) = &rules[2].check else {
            unreachable!("documentation rule carries a freshness check")
        };
        assert_eq!(check.recent_markers, vec!["unreleased", "2026", "2025"]);
    }

    #[test]
    fn full_context() {
        let ctx = EvolutionContext {
            breaking_changes: vec!["Loan.rate renamed to interest_rate".into()],
            deprecated_features: vec!["legacy_export".into()],
            refactored_components: vec!["LoanService".into()],
            modified_modules: vec!["operations".into()],
            performance_optimizations: vec!["caching".into(), "sharding".into()],
            data_migrations: vec!["0004_backfill_rates".into()],
            new_config_keys: vec!["CACHE_TTL".into()],
        };
        let spec = Specification {
            apps: vec!["core".into()],
            ..Specification::default()
        };
        let rules = EvolutionGenerator::with_year(ctx, 2026).generate_rules(&spec);
        assert_eq!(rules.len(), 11);
        let maintenance = rules.iter().find(|r| r.name == "validate_test_maintenance").unwrap();
        let CheckSpec::TestCoverage(coverage) = &maintenance.check else {
            unreachable!("maintenance rule carries a coverage check")
        };
        assert_eq!(coverage.modules, vec!["operations"]);
        assert_eq!(optimization_needles("sharding"), vec!["sharding"]);
        assert!(optimization_needles("caching").contains(&"@cache".to_string()));
    }
}
