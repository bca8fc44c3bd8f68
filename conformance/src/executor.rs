//! Rule execution with per-rule failure isolation.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, info};

use crate::context::RunContext;
use crate::manifest::ValidatorManifest;
use crate::registry::{LinkedRule, Registry};
use crate::report::{Issue, Results, Severity};
use crate::scorer::{self, ScoringWeights, Verdict};

/// Outcome of one run: results, verdict and the rules skipped by the
/// configuration.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Aggregated results, score included.
    pub results: Results,
    /// Pass/fail decision against the profile threshold.
    pub verdict: Verdict,
    /// Weights the score was computed with.
    pub weights: ScoringWeights,
    /// Rules skipped because they are ignored.
    pub skipped: Vec<String>,
}

/// Runs linked rules against a root.
#[derive(Debug)]
pub struct Executor {
    registry: Registry,
    weights: ScoringWeights,
}

fn validation_error(rule: &LinkedRule, error: &str) -> Issue {
    Issue::new(
        "validator",
        "validation_error",
        format!("Rule {} failed to run", rule.name),
        "Validation must run without errors",
        format!("Error: {error}"),
        Severity::Critical,
    )
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "check panicked".to_string())
}

impl Executor {
    /// Creates an executor over already linked rules.
    #[must_use]
    pub fn new(registry: Registry, weights: ScoringWeights) -> Self {
        Self { registry, weights }
    }

    /// Links `manifest` and keeps its embedded weights.
    #[must_use]
    pub fn from_manifest(manifest: ValidatorManifest) -> Self {
        let weights = manifest.weights;
        Self::new(Registry::link(manifest), weights)
    }

    /// The linked rules.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs one rule, converting errors and panics into a single CRITICAL
    /// `validation_error` issue.
    fn run_rule(rule: &LinkedRule, ctx: &RunContext) -> Vec<Issue> {
        match catch_unwind(AssertUnwindSafe(|| rule.check.run(&ctx.root))) {
            Ok(Ok(issues)) => issues,
            Ok(Err(e)) => vec![validation_error(rule, &e.to_string())],
            Err(payload) => vec![validation_error(rule, &panic_message(payload.as_ref()))],
        }
    }

    /// Runs every rule in order and scores the results under the context's
    /// profile.
    #[must_use]
    pub fn run(&self, ctx: &RunContext) -> Outcome {
        let _guard = ctx.span.enter();
        let weights = ctx.config.weights_over(self.weights);
        let mut results = Results::new();
        let mut skipped = Vec::new();

        for rule in self.registry.rules() {
            if ctx.config.is_ignored(&rule.name) {
                debug!(rule = %rule.name, "ignored by configuration");
                skipped.push(rule.name.clone());
                continue;
            }
            let issues: Vec<Issue> = Self::run_rule(rule, ctx)
                .into_iter()
                .filter(|i| {
                    i.issue_type == "validation_error"
                        || !(ctx.config.tolerance.tolerates(&i.issue_type) || ctx.profile.waives(i))
                })
                .map(|i| i.in_category(rule.category))
                .collect();
            if issues.is_empty() {
                debug!(rule = %rule.name, "passed");
                results.record_pass();
            } else {
                debug!(rule = %rule.name, issues = issues.len(), "failed");
                results.record_failure(issues);
            }
        }

        results.score = scorer::score(&results, &weights, ctx.profile.max_penalty_factor);
        let verdict = Verdict::new(results.score, ctx.profile.min_score_threshold);
        info!(
            total = results.total_checks,
            failed = results.failed_checks,
            score = results.score,
            passed = verdict.passed,
            "validation finished"
        );
        Outcome {
            results,
            verdict,
            weights,
            skipped,
        }
    }
}
