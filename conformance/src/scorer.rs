//! Weighted conformity scoring.
//!
//! The score starts from the share of passing rules and is reduced by a
//! penalty factor derived from the severity and category of every issue:
//!
//! ```text
//! base    = passed / total * 100
//! penalty = sum(severity_weight * category_weight)
//! factor  = min(penalty / (failed * 10), cap)      cap <= 0.5
//! score   = max(0, base * (1 - factor))            rounded to 2 decimals
//! ```
//!
//! A run with no failed rule scores exactly 100.

use serde::{Deserialize, Serialize};

use crate::report::{Category, Issue, Results, Severity};

/// Upper bound on the penalty factor, whatever the profile asks for.
pub const MAX_PENALTY_FACTOR: f64 = 0.5;

/// Penalty points per failed rule that saturate the factor at 1.0.
const PENALTY_PER_FAILURE: f64 = 10.0;

/// Penalty weight per severity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SeverityWeights {
    /// Weight of a CRITICAL issue.
    pub critical: f64,
    /// Weight of a HIGH issue.
    pub high: f64,
    /// Weight of a MEDIUM issue.
    pub medium: f64,
    /// Weight of a LOW issue.
    pub low: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 15.0,
            high: 8.0,
            medium: 2.0,
            low: 1.0,
        }
    }
}

impl SeverityWeights {
    /// Returns the weight for `severity`.
    #[must_use]
    pub fn of(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Penalty multiplier per category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CategoryWeights {
    /// Multiplier for STRUCTURE issues.
    pub structure: f64,
    /// Multiplier for CONTENT issues.
    pub content: f64,
    /// Multiplier for MODELS issues.
    pub models: f64,
    /// Multiplier for DEPENDENCIES issues.
    pub dependencies: f64,
    /// Multiplier for API issues.
    pub api: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            structure: 1.0,
            content: 1.5,
            models: 2.0,
            dependencies: 1.2,
            api: 1.3,
        }
    }
}

impl CategoryWeights {
    /// Returns the multiplier for `category`.
    #[must_use]
    pub fn of(&self, category: Category) -> f64 {
        match category {
            Category::Structure => self.structure,
            Category::Content => self.content,
            Category::Models => self.models,
            Category::Dependencies => self.dependencies,
            Category::Api => self.api,
        }
    }
}

/// The weight tables used by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Severity table.
    #[serde(default)]
    pub severity: SeverityWeights,
    /// Category table.
    #[serde(default)]
    pub category: CategoryWeights,
}

impl ScoringWeights {
    /// Penalty of one issue, weighted by its canonical category.
    #[must_use]
    pub fn penalty(&self, issue: &Issue) -> f64 {
        self.severity.of(issue.severity) * self.category.of(issue.category)
    }

    /// Sum of all issue penalties.
    #[must_use]
    pub fn total_penalty(&self, issues: &[Issue]) -> f64 {
        issues.iter().map(|i| self.penalty(i)).sum()
    }
}

/// Penalty factor for `total_penalty` spread over `failed` rules, capped at
/// `min(cap, MAX_PENALTY_FACTOR)`.
#[must_use]
pub fn penalty_factor(total_penalty: f64, failed: usize, cap: f64) -> f64 {
    if failed == 0 {
        return 0.0;
    }
    let cap = cap.clamp(0.0, MAX_PENALTY_FACTOR);
    (total_penalty / (failed as f64 * PENALTY_PER_FAILURE)).clamp(0.0, cap)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes the conformity score of `results`.
#[must_use]
pub fn score(results: &Results, weights: &ScoringWeights, cap: f64) -> f64 {
    if results.failed_checks == 0 {
        return 100.0;
    }
    let base = results.passed_checks as f64 / results.total_checks as f64 * 100.0;
    let factor = penalty_factor(
        weights.total_penalty(&results.issues),
        results.failed_checks,
        cap,
    );
    round2((base * (1.0 - factor)).max(0.0))
}

/// Pass/fail decision of a scored run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Final score.
    pub score: f64,
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// Whether `score >= threshold`.
    pub passed: bool,
}

impl Verdict {
    /// Compares `score` against `threshold`.
    #[must_use]
    pub fn new(score: f64, threshold: f64) -> Self {
        Self {
            score,
            threshold,
            passed: score >= threshold,
        }
    }

    /// Process exit code: 0 when passed, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.passed)
    }
}
