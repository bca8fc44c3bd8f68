//! Human-readable run report.

use std::fmt::Write as _;

use crate::executor::Outcome;
use crate::profile::Profile;
use crate::report::{Category, Severity};

/// Status band for a score.
#[must_use]
pub fn status(score: f64) -> &'static str {
    if score >= 90.0 {
        "EXCELLENT"
    } else if score >= 85.0 {
        "APPROVED"
    } else if score >= 70.0 {
        "NEEDS IMPROVEMENT"
    } else {
        "REJECTED"
    }
}

/// Renders the report for `outcome` under `profile`.
#[must_use]
pub fn render(title: &str, profile_name: &str, profile: &Profile, outcome: &Outcome) -> String {
    let r = &outcome.results;
    let mut out = String::new();
    let rule = "=".repeat(title.len().max(40));
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "Profile: {profile_name} (threshold {:.0}%)",
        profile.min_score_threshold
    );
    let _ = writeln!(
        out,
        "Checks: {} total, {} passed, {} failed",
        r.total_checks, r.passed_checks, r.failed_checks
    );
    if !outcome.skipped.is_empty() {
        let _ = writeln!(out, "Skipped: {}", outcome.skipped.join(", "));
    }
    let _ = writeln!(out, "Score: {:.2}% [{}]", r.score, status(r.score));
    let _ = writeln!(out);

    let mut order: Vec<Category> = profile.focus_categories.clone();
    order.extend(Category::ALL.iter().filter(|c| !profile.focus_categories.contains(c)));
    let _ = writeln!(out, "Issues by category:");
    for category in order {
        let count = r.categories.get(&category).copied().unwrap_or(0);
        let flag = if count > 0 && profile.required_categories.contains(&category) {
            "  (required)"
        } else {
            ""
        };
        let _ = writeln!(out, "  {:<13} {count}{flag}", category.as_str());
    }

    for severity in Severity::ALL {
        let issues: Vec<_> = r.issues.iter().filter(|i| i.severity == severity).collect();
        if issues.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{severity} ({})", issues.len());
        for issue in issues {
            let _ = writeln!(out, "  [{}] {}: {}", issue.category, issue.file_path, issue.description);
            let _ = writeln!(out, "      expected: {}", issue.expected);
            let _ = writeln!(out, "      actual:   {}", issue.actual);
        }
    }

    let _ = writeln!(out);
    if outcome.verdict.passed {
        let _ = writeln!(
            out,
            "PASSED: {:.2}% >= {:.0}%",
            outcome.verdict.score, outcome.verdict.threshold
        );
    } else {
        let _ = writeln!(
            out,
            "FAILED: {:.2}% < {:.0}%",
            outcome.verdict.score, outcome.verdict.threshold
        );
    }
    out
}
