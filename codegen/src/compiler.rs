//! Assembles generated rules into one standalone validator manifest.

use std::collections::BTreeSet;

use agv_conformance::{Rule, ScoringWeights, ValidatorManifest, MANIFEST_FORMAT};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

/// Manifest identity, fixed before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Validator name.
    pub name: String,
    /// What the validator checks.
    pub description: String,
    /// Phase label.
    pub phase: String,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
}

impl Header {
    /// Creates a header stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        phase: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            phase: phase.into(),
            generated_at: Utc::now(),
        }
    }
}

/// What the compiler kept and dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileReport {
    /// Rules in the manifest.
    pub rule_count: usize,
    /// Names of rules dropped as duplicates.
    pub dropped: Vec<String>,
}

/// A compiled validator and its report.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledValidator {
    /// The manifest, ready to be written.
    pub manifest: ValidatorManifest,
    /// Compilation report.
    pub report: CompileReport,
}

/// Compiles `rules` under `header`.
///
/// Rule names are unique in the result: a rule reusing an earlier name is
/// dropped and recorded in the report. The canonical scoring weights are
/// embedded so the manifest is self-describing.
#[must_use]
pub fn compile(header: Header, rules: Vec<Rule>) -> CompiledValidator {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(rules.len());
    let mut report = CompileReport::default();

    for rule in rules {
        if seen.insert(rule.name.clone()) {
            kept.push(rule);
        } else {
            warn!(rule = %rule.name, "duplicate rule name dropped");
            report.dropped.push(rule.name);
        }
    }
    report.rule_count = kept.len();
    info!(
        validator = %header.name,
        rules = report.rule_count,
        dropped = report.dropped.len(),
        "validator compiled"
    );

    CompiledValidator {
        manifest: ValidatorManifest {
            format: MANIFEST_FORMAT.to_string(),
            name: header.name,
            description: header.description,
            phase: header.phase,
            generated_at: header.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            results_path: None,
            weights: ScoringWeights::default(),
            rules: kept,
        },
        report,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agv_conformance::checks::structure::RequiredPaths;
    use agv_conformance::{Category, CheckSpec, Severity};
    use chrono::TimeZone;

    fn rule(name: &str, path: &str) -> Rule {
        Rule::new(
            name,
            "d",
            Severity::High,
            Category::Structure,
            CheckSpec::RequiredPaths(RequiredPaths {
                paths: vec![path.into()],
            }),
        )
    }

    fn header() -> Header {
        Header {
            name: "validate_scaffold".into(),
            description: "Scaffold".into(),
            phase: "scaffold".into(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn duplicate_names_keep_the_first() {
        let compiled = compile(
            header(),
            vec![rule("validate_a", "a/"), rule("validate_b", "b/"), rule("validate_a", "c/")],
        );
        assert_eq!(compiled.report.rule_count, 2);
        assert_eq!(compiled.report.dropped, vec!["validate_a"]);
        let CheckSpec::RequiredPaths(first) = &compiled.manifest.rules[0].check else {
            unreachable!("rule carries a path check")
        };
        assert_eq!(first.paths, vec!["a/"]);
    }

    #[test]
    fn manifest_is_stamped() {
        let m = compile(header(), vec![]).manifest;
        assert_eq!(m.format, MANIFEST_FORMAT);
        assert_eq!(m.generated_at, "2026-03-01T12:00:00Z");
        assert!(m.rules.is_empty());
        assert_eq!(m.weights, ScoringWeights::default());
    }
}
