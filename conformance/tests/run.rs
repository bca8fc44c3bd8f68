//! End-to-end execution of a manifest against target trees.

#![allow(clippy::unwrap_used)]

use std::fs::{create_dir_all, write};

use agv_conformance::checks::content::FileContent;
use agv_conformance::checks::models::ModelFields;
use agv_conformance::checks::structure::RequiredPaths;
use agv_conformance::{
    validate, Category, CheckSpec, ContentRequirement, Rule, RunContext, ScoringWeights,
    Severity, ValidationConfig, ValidatorManifest, MANIFEST_FORMAT,
};

fn manifest(rules: Vec<Rule>) -> ValidatorManifest {
    ValidatorManifest {
        format: MANIFEST_FORMAT.to_string(),
        name: "validate_scaffold".into(),
        description: "Scaffold conformity".into(),
        phase: "scaffold".into(),
        generated_at: "2026-10-19T00:00:00+00:00".into(),
        results_path: None,
        weights: ScoringWeights::default(),
        rules,
    }
}

fn layout_rule() -> Rule {
    Rule::new(
        "validate_directory_structure",
        "Required layout",
        Severity::High,
        Category::Structure,
        CheckSpec::RequiredPaths(RequiredPaths {
            paths: vec!["app/".into(), "app/models.py".into()],
        }),
    )
}

fn settings_rule() -> Rule {
    Rule::new(
        "validate_django_settings_advanced",
        "Settings content",
        Severity::High,
        Category::Content,
        CheckSpec::FileContent(FileContent {
            file: "settings.py".into(),
            missing_severity: Severity::High,
            requirements: vec![ContentRequirement::new(
                "INSTALLED_APPS configured",
                &["INSTALLED_APPS"],
                Severity::High,
            )],
        }),
    )
}

fn loan_rule() -> Rule {
    Rule::new(
        "validate_model_loan",
        "Loan fields",
        Severity::Medium,
        Category::Models,
        CheckSpec::ModelFields(ModelFields {
            files: vec!["models.py".into()],
            model: "Loan".into(),
            fields: vec!["amount".into()],
        }),
    )
}

#[test]
fn one_rule_two_issues_on_empty_tree() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = RunContext::with_defaults(dir.path()).unwrap();
    let outcome = validate(manifest(vec![layout_rule()]), &ctx);
    let r = &outcome.results;
    assert_eq!(r.total_checks, 1);
    assert_eq!(r.failed_checks, 1);
    assert_eq!(r.issues.len(), 2);
    assert_eq!(r.issues[0].issue_type, "missing_directory");
    assert_eq!(r.issues[0].severity, Severity::High);
    assert_eq!(r.issues[1].issue_type, "missing_file");
    assert_eq!(r.issues[1].severity, Severity::Medium);
    assert_eq!(r.categories[&Category::Structure], 2);
    // base 0 -> score 0 regardless of the factor
    assert_eq!(r.score, 0.0);
    assert_eq!(outcome.verdict.exit_code(), 1);
}

#[test]
fn conforming_tree_scores_100() {
    let dir = tempfile::tempdir().unwrap();
    create_dir_all(dir.path().join("app")).unwrap();
    write(
        dir.path().join("app/models.py"),
        "class Loan(models.Model):\n    amount = models.DecimalField()\n",
    )
    .unwrap();
    write(dir.path().join("app/settings.py"), "INSTALLED_APPS = []\n").unwrap();
    let ctx = RunContext::with_defaults(dir.path()).unwrap();
    let outcome = validate(manifest(vec![layout_rule(), settings_rule(), loan_rule()]), &ctx);
    assert_eq!(outcome.results.passed_checks, 3);
    assert_eq!(outcome.results.score, 100.0);
    assert_eq!(outcome.verdict.exit_code(), 0);
}

#[test]
fn partial_conformity_and_profiles() {
    let dir = tempfile::tempdir().unwrap();
    create_dir_all(dir.path().join("app")).unwrap();
    write(dir.path().join("app/models.py"), "class Loan(models.Model):\n    pass\n").unwrap();
    write(dir.path().join("settings.py"), "INSTALLED_APPS = []\n").unwrap();
    let rules = vec![layout_rule(), settings_rule(), loan_rule()];

    // 2 of 3 pass; one MEDIUM issue in MODELS: penalty 4 / 10 = 0.4.
    // 66.67 * 0.6 = 40.0
    let ctx = RunContext::with_defaults(dir.path()).unwrap();
    let outcome = validate(manifest(rules.clone()), &ctx);
    assert_eq!(outcome.results.failed_checks, 1);
    assert_eq!(outcome.results.score, 40.0);

    // The permissive profile caps the factor at 0.3: 66.67 * 0.7 = 46.67
    let ctx = RunContext::new(dir.path(), ValidationConfig::default(), Some("permissive")).unwrap();
    let outcome = validate(manifest(rules), &ctx);
    assert_eq!(outcome.results.score, 46.67);
    assert!(!outcome.verdict.passed);
}

#[test]
fn manifest_survives_the_process_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("validator.json");
    write(&path, manifest(vec![layout_rule()]).to_json_pretty().unwrap()).unwrap();
    let loaded = ValidatorManifest::load(&path).unwrap();
    let target = tempfile::tempdir().unwrap();
    create_dir_all(target.path().join("app")).unwrap();
    let ctx = RunContext::with_defaults(target.path()).unwrap();
    let outcome = validate(loaded, &ctx);
    assert_eq!(outcome.results.issues.len(), 1);
    assert_eq!(outcome.results.issues[0].file_path, "app/models.py");
}

#[test]
fn missing_root_is_a_validation_error() {
    let ctx = RunContext::with_defaults("/no/such/agv/target").unwrap();
    let outcome = validate(manifest(vec![layout_rule(), loan_rule()]), &ctx);
    let r = &outcome.results;
    assert_eq!(r.failed_checks, 2);
    assert!(r
        .issues
        .iter()
        .all(|i| i.issue_type == "validation_error" && i.severity == Severity::Critical));
}
