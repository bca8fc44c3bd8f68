//! End-to-end generation: Blueprint to written validator to execution.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};

use agv_codegen::{generate, Phase, TargetContext};
use agv_conformance::{validate, Category, RunContext, ValidatorManifest, MANIFEST_FORMAT};
use agv_spec::Specification;

fn spec() -> Specification {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../spec/tests/fixtures/blueprint.md");
    agv_spec::extract_file(&path).unwrap().spec
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn scaffold_validator_is_written_and_reloadable() {
    let out = tempfile::tempdir().unwrap();
    let report = generate(&spec(), &Phase::Scaffold, out.path(), None).unwrap();

    assert_eq!(report.phase, "scaffold");
    assert!(report.dropped.is_empty());
    assert!(report.validator.starts_with(out.path().join("validators")));
    assert!(report
        .validator
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("validate_scaffold_"));

    let manifest = ValidatorManifest::load(&report.validator).unwrap();
    assert_eq!(manifest.format, MANIFEST_FORMAT);
    assert_eq!(manifest.phase, "scaffold");
    assert_eq!(manifest.rules.len(), report.rule_count);
    assert_eq!(
        manifest.results_path.as_deref(),
        Some(report.results.display().to_string().as_str())
    );
    assert!(manifest.description.contains("IABANK"));
}

#[test]
fn scaffold_validator_rejects_an_empty_tree() {
    let out = tempfile::tempdir().unwrap();
    let report = generate(&spec(), &Phase::Scaffold, out.path(), Some("scaffold_check")).unwrap();
    let manifest = ValidatorManifest::load(&report.validator).unwrap();
    assert_eq!(manifest.name, "scaffold_check");

    let target = tempfile::tempdir().unwrap();
    let outcome = validate(manifest, &RunContext::with_defaults(target.path()).unwrap());
    assert_eq!(outcome.results.total_checks, report.rule_count);
    assert!(outcome.results.failed_checks > outcome.results.passed_checks);
    assert_eq!(outcome.verdict.exit_code(), 1);
    assert!(outcome.results.categories[&Category::Dependencies] > 0);
}

#[test]
fn target_validator_accepts_a_delivered_increment() {
    let context = TargetContext {
        models: vec!["Loan".into()],
        urls: vec!["api/v1/loans/".into()],
        ..TargetContext::default()
    };
    let out = tempfile::tempdir().unwrap();
    let report = generate(&spec(), &Phase::Target { number: 4, context }, out.path(), None).unwrap();
    let manifest = ValidatorManifest::load(&report.validator).unwrap();

    let root = tempfile::tempdir().unwrap();
    let r = root.path();
    write(
        r,
        "operations/models.py",
        r#""""Operations models."""
from django.db import models


class BaseTenantModel(models.Model):
    tenant = models.ForeignKey("core.Tenant", on_delete=models.CASCADE)

    class Meta:
        abstract = True


class Loan(BaseTenantModel):
    customer = models.ForeignKey("customers.Customer", on_delete=models.PROTECT)
    amount = models.DecimalField(max_digits=12, decimal_places=2)
    interest_rate = models.DecimalField(max_digits=5, decimal_places=2)
    status = models.CharField(max_length=20)
"#,
    );
    write(r, "operations/__init__.py", "");
    write(r, "operations/urls.py", "urlpatterns = [path(\"api/v1/loans/\", LoanViewSet)]\n");
    write(
        r,
        "operations/tests/test_loans.py",
        "from operations.models import Loan\n\n\ndef test_loan_amount():\n    assert Loan\n",
    );
    write(
        r,
        "operations/migrations/0001_initial.py",
        "operations = [migrations.CreateModel(name=\"Loan\", fields=[])]\n",
    );

    let outcome = validate(manifest, &RunContext::with_defaults(r).unwrap());
    assert!(outcome.results.issues.is_empty(), "{:#?}", outcome.results.issues);
    assert_eq!(outcome.results.score, 100.0);
    assert_eq!(outcome.verdict.exit_code(), 0);
}
