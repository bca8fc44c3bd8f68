//! AGV rule generators and validator compiler.
//!
//! Turns a Blueprint [`Specification`] into a standalone validator: the
//! phase's [`RuleGenerator`] emits typed rules, the [`compiler`] assembles
//! them into a [`ValidatorManifest`](agv_conformance::ValidatorManifest)
//! and [`emit`] writes it. The manifest is executed later by
//! `agv-conformance` without the Blueprint or this crate.
//!
//! | Phase | Generator | Focus |
//! |-------|-----------|-------|
//! | scaffold | [`ScaffoldGenerator`] | layout, configuration files, dependencies, docs |
//! | target N | [`TargetGenerator`] | models, views, routes, tests of one increment |
//! | integration | [`IntegrationGenerator`] | coupling, contracts, migrations, endpoints |
//! | evolution | [`EvolutionGenerator`] | compatibility, refactors, freshness, versioning |

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod compiler;
pub mod context;
pub mod emit;
pub mod evolution;
pub mod generator;
pub mod integration;
pub mod phase;
pub mod scaffold;
pub mod target;

use std::path::{Path, PathBuf};

use agv_spec::Specification;
use anyhow::{bail, Result};
use tracing::info;

pub use compiler::{compile, CompileReport, CompiledValidator, Header};
pub use context::{ContextError, EvolutionContext, IntegrationContext, TargetContext};
pub use evolution::EvolutionGenerator;
pub use generator::RuleGenerator;
pub use integration::IntegrationGenerator;
pub use phase::Phase;
pub use scaffold::ScaffoldGenerator;
pub use target::TargetGenerator;

/// Report of what was generated.
#[derive(Debug)]
pub struct GenerationReport {
    /// Phase label.
    pub phase: String,
    /// Rules in the written validator.
    pub rule_count: usize,
    /// Rules dropped as duplicates.
    pub dropped: Vec<String>,
    /// Written validator file.
    pub validator: PathBuf,
    /// Results path recorded in the validator.
    pub results: PathBuf,
}

/// Generates, compiles and writes the validator for `phase` under
/// `out_dir`. `stem` overrides the validator name.
///
/// # Errors
///
/// Returns an error if the phase yields no rules or the validator cannot
/// be written.
pub fn generate(
    spec: &Specification,
    phase: &Phase,
    out_dir: &Path,
    stem: Option<&str>,
) -> Result<GenerationReport> {
    let label = phase.label();
    let rules = phase.generate_rules(spec);
    if rules.is_empty() {
        bail!("no rules generated for phase {label}");
    }
    info!(phase = %label, rules = rules.len(), "rules generated");

    let name = stem.map_or_else(|| phase.validator_name(), str::to_string);
    let header = Header::new(name.as_str(), phase.describe(spec), label.as_str());
    let paths = emit::artifact_paths(out_dir, &name, &label, header.generated_at);

    let CompiledValidator { mut manifest, report } = compile(header, rules);
    manifest.results_path = Some(paths.results.display().to_string());
    emit::write_validator(&paths.validator, &manifest)?;

    Ok(GenerationReport {
        phase: label,
        rule_count: report.rule_count,
        dropped: report.dropped,
        validator: paths.validator,
        results: paths.results,
    })
}
