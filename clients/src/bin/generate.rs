//! `agv-generate` — Builds a standalone validator from an architecture Blueprint.
//!
//! **Outputs:**
//! - `<out>/validators/<name>_<timestamp>.json` — the validator manifest
//!
//! **Usage:**
//! ```text
//! agv-generate <blueprint> <scaffold|target|integration|evolution>
//!     [--target-number N] [--integration-phase T1] [--context ctx.json]
//!     [--output-dir agv-outputs] [--name stem] [-v...]
//! ```
//!
//! Exits non-zero if the Blueprint cannot be read or no rules are generated.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use agv_codegen::{context, generate, EvolutionContext, IntegrationContext, Phase, TargetContext};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

/// Validation phase selector.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PhaseKind {
    Scaffold,
    Target,
    Integration,
    Evolution,
}

/// Generate a validator from a Blueprint.
#[derive(Parser)]
#[command(
    name = "agv-generate",
    about = "Generate a Blueprint conformity validator for one phase"
)]
struct Args {
    /// Blueprint markdown file.
    blueprint: PathBuf,

    /// Validation phase.
    #[arg(value_enum)]
    phase: PhaseKind,

    /// Target number (target phase).
    #[arg(long, default_value_t = 1)]
    target_number: u32,

    /// Integration phase name (integration phase).
    #[arg(long, default_value = "T1")]
    integration_phase: String,

    /// JSON context narrowing the phase.
    #[arg(long)]
    context: Option<PathBuf>,

    /// Output directory for generated artifacts.
    #[arg(long, default_value = "agv-outputs")]
    output_dir: PathBuf,

    /// Validator name (default: validate_<phase>).
    #[arg(long)]
    name: Option<String>,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    agv_clients::init_tracing(args.verbose);

    let extraction = agv_spec::extract_file(&args.blueprint)?;
    let spec = extraction.spec;

    let ctx = args.context.as_deref();
    let phase = match args.phase {
        PhaseKind::Scaffold => Phase::Scaffold,
        PhaseKind::Target => Phase::Target {
            number: args.target_number,
            context: ctx.map(context::load::<TargetContext>).transpose()?.unwrap_or_default(),
        },
        PhaseKind::Integration => Phase::Integration {
            name: args.integration_phase.clone(),
            context: ctx
                .map(context::load::<IntegrationContext>)
                .transpose()?
                .unwrap_or_default(),
        },
        PhaseKind::Evolution => Phase::Evolution {
            context: ctx
                .map(context::load::<EvolutionContext>)
                .transpose()?
                .unwrap_or_default(),
        },
    };

    let report = generate(&spec, &phase, &args.output_dir, args.name.as_deref())
        .with_context(|| format!("Failed to generate the {phase} validator"))?;
    info!(validator = %report.validator.display(), rules = report.rule_count, "validator written");

    println!(
        "{}: {} models, {} apps, {} warnings",
        if spec.project_name.is_empty() {
            "Blueprint"
        } else {
            spec.project_name.as_str()
        },
        spec.models.len(),
        spec.apps.len(),
        extraction.warnings.len()
    );
    println!("Phase {}: {} rules", report.phase, report.rule_count);
    if !report.dropped.is_empty() {
        println!("Dropped duplicates: {}", report.dropped.join(", "));
    }
    println!("Validator: {}", report.validator.display());
    println!("Results:   {}", report.results.display());
    println!();
    println!("Run: agv-validate {}", report.validator.display());
    Ok(())
}
