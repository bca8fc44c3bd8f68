//! `agv-validate` — Runs a generated validator against a project tree.
//!
//! Prints a report grouped by severity, writes the results as JSON, and
//! exits 0 when the conformity score reaches the profile's threshold.
//!
//! **Usage:**
//! ```text
//! agv-validate <manifest> [--root DIR] [--profile NAME] [--config FILE]
//!     [--results FILE] [-v...]
//! agv-validate --list-profiles [--config FILE]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use agv_conformance::profile::DEFAULT_CONFIG_FILE;
use agv_conformance::render::render;
use agv_conformance::{validate, RunContext, ValidationConfig, ValidatorManifest};
use anyhow::Result;
use clap::Parser;

/// Run a Blueprint conformity validator.
#[derive(Parser)]
#[command(
    name = "agv-validate",
    about = "Validate a project tree against a generated validator"
)]
struct Args {
    /// Validator manifest produced by agv-generate.
    #[arg(required_unless_present = "list_profiles")]
    manifest: Option<PathBuf>,

    /// Project root the checks run against.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Validation profile (default: from the configuration file).
    #[arg(long)]
    profile: Option<String>,

    /// Validation configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Results JSON file (default: the path recorded in the manifest).
    #[arg(long)]
    results: Option<PathBuf>,

    /// List the available profiles and exit.
    #[arg(long)]
    list_profiles: bool,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn list_profiles(config: &ValidationConfig) {
    println!("Validation profiles");
    println!("===================");
    for (name, profile) in &config.profiles {
        let active = if *name == config.validation_profile { " *" } else { "" };
        println!(
            "  {name:<20} threshold {:>3.0}%  penalty cap {:.1}  {}{active}",
            profile.min_score_threshold, profile.max_penalty_factor, profile.description
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    agv_clients::init_tracing(args.verbose);

    let config = ValidationConfig::load(&args.config)?;
    if args.list_profiles {
        list_profiles(&config);
        return Ok(());
    }
    let Some(manifest_path) = args.manifest.as_deref() else {
        anyhow::bail!("a validator manifest is required");
    };

    let manifest = ValidatorManifest::load(manifest_path)?;
    let title = format!("{} ({})", manifest.name, manifest.description);
    let results_path: Option<PathBuf> = args
        .results
        .clone()
        .or_else(|| manifest.results_path.as_deref().map(PathBuf::from));

    let ctx = RunContext::new(&args.root, config, args.profile.as_deref())?;
    let outcome = validate(manifest, &ctx);

    print!("{}", render(&title, &ctx.profile_name, &ctx.profile, &outcome));

    if let Some(path) = results_path {
        outcome.results.write_json(&path)?;
        println!("Results written to {}", path.display());
    }

    if !outcome.verdict.passed {
        eprintln!(
            "Validation failed: score {:.2}% below threshold {:.0}%",
            outcome.verdict.score, outcome.verdict.threshold
        );
    }
    process::exit(outcome.verdict.exit_code());
}
