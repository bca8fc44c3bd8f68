//! AGV conformance runtime.
//!
//! This crate executes compiled validators. It owns the typed checks, the
//! validator manifest format, the linking step, the executor and the
//! weighted scorer. It has no knowledge of Blueprints: everything a rule
//! needs is carried as literal parameters in the manifest.
//!
//! # Check families
//!
//! | Module | Checks |
//! |--------|--------|
//! | `checks::structure` | required paths, file patterns, application layout, CI workflows |
//! | `checks::content` | file contents, module docstrings, README sections |
//! | `checks::models` | model classes and fields, relationships, tenant base model, migrations |
//! | `checks::dependencies` | packages declared in dependency manifests |
//! | `checks::api` | module coupling, class and function definitions |
//! | `checks::testing` | test layout, per-module test counts, integration scenarios |
//! | `checks::evolution` | breaking changes, deprecations, refactors, freshness, versioning |
//!
//! # Entry Point
//!
//! ```no_run
//! use agv_conformance::{validate, RunContext, ValidatorManifest};
//! use std::path::Path;
//!
//! let manifest = ValidatorManifest::load(Path::new("validate_scaffold.json"))
//!     .expect("Failed to load validator");
//! let ctx = RunContext::with_defaults(".").expect("Failed to build context");
//! let outcome = validate(manifest, &ctx);
//! std::process::exit(outcome.verdict.exit_code());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

/// Compiles a pattern once; yields `None` if it does not compile.
macro_rules! regex {
    ($pattern:expr) => {{
        static RE: std::sync::OnceLock<Option<regex::Regex>> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).ok()).as_ref()
    }};
}

pub mod checks;
pub mod context;
pub mod executor;
pub mod manifest;
pub mod profile;
pub mod registry;
pub mod render;
pub mod report;
pub mod rule;
pub mod scorer;

pub use checks::{Check, CheckError, CheckSpec, ContentRequirement};
pub use context::RunContext;
pub use executor::{Executor, Outcome};
pub use manifest::{ManifestError, ValidatorManifest, MANIFEST_FORMAT};
pub use profile::{ConfigError, Profile, Tolerance, ValidationConfig};
pub use registry::{LinkedRule, Registry};
pub use report::{Category, Issue, Results, ResultsError, Severity};
pub use rule::Rule;
pub use scorer::{ScoringWeights, Verdict};

/// Links `manifest` and runs it under `ctx`.
#[must_use]
pub fn validate(manifest: ValidatorManifest, ctx: &RunContext) -> Outcome {
    Executor::from_manifest(manifest).run(ctx)
}
