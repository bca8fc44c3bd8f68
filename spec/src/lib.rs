//! AGV Blueprint model and extractor.
//!
//! The `agv-spec` crate turns a free-form architecture Blueprint (markdown
//! with fenced code blocks and an ASCII directory tree) into a typed
//! [`Specification`]. Extraction is heuristic: absent sections leave their
//! fields empty and are reported as [`ExtractionWarning`]s.
//!
//! # Entry Point
//!
//! ```
//! let text = "# Loans\n\n```python\nclass Loan(models.Model):\n    amount = models.DecimalField()\n```\n";
//! let extraction = agv_spec::extract(text);
//! let loan = extraction.spec.model("Loan");
//! assert!(loan.is_some_and(|m| m.has_field("amount")));
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

/// Compiles a regex once per call site. Evaluates to `Option<&'static Regex>`;
/// `None` only if the literal pattern is invalid.
macro_rules! regex {
    ($pattern:expr) => {{
        static RE: std::sync::OnceLock<Option<regex::Regex>> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).ok()).as_ref()
    }};
}

pub mod extractor;
pub mod model;

pub use extractor::{extract, extract_file, ExtractError, Extraction, ExtractionWarning};
pub use model::{
    AuthMethod, Dependencies, DirectoryTree, FieldKind, ModelSpec, RelationKind, Section,
    Specification,
};
