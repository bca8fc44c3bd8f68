//! Rules: named, categorized checks as they appear in a validator manifest.

use serde::{Deserialize, Serialize};

use crate::checks::CheckSpec;
use crate::report::{Category, Severity};

/// One named, independently executable check.
///
/// A rule carries only literal parameters; it holds no reference to the
/// Blueprint or to the generator that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Globally unique name; the executor dispatches by it.
    pub name: String,
    /// One-line description shown in reports.
    pub description: String,
    /// Nominal severity of the rule.
    pub severity: Severity,
    /// Category stamped on every issue the rule produces.
    pub category: Category,
    /// The check and its parameters.
    pub check: CheckSpec,
}

impl Rule {
    /// Creates a rule.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        category: Category,
        check: CheckSpec,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            severity,
            category,
            check,
        }
    }
}
