//! The generator seam and helpers shared by the phase generators.

use agv_conformance::{ContentRequirement, Rule, Severity};
use agv_spec::Specification;

/// Produces the rules of one validation phase.
///
/// Generators never fail: a step whose parameters cannot be determined
/// from the Specification simply emits no rule.
pub trait RuleGenerator {
    /// Returns the rules in emission order.
    fn generate_rules(&self, spec: &Specification) -> Vec<Rule>;
}

/// Turns free text into a rule-name fragment: lowercase, non-word
/// characters replaced by `_`, no leading or trailing `_`.
#[must_use]
pub fn clean_name(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            out.extend(c.to_lowercase());
        } else {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// A requirement met by any of `needles`.
pub(crate) fn requirement(
    description: impl Into<String>,
    needles: Vec<String>,
    severity: Severity,
) -> ContentRequirement {
    ContentRequirement {
        description: description.into(),
        any_of: needles,
        severity,
    }
}

/// One requirement per item, each satisfied by the item itself.
pub(crate) fn literal_requirements(
    items: &[String],
    describe: impl Fn(&str) -> String,
    severity: Severity,
) -> Vec<ContentRequirement> {
    items
        .iter()
        .map(|item| requirement(describe(item), vec![item.clone()], severity))
        .collect()
}
