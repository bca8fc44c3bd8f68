//! The linking step: resolves a manifest's rules into executable checks
//! keyed by unique name.

use std::collections::BTreeSet;

use tracing::warn;

use crate::checks::Check;
use crate::manifest::ValidatorManifest;
use crate::report::{Category, Severity};
use crate::rule::Rule;

/// A rule whose check has been resolved into a typed object.
#[derive(Debug)]
pub struct LinkedRule {
    /// Unique rule name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Nominal severity.
    pub severity: Severity,
    /// Category stamped on every issue.
    pub category: Category,
    /// The executable check.
    pub check: Box<dyn Check>,
}

impl From<Rule> for LinkedRule {
    fn from(rule: Rule) -> Self {
        Self {
            name: rule.name,
            description: rule.description,
            severity: rule.severity,
            category: rule.category,
            check: rule.check.into_check(),
        }
    }
}

/// Linked rules in generation order; names are unique.
#[derive(Debug, Default)]
pub struct Registry {
    rules: Vec<LinkedRule>,
    names: BTreeSet<String>,
    rejected: Vec<String>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links every rule of `manifest`.
    #[must_use]
    pub fn link(manifest: ValidatorManifest) -> Self {
        let mut registry = Self::new();
        for rule in manifest.rules {
            registry.register(LinkedRule::from(rule));
        }
        registry
    }

    /// Adds a rule. A rule reusing a registered name is dropped with a
    /// warning; returns whether it was added.
    pub fn register(&mut self, rule: LinkedRule) -> bool {
        if !self.names.insert(rule.name.clone()) {
            warn!(rule = %rule.name, "duplicate rule name, dropping");
            self.rejected.push(rule.name);
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[LinkedRule] {
        &self.rules
    }

    /// Names of dropped duplicates.
    #[must_use]
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Number of linked rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
