//! Validation phases and generator dispatch.

use std::fmt;

use agv_conformance::Rule;
use agv_spec::Specification;

use crate::context::{EvolutionContext, IntegrationContext, TargetContext};
use crate::evolution::EvolutionGenerator;
use crate::generator::{clean_name, RuleGenerator};
use crate::integration::IntegrationGenerator;
use crate::scaffold::ScaffoldGenerator;
use crate::target::TargetGenerator;

/// A validation phase with its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Project skeleton.
    Scaffold,
    /// One numbered implementation target.
    Target {
        /// Target number, starting at 1.
        number: u32,
        /// Explicit context; empty means inferred.
        context: TargetContext,
    },
    /// Wiring of separately built modules.
    Integration {
        /// Phase name (e.g. `T1`).
        name: String,
        /// What is integrated.
        context: IntegrationContext,
    },
    /// Change to an existing codebase.
    Evolution {
        /// What changed.
        context: EvolutionContext,
    },
}

impl Phase {
    /// Label used in manifests and output file names (`scaffold`,
    /// `target_3`, `integration_t1`, `evolution`).
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Phase::Scaffold => "scaffold".to_string(),
            Phase::Target { number, .. } => format!("target_{number}"),
            Phase::Integration { name, .. } => format!("integration_{}", clean_name(name)),
            Phase::Evolution { .. } => "evolution".to_string(),
        }
    }

    /// Default validator name (`validate_<label>`).
    #[must_use]
    pub fn validator_name(&self) -> String {
        format!("validate_{}", self.label())
    }

    /// One-line description of the validator for `spec`.
    #[must_use]
    pub fn describe(&self, spec: &Specification) -> String {
        let project = if spec.project_name.is_empty() {
            "the project"
        } else {
            spec.project_name.as_str()
        };
        match self {
            Phase::Scaffold => format!("Scaffold conformity of {project}"),
            Phase::Target { number, .. } => format!("Target {number} conformity of {project}"),
            Phase::Integration { name, .. } => format!("Integration {name} conformity of {project}"),
            Phase::Evolution { .. } => format!("Evolution conformity of {project}"),
        }
    }

    /// Runs the phase's generator.
    #[must_use]
    pub fn generate_rules(&self, spec: &Specification) -> Vec<Rule> {
        match self {
            Phase::Scaffold => ScaffoldGenerator.generate_rules(spec),
            Phase::Target { number, context } => {
                TargetGenerator::new(*number, context.clone()).generate_rules(spec)
            }
            Phase::Integration { name, context } => {
                IntegrationGenerator::new(name.clone(), context.clone()).generate_rules(spec)
            }
            Phase::Evolution { context } => EvolutionGenerator::new(context.clone()).generate_rules(spec),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(Phase::Scaffold.label(), "scaffold");
        let target = Phase::Target {
            number: 3,
            context: TargetContext::default(),
        };
        assert_eq!(target.validator_name(), "validate_target_3");
        let integration = Phase::Integration {
            name: "T1".into(),
            context: IntegrationContext::default(),
        };
        assert_eq!(integration.to_string(), "integration_t1");
    }

    #[test]
    fn description_falls_back_without_a_name() {
        let spec = Specification::default();
        assert_eq!(
            Phase::Evolution {
                context: EvolutionContext::default()
            }
            .describe(&spec),
            "Evolution conformity of the project"
        );
    }
}
