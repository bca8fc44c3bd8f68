//! Integration phase: modules built separately are wired together.

use agv_conformance::checks::api::{DefinitionsPresent, ModuleCoupling};
use agv_conformance::checks::content::TextPresent;
use agv_conformance::checks::models::Migrations;
use agv_conformance::checks::testing::IntegrationTests;
use agv_conformance::{Category, CheckSpec, ContentRequirement, Rule, Severity};
use agv_spec::Specification;

use crate::context::IntegrationContext;
use crate::generator::{clean_name, literal_requirements, requirement, RuleGenerator};

/// Generates the rules of integration phase `name` (e.g. `T1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationGenerator {
    /// Phase name as given.
    pub name: String,
    /// What the phase integrates.
    pub context: IntegrationContext,
}

/// Text that shows a communication pattern is in use.
fn pattern_requirement(pattern: &str) -> ContentRequirement {
    let known: &[&str] = match pattern {
        "signal" | "signals" => &["post_save", "pre_save", "Signal(", "@receiver"],
        "event" | "events" => &["event", "Event"],
        "message_queue" | "queue" => &["celery", "@shared_task", "kombu", "pika"],
        "api_call" | "http" => &["requests.", "httpx"],
        _ => &[],
    };
    let any_of = if known.is_empty() {
        vec![pattern.to_string()]
    } else {
        known.iter().map(|s| (*s).to_string()).collect()
    };
    requirement(format!("Communication via {pattern}"), any_of, Severity::Medium)
}

/// The migration operation behind a database operation name.
fn migration_operation(op: &str) -> Option<&'static str> {
    match op {
        "create_table" | "create_model" => Some("CreateModel"),
        "add_field" => Some("AddField"),
        "alter_field" => Some("AlterField"),
        "remove_field" => Some("RemoveField"),
        "add_index" => Some("AddIndex"),
        _ => None,
    }
}

impl IntegrationGenerator {
    /// Creates a generator for phase `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, context: IntegrationContext) -> Self {
        Self {
            name: name.into(),
            context,
        }
    }

    fn rule_name(&self, what: &str) -> String {
        format!("validate_{}_{what}", clean_name(&self.name))
    }
}

impl RuleGenerator for IntegrationGenerator {
    fn generate_rules(&self, spec: &Specification) -> Vec<Rule> {
        let ctx = &self.context;
        let phase = self.name.as_str();
        let mut rules = Vec::new();

        // Without explicit modules the declared apps are what gets integrated.
        let modules = if ctx.modules.is_empty() {
            spec.apps.clone()
        } else {
            ctx.modules.clone()
        };
        if modules.len() > 1 {
            rules.push(Rule::new(
                self.rule_name("module_integration"),
                format!("Phase {phase}: modules import one another"),
                Severity::High,
                Category::Structure,
                CheckSpec::ModuleCoupling(ModuleCoupling { modules }),
            ));
        }

        let mut names = ctx.interfaces.clone();
        for contract in &ctx.contracts {
            if !names.contains(contract) {
                names.push(contract.clone());
            }
        }
        if !names.is_empty() {
            rules.push(Rule::new(
                self.rule_name("interfaces"),
                format!("Phase {phase}: interfaces and contracts are defined"),
                Severity::High,
                Category::Structure,
                CheckSpec::DefinitionsPresent(DefinitionsPresent {
                    files: vec!["*.py".into()],
                    names,
                    issue_type: "missing_interface".into(),
                    severity: Severity::High,
                }),
            ));
        }

        if !ctx.communication_patterns.is_empty() {
            rules.push(Rule::new(
                self.rule_name("communication"),
                format!("Phase {phase}: modules communicate as planned"),
                Severity::Medium,
                Category::Structure,
                CheckSpec::TextPresent(TextPresent {
                    files: vec!["*.py".into()],
                    issue_type: "missing_communication_pattern".into(),
                    requirements: ctx
                        .communication_patterns
                        .iter()
                        .map(|p| pattern_requirement(p))
                        .collect(),
                }),
            ));
        }

        if !ctx.database_operations.is_empty() {
            let mut operations: Vec<String> = Vec::new();
            for op in ctx.database_operations.iter().filter_map(|o| migration_operation(o)) {
                if !operations.iter().any(|o| o == op) {
                    operations.push(op.to_string());
                }
            }
            rules.push(Rule::new(
                self.rule_name("database_integration"),
                format!("Phase {phase}: migrations carry the schema changes"),
                Severity::High,
                Category::Models,
                CheckSpec::Migrations(Migrations {
                    apps: Vec::new(),
                    operations,
                    require_reversible: false,
                }),
            ));
        }

        if !ctx.api_endpoints.is_empty() {
            rules.push(Rule::new(
                self.rule_name("api_integration"),
                format!("Phase {phase}: endpoints are routed"),
                Severity::High,
                Category::Api,
                CheckSpec::TextPresent(TextPresent {
                    files: vec!["urls.py".into()],
                    issue_type: "missing_api_endpoint".into(),
                    requirements: literal_requirements(
                        &ctx.api_endpoints,
                        |e| format!("Endpoint {e} is routed"),
                        Severity::High,
                    ),
                }),
            ));
        }

        if !ctx.external_apis.is_empty() {
            rules.push(Rule::new(
                self.rule_name("external_apis"),
                format!("Phase {phase}: external services are called"),
                Severity::Medium,
                Category::Api,
                CheckSpec::TextPresent(TextPresent {
                    files: vec!["*.py".into()],
                    issue_type: "missing_external_api_integration".into(),
                    requirements: ctx
                        .external_apis
                        .iter()
                        .map(|api| {
                            requirement(
                                format!("Integration with {api}"),
                                vec![api.clone(), api.to_lowercase()],
                                Severity::Medium,
                            )
                        })
                        .collect(),
                }),
            ));
        }

        rules.push(Rule::new(
            self.rule_name("integration_tests"),
            format!("Phase {phase}: integration tests cover the scenarios"),
            Severity::High,
            Category::Content,
            CheckSpec::IntegrationTests(IntegrationTests {
                scenarios: ctx.test_scenarios.clone(),
            }),
        ));

        if !ctx.config_keys.is_empty() {
            rules.push(Rule::new(
                self.rule_name("configuration"),
                format!("Phase {phase}: settings declare the integration keys"),
                Severity::Medium,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: vec!["settings.py".into()],
                    issue_type: "missing_integration_config".into(),
                    requirements: literal_requirements(
                        &ctx.config_keys,
                        |k| format!("{k} is configured"),
                        Severity::Medium,
                    ),
                }),
            ));
            rules.push(Rule::new(
                self.rule_name("env_configuration"),
                format!("Phase {phase}: .env.example documents the integration keys"),
                Severity::Low,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: vec![".env.example".into()],
                    issue_type: "missing_env_config".into(),
                    requirements: literal_requirements(
                        &ctx.config_keys,
                        |k| format!("{k} is documented"),
                        Severity::Low,
                    ),
                }),
            ));
        }

        rules
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_still_requires_integration_tests() {
        let rules = IntegrationGenerator::new("T1", IntegrationContext::default())
            .generate_rules(&Specification::default());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "validate_t1_integration_tests");
        assert_eq!(rules[0].category, Category::Content);
    }

    #[test]
    fn apps_stand_in_for_modules() {
        let spec = Specification {
            apps: vec!["customers".into(), "operations".into()],
            ..Specification::default()
        };
        let rules = IntegrationGenerator::new("T2", IntegrationContext::default()).generate_rules(&spec);
        assert_eq!(rules[0].name, "validate_t2_module_integration");
    }

    #[test]
    fn full_context() {
        let ctx = IntegrationContext {
            modules: vec!["customers".into(), "operations".into()],
            interfaces: vec!["LoanService".into()],
            contracts: vec!["LoanService".into(), "PaymentGateway".into()],
            communication_patterns: vec!["signal".into(), "webhook".into()],
            database_operations: vec!["create_table".into(), "add_field".into(), "create_table".into()],
            api_endpoints: vec!["api/v1/loans/".into()],
            external_apis: vec!["Stripe".into()],
            test_scenarios: vec!["loan approval".into()],
            config_keys: vec!["PAYMENT_GATEWAY_URL".into()],
        };
        let rules = IntegrationGenerator::new("T1", ctx).generate_rules(&Specification::default());
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "validate_t1_module_integration",
                "validate_t1_interfaces",
                "validate_t1_communication",
                "validate_t1_database_integration",
                "validate_t1_api_integration",
                "validate_t1_external_apis",
                "validate_t1_integration_tests",
                "validate_t1_configuration",
                "validate_t1_env_configuration",
            ]
        );
        let CheckSpec::DefinitionsPresent(defs) = &rules[1].check else {
            unreachable!("interfaces rule carries a definitions check")
        };
        assert_eq!(defs.names, vec!["LoanService", "PaymentGateway"]);
        let CheckSpec::Migrations(migrations) = &rules[3].check else {
            unreachable!("database rule carries a migrations check")
        };
        assert_eq!(migrations.operations, vec!["CreateModel", "AddField"]);
        let CheckSpec::TextPresent(comm) = &rules[2].check else {
            unreachable!("communication rule carries a text check")
        };
        assert!(comm.requirements[0].any_of.contains(&"@receiver".to_string()));
        assert_eq!(comm.requirements[1].any_of, vec!["webhook"]);
    }
}
