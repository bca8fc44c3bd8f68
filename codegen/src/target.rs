//! Target phase: one numbered implementation increment.
//!
//! An explicit [`TargetContext`] names what the target delivers. When the
//! context is empty the target is inferred from the Specification: models
//! are distributed over eight targets, and views, URLs, templates,
//! components and settings follow the target's band (1-3 authentication,
//! 4-5 business features, 6+ administration).

use agv_conformance::checks::api::DefinitionsPresent;
use agv_conformance::checks::content::TextPresent;
use agv_conformance::checks::models::{
    Migrations, ModelClasses, ModelFields, ModelRelationships, RelationRequirement, TenantBaseModel,
};
use agv_conformance::checks::structure::FilePatterns;
use agv_conformance::{Category, CheckSpec, Rule, Severity};
use agv_spec::{AuthMethod, Specification};

use crate::context::TargetContext;
use crate::generator::{literal_requirements, requirement, RuleGenerator};

/// Targets the model list is spread over.
const TARGET_SLOTS: usize = 8;

/// Generates the rules of target `number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGenerator {
    /// Target number, starting at 1.
    pub number: u32,
    /// Explicit context; empty means inferred.
    pub context: TargetContext,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// The models assigned to target `number` out of `models`.
///
/// `per = max(1, len / 8)`; target `n` takes `[(n-1)*per, (n-1)*per + per)`
/// clipped to the list.
#[must_use]
pub fn models_for_target(models: &[&str], number: u32) -> Vec<String> {
    let per = (models.len() / TARGET_SLOTS).max(1);
    let start = (number.max(1) as usize - 1).saturating_mul(per);
    if start >= models.len() {
        return Vec::new();
    }
    let end = (start + per).min(models.len());
    strings(&models[start..end])
}

impl TargetGenerator {
    /// Creates a generator for target `number`.
    #[must_use]
    pub fn new(number: u32, context: TargetContext) -> Self {
        Self { number, context }
    }

    /// The context the rules are generated from: the explicit one, or the
    /// one inferred from `spec`.
    #[must_use]
    pub fn resolve_context(&self, spec: &Specification) -> TargetContext {
        if !self.context.is_empty() {
            return self.context.clone();
        }
        let n = self.number;
        let has_app = |app: &str| spec.apps.iter().any(|a| a == app);
        let finance = has_app("finance");
        let react = spec.frontend_framework == "react";

        let views = if n <= 3 {
            strings(&["LoginView", "RegisterView", "UserProfileView"])
        } else if n <= 5 && finance {
            strings(&["LoanListView", "LoanDetailView", "TransactionView"])
        } else if n <= 5 {
            strings(&["DashboardView", "ReportView"])
        } else {
            strings(&["AdminView", "AnalyticsView", "ExportView"])
        };

        let urls = if n <= 3 {
            strings(&["api/auth/", "api/users/", "api/profile/"])
        } else if n <= 5 && finance {
            strings(&["api/loans/", "api/transactions/"])
        } else if n <= 5 {
            strings(&["api/dashboard/", "api/reports/"])
        } else {
            strings(&["api/admin/", "api/analytics/"])
        };

        let files = if n <= 3 && has_app("core") {
            strings(&["core/views.py", "core/serializers.py"])
        } else if n <= 5 && finance {
            strings(&["finance/views.py", "finance/serializers.py"])
        } else if has_app("operations") {
            strings(&["operations/views.py", "operations/serializers.py"])
        } else {
            Vec::new()
        };

        let templates = if react {
            Vec::new()
        } else if n <= 3 {
            strings(&["login.html", "register.html"])
        } else {
            strings(&["dashboard.html", "report.html"])
        };

        let components = if !react {
            Vec::new()
        } else if n <= 3 {
            strings(&["LoginForm", "RegisterForm", "UserProfile"])
        } else if n <= 5 {
            strings(&["Dashboard", "DataTable", "FilterPanel"])
        } else {
            strings(&["AdminPanel", "Analytics", "ExportDialog"])
        };

        let settings = if n <= 2 && spec.authentication == AuthMethod::Jwt {
            strings(&["JWT_SECRET_KEY", "JWT_EXPIRATION_DELTA"])
        } else if (3..=4).contains(&n) && spec.database == "postgresql" {
            strings(&["DATABASES", "DATABASE_URL"])
        } else {
            Vec::new()
        };

        TargetContext {
            models: models_for_target(&spec.model_names(), n),
            views,
            urls,
            files,
            templates,
            components,
            settings,
        }
    }

    fn name(&self, what: &str) -> String {
        format!("validate_target_{}_{what}", self.number)
    }

    fn model_rules(&self, ctx: &TargetContext, spec: &Specification) -> Vec<Rule> {
        let n = self.number;
        let mut rules: Vec<Rule> = ctx
            .models
            .iter()
            .map(|model| {
                let check = match spec.model(model) {
                    Some(m) if !m.fields.is_empty() => CheckSpec::ModelFields(ModelFields {
                        files: strings(&["models.py", "models/*.py"]),
                        model: model.clone(),
                        fields: m.fields.clone(),
                    }),
                    _ => CheckSpec::ModelClasses(ModelClasses {
                        files: strings(&["models.py", "models/*.py"]),
                        models: vec![model.clone()],
                    }),
                };
                Rule::new(
                    self.name(&format!("model_{}", model.to_lowercase())),
                    format!("Target {n}: model {model} and its fields"),
                    Severity::High,
                    Category::Models,
                    check,
                )
            })
            .collect();

        let relations: Vec<RelationRequirement> = ctx
            .models
            .iter()
            .filter_map(|m| spec.relationships.get(m).map(|targets| (m, targets)))
            .flat_map(|(m, targets)| {
                targets.iter().map(move |t| RelationRequirement {
                    model: m.clone(),
                    target: t.clone(),
                })
            })
            .collect();
        if ctx.models.len() > 1 && !relations.is_empty() {
            rules.push(Rule::new(
                self.name("model_relationships"),
                format!("Target {n}: relationships between the target models"),
                Severity::Medium,
                Category::Models,
                CheckSpec::ModelRelationships(ModelRelationships {
                    files: strings(&["models.py", "models/*.py"]),
                    relations,
                }),
            ));
        }

        let base = spec.base_model_class.as_str();
        if spec.multi_tenancy && !base.is_empty() {
            let tenant_models: Vec<String> = ctx
                .models
                .iter()
                .filter(|m| {
                    spec.model(m)
                        .is_some_and(|s| !s.is_abstract && s.bases.split(',').any(|b| b.trim() == base))
                })
                .cloned()
                .collect();
            if !tenant_models.is_empty() {
                rules.push(Rule::new(
                    self.name("tenant_models"),
                    format!("Target {n}: models are scoped by {base}"),
                    Severity::High,
                    Category::Models,
                    CheckSpec::TenantBaseModel(TenantBaseModel {
                        files: strings(&["models.py", "models/*.py"]),
                        base_class: base.to_string(),
                        tenant_field: "tenant".into(),
                        models: tenant_models,
                    }),
                ));
            }
        }
        rules
    }
}

impl RuleGenerator for TargetGenerator {
    fn generate_rules(&self, spec: &Specification) -> Vec<Rule> {
        let ctx = self.resolve_context(spec);
        let n = self.number;
        let mut rules = Vec::new();

        if !ctx.files.is_empty() {
            rules.push(Rule::new(
                self.name("files"),
                format!("Target {n}: delivered files exist"),
                Severity::High,
                Category::Structure,
                CheckSpec::FilePatterns(FilePatterns {
                    patterns: ctx.files.clone(),
                    issue_type: "missing_target_file".into(),
                    severity: Severity::High,
                }),
            ));
        }

        rules.extend(self.model_rules(&ctx, spec));

        if !ctx.views.is_empty() {
            rules.push(Rule::new(
                self.name("api_views"),
                format!("Target {n}: views are implemented"),
                Severity::High,
                Category::Api,
                CheckSpec::DefinitionsPresent(DefinitionsPresent {
                    files: strings(&["views.py", "viewsets.py", "views/*.py"]),
                    names: ctx.views.clone(),
                    issue_type: "missing_target_view".into(),
                    severity: Severity::High,
                }),
            ));
        }

        if !ctx.urls.is_empty() {
            rules.push(Rule::new(
                self.name("urls"),
                format!("Target {n}: routes are registered"),
                Severity::Medium,
                Category::Api,
                CheckSpec::TextPresent(TextPresent {
                    files: strings(&["urls.py"]),
                    issue_type: "missing_target_url".into(),
                    requirements: literal_requirements(
                        &ctx.urls,
                        |u| format!("Route {u} is registered"),
                        Severity::Medium,
                    ),
                }),
            ));
        }

        if !ctx.templates.is_empty() {
            rules.push(Rule::new(
                self.name("templates"),
                format!("Target {n}: templates exist"),
                Severity::Medium,
                Category::Content,
                CheckSpec::FilePatterns(FilePatterns {
                    patterns: ctx.templates.clone(),
                    issue_type: "missing_target_template".into(),
                    severity: Severity::Medium,
                }),
            ));
        }

        if !ctx.components.is_empty() {
            rules.push(Rule::new(
                self.name("components"),
                format!("Target {n}: frontend components exist"),
                Severity::Medium,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: strings(&["*.tsx", "*.jsx"]),
                    issue_type: "missing_target_component".into(),
                    requirements: ctx
                        .components
                        .iter()
                        .map(|c| {
                            requirement(
                                format!("Component {c} is defined"),
                                vec![format!("function {c}"), format!("const {c}"), format!("class {c}")],
                                Severity::Medium,
                            )
                        })
                        .collect(),
                }),
            ));
        }

        let tested: Vec<&String> = ctx.models.iter().chain(&ctx.views).collect();
        if !tested.is_empty() {
            rules.push(Rule::new(
                self.name("tests"),
                format!("Target {n}: tests cover the delivered models and views"),
                Severity::High,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: strings(&["test*.py", "*_test.py"]),
                    issue_type: "missing_target_tests".into(),
                    requirements: tested
                        .iter()
                        .map(|name| {
                            requirement(
                                format!("Tests exercise {name}"),
                                vec![(*name).clone(), name.to_lowercase()],
                                Severity::High,
                            )
                        })
                        .collect(),
                }),
            ));
        }

        if !ctx.models.is_empty() {
            rules.push(Rule::new(
                self.name("migrations"),
                format!("Target {n}: models have migrations"),
                Severity::Medium,
                Category::Models,
                CheckSpec::Migrations(Migrations {
                    apps: Vec::new(),
                    operations: strings(&["CreateModel"]),
                    require_reversible: false,
                }),
            ));
        }

        if !ctx.settings.is_empty() {
            rules.push(Rule::new(
                self.name("settings"),
                format!("Target {n}: settings are configured"),
                Severity::Medium,
                Category::Content,
                CheckSpec::TextPresent(TextPresent {
                    files: strings(&["settings.py"]),
                    issue_type: "missing_target_setting".into(),
                    requirements: literal_requirements(
                        &ctx.settings,
                        |s| format!("{s} is configured"),
                        Severity::Medium,
                    ),
                }),
            ));
        }

        rules
    }
}
