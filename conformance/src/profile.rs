//! Validation profiles and the TOML configuration surface.
//!
//! ```toml
//! validation_profile = "production"
//! ignored_validations = ["validate_docker_files"]
//!
//! [tolerance]
//! missing_documentation = true
//!
//! [profiles.team]
//! min_score_threshold = 80
//! max_penalty_factor = 0.5
//! required_categories = ["STRUCTURE", "MODELS"]
//! ```
//!
//! A missing configuration file yields the built-in defaults. Profiles
//! declared in the file replace built-ins of the same name; the others
//! remain available.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::report::{Category, Issue};
use crate::scorer::{CategoryWeights, ScoringWeights, SeverityWeights};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "validation_config.toml";

/// Profile used when neither the file nor the caller picks one.
pub const DEFAULT_PROFILE: &str = "moderate";

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but cannot be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },
    /// The requested profile is not defined.
    #[error("unknown profile `{name}` (available: {available})")]
    UnknownProfile {
        /// Requested name.
        name: String,
        /// Comma-separated defined names.
        available: String,
    },
}

/// A named pass/fail configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// One-line description for `--list-profiles`.
    pub description: String,
    /// Minimum passing score.
    pub min_score_threshold: f64,
    /// Requested penalty-factor cap (never applied above 0.5).
    pub max_penalty_factor: f64,
    /// Categories whose issues the report calls out.
    pub required_categories: Vec<Category>,
    /// Categories the report lists first.
    pub focus_categories: Vec<Category>,
    /// File names whose `missing_file` issues are discarded.
    pub ignore_missing_files: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            description: String::new(),
            min_score_threshold: 75.0,
            max_penalty_factor: 0.5,
            required_categories: Vec::new(),
            focus_categories: Vec::new(),
            ignore_missing_files: Vec::new(),
        }
    }
}

impl Profile {
    fn builtin(description: &str, threshold: f64, cap: f64, required: &[Category]) -> Self {
        Self {
            description: description.to_string(),
            min_score_threshold: threshold,
            max_penalty_factor: cap,
            required_categories: required.to_vec(),
            ..Self::default()
        }
    }

    /// Returns true if a `missing_file` issue for `issue.file_path` is
    /// waived by this profile.
    #[must_use]
    pub fn waives(&self, issue: &Issue) -> bool {
        issue.issue_type == "missing_file"
            && self
                .ignore_missing_files
                .iter()
                .any(|f| issue.file_path.ends_with(f.as_str()))
    }
}

/// The built-in profiles.
#[must_use]
pub fn builtin_profiles() -> BTreeMap<String, Profile> {
    use Category::{Api, Content, Dependencies, Models, Structure};
    let all = [Structure, Content, Models, Dependencies, Api];
    [
        ("permissive", Profile::builtin("Early prototypes", 60.0, 0.3, &[Structure])),
        ("development", Profile::builtin("Initial development", 65.0, 0.3, &[Structure, Models])),
        ("moderate", Profile::builtin("General use", 75.0, 0.5, &[Structure, Content, Models])),
        ("ci_cd", Profile::builtin("CI/CD pipelines", 75.0, 0.5, &[Structure, Content, Models])),
        ("production", Profile::builtin("Production deploys", 85.0, 0.7, &all)),
        ("strict", Profile::builtin("Rigorous review", 90.0, 0.8, &all)),
        ("architecture_review", Profile::builtin("Architecture review", 95.0, 0.9, &all)),
    ]
    .into_iter()
    .map(|(name, p)| (name.to_string(), p))
    .collect()
}

/// Issue-type families that may be tolerated as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Documentation gaps (missing docstrings, README sections, files).
    pub missing_documentation: bool,
    /// Missing CI pipeline or steps.
    pub missing_ci_cd: bool,
    /// Missing Docker files.
    pub missing_docker: bool,
}

impl Tolerance {
    /// Returns true if issues of `issue_type` are tolerated.
    #[must_use]
    pub fn tolerates(&self, issue_type: &str) -> bool {
        match issue_type {
            "missing_documentation"
            | "missing_docstring"
            | "missing_readme_section"
            | "incomplete_documentation"
            | "insufficient_documentation" => self.missing_documentation,
            "missing_ci_pipeline" | "missing_ci_step" => self.missing_ci_cd,
            "missing_docker_file" => self.missing_docker,
            _ => false,
        }
    }
}

fn default_mandatory() -> Vec<String> {
    [
        "validate_directory_structure",
        "validate_django_models",
        "validate_django_settings_advanced",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Active profile name.
    pub validation_profile: String,
    /// Defined profiles, built-ins included.
    pub profiles: BTreeMap<String, Profile>,
    /// Rule names skipped during execution.
    pub ignored_validations: Vec<String>,
    /// Rule names that run even when ignored.
    pub mandatory_validations: Vec<String>,
    /// Tolerated issue families.
    pub tolerance: Tolerance,
    /// Overrides the manifest's severity weights.
    pub severity_weights: Option<SeverityWeights>,
    /// Overrides the manifest's category weights.
    pub category_weights: Option<CategoryWeights>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validation_profile: DEFAULT_PROFILE.to_string(),
            profiles: builtin_profiles(),
            ignored_validations: Vec::new(),
            mandatory_validations: default_mandatory(),
            tolerance: Tolerance::default(),
            severity_weights: None,
            category_weights: None,
        }
    }
}

impl ValidationConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text does not match the schema.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        for (name, profile) in builtin_profiles() {
            config.profiles.entry(name).or_insert(profile);
        }
        Ok(config)
    }

    /// Loads `path`, or the built-in defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Resolves `name` (or the configured active profile).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] if the profile is not defined.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name.unwrap_or(&self.validation_profile);
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                available: self.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    /// Returns true if the rule named `rule` must be skipped.
    #[must_use]
    pub fn is_ignored(&self, rule: &str) -> bool {
        self.ignored_validations.iter().any(|r| r == rule)
            && !self.mandatory_validations.iter().any(|r| r == rule)
    }

    /// Applies the configured weight overrides to `weights`.
    #[must_use]
    pub fn weights_over(&self, weights: ScoringWeights) -> ScoringWeights {
        ScoringWeights {
            severity: self.severity_weights.unwrap_or(weights.severity),
            category: self.category_weights.unwrap_or(weights.category),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = ValidationConfig::load(Path::new("/no/such/validation_config.toml")).unwrap();
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "moderate");
        assert_eq!(profile.min_score_threshold, 75.0);
        assert_eq!(config.profiles.len(), 7);
    }

    #[test]
    fn file_overrides_and_extends() {
        let text = r#"
validation_profile = "team"
ignored_validations = ["validate_docker_files", "validate_directory_structure"]

[tolerance]
missing_docker = true

[profiles.team]
min_score_threshold = 80
required_categories = ["MODELS"]
ignore_missing_files = [".env.example"]

[profiles.strict]
min_score_threshold = 99

[severity_weights]
CRITICAL = 20
"#;
        let config = ValidationConfig::from_toml(text, Path::new("cfg.toml")).unwrap();
        let (name, team) = config.profile(None).unwrap();
        assert_eq!(name, "team");
        assert_eq!(team.min_score_threshold, 80.0);
        assert_eq!(team.max_penalty_factor, 0.5);
        assert_eq!(config.profile(Some("strict")).unwrap().1.min_score_threshold, 99.0);
        assert!(config.profiles.contains_key("permissive"));

        assert!(config.is_ignored("validate_docker_files"));
        assert!(!config.is_ignored("validate_directory_structure"));
        assert!(config.tolerance.tolerates("missing_docker_file"));
        assert!(!config.tolerance.tolerates("missing_ci_step"));

        let w = config.weights_over(ScoringWeights::default());
        assert_eq!(w.severity.critical, 20.0);
        assert_eq!(w.severity.high, 8.0);
        assert_eq!(w.category.models, 2.0);
    }

    #[test]
    fn unknown_profile() {
        let err = ValidationConfig::default().profile(Some("lenient")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));
        assert!(err.to_string().contains("architecture_review"));
    }

    #[test]
    fn invalid_file() {
        let err = ValidationConfig::from_toml("validation_profile = [", Path::new("x.toml"));
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn waived_missing_files() {
        let profile = Profile {
            ignore_missing_files: vec![".env.example".into()],
            ..Profile::default()
        };
        let issue = Issue::new(".env.example", "missing_file", "d", "e", "a", crate::Severity::Medium);
        assert!(profile.waives(&issue));
        let other = Issue::new("README.md", "missing_file", "d", "e", "a", crate::Severity::Medium);
        assert!(!profile.waives(&other));
    }
}
