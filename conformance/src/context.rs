//! Per-run context threaded through execution.

use std::path::{Path, PathBuf};

use tracing::Span;

use crate::profile::{ConfigError, Profile, ValidationConfig};

/// Everything one validation run needs besides the rules themselves.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Directory the checks run against.
    pub root: PathBuf,
    /// Loaded configuration.
    pub config: ValidationConfig,
    /// Name of the active profile.
    pub profile_name: String,
    /// The active profile.
    pub profile: Profile,
    /// Span entered for the duration of the run.
    pub span: Span,
}

impl RunContext {
    /// Builds a context, resolving `profile` (or the configured default).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] if the profile is undefined.
    pub fn new(
        root: impl AsRef<Path>,
        config: ValidationConfig,
        profile: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let (name, resolved) = config.profile(profile)?;
        let (profile_name, profile) = (name.to_string(), resolved.clone());
        let root = root.as_ref().to_path_buf();
        let span = tracing::info_span!("validate", root = %root.display(), profile = %profile_name);
        Ok(Self {
            root,
            config,
            profile_name,
            profile,
            span,
        })
    }

    /// Context with built-in defaults and the default profile.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in configuration; the `Result` mirrors
    /// [`RunContext::new`].
    pub fn with_defaults(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::new(root, ValidationConfig::default(), None)
    }
}
