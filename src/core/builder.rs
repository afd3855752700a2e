//! Builder for constructing LogConf instances.

use crate::core::config_handle::{Validator, build_configuration};
use crate::core::{Configuration, LogConf};
use crate::error::{Result, ValidationError};
use crate::sources::{ConfigSource, FileSource, TextSource, env};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for constructing a [`LogConf`] handle.
///
/// # Examples
///
/// ```rust,no_run
/// use hotlog_conf::prelude::*;
///
/// # fn example() -> Result<()> {
/// let conf = LogConf::builder()
///     .with_file("/etc/app/log.conf")
///     .strict(true)
///     .with_validation(|conf| {
///         if conf.rules().is_empty() {
///             return Err(ValidationError::custom("at least one rule is required"));
///         }
///         Ok(())
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct LogConfBuilder {
    source: Option<Arc<dyn ConfigSource>>,
    env_path: bool,
    strict: Option<bool>,
    validator: Option<Validator>,
}

impl LogConfBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            source: None,
            env_path: false,
            strict: None,
            validator: None,
        }
    }

    /// Load from the file at `path`.
    pub fn with_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_source(FileSource::new(path))
    }

    /// Load from in-memory text; `name` labels error locations.
    pub fn with_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_source(TextSource::new(name, text))
    }

    /// Load from a custom source. The last source given wins.
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Fall back to the file named by `HOTLOG_CONF_PATH` when no source is given.
    pub fn with_env_path(mut self, enabled: bool) -> Self {
        self.env_path = enabled;
        self
    }

    /// Force strict mode on or off for this handle, instead of following
    /// the process-wide toggle.
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = Some(enabled);
        self
    }

    /// Add a check that every built configuration must pass, on the
    /// initial build and on each reload.
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Configuration) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Build the initial configuration and wrap it in a handle.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source cannot be read
    /// - A line is too long, malformed, or names an unknown option
    /// - Validation fails
    pub fn build(self) -> Result<LogConf> {
        let source = self.source.or_else(|| {
            self.env_path
                .then(env::path_from_env)
                .flatten()
                .map(|path| Arc::new(FileSource::new(path)) as Arc<dyn ConfigSource>)
        });

        let conf = build_configuration(source.as_deref(), self.strict, self.validator.as_ref())
            .inspect_err(|err| tracing::error!(error = %err, "initial configuration load failed"))?;

        tracing::info!(
            source = %conf.source_name(),
            formats = conf.formats().len(),
            rules = conf.rules().len(),
            "configuration initialized"
        );
        Ok(LogConf::from_parts(conf, source, self.strict, self.validator))
    }
}

impl Default for LogConfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
