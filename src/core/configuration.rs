//! The immutable configuration snapshot consulted by the logging hot path.

use crate::core::Validate;
use crate::error::{ConfError, Result, ValidationError};
use crate::model::format::DEFAULT_FORMAT_NAME;
use crate::model::{CategoryMatch, Format, Level, LevelRegistry, Rule};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default lower bound of per-thread output buffers.
pub const DEFAULT_BUF_SIZE_MIN: u64 = 1024;

/// Default upper bound of per-thread output buffers.
pub const DEFAULT_BUF_SIZE_MAX: u64 = 2 * 1024 * 1024;

/// Default cross-process rotation lock file.
pub const DEFAULT_ROTATE_LOCK_FILE: &str = "/tmp/hotlog.lock";

/// One accepted directive, in the order it appeared in the source.
///
/// Rules bind their format when they are compiled, so the dump has to
/// replay `@default_format`, `@level` and format definitions exactly where
/// they were declared for a reload of the dump to bind the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Declaration {
    /// `@default_format`, by template; the replaced format is not kept alive.
    DefaultFormat(String),
    /// `@level`, as defined at that point.
    Level(Level),
    /// Index into `formats`.
    Format(usize),
    /// Index into `rules`.
    Rule(usize),
}

/// A fully built configuration.
///
/// Instances only exist in a complete state: the loader either returns a
/// populated value or an error. Nothing in a published configuration is
/// mutated afterwards, so any number of threads can read it concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) source_name: String,
    pub(crate) source_path: Option<PathBuf>,
    pub(crate) source_mtime: Option<String>,
    pub(crate) ignore_malformed_entries: bool,
    pub(crate) min_buffer_size: u64,
    pub(crate) max_buffer_size: u64,
    pub(crate) rotation_lock_path: String,
    pub(crate) default_format: Arc<Format>,
    pub(crate) formats: Vec<Arc<Format>>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) levels: LevelRegistry,
    pub(crate) declarations: Vec<Declaration>,
}

impl Configuration {
    /// A configuration holding only the built-in defaults, with no formats
    /// and no rules.
    pub(crate) fn seeded() -> Result<Self> {
        Ok(Self {
            source_name: String::new(),
            source_path: None,
            source_mtime: None,
            ignore_malformed_entries: false,
            min_buffer_size: DEFAULT_BUF_SIZE_MIN,
            max_buffer_size: DEFAULT_BUF_SIZE_MAX,
            rotation_lock_path: DEFAULT_ROTATE_LOCK_FILE.to_string(),
            default_format: Arc::new(Format::builtin_default()?),
            formats: Vec::new(),
            rules: Vec::new(),
            levels: LevelRegistry::builtin(),
            declarations: Vec::new(),
        })
    }

    pub(crate) fn push_format(&mut self, format: Format) {
        self.declarations.push(Declaration::Format(self.formats.len()));
        self.formats.push(Arc::new(format));
    }

    pub(crate) fn push_rule(&mut self, rule: Rule) {
        self.declarations.push(Declaration::Rule(self.rules.len()));
        self.rules.push(rule);
    }

    /// Replace the default format; the previous one is dropped here unless a
    /// rule still holds it.
    pub(crate) fn set_default_format(&mut self, format: Format) {
        self.declarations
            .push(Declaration::DefaultFormat(format.template().to_string()));
        self.default_format = Arc::new(format);
    }

    pub(crate) fn define_level(&mut self, name: &str, value: i64, syslog: Option<&str>) -> Result<()> {
        self.levels.define(name, value, syslog)?;
        if let Some(level) = self.levels.get(name) {
            self.declarations.push(Declaration::Level(level.clone()));
        }
        Ok(())
    }

    /// Name of the source this configuration was loaded from; empty for
    /// the built-in defaults.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Path of the file this configuration was loaded from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Modification time of the source file at load time.
    pub fn source_mtime(&self) -> Option<&str> {
        self.source_mtime.as_deref()
    }

    /// Whether malformed format and rule lines were skipped during load.
    pub fn ignore_malformed_entries(&self) -> bool {
        self.ignore_malformed_entries
    }

    /// Lower bound for per-thread output buffers, in bytes.
    pub fn min_buffer_size(&self) -> u64 {
        self.min_buffer_size
    }

    /// Upper bound for per-thread output buffers, in bytes.
    pub fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }

    /// Path of the cross-process rotation lock file.
    pub fn rotation_lock_path(&self) -> &str {
        &self.rotation_lock_path
    }

    /// Format used by rules that do not name one.
    pub fn default_format(&self) -> &Arc<Format> {
        &self.default_format
    }

    /// Named formats in declaration order.
    pub fn formats(&self) -> &[Arc<Format>] {
        &self.formats
    }

    /// Look a format up by name; the last definition wins.
    pub fn format(&self, name: &str) -> Option<&Arc<Format>> {
        self.formats.iter().rev().find(|f| f.name() == name)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Levels known to this configuration.
    pub fn levels(&self) -> &LevelRegistry {
        &self.levels
    }

    /// Rules that route a record of `category` at `level`, in declaration order.
    ///
    /// Rules with the `!` category apply only to categories that no other
    /// rule's category selector claims.
    pub fn matching_rules<'a>(
        &'a self,
        category: &'a str,
        level: u8,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        let claimed = self.rules.iter().any(|r| r.category().matches(category));
        self.rules.iter().filter(move |rule| {
            let category_ok = if claimed {
                rule.category().matches(category)
            } else {
                *rule.category() == CategoryMatch::Unmatched
            };
            category_ok && rule.level().matches(level)
        })
    }

    /// Emit the full configuration through `tracing` at info level.
    pub fn profile(&self) {
        tracing::info!(
            source = %self.source_name,
            mtime = self.source_mtime.as_deref().unwrap_or("-"),
            formats = self.formats.len(),
            rules = self.rules.len(),
            "configuration profile"
        );
        for line in self.to_string().lines() {
            tracing::info!("{}", line);
        }
    }

    /// Serializable summary of the configuration.
    pub fn to_profile(&self) -> ConfigProfile {
        ConfigProfile {
            source: self.source_name.clone(),
            mtime: self.source_mtime.clone(),
            ignore_error_format_rule: self.ignore_malformed_entries,
            buf_size_min: self.min_buffer_size,
            buf_size_max: self.max_buffer_size,
            rotate_lock_file: self.rotation_lock_path.clone(),
            levels: self.custom_levels().map(ToString::to_string).collect(),
            default_format: self.default_format.to_string(),
            formats: self.formats.iter().map(|f| f.to_string()).collect(),
            rules: self.rules.iter().map(ToString::to_string).collect(),
        }
    }

    fn custom_levels(&self) -> impl Iterator<Item = &Level> {
        let builtin = LevelRegistry::builtin();
        self.levels
            .iter()
            .filter(move |level| builtin.get(level.name()) != Some(*level))
    }
}

/// Renders the configuration as loadable configuration text: scalar options
/// first, then default-format overrides, levels, formats and rules
/// interleaved exactly as they were declared, so every rule reloads bound to
/// the same format and level values.
impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.source_name.is_empty() {
            writeln!(f, "# source: {}", self.source_name)?;
        }
        if let Some(mtime) = &self.source_mtime {
            writeln!(f, "# mtime: {}", mtime)?;
        }
        writeln!(
            f,
            "@ignore_error_format_rule {}",
            self.ignore_malformed_entries
        )?;
        writeln!(f, "@buf_size_min {}", self.min_buffer_size)?;
        writeln!(f, "@buf_size_max {}", self.max_buffer_size)?;
        writeln!(f, "@rotate_lock_file {}", self.rotation_lock_path)?;
        for declaration in &self.declarations {
            match declaration {
                Declaration::DefaultFormat(template) => {
                    writeln!(f, "@default_format \"{}\"", template)?
                }
                Declaration::Level(level) => writeln!(f, "@level {}", level)?,
                Declaration::Format(i) => {
                    if let Some(format) = self.formats.get(*i) {
                        writeln!(f, "{}", format)?;
                    }
                }
                Declaration::Rule(i) => {
                    if let Some(rule) = self.rules.get(*i) {
                        writeln!(f, "{}", rule)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl Validate for Configuration {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut errors = Vec::new();
        if self.min_buffer_size == 0 {
            errors.push(ValidationError::invalid_field(
                "buf_size_min",
                "must be greater than 0",
            ));
        }
        if self.min_buffer_size > self.max_buffer_size {
            errors.push(ValidationError::invalid_field(
                "buf_size_min",
                format!(
                    "{} exceeds buf_size_max {}",
                    self.min_buffer_size, self.max_buffer_size
                ),
            ));
        }
        if self.default_format.name() != DEFAULT_FORMAT_NAME {
            errors.push(ValidationError::invalid_field(
                "default_format",
                format!("must be named '{}'", DEFAULT_FORMAT_NAME),
            ));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

/// Serializable view of a [`Configuration`], for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigProfile {
    /// Source name
    pub source: String,
    /// Source modification time
    pub mtime: Option<String>,
    /// `@ignore_error_format_rule`
    pub ignore_error_format_rule: bool,
    /// `@buf_size_min`
    pub buf_size_min: u64,
    /// `@buf_size_max`
    pub buf_size_max: u64,
    /// `@rotate_lock_file`
    pub rotate_lock_file: String,
    /// Levels added or changed by `@level`
    pub levels: Vec<String>,
    /// Default format definition
    pub default_format: String,
    /// Format definitions in declaration order
    pub formats: Vec<String>,
    /// Rule definitions in declaration order
    pub rules: Vec<String>,
}

impl ConfigProfile {
    /// Render the profile as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::Validation`] if serialization fails.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfError::Validation(format!("profile serialization: {}", e)))
    }
}

/// Map a failed [`Validate`] check on a configuration into a [`ConfError`].
pub(crate) fn check(conf: &Configuration) -> Result<()> {
    conf.validate().map_err(ConfError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_rules(lines: &[&str]) -> Configuration {
        let mut conf = Configuration::seeded().unwrap();
        for line in lines {
            let rule =
                Rule::compile(line, &conf.default_format, &conf.formats, &conf.levels).unwrap();
            conf.push_rule(rule);
        }
        conf
    }

    #[test]
    fn test_seeded_defaults() {
        let conf = Configuration::seeded().unwrap();
        assert_eq!(conf.min_buffer_size(), 1024);
        assert_eq!(conf.max_buffer_size(), 2 * 1024 * 1024);
        assert_eq!(conf.rotation_lock_path(), DEFAULT_ROTATE_LOCK_FILE);
        assert_eq!(conf.default_format().name(), "default");
        assert!(conf.formats().is_empty());
        assert!(conf.rules().is_empty());
        assert!(check(&conf).is_ok());
    }

    #[test]
    fn test_matching_rules_in_declaration_order() {
        let conf = with_rules(&["*.ERROR >stderr", "app.* >stdout", "db.* >stdout"]);
        let outputs: Vec<String> = conf
            .matching_rules("app", 100)
            .map(ToString::to_string)
            .collect();
        assert_eq!(outputs, vec!["*.ERROR >stderr", "app.* >stdout"]);
    }

    #[test]
    fn test_unmatched_category_rule() {
        let conf = with_rules(&["app.* >stdout", "!.* >stderr"]);
        let for_app: Vec<String> = conf.matching_rules("app", 20).map(ToString::to_string).collect();
        assert_eq!(for_app, vec!["app.* >stdout"]);

        let for_other: Vec<String> =
            conf.matching_rules("other", 20).map(ToString::to_string).collect();
        assert_eq!(for_other, vec!["!.* >stderr"]);
    }

    #[test]
    fn test_inverted_buffer_bounds_rejected() {
        let mut conf = Configuration::seeded().unwrap();
        conf.min_buffer_size = 4096;
        conf.max_buffer_size = 1024;
        let err = check(&conf).unwrap_err();
        assert!(matches!(err, ConfError::Validation(_)));
        assert!(err.to_string().contains("buf_size_max"));
    }

    #[test]
    fn test_display_renders_loadable_text() {
        let mut conf = Configuration::seeded().unwrap();
        conf.define_level("TRACE", 10, None).unwrap();
        let rule =
            Rule::compile("*.TRACE >stdout", &conf.default_format, &conf.formats, &conf.levels)
                .unwrap();
        conf.push_rule(rule);
        let text = conf.to_string();
        assert!(text.contains("@buf_size_min 1024\n"));
        assert!(text.contains("@level TRACE = 10, LOG_DEBUG\n"));
        assert!(!text.contains("@level INFO"));
        assert!(text.ends_with("*.TRACE >stdout\n"));
    }

    #[test]
    fn test_display_follows_declaration_order() {
        let mut conf = with_rules(&["*.* >stdout"]);
        conf.push_format(Format::compile("&short \"%m%n\"").unwrap());
        conf.set_default_format(Format::compile("&default \"%V %m%n\"").unwrap());
        let rule = Rule::compile(
            "app.* >stderr; short",
            &conf.default_format,
            &conf.formats,
            &conf.levels,
        )
        .unwrap();
        conf.push_rule(rule);

        let text = conf.to_string();
        let positions: Vec<usize> = [
            "*.* >stdout\n",
            "&short \"%m%n\"\n",
            "@default_format \"%V %m%n\"\n",
            "app.* >stderr; short\n",
        ]
        .iter()
        .map(|line| text.find(line).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{}", text);
    }

    #[test]
    fn test_profile_lists_everything() {
        let conf = with_rules(&["*.* >stdout", "app.* >stderr"]);
        let profile = conf.to_profile();
        assert_eq!(profile.rules, vec!["*.* >stdout", "app.* >stderr"]);
        assert_eq!(profile.default_format, conf.default_format().to_string());
        assert!(profile.levels.is_empty());
    }
}
