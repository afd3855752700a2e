//! Configuration loader: seeds defaults, then drives the line splicer and
//! directive dispatcher over a source.

use crate::core::configuration::{self, Configuration};
use crate::error::{ConfError, Result};
use crate::model::format::DEFAULT_FORMAT_NAME;
use crate::model::{Format, Rule};
use crate::parse::{Directive, GlobalOption, LineSplicer, MAX_LINE_LEN, MAX_PATH_LEN};
use crate::sources::ConfigSource;
use tracing::{debug, error, warn};

/// Rule installed when no configuration source is given.
pub const DEFAULT_RULE: &str = "*.*        >stdout";

/// Builds a [`Configuration`] from a source, or from defaults alone.
///
/// Every call works on a fresh value; nothing is shared between builds, so
/// a failed build leaves no trace anywhere.
pub struct ConfigLoader {
    strict: bool,
}

impl ConfigLoader {
    /// Create a loader. In `strict` mode a malformed format or rule line is
    /// always fatal, whatever `@ignore_error_format_rule` says.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Build a configuration.
    ///
    /// With a source, every logical line is applied in order. Without one,
    /// the single catch-all [`DEFAULT_RULE`] is installed instead.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, annotated with the source name and line
    /// number for per-line failures, or a validation error for an
    /// inconsistent result.
    pub fn load(&self, source: Option<&dyn ConfigSource>) -> Result<Configuration> {
        let mut conf = Configuration::seeded()?;

        match source {
            Some(source) => self.read(&mut conf, source)?,
            None => install_default_rule(&mut conf)?,
        }
        configuration::check(&conf)?;

        debug!(
            source = %conf.source_name,
            formats = conf.formats.len(),
            rules = conf.rules.len(),
            "configuration built"
        );
        Ok(conf)
    }

    fn read(&self, conf: &mut Configuration, source: &dyn ConfigSource) -> Result<()> {
        let name = source.name();
        if let Some(path) = source.path() {
            let len = path.as_os_str().len();
            if len > MAX_PATH_LEN {
                return Err(ConfError::NameTooLong {
                    what: "configuration path",
                    len,
                    max: MAX_PATH_LEN,
                });
            }
            conf.source_path = Some(path.to_path_buf());
        }
        conf.source_mtime = source.modified()?;
        conf.source_name = name.clone();

        let reader = source.open()?;
        for line in LineSplicer::new(reader, name.as_str(), MAX_LINE_LEN) {
            let line = line?;
            debug!(line = line.first_line, text = %line.text, "parsing configuration line");

            if let Err(err) = self.apply_line(conf, &line.text) {
                let err = err.at_line(name.as_str(), line.first_line);
                error!(error = %err, "configuration line rejected");
                return Err(err);
            }
        }
        Ok(())
    }

    fn apply_line(&self, conf: &mut Configuration, line: &str) -> Result<()> {
        let directive = Directive::classify(line)?;
        let skippable = directive.is_skippable();

        match dispatch(conf, directive) {
            Err(err) if skippable && conf.ignore_malformed_entries && !self.strict => {
                warn!(error = %err, line, "skipping malformed entry");
                Ok(())
            }
            other => other,
        }
    }
}

fn dispatch(conf: &mut Configuration, directive: Directive<'_>) -> Result<()> {
    match directive {
        Directive::Option(option) => apply_option(conf, option),
        Directive::Format(text) => {
            let format = Format::compile(text)?;
            conf.push_format(format);
            Ok(())
        }
        Directive::Rule(text) => {
            let rule = Rule::compile(text, &conf.default_format, &conf.formats, &conf.levels)?;
            conf.push_rule(rule);
            Ok(())
        }
    }
}

fn apply_option(conf: &mut Configuration, option: GlobalOption) -> Result<()> {
    match option {
        GlobalOption::IgnoreErrorFormatRule(enabled) => {
            conf.ignore_malformed_entries = enabled;
            debug!(ignore_error_format_rule = enabled);
        }
        GlobalOption::BufSizeMin(size) => {
            conf.min_buffer_size = size;
            debug!(buf_size_min = size);
        }
        GlobalOption::BufSizeMax(size) => {
            conf.max_buffer_size = size;
            debug!(buf_size_max = size);
        }
        GlobalOption::RotateLockFile(path) => {
            if path.len() > MAX_PATH_LEN {
                return Err(ConfError::NameTooLong {
                    what: "rotate_lock_file",
                    len: path.len(),
                    max: MAX_PATH_LEN,
                });
            }
            debug!(rotate_lock_file = %path);
            conf.rotation_lock_path = path;
        }
        GlobalOption::DefaultFormat(definition) => {
            let line = format!("&{} {}", DEFAULT_FORMAT_NAME, definition);
            if line.len() > MAX_LINE_LEN {
                return Err(ConfError::LineTooLong {
                    len: line.len(),
                    max: MAX_LINE_LEN,
                });
            }
            conf.set_default_format(Format::compile(&line)?);
            debug!(default_format = %conf.default_format, "overrode built-in default format");
        }
        GlobalOption::Level {
            name,
            value,
            syslog,
        } => {
            conf.define_level(&name, value, syslog.as_deref())?;
            debug!(level = %name, value, "defined level");
        }
    }
    Ok(())
}

fn install_default_rule(conf: &mut Configuration) -> Result<()> {
    let rule = Rule::compile(DEFAULT_RULE, &conf.default_format, &conf.formats, &conf.levels)
        .map_err(|e| ConfError::ResourceInit(format!("built-in default rule: {}", e)))?;
    conf.push_rule(rule);
    Ok(())
}
