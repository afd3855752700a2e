//! `@name value` global options.

use super::byte_size::parse_byte_size;
use crate::error::{ConfError, Result};

/// A parsed global option line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalOption {
    /// `@ignore_error_format_rule true|false`
    IgnoreErrorFormatRule(bool),
    /// `@buf_size_min <size>`
    BufSizeMin(u64),
    /// `@buf_size_max <size>`
    BufSizeMax(u64),
    /// `@rotate_lock_file <path>`
    RotateLockFile(String),
    /// `@default_format "<template>"`; holds everything after the option name.
    DefaultFormat(String),
    /// `@level NAME = value [, LOG_PRIORITY]`
    Level {
        /// Level name as written
        name: String,
        /// Numeric value, range-checked by the registry
        value: i64,
        /// Optional syslog priority name
        syslog: Option<String>,
    },
}

impl GlobalOption {
    /// Parse a line starting with `@`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::Syntax`] if the name or value is missing or the
    /// value is malformed, and [`ConfError::UnknownOption`] for an
    /// unrecognized name.
    pub fn parse(line: &str) -> Result<Self> {
        let body = line
            .strip_prefix('@')
            .ok_or_else(|| ConfError::syntax(format!("option line must start with '@': [{}]", line)))?;
        let (name, remainder) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        let value = remainder.split_whitespace().next().unwrap_or("");
        if name.is_empty() || value.is_empty() {
            return Err(ConfError::syntax(format!(
                "option name or value is missing: [{}]",
                line
            )));
        }

        let option = match name {
            "ignore_error_format_rule" => {
                Self::IgnoreErrorFormatRule(value.eq_ignore_ascii_case("true"))
            }
            "buf_size_min" => Self::BufSizeMin(parse_byte_size(value)?),
            "buf_size_max" => Self::BufSizeMax(parse_byte_size(value)?),
            "rotate_lock_file" => Self::RotateLockFile(value.to_string()),
            "default_format" => Self::DefaultFormat(remainder.to_string()),
            "level" => parse_level(remainder)?,
            other => return Err(ConfError::UnknownOption(other.to_string())),
        };
        Ok(option)
    }
}

fn parse_level(text: &str) -> Result<GlobalOption> {
    let malformed = || {
        ConfError::syntax(format!(
            "level must be 'NAME = value [, LOG_PRIORITY]': [{}]",
            text
        ))
    };

    let (name, rhs) = text.split_once('=').ok_or_else(malformed)?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(malformed());
    }
    let (value, syslog) = match rhs.split_once(',') {
        Some((value, syslog)) => (value.trim(), Some(syslog.trim())),
        None => (rhs.trim(), None),
    };
    let value = value.parse::<i64>().map_err(|_| malformed())?;
    let syslog = match syslog {
        Some("") => return Err(malformed()),
        other => other.map(str::to_string),
    };

    Ok(GlobalOption::Level {
        name: name.to_string(),
        value,
        syslog,
    })
}
