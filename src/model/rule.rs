//! Rule engine: compiles `category.level output;format` lines into [`Rule`]s.

use super::format::{Format, is_identifier};
use super::level::LevelRegistry;
use crate::error::{ConfError, Result};
use crate::parse::byte_size::parse_byte_size;
use crate::parse::MAX_PATH_LEN;
use std::fmt;
use std::sync::Arc;

/// Which categories a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMatch {
    /// `*`: every category.
    All,
    /// `!`: categories no other rule matches.
    Unmatched,
    /// `name_`: `name` itself and every `name_...` descendant. Stored without the underscore.
    Prefix(String),
    /// `name`: exactly this category.
    Exact(String),
}

impl CategoryMatch {
    fn parse(text: &str) -> Result<Self> {
        match text {
            "*" => Ok(Self::All),
            "!" => Ok(Self::Unmatched),
            _ if !is_identifier(text) => {
                Err(ConfError::syntax(format!("invalid category '{}'", text)))
            }
            _ => match text.strip_suffix('_') {
                Some(stem) if !stem.is_empty() => Ok(Self::Prefix(stem.to_string())),
                _ => Ok(Self::Exact(text.to_string())),
            },
        }
    }

    /// Whether `category` is selected. `Unmatched` never matches on its own.
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Unmatched => false,
            Self::Exact(name) => category == name,
            Self::Prefix(stem) => {
                category == stem
                    || (category.starts_with(stem.as_str())
                        && category.as_bytes().get(stem.len()) == Some(&b'_'))
            }
        }
    }
}

impl fmt::Display for CategoryMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Unmatched => f.write_str("!"),
            Self::Prefix(stem) => write!(f, "{}_", stem),
            Self::Exact(name) => f.write_str(name),
        }
    }
}

/// Comparison applied by a level selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOp {
    /// `LEVEL`: at least as severe.
    AtLeast,
    /// `=LEVEL`: exactly this level.
    Exactly,
    /// `!LEVEL`: any level but this one.
    Not,
}

/// Which levels a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSelector {
    /// `*`
    All,
    /// A comparison against a named level.
    Cmp {
        /// Comparison
        op: LevelOp,
        /// Upper-case level name as registered
        name: String,
        /// Numeric value resolved at compile time
        value: u8,
    },
}

impl LevelSelector {
    fn parse(text: &str, levels: &LevelRegistry) -> Result<Self> {
        if text == "*" {
            return Ok(Self::All);
        }
        let (op, name) = match text.as_bytes().first() {
            Some(b'=') => (LevelOp::Exactly, &text[1..]),
            Some(b'!') => (LevelOp::Not, &text[1..]),
            _ => (LevelOp::AtLeast, text),
        };
        let level = levels
            .get(name)
            .ok_or_else(|| ConfError::syntax(format!("unknown level '{}'", name)))?;
        Ok(Self::Cmp {
            op,
            name: level.name().to_string(),
            value: level.value(),
        })
    }

    /// Whether a record at `level` is selected.
    pub fn matches(&self, level: u8) -> bool {
        match *self {
            Self::All => true,
            Self::Cmp { op: LevelOp::AtLeast, value, .. } => level >= value,
            Self::Cmp { op: LevelOp::Exactly, value, .. } => level == value,
            Self::Cmp { op: LevelOp::Not, value, .. } => level != value,
        }
    }
}

impl fmt::Display for LevelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Cmp { op, name, .. } => {
                let prefix = match op {
                    LevelOp::AtLeast => "",
                    LevelOp::Exactly => "=",
                    LevelOp::Not => "!",
                };
                write!(f, "{}{}", prefix, name)
            }
        }
    }
}

/// Where matching records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// `>stdout`
    Stdout,
    /// `>stderr`
    Stderr,
    /// `>syslog[, FACILITY]`
    Syslog {
        /// `LOG_USER` or `LOG_LOCAL0`..`LOG_LOCAL7`
        facility: String,
    },
    /// `"path"[, size][ * count][ ~ "archive"]`
    File {
        /// Path template
        path: String,
        /// Rotate once the file reaches this many bytes
        max_size: Option<u64>,
        /// Keep at most this many archived files
        max_count: Option<u32>,
        /// Archive path template
        archive: Option<String>,
    },
    /// `$name, "param"`: handed to a user-registered record function.
    Record {
        /// Record function name
        name: String,
        /// Free-form parameter
        param: String,
    },
}

const SYSLOG_FACILITIES: &[&str] = &[
    "LOG_USER",
    "LOG_LOCAL0",
    "LOG_LOCAL1",
    "LOG_LOCAL2",
    "LOG_LOCAL3",
    "LOG_LOCAL4",
    "LOG_LOCAL5",
    "LOG_LOCAL6",
    "LOG_LOCAL7",
];

impl Output {
    fn parse(text: &str) -> Result<Self> {
        if let Some(target) = text.strip_prefix('>') {
            let (target, arg) = match target.split_once(',') {
                Some((t, a)) => (t.trim(), Some(a.trim())),
                None => (target.trim(), None),
            };
            return match (target.to_ascii_lowercase().as_str(), arg) {
                ("stdout", None) => Ok(Self::Stdout),
                ("stderr", None) => Ok(Self::Stderr),
                ("syslog", facility) => {
                    let facility = facility.unwrap_or("LOG_USER").to_ascii_uppercase();
                    if !SYSLOG_FACILITIES.contains(&facility.as_str()) {
                        return Err(ConfError::syntax(format!(
                            "unknown syslog facility '{}'",
                            facility
                        )));
                    }
                    Ok(Self::Syslog { facility })
                }
                _ => Err(ConfError::syntax(format!("unknown output target '>{}'", target))),
            };
        }

        if let Some(record) = text.strip_prefix('$') {
            let (name, param) = record.split_once(',').ok_or_else(|| {
                ConfError::syntax(format!("record output needs '$name, \"param\"': [{}]", text))
            })?;
            let name = name.trim();
            if !is_identifier(name) {
                return Err(ConfError::syntax(format!("invalid record name '{}'", name)));
            }
            let (param, rest) = take_quoted(param.trim())?;
            expect_empty(rest)?;
            return Ok(Self::Record {
                name: name.to_string(),
                param,
            });
        }

        if text.starts_with('"') {
            return Self::parse_file(text);
        }

        Err(ConfError::syntax(format!("unrecognized output [{}]", text)))
    }

    fn parse_file(text: &str) -> Result<Self> {
        let (path, mut rest) = take_quoted(text)?;
        check_path_len(&path)?;

        let mut max_size = None;
        if let Some(r) = rest.strip_prefix(',') {
            let end = r.find(['*', '~']).unwrap_or(r.len());
            let size = r[..end].trim();
            if !size.is_empty() {
                max_size = Some(parse_byte_size(size)?);
            }
            rest = r[end..].trim_start();
        }

        let mut max_count = None;
        if let Some(r) = rest.strip_prefix('*') {
            let end = r.find('~').unwrap_or(r.len());
            let count = r[..end].trim();
            max_count = Some(count.parse::<u32>().map_err(|_| {
                ConfError::syntax(format!("invalid rotation count '{}'", count))
            })?);
            rest = r[end..].trim_start();
        }

        let mut archive = None;
        if let Some(r) = rest.strip_prefix('~') {
            let (archive_path, tail) = take_quoted(r.trim_start())?;
            check_path_len(&archive_path)?;
            archive = Some(archive_path);
            rest = tail;
        }
        expect_empty(rest)?;

        Ok(Self::File {
            path,
            max_size,
            max_count,
            archive,
        })
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str(">stdout"),
            Self::Stderr => f.write_str(">stderr"),
            Self::Syslog { facility } => write!(f, ">syslog, {}", facility),
            Self::File {
                path,
                max_size,
                max_count,
                archive,
            } => {
                write!(f, "\"{}\"", path)?;
                if let Some(size) = max_size {
                    write!(f, ", {}", size)?;
                }
                if let Some(count) = max_count {
                    write!(f, " * {}", count)?;
                }
                if let Some(archive) = archive {
                    write!(f, " ~ \"{}\"", archive)?;
                }
                Ok(())
            }
            Self::Record { name, param } => write!(f, "${}, \"{}\"", name, param),
        }
    }
}

fn take_quoted(text: &str) -> Result<(String, &str)> {
    let inner = text
        .strip_prefix('"')
        .ok_or_else(|| ConfError::syntax(format!("expected a quoted string at [{}]", text)))?;
    let end = inner
        .find('"')
        .ok_or_else(|| ConfError::syntax(format!("unterminated quoted string [{}]", text)))?;
    Ok((inner[..end].to_string(), inner[end + 1..].trim_start()))
}

fn expect_empty(rest: &str) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ConfError::syntax(format!("unexpected trailing text [{}]", rest)))
    }
}

fn check_path_len(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ConfError::syntax("output path is empty"));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(ConfError::NameTooLong {
            what: "output path",
            len: path.len(),
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

/// Byte offset of the last `;` that is not inside double quotes.
fn format_separator(text: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut found = None;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => found = Some(i),
            _ => {}
        }
    }
    found
}

/// A compiled routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    category: CategoryMatch,
    level: LevelSelector,
    output: Output,
    // None when the rule falls back to the configuration default
    format_name: Option<String>,
    format: Arc<Format>,
}

impl Rule {
    /// Compile a rule line.
    ///
    /// `formats` is searched for an explicit `;name` from the back, so the
    /// most recent definition of a duplicated name wins. Rules without a
    /// format name bind to `default_format`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::Syntax`] for any malformed part of the line, an
    /// unknown level or an unknown format name.
    pub fn compile(
        line: &str,
        default_format: &Arc<Format>,
        formats: &[Arc<Format>],
        levels: &LevelRegistry,
    ) -> Result<Self> {
        let (body, format_name) = match format_separator(line) {
            Some(i) => {
                let name = line[i + 1..].trim();
                (&line[..i], (!name.is_empty()).then(|| name.to_string()))
            }
            None => (line, None),
        };

        let selector_end = body
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '"' | '$'))
            .unwrap_or(body.len());
        let (selector, output) = body.split_at(selector_end);
        let (category, level) = selector.split_once('.').ok_or_else(|| {
            ConfError::syntax(format!("rule selector must be 'category.level': [{}]", line))
        })?;

        let output = output.trim();
        if output.is_empty() {
            return Err(ConfError::syntax(format!("rule has no output: [{}]", line)));
        }

        let format = match &format_name {
            Some(name) => formats
                .iter()
                .rev()
                .find(|f| f.name() == name)
                .cloned()
                .ok_or_else(|| ConfError::syntax(format!("unknown format '{}'", name)))?,
            None => Arc::clone(default_format),
        };

        Ok(Self {
            category: CategoryMatch::parse(category)?,
            level: LevelSelector::parse(level, levels)?,
            output: Output::parse(output)?,
            format_name,
            format,
        })
    }

    /// Category selector.
    pub fn category(&self) -> &CategoryMatch {
        &self.category
    }

    /// Level selector.
    pub fn level(&self) -> &LevelSelector {
        &self.level
    }

    /// Output target.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Resolved format.
    pub fn format(&self) -> &Arc<Format> {
        &self.format
    }

    /// Format name given in the rule line, if any.
    pub fn format_name(&self) -> Option<&str> {
        self.format_name.as_deref()
    }

    /// Whether this rule selects a record of `category` at `level`.
    pub fn matches(&self, category: &str, level: u8) -> bool {
        self.category.matches(category) && self.level.matches(level)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.category, self.level, self.output)?;
        if let Some(name) = &self.format_name {
            write!(f, "; {}", name)?;
        }
        Ok(())
    }
}
