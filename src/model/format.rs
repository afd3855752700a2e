//! Format compiler: turns `&name "template"` lines into compiled [`Format`]s.

use crate::error::{ConfError, Result};
use std::fmt;

/// Maximum length of a format name.
pub const FORMAT_NAME_MAX: usize = 63;

/// Format line installed before any configuration text is read.
pub const BUILTIN_DEFAULT_FORMAT: &str = r#"&default "%d(%F %T) %V [%p:%F:%L] %m%n""#;

/// Name given to the format built by `@default_format`.
pub const DEFAULT_FORMAT_NAME: &str = "default";

/// A record field a conversion spec expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// `%c`
    Category,
    /// `%d` or `%d(strftime pattern)`
    Time(Option<String>),
    /// `%F`
    File,
    /// `%L`
    Line,
    /// `%U`
    Function,
    /// `%m`
    Message,
    /// `%p`
    Pid,
    /// `%t`
    ThreadId,
    /// `%H`
    Hostname,
    /// `%V`
    LevelUpper,
    /// `%v`
    LevelLower,
    /// `%M(key)`
    Mdc(String),
}

/// Padding and truncation applied to an expanded field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Width {
    /// Pad on the right instead of the left (`%-10c`).
    pub left_align: bool,
    /// Minimum width (`%10c`).
    pub min: usize,
    /// Maximum width (`%.10c`).
    pub max: Option<usize>,
}

/// One step of a compiled format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOp {
    /// Text copied verbatim, `%n` and `%%` included.
    Literal(String),
    /// A field expansion.
    Spec {
        /// What to expand
        field: Field,
        /// How to pad or truncate it
        width: Width,
    },
}

/// A named, compiled output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    name: String,
    template: String,
    ops: Vec<FormatOp>,
}

impl Format {
    /// Compile a format definition line of the form `&name "template"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::Syntax`] when the line is malformed or the
    /// template contains an unknown or unterminated conversion, and
    /// [`ConfError::NameTooLong`] for an oversized name.
    pub fn compile(line: &str) -> Result<Self> {
        let body = line
            .strip_prefix('&')
            .ok_or_else(|| ConfError::syntax(format!("format line must start with '&': [{}]", line)))?;

        let name_end = body
            .find(|c: char| c.is_whitespace() || c == '"')
            .unwrap_or(body.len());
        let name = &body[..name_end];
        if name.is_empty() {
            return Err(ConfError::syntax(format!("format name is empty: [{}]", line)));
        }
        if name.len() > FORMAT_NAME_MAX {
            return Err(ConfError::NameTooLong {
                what: "format name",
                len: name.len(),
                max: FORMAT_NAME_MAX,
            });
        }
        if !is_identifier(name) {
            return Err(ConfError::syntax(format!("invalid format name '{}'", name)));
        }

        let rest = body[name_end..].trim();
        let template = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .ok_or_else(|| {
                ConfError::syntax(format!("format '{}' needs a double-quoted template", name))
            })?;

        let ops = compile_template(template)
            .map_err(|e| ConfError::syntax(format!("format '{}': {}", name, e)))?;

        Ok(Self {
            name: name.to_string(),
            template: template.to_string(),
            ops,
        })
    }

    /// The built-in default format.
    pub fn builtin_default() -> Result<Self> {
        Self::compile(BUILTIN_DEFAULT_FORMAT)
            .map_err(|e| ConfError::ResourceInit(format!("built-in default format: {}", e)))
    }

    /// Format name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template text between the quotes.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Compiled operations, in output order.
    pub fn ops(&self) -> &[FormatOp] {
        &self.ops
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{} \"{}\"", self.name, self.template)
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn compile_template(template: &str) -> std::result::Result<Vec<FormatOp>, String> {
    let mut ops = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        let mut width = Width::default();
        if chars.peek() == Some(&'-') {
            chars.next();
            width.left_align = true;
        }
        width.min = take_number(&mut chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            width.max = Some(
                take_number(&mut chars).ok_or("precision must follow '.' in conversion spec")?,
            );
        }

        let conv = chars.next().ok_or("dangling '%' at end of template")?;
        let field = match conv {
            '%' => {
                literal.push('%');
                continue;
            }
            'n' => {
                literal.push('\n');
                continue;
            }
            'c' => Field::Category,
            'd' => Field::Time(take_argument(&mut chars, 'd')?),
            'F' => Field::File,
            'L' => Field::Line,
            'U' => Field::Function,
            'm' => Field::Message,
            'p' => Field::Pid,
            't' => Field::ThreadId,
            'H' => Field::Hostname,
            'V' => Field::LevelUpper,
            'v' => Field::LevelLower,
            'M' => Field::Mdc(
                take_argument(&mut chars, 'M')?.ok_or("%M requires a key, as in %M(key)")?,
            ),
            other => return Err(format!("unknown conversion '%{}'", other)),
        };

        if !literal.is_empty() {
            ops.push(FormatOp::Literal(std::mem::take(&mut literal)));
        }
        ops.push(FormatOp::Spec { field, width });
    }

    if !literal.is_empty() {
        ops.push(FormatOp::Literal(literal));
    }
    Ok(ops)
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits.parse().ok()
}

fn take_argument(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    conv: char,
) -> std::result::Result<Option<String>, String> {
    if chars.peek() != Some(&'(') {
        return Ok(None);
    }
    chars.next();
    let mut arg = String::new();
    for c in chars.by_ref() {
        if c == ')' {
            return Ok(Some(arg));
        }
        arg.push(c);
    }
    Err(format!("unterminated '%{}(' in template", conv))
}
