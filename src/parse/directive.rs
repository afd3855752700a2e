//! Classification of logical lines into directives.

use super::option::GlobalOption;
use crate::error::Result;

/// One logical configuration line, classified by its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `@name value`
    Option(GlobalOption),
    /// `&name "template"`, passed whole to the format compiler.
    Format(&'a str),
    /// Anything else, passed whole to the rule compiler.
    Rule(&'a str),
}

impl<'a> Directive<'a> {
    /// Classify a logical line.
    ///
    /// # Errors
    ///
    /// Fails only for `@` lines whose option cannot be parsed; format and
    /// rule bodies are validated later by their compilers.
    pub fn classify(line: &'a str) -> Result<Self> {
        match line.as_bytes().first() {
            Some(b'@') => GlobalOption::parse(line).map(Self::Option),
            Some(b'&') => Ok(Self::Format(line)),
            _ => Ok(Self::Rule(line)),
        }
    }

    /// Whether a failure while applying this directive may be skipped
    /// under `@ignore_error_format_rule`.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, Self::Option(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfError;

    #[test]
    fn test_classify() {
        assert_eq!(
            Directive::classify("@buf_size_min 1024").unwrap(),
            Directive::Option(GlobalOption::BufSizeMin(1024))
        );
        assert_eq!(
            Directive::classify(r#"&simple "%m""#).unwrap(),
            Directive::Format(r#"&simple "%m""#)
        );
        assert_eq!(
            Directive::classify("*.* >stdout").unwrap(),
            Directive::Rule("*.* >stdout")
        );
    }

    #[test]
    fn test_bad_option_fails_classification() {
        assert!(matches!(
            Directive::classify("@nonsense 1"),
            Err(ConfError::UnknownOption(_))
        ));
    }

    #[test]
    fn test_only_formats_and_rules_are_skippable() {
        assert!(Directive::Format("&x \"%m\"").is_skippable());
        assert!(Directive::Rule("*.* >stdout").is_skippable());
        assert!(!Directive::Option(GlobalOption::BufSizeMin(1)).is_skippable());
    }
}
