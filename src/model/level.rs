//! Level registry: level names, numeric values and syslog priorities.

use crate::error::{ConfError, Result};
use serde::Serialize;
use std::fmt;

/// Maximum length of a level name.
pub const LEVEL_NAME_MAX: usize = 15;

/// Syslog priority a level maps to when written through `>syslog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyslogPriority {
    /// `LOG_EMERG`
    Emerg,
    /// `LOG_ALERT`
    Alert,
    /// `LOG_CRIT`
    Crit,
    /// `LOG_ERR`
    Err,
    /// `LOG_WARNING`
    Warning,
    /// `LOG_NOTICE`
    Notice,
    /// `LOG_INFO`
    Info,
    /// `LOG_DEBUG`
    Debug,
}

impl SyslogPriority {
    /// Parse a `LOG_*` priority name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let p = match name.to_ascii_uppercase().as_str() {
            "LOG_EMERG" => Self::Emerg,
            "LOG_ALERT" => Self::Alert,
            "LOG_CRIT" => Self::Crit,
            "LOG_ERR" => Self::Err,
            "LOG_WARNING" => Self::Warning,
            "LOG_NOTICE" => Self::Notice,
            "LOG_INFO" => Self::Info,
            "LOG_DEBUG" => Self::Debug,
            _ => return None,
        };
        Some(p)
    }

    /// The canonical `LOG_*` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emerg => "LOG_EMERG",
            Self::Alert => "LOG_ALERT",
            Self::Crit => "LOG_CRIT",
            Self::Err => "LOG_ERR",
            Self::Warning => "LOG_WARNING",
            Self::Notice => "LOG_NOTICE",
            Self::Info => "LOG_INFO",
            Self::Debug => "LOG_DEBUG",
        }
    }

    /// Numeric priority as used by `syslog(3)`.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for SyslogPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    name: String,
    value: u8,
    syslog: SyslogPriority,
}

impl Level {
    /// Upper-case level name, as rendered by `%V`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-case level name, as rendered by `%v`.
    pub fn name_lower(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Numeric value; higher is more severe.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Syslog priority used for `>syslog` outputs.
    pub fn syslog(&self) -> SyslogPriority {
        self.syslog
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}, {}", self.name, self.value, self.syslog)
    }
}

/// Level table consulted by rule compilation.
///
/// Every [`Configuration`](crate::core::Configuration) owns its own registry,
/// seeded from [`LevelRegistry::builtin`], so `@level` overrides made by a
/// failed reload never reach the active configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRegistry {
    // sorted by value, at most one entry per value and per name
    levels: Vec<Level>,
}

impl LevelRegistry {
    /// Value of the `*` pseudo level, which matches everything.
    pub const ALL: u8 = 0;
    /// Value of the `!` pseudo level, which matches nothing.
    pub const NONE: u8 = 255;

    /// The built-in level set.
    pub fn builtin() -> Self {
        use SyslogPriority::*;
        let table = [
            ("*", Self::ALL, Debug),
            ("DEBUG", 20, Debug),
            ("INFO", 40, Info),
            ("NOTICE", 60, Notice),
            ("WARN", 80, Warning),
            ("ERROR", 100, Err),
            ("FATAL", 120, Alert),
            ("UNKNOWN", 254, Err),
            ("!", Self::NONE, Info),
        ];
        Self {
            levels: table
                .iter()
                .map(|&(name, value, syslog)| Level {
                    name: name.to_string(),
                    value,
                    syslog,
                })
                .collect(),
        }
    }

    /// Define or override a level.
    ///
    /// Any existing level with the same name or the same value is replaced.
    /// `syslog` defaults to `LOG_DEBUG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::NameTooLong`] for names over [`LEVEL_NAME_MAX`] bytes
    /// and [`ConfError::Syntax`] for an invalid name, an out-of-range value
    /// (user levels live in `1..=254`) or an unknown syslog priority.
    pub fn define(&mut self, name: &str, value: i64, syslog: Option<&str>) -> Result<()> {
        if name.len() > LEVEL_NAME_MAX {
            return Err(ConfError::NameTooLong {
                what: "level name",
                len: name.len(),
                max: LEVEL_NAME_MAX,
            });
        }
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(ConfError::syntax(format!("invalid level name '{}'", name)));
        }
        let value = u8::try_from(value)
            .ok()
            .filter(|v| *v != Self::ALL && *v != Self::NONE)
            .ok_or_else(|| {
                ConfError::syntax(format!("level value {} out of range 1..=254", value))
            })?;
        let syslog = match syslog {
            Some(s) => SyslogPriority::from_name(s)
                .ok_or_else(|| ConfError::syntax(format!("unknown syslog priority '{}'", s)))?,
            None => SyslogPriority::Debug,
        };

        let name = name.to_ascii_uppercase();
        self.levels.retain(|l| l.value != value && l.name != name);
        let pos = self.levels.partition_point(|l| l.value < value);
        self.levels.insert(pos, Level { name, value, syslog });
        Ok(())
    }

    /// Look a level up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Look a level up by numeric value.
    pub fn by_value(&self, value: u8) -> Option<&Level> {
        self.levels.iter().find(|l| l.value == value)
    }

    /// All levels in ascending value order.
    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let levels = LevelRegistry::builtin();
        assert_eq!(levels.get("info").map(Level::value), Some(40));
        assert_eq!(levels.get("Error").map(Level::syslog), Some(SyslogPriority::Err));
        assert_eq!(levels.by_value(120).map(Level::name), Some("FATAL"));
    }

    #[test]
    fn test_define_new_level() {
        let mut levels = LevelRegistry::builtin();
        levels.define("trace", 10, Some("LOG_DEBUG")).unwrap();

        let trace = levels.get("TRACE").unwrap();
        assert_eq!(trace.value(), 10);
        assert_eq!(trace.name_lower(), "trace");
        // stays sorted by value
        let values: Vec<u8> = levels.iter().map(Level::value).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(values, sorted);
    }

    #[test]
    fn test_define_replaces_same_value() {
        let mut levels = LevelRegistry::builtin();
        levels.define("NOTE", 60, None).unwrap();
        assert!(levels.get("NOTICE").is_none());
        assert_eq!(levels.by_value(60).map(Level::name), Some("NOTE"));
        assert_eq!(levels.get("NOTE").map(Level::syslog), Some(SyslogPriority::Debug));
    }

    #[test]
    fn test_define_rejects_bad_input() {
        let mut levels = LevelRegistry::builtin();
        assert!(matches!(levels.define("X", 0, None), Err(ConfError::Syntax(_))));
        assert!(matches!(levels.define("X", 300, None), Err(ConfError::Syntax(_))));
        assert!(matches!(levels.define("bad-name", 5, None), Err(ConfError::Syntax(_))));
        assert!(matches!(
            levels.define("X", 5, Some("LOG_LOUD")),
            Err(ConfError::Syntax(_))
        ));
        assert!(matches!(
            levels.define("A_VERY_LONG_LEVEL_NAME", 5, None),
            Err(ConfError::NameTooLong { .. })
        ));
        assert_eq!(levels, LevelRegistry::builtin());
    }
}
