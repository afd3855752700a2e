//! Formats, rules and levels: the entities a configuration is made of.

pub mod format;
pub mod level;
pub mod rule;

pub use format::{Format, FormatOp};
pub use level::{Level, LevelRegistry, SyslogPriority};
pub use rule::{CategoryMatch, LevelSelector, Output, Rule};
