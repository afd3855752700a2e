//! # hotlog-conf
//!
//! Configuration subsystem for a high-throughput logging library.
//!
//! ## Overview
//!
//! `hotlog-conf` parses a small line-oriented configuration language made of
//! global options, named output formats and category-matching rules, and
//! turns it into an immutable [`Configuration`](core::Configuration) that the
//! logging hot path consults on every record. Reloads are transactional: a
//! new configuration is built off to the side and only published, with a
//! single atomic swap, if every line was accepted.
//!
//! ## Configuration language
//!
//! ```text
//! # comments and blank lines are ignored
//! @ignore_error_format_rule false
//! @buf_size_min 1KB
//! @buf_size_max 2MB
//! @rotate_lock_file /tmp/hotlog.lock
//! @default_format "%d(%F %T) %V [%p:%F:%L] %m%n"
//! @level TRACE = 10, LOG_DEBUG
//!
//! &simple "%m%n"
//! &detail "%d(%T) %-5V [%c] \
//!          %m%n"
//!
//! app_.TRACE  >stdout; simple
//! app.=ERROR  "/var/log/app.err", 10MB * 5 ~ "/var/log/app.#r.err"; detail
//! *.*         >stderr
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use hotlog_conf::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let conf = LogConf::builder()
//!     .with_text("inline", "&simple \"%m%n\"\napp.INFO >stdout; simple\n")
//!     .build()?;
//!
//! // Lock-free read on the hot path
//! let active = conf.get().expect("initialized");
//! let routed: Vec<_> = active.matching_rules("app", 40).collect();
//! assert_eq!(routed.len(), 1);
//!
//! // A failed reload keeps the working configuration
//! assert!(conf.reload_from(TextSource::new("bad", "@nonsense 1\n")).is_err());
//! assert_eq!(conf.get().expect("still active").rules().len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): reload automatically when the file changes
//! - `json`: render the diagnostic profile as JSON

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod model;
pub mod notify;
pub mod parse;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{Configuration, LogConf, LogConfBuilder, Validate};
    pub use crate::error::{ConfError, Result, ValidationError};
    pub use crate::model::{Format, Output, Rule};
    pub use crate::sources::env::set_strict_mode;
    pub use crate::sources::{ConfigSource, FileSource, TextSource};
}
