//! Configuration sources and process-environment settings.

mod config_source;
pub mod env;
mod file;

pub use config_source::ConfigSource;
pub use file::{FileSource, MTIME_FORMAT, TextSource};
