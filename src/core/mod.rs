//! Core configuration management types.

mod builder;
mod config_handle;
mod configuration;
mod loader;
mod validation;

pub use builder::LogConfBuilder;
pub use config_handle::LogConf;
pub use configuration::{
    ConfigProfile, Configuration, DEFAULT_BUF_SIZE_MAX, DEFAULT_BUF_SIZE_MIN,
    DEFAULT_ROTATE_LOCK_FILE,
};
pub use loader::{ConfigLoader, DEFAULT_RULE};
pub use validation::Validate;
