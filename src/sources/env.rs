//! Process environment: default configuration path and strict mode.

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Names the configuration file used when `initialize` is given no path.
pub const CONF_PATH_ENV: &str = "HOTLOG_CONF_PATH";

/// When set (to any value), malformed formats and rules always abort a load.
pub const STRICT_ENV: &str = "HOTLOG_CHECK_FORMAT_RULE";

static STRICT_MODE: AtomicBool = AtomicBool::new(false);

/// Force strict validation for every subsequent build in this process.
///
/// Strict mode makes a malformed format or rule line fatal even when the
/// configuration sets `@ignore_error_format_rule true`, so a file can be
/// checked without silently losing rules.
pub fn set_strict_mode(enabled: bool) {
    STRICT_MODE.store(enabled, Ordering::SeqCst);
}

/// Whether strict mode is on, either via [`set_strict_mode`] or [`STRICT_ENV`].
pub fn strict_mode() -> bool {
    STRICT_MODE.load(Ordering::SeqCst) || env::var_os(STRICT_ENV).is_some()
}

/// Configuration path from [`CONF_PATH_ENV`], if set and non-empty.
pub fn path_from_env() -> Option<PathBuf> {
    env::var_os(CONF_PATH_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}
