//! Process-wide strict mode. Kept in its own test binary because the toggle
//! and the environment variable are global.

use hotlog_conf::prelude::*;
use hotlog_conf::sources::env::{CONF_PATH_ENV, STRICT_ENV, strict_mode};
use std::fs;
use tempfile::TempDir;

const TOLERANT: &str = "@ignore_error_format_rule true\n*.* >stdout\n*.* >nowhere\n";

#[test]
fn test_strict_mode_toggle_and_environment() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("log.conf");
    fs::write(&config_path, TOLERANT).unwrap();

    // SAFETY: this is the only test in this binary touching the environment
    unsafe {
        std::env::remove_var(STRICT_ENV);
        std::env::set_var(CONF_PATH_ENV, &config_path);
    }
    assert!(!strict_mode());

    // the path comes from the environment; the bad rule is skipped
    let conf = LogConf::initialize(None).unwrap();
    assert_eq!(conf.get().unwrap().rules().len(), 1);

    set_strict_mode(true);
    let err = conf.reload(None).unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert_eq!(conf.get().unwrap().rules().len(), 1);

    // an explicit per-handle setting wins over the process toggle
    let relaxed = LogConf::builder()
        .with_file(&config_path)
        .strict(false)
        .build()
        .unwrap();
    assert_eq!(relaxed.get().unwrap().rules().len(), 1);

    set_strict_mode(false);
    unsafe {
        std::env::set_var(STRICT_ENV, "1");
    }
    assert!(strict_mode());
    assert!(LogConf::initialize(Some(&config_path)).is_err());

    unsafe {
        std::env::remove_var(STRICT_ENV);
        std::env::remove_var(CONF_PATH_ENV);
    }
    assert!(LogConf::initialize(Some(&config_path)).is_ok());

    // no path and no environment: built-in catch-all rule
    let defaults = LogConf::initialize(None).unwrap();
    assert_eq!(defaults.get().unwrap().rules()[0].to_string(), "*.* >stdout");
}
