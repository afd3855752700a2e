//! File and in-memory configuration sources.

use super::ConfigSource;
use crate::error::{ConfError, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Timestamp layout of [`ConfigSource::modified`].
pub const MTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration read from a file on disk.
///
/// # Examples
///
/// ```rust,no_run
/// use hotlog_conf::sources::{ConfigSource, FileSource};
///
/// let source = FileSource::new("/etc/app/log.conf");
/// assert_eq!(source.name(), "/etc/app/log.conf");
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> ConfError {
        ConfError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn modified(&self) -> Result<Option<String>> {
        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|e| self.io_error(e))?;
        let local: DateTime<Local> = modified.into();
        Ok(Some(local.format(MTIME_FORMAT).to_string()))
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Configuration held in memory, e.g. embedded in the binary.
///
/// # Examples
///
/// ```rust
/// use hotlog_conf::sources::{ConfigSource, TextSource};
///
/// let source = TextSource::new("embedded", "*.* >stderr\n");
/// assert!(source.path().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TextSource {
    name: String,
    text: String,
}

impl TextSource {
    /// Create a source named `name` over `text`.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl ConfigSource for TextSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(self.text.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_file_source_reads_and_stamps() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("log.conf");
        fs::write(&config_path, "*.* >stdout\n").unwrap();

        let source = FileSource::new(&config_path);
        let mtime = source.modified().unwrap().unwrap();
        assert_eq!(mtime.len(), "2024-01-01 00:00:00".len());

        let mut text = String::new();
        source.open().unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "*.* >stdout\n");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = FileSource::new("/nonexistent/log.conf");
        assert!(matches!(source.modified(), Err(ConfError::Io { .. })));
        assert!(matches!(source.open(), Err(ConfError::Io { .. })));
    }

    #[test]
    fn test_text_source() {
        let source = TextSource::new("inline", "a\nb\n");
        assert_eq!(source.name(), "inline");
        assert!(source.modified().unwrap().is_none());
        assert_eq!(source.open().unwrap().lines().count(), 2);
    }
}
