//! Configuration source trait.

use crate::error::Result;
use std::io::BufRead;
use std::path::Path;

/// Where configuration text comes from.
///
/// Implement this trait to feed configuration text from somewhere other than
/// a plain file. A source is read once per build; the same source is reused
/// when a reload does not name a new one.
pub trait ConfigSource: Send + Sync {
    /// Human-readable name used in diagnostics and error locations.
    fn name(&self) -> String;

    /// Filesystem path, if this source is a file.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Human-readable modification time, captured once before reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the source's metadata cannot be read.
    fn modified(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Open the source for line-by-line reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened.
    fn open(&self) -> Result<Box<dyn BufRead + '_>>;
}
