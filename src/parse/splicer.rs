//! Line splicer: physical lines in, logical lines out.
//!
//! Each physical line goes through a small pipeline of pure steps:
//! newline strip → blank/comment skip → trim → continuation split. Lines
//! ending in `\` are joined with the next non-comment line.

use crate::error::{ConfError, Result};
use std::io::{BufRead, Read};

/// A complete logical line, continuations joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based number of the first physical line.
    pub first_line: usize,
    /// 1-based number of the last physical line.
    pub last_line: usize,
    /// Trimmed text, never empty.
    pub text: String,
}

/// Remove a trailing `\n` or `\r\n`.
pub fn strip_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Whether a physical line carries nothing: blank, or a `#` comment.
pub fn is_blank_or_comment(line: &str) -> bool {
    let content = line.trim_start();
    content.is_empty() || content.starts_with('#')
}

/// Trim whitespace on both ends.
pub fn trim_line(line: &str) -> &str {
    line.trim()
}

/// If `line` ends with a continuation backslash, return the text before it
/// with the whitespace preceding the backslash removed.
pub fn split_continuation(line: &str) -> Option<&str> {
    line.strip_suffix('\\').map(str::trim_end)
}

// Byte length of a raw physical line without its `\n` or `\r\n`.
fn content_len(raw: &[u8]) -> usize {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw).len()
}

/// Iterator over the logical lines of a reader.
///
/// Fails with [`ConfError::LineTooLong`] as soon as a physical line or an
/// accumulating logical line exceeds `max_len` bytes, with
/// [`ConfError::Syntax`] on a line that is not valid UTF-8, and with
/// [`ConfError::Io`] on read failure. The iterator is fused after an error.
///
/// At most `max_len + 2` bytes of a physical line are ever buffered, so an
/// endless line is rejected without reading it to the end.
pub struct LineSplicer<R> {
    reader: R,
    source_name: String,
    max_len: usize,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> LineSplicer<R> {
    /// Splice lines from `reader`; `source_name` labels errors.
    pub fn new(reader: R, source_name: impl Into<String>, max_len: usize) -> Self {
        Self {
            reader,
            source_name: source_name.into(),
            max_len,
            line_no: 0,
            done: false,
        }
    }

    fn fail(&mut self, err: ConfError, line: usize) -> Option<Result<LogicalLine>> {
        self.done = true;
        Some(Err(err.at_line(self.source_name.clone(), line)))
    }
}

impl<R: BufRead> Iterator for LineSplicer<R> {
    type Item = Result<LogicalLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut first_line = None;
        let mut buf = String::new();
        let mut raw = Vec::new();
        // room for the longest allowed line plus "\r\n"
        let limit = self.max_len as u64 + 2;

        loop {
            raw.clear();
            match self.reader.by_ref().take(limit).read_until(b'\n', &mut raw) {
                Ok(0) => {
                    self.done = true;
                    // a dangling continuation at end of input still counts
                    return first_line.filter(|_| !buf.is_empty()).map(|first_line| {
                        Ok(LogicalLine {
                            first_line,
                            last_line: self.line_no,
                            text: buf,
                        })
                    });
                }
                Ok(_) => self.line_no += 1,
                Err(source) => {
                    let line = self.line_no + 1;
                    let err = ConfError::Io {
                        path: self.source_name.clone().into(),
                        source,
                    };
                    return self.fail(err, line);
                }
            }

            let len = content_len(&raw);
            if len > self.max_len {
                // len may be cut short at the read limit
                let err = ConfError::LineTooLong {
                    len,
                    max: self.max_len,
                };
                return self.fail(err, self.line_no);
            }
            let physical = match std::str::from_utf8(&raw) {
                Ok(text) => strip_newline(text),
                Err(e) => {
                    let err =
                        ConfError::syntax(format!("invalid UTF-8 after byte {}", e.valid_up_to()));
                    return self.fail(err, self.line_no);
                }
            };
            if is_blank_or_comment(physical) {
                continue;
            }

            let trimmed = trim_line(physical);
            let (piece, continues) = match split_continuation(trimmed) {
                Some(body) => (body, true),
                None => (trimmed, false),
            };

            let first = *first_line.get_or_insert(self.line_no);
            buf.push_str(piece);
            if buf.len() > self.max_len {
                let err = ConfError::LineTooLong {
                    len: buf.len(),
                    max: self.max_len,
                };
                return self.fail(err, first);
            }

            if !continues {
                return Some(Ok(LogicalLine {
                    first_line: first,
                    last_line: self.line_no,
                    text: buf,
                }));
            }
        }
    }
}
