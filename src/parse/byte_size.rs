//! Human-readable byte sizes such as `1024`, `10KB` or `2M`.

use crate::error::{ConfError, Result};

/// Parse a byte-size literal.
///
/// Whitespace is ignored. A `K`, `M` or `G` suffix multiplies by powers of
/// 1000; followed by `B` (`KB`, `MB`, `GB`) it multiplies by powers of 1024.
///
/// # Errors
///
/// Returns [`ConfError::Syntax`] for empty, zero, non-numeric, overflowing
/// or unknown-suffix input.
pub fn parse_byte_size(text: &str) -> Result<u64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = || ConfError::syntax(format!("invalid byte size '{}'", text));

    let digits_end = compact
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(compact.len());
    let (digits, suffix) = compact.split_at(digits_end);
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    if value == 0 {
        return Err(invalid());
    }

    let (unit, base) = match suffix.strip_suffix(['B', 'b']) {
        Some(unit) => (unit, 1024u64),
        None => (suffix, 1000u64),
    };
    let exponent = match unit {
        "" if base == 1000 => 0,
        "K" | "k" => 1,
        "M" | "m" => 2,
        "G" | "g" => 3,
        _ => return Err(invalid()),
    };

    value
        .checked_mul(base.pow(exponent))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_number() {
        assert_eq!(parse_byte_size("1024").unwrap(), 1024);
        assert_eq!(parse_byte_size(" 2 048 ").unwrap(), 2048);
    }

    #[test]
    fn test_decimal_and_binary_suffixes() {
        assert_eq!(parse_byte_size("1K").unwrap(), 1000);
        assert_eq!(parse_byte_size("1KB").unwrap(), 1024);
        assert_eq!(parse_byte_size("2mb").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_byte_size("3M").unwrap(), 3_000_000);
        assert_eq!(parse_byte_size("1 GB").unwrap(), 1 << 30);
    }

    #[test]
    fn test_rejects_garbage() {
        for text in ["", "0", "KB", "12XB", "12Q", "-5", "1B", "99999999999999999999"] {
            assert!(parse_byte_size(text).is_err(), "accepted '{}'", text);
        }
    }
}
