//! Consistency checks run on every built configuration before it is published.

use crate::error::ValidationError;

/// Cross-field checks that line-by-line parsing cannot make.
///
/// A configuration that fails validation is never published: the initial
/// build fails, and a reload leaves the active configuration in place.
///
/// # Examples
///
/// ```rust
/// use hotlog_conf::core::Validate;
/// use hotlog_conf::error::ValidationError;
///
/// struct Limits {
///     min: u64,
///     max: u64,
/// }
///
/// impl Validate for Limits {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.min > self.max {
///             return Err(ValidationError::invalid_field("min", "must not exceed max"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Check the value as a whole.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint, wrapped in
    /// [`ValidationError::Multiple`] when there is more than one.
    fn validate(&self) -> Result<(), ValidationError>;
}
