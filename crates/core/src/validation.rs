//! Shared field validation helpers.
//!
//! Small range and presence checks reused by the loan and movie modules.

use crate::error::CoreError;

/// Unwrap a required request field, naming it in the error when absent.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, CoreError> {
    value.ok_or_else(|| CoreError::Validation(format!("Missing required field: {field}")))
}

/// Validate that a finite value is `>= 0`.
pub fn validate_non_negative(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a finite value lies in `[min, max]`.
pub fn validate_range(value: f64, min: f64, max: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < min || value > max {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Validate a required text column: non-blank and at most `max_len` characters.
pub fn validate_text(value: &str, max_len: usize, name: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{name} must not be empty")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(CoreError::Validation(format!(
            "{name} exceeds maximum length of {max_len} characters (got {len})"
        )));
    }
    Ok(())
}
