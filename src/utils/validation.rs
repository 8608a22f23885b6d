//! Validation utilities
//!
//! Provides helpers for common validation patterns.

/// Ensure a condition is true with a formatted error message
///
/// Similar to `assert!` but returns a Result instead of panicking.
pub fn ensure_fmt<F>(condition: bool, message: F) -> Result<(), String>
where
    F: FnOnce() -> String,
{
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

/// Validate a value is within a range
///
/// Returns `Ok(())` if `min <= value <= max`, error otherwise.
pub fn ensure_range<T>(value: T, min: T, max: T, name: &str) -> Result<(), String>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        Err(format!("{} must be between {} and {}, got {}", name, min, max, value))
    } else {
        Ok(())
    }
}

/// Validate a string is not blank
pub fn ensure_not_blank(value: &str, name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} must not be empty", name))
    } else {
        Ok(())
    }
}
