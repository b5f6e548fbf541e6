//! Validation Error Types

use thiserror::Error;

/// Errors during input validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Limits themselves are unusable (min above max)
    #[error("Invalid limits for {field}: min {min} is greater than max {max}")]
    InvalidLimits {
        field: &'static str,
        min: i64,
        max: i64,
    },
}
