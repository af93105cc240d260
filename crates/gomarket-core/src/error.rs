//! # Error Types
//!
//! Domain-specific error types for gomarket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gomarket-core errors (this file)                                      │
//! │  ├── CoreError        - Payload and domain errors                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gomarket-db errors (separate crate)                                   │
//! │  └── DbError          - Storage backend failures                       │
//! │                                                                         │
//! │  gomarket-cart errors (separate crate)                                 │
//! │  └── CartError        - Store, config and context failures             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CartError → CliError              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core cart errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A persisted payload could not be parsed into cart lines.
    ///
    /// ## When This Occurs
    /// - Storage holds something that is not a JSON array of lines
    /// - A line is missing a required field or has the wrong type
    /// - A line fails validation (e.g. empty id)
    ///
    /// The store treats this as "no saved cart".
    #[error("Invalid cart payload: {0}")]
    Payload(String),

    /// The cart could not be encoded for storage.
    #[error("Failed to encode cart: {0}")]
    Encode(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is not usable (NaN, infinite, negative).
    #[error("{field} is not a valid number: {reason}")]
    InvalidNumber { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
