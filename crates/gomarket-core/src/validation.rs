//! # Validation Module
//!
//! Input validation for cart lines.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Consumer input (CLI flags, UI forms)                         │
//! │  └── validate_line_id / validate_title / validate_price                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart::add                                                     │
//! │  └── validate_line: refuses lines a restore would drop                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Restoring a persisted payload (codec)                        │
//! │  └── validate_line on every stored line, bad lines are skipped         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gomarket_core::validation::{validate_line_id, validate_price};
//!
//! validate_line_id("p1").unwrap();
//! assert!(validate_price(f64::NAN).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::CartLine;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product id accepted.
pub const MAX_LINE_ID_LEN: usize = 128;

/// Longest product title accepted.
pub const MAX_TITLE_LEN: usize = 200;

/// Validates a product id.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 128 characters
pub fn validate_line_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.chars().count() > MAX_LINE_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_LINE_ID_LEN,
        });
    }

    Ok(())
}

/// Checks that a line can be saved and read back.
///
/// Layers 2 and 3 share these rules, so a line the cart accepts is never one
/// the codec drops on restore.
///
/// ## Rules
/// - The id passes [`validate_line_id`]
/// - The price is finite (JSON has no NaN or infinity)
pub fn validate_line(line: &CartLine) -> ValidationResult<()> {
    validate_line_id(&line.id)?;

    if !line.price.is_finite() {
        return Err(ValidationError::InvalidNumber {
            field: "price".to_string(),
            reason: "must be finite".to_string(),
        });
    }

    Ok(())
}

/// Validates a product title.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 200 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    if title.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// The cart never computes with prices, but NaN and infinities cannot be
/// written as JSON numbers, so they are rejected before they reach a cart.
pub fn validate_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::InvalidNumber {
            field: "price".to_string(),
            reason: "must be finite".to_string(),
        });
    }

    if price < 0.0 {
        return Err(ValidationError::InvalidNumber {
            field: "price".to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    Ok(())
}
