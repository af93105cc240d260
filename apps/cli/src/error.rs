//! # CLI Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the CLI                                │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<T, CliError>                                                    │
//! │         │                                                               │
//! │         ├── ValidationError ──────► VALIDATION_ERROR   exit 2           │
//! │         ├── id not in cart ───────► NOT_FOUND          exit 3           │
//! │         ├── CartError (config) ───► CONFIG_ERROR       exit 4           │
//! │         ├── DbError ──────────────► DATABASE_ERROR     exit 5           │
//! │         ├── CartError (writer) ───► PERSISTENCE_ERROR  exit 6           │
//! │         └── anything else ────────► INTERNAL           exit 1           │
//! │                                                                         │
//! │  --json prints { "code": "...", "message": "..." } on stderr           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use gomarket_cart::CartError;
use gomarket_core::{CoreError, ValidationError};
use gomarket_db::DbError;

/// Error returned from CLI commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Cart line not found: p9"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes, one per exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad command input
    ValidationError,

    /// No line with the given id
    NotFound,

    /// Configuration or wiring problem
    ConfigError,

    /// Database could not be opened or queried
    DatabaseError,

    /// The cart could not be written
    PersistenceError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Process exit status for this code.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::ConfigError => 4,
            ErrorCode::DatabaseError => 5,
            ErrorCode::PersistenceError => 6,
        }
    }
}

impl CliError {
    /// Creates a new CLI error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("Cart line not found: {}", id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        self.code.exit_code()
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        tracing::error!("Database error: {}", err);
        CliError::new(ErrorCode::DatabaseError, err.to_string())
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::Payload(_) | CoreError::Encode(_) => CliError::internal(err.to_string()),
        }
    }
}

impl From<CartError> for CliError {
    fn from(err: CartError) -> Self {
        if err.is_config_error() {
            return CliError::new(ErrorCode::ConfigError, err.to_string());
        }

        match err {
            CartError::Storage(_) => CliError::new(ErrorCode::DatabaseError, err.to_string()),
            CartError::PersistenceStopped => {
                CliError::new(ErrorCode::PersistenceError, err.to_string())
            }
            _ => CliError::internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(format!("Failed to render output: {}", err))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            ErrorCode::Internal,
            ErrorCode::ValidationError,
            ErrorCode::NotFound,
            ErrorCode::ConfigError,
            ErrorCode::DatabaseError,
            ErrorCode::PersistenceError,
        ];
        let mut exits: Vec<u8> = codes.iter().map(|c| c.exit_code()).collect();
        exits.sort_unstable();
        exits.dedup();

        assert_eq!(exits.len(), codes.len());
        assert!(!exits.contains(&0));
    }

    #[test]
    fn test_missing_store_maps_to_config_error() {
        let err: CliError = CartError::NoEnclosingStore.into();

        assert_eq!(err.code, ErrorCode::ConfigError);
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_validation_error_mapping() {
        let err: CliError = CoreError::Validation(ValidationError::Required {
            field: "title".into(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("title"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&CliError::not_found("p9")).unwrap();

        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Cart line not found: p9"}"#);
    }
}
