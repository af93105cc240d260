//! # Cart Error Types
//!
//! Error types for the cart store.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Persistence   │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ NoEnclosingStore│  │  Storage        │  │  Payload                │ │
//! │  │ InvalidConfig   │  │  Persistence-   │  │                         │ │
//! │  │ ConfigLoad/Save │  │  Stopped        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Mutations never return these: a failed write is logged and retried    │
//! │  by the writer task, the in-memory change stands.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use gomarket_core::CoreError;
use gomarket_db::DbError;

/// Result type alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// Cart store error type.
#[derive(Debug, Error)]
pub enum CartError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Cart API used where no store was provided.
    ///
    /// A programming error in the consumer, not something a user can fix.
    #[error("Cart operation invoked without an enclosing store")]
    NoEnclosingStore,

    /// Invalid cart configuration.
    #[error("Invalid cart configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The writer task is gone (store closed).
    #[error("Cart persistence has stopped")]
    PersistenceStopped,

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// The persisted cart could not be encoded or decoded.
    #[error("Cart payload error: {0}")]
    Payload(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for CartError {
    fn from(err: DbError) -> Self {
        CartError::Storage(err.to_string())
    }
}

impl From<CoreError> for CartError {
    fn from(err: CoreError) -> Self {
        CartError::Payload(err.to_string())
    }
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CartError {
    fn from(err: toml::de::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CartError {
    fn from(err: toml::ser::Error) -> Self {
        CartError::ConfigSaveFailed(err.to_string())
    }
}

impl CartError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CartError::NoEnclosingStore
                | CartError::InvalidConfig(_)
                | CartError::ConfigLoadFailed(_)
                | CartError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_store_is_config_error() {
        let err = CartError::NoEnclosingStore;

        assert!(err.is_config_error());
        assert_eq!(
            err.to_string(),
            "Cart operation invoked without an enclosing store"
        );
    }

    #[test]
    fn test_conversions() {
        let err: CartError = DbError::PoolExhausted.into();
        assert!(matches!(err, CartError::Storage(_)));
        assert!(!err.is_config_error());

        let err: CartError = CoreError::Payload("expected array".into()).into();
        assert!(err.to_string().contains("expected array"));
    }
}
