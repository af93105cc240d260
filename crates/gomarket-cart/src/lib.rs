//! # gomarket-cart: Cart Store for GoMarketplace
//!
//! Holds the shopping cart in memory, restores it once at startup, and
//! writes every change back to storage in the background.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Store Architecture                          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  CartContext  ──cart()──►  CartStore                             │  │
//! │  │                                                                  │  │
//! │  │  add_to_cart / increment / decrement   (sync, in memory)         │  │
//! │  │  products / get / subscribe            (snapshots)               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ Save { revision, snapshot }             │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Persister (one Tokio task per store)                            │  │
//! │  │                                                                  │  │
//! │  │  restore once → coalesce saves → write → retry with backoff      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  KeyValueStore (gomarket-db): SQLite or in-memory                │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Storage key and write retry policy
//! - [`context`] - `CartContext`, the explicit enclosing store
//! - [`error`] - Cart error types
//! - [`persister`] - Background writer
//! - [`store`] - `CartStore`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gomarket_cart::{CartConfig, CartContext, CartStore};
//! use gomarket_core::CartLine;
//! use gomarket_db::{Database, DbConfig};
//!
//! let config = CartConfig::load_or_default(None);
//! let db = Database::new(DbConfig::new("cart.db")).await?;
//!
//! let store = CartStore::open(Arc::new(db.key_values()), &config).await;
//! let ctx = CartContext::provide(store);
//!
//! ctx.cart()?.add_to_cart(CartLine::new("p1", "Hat", "https://img/hat.png", 9.99));
//! ctx.cart()?.close().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod context;
pub mod error;
pub mod persister;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{CartConfig, PersistenceSettings, StorageSettings};
pub use context::CartContext;
pub use error::{CartError, CartResult};
pub use persister::PersistenceStats;
pub use store::CartStore;
