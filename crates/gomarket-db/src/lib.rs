//! # gomarket-db: Persistence Layer for the GoMarketplace Cart
//!
//! This crate provides the storage backends the cart store writes to.
//! Every backend implements one narrow async contract, [`KeyValueStore`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Persistence Data Flow                       │
//! │                                                                         │
//! │  CartStore writer task (gomarket-cart)                                 │
//! │       │  get("@GoMarketplace:cart") once, then set(...) per change     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    gomarket-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │        dyn KeyValueStore                                        │   │
//! │  │          ├── KeyValueRepository ──► Database (SqlitePool)       │   │
//! │  │          └── MemoryStore        ──► HashMap (tests, ephemeral)  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/gomarket.db   table: kv_store(key, value, ...)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `KeyValueStore` contract and the in-memory backend
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQLite-backed repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gomarket_db::{Database, DbConfig, KeyValueStore};
//!
//! let db = Database::new(DbConfig::new("path/to/gomarket.db")).await?;
//! let kv = db.key_values();
//!
//! kv.set("@GoMarketplace:cart", "[]").await?;
//! assert_eq!(kv.get("@GoMarketplace:cart").await?.as_deref(), Some("[]"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::kv::KeyValueRepository;
pub use store::{KeyValueStore, MemoryStore};
