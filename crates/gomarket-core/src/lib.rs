//! # gomarket-core: Pure Cart Logic for GoMarketplace
//!
//! This crate holds the shopping cart as a plain value type together with
//! the rules that govern it. It has zero I/O dependencies: persistence and
//! scheduling live in `gomarket-db` and `gomarket-cart`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     GoMarketplace Cart Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              UI consumers (mobile app, CLI)                     │   │
//! │  │     products ◄── read      add_to_cart / increment / decrement  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 gomarket-cart (CartStore)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ gomarket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   codec   │  │ validation│  │   error   │  │   │
//! │  │   │ CartLine  │  │ JSON      │  │  ids,     │  │ CoreError │  │   │
//! │  │   │   Cart    │  │ payload   │  │  prices   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO TASKS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `CartLine` and the `Cart` container
//! - [`codec`] - Persisted payload format (JSON array of lines)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use gomarket_core::{Cart, CartLine};
//!
//! let mut cart = Cart::new();
//! cart.add(CartLine::new("p1", "Shirt", "https://img/p1.png", 20.0));
//! cart.add(CartLine::new("p1", "Shirt", "https://img/p1.png", 20.0));
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.get("p1").map(|l| l.quantity), Some(2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use codec::{decode_cart, encode_cart, DecodedCart};
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Storage key the cart payload lives under.
///
/// Shared with the mobile client that wrote carts before this crate existed,
/// so carts saved there are picked up on first launch.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace:cart";

/// Quantity every freshly added line starts with.
pub const MIN_LINE_QUANTITY: u32 = 1;
