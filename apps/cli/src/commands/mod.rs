//! # Commands Module
//!
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! └── cart.rs     ◄─── list, add, increment, decrement
//! ```
//!
//! `init-config` needs no store and lives in `lib.rs`.

pub mod cart;
