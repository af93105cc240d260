//! # Cart Context
//!
//! The explicit stand-in for "the enclosing store": consumers receive a
//! `CartContext` and ask it for the cart. A context that was never given a
//! store fails every request with [`CartError::NoEnclosingStore`].
//!
//! ```text
//! CartContext::provide(store).cart()  ──► Ok(&CartStore)
//! CartContext::empty().cart()         ──► Err(NoEnclosingStore)
//! ```

use tracing::error;

use crate::error::{CartError, CartResult};
use crate::store::CartStore;

/// Carries the cart store to the code that uses it.
#[derive(Debug, Clone, Default)]
pub struct CartContext {
    store: Option<CartStore>,
}

impl CartContext {
    /// A context with no store.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A context serving `store`.
    pub fn provide(store: CartStore) -> Self {
        CartContext { store: Some(store) }
    }

    /// Returns the store, or `NoEnclosingStore` when none was provided.
    pub fn cart(&self) -> CartResult<&CartStore> {
        self.store.as_ref().ok_or_else(|| {
            error!("Cart operation invoked without an enclosing store");
            CartError::NoEnclosingStore
        })
    }

    /// Checks whether a store was provided.
    pub fn is_provided(&self) -> bool {
        self.store.is_some()
    }

    /// Takes the store back out, leaving the context empty.
    pub fn take(&mut self) -> Option<CartStore> {
        self.store.take()
    }
}

impl From<CartStore> for CartContext {
    fn from(store: CartStore) -> Self {
        CartContext::provide(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CartConfig;
    use gomarket_core::CartLine;
    use gomarket_db::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_empty_context_fails_immediately() {
        let ctx = CartContext::empty();

        let err = ctx.cart().unwrap_err();

        assert!(matches!(err, CartError::NoEnclosingStore));
        assert!(err.is_config_error());
        assert!(!ctx.is_provided());
    }

    #[tokio::test]
    async fn test_provided_context_serves_store() {
        let store = CartStore::open(Arc::new(MemoryStore::new()), &CartConfig::default()).await;
        let ctx = CartContext::provide(store.clone());

        ctx.cart()
            .unwrap()
            .add_to_cart(CartLine::new("p1", "Hat", "u", 9.99));

        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_one_cart() {
        let store = CartStore::open(Arc::new(MemoryStore::new()), &CartConfig::default()).await;
        let a = CartContext::from(store);
        let b = a.clone();

        a.cart().unwrap().add_to_cart(CartLine::new("p1", "Hat", "u", 9.99));
        b.cart().unwrap().increment("p1");

        assert_eq!(a.cart().unwrap().total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_take_empties_context() {
        let store = CartStore::open(Arc::new(MemoryStore::new()), &CartConfig::default()).await;
        let mut ctx = CartContext::provide(store);

        assert!(ctx.take().is_some());
        assert!(matches!(ctx.cart(), Err(CartError::NoEnclosingStore)));
    }
}
