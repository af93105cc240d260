//! # Cart Commands
//!
//! Every command asks the [`CartContext`] for the store, applies at most one
//! mutation, and returns the resulting cart.
//!
//! ```text
//! gomarket add --id p1 --title Hat --price 9.99
//!        │
//!        ▼
//! validate input ──► ctx.cart()?.add_to_cart(line) ──► CartResponse
//! ```

use serde::Serialize;
use tracing::debug;

use gomarket_cart::CartContext;
use gomarket_core::validation::{validate_line_id, validate_price, validate_title};
use gomarket_core::{CartChange, CartLine};

use crate::error::CliError;

/// Cart contents as printed by every command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartLine>,
    pub total_quantity: u64,

    /// Whether the command changed the cart.
    pub changed: bool,
}

impl CartResponse {
    fn from_context(ctx: &CartContext, changed: bool) -> Result<Self, CliError> {
        let store = ctx.cart()?;
        Ok(CartResponse {
            items: store.products(),
            total_quantity: store.total_quantity(),
            changed,
        })
    }

    /// Renders the cart as a plain-text table.
    pub fn render_table(&self) -> String {
        if self.items.is_empty() {
            return "Cart is empty\n".to_string();
        }

        let id_width = self
            .items
            .iter()
            .map(|l| l.id.chars().count())
            .max()
            .unwrap_or(0)
            .max(2);
        let title_width = self
            .items
            .iter()
            .map(|l| l.title.chars().count())
            .max()
            .unwrap_or(0)
            .max(5);

        let mut out = format!(
            "{:<id_width$}  {:<title_width$}  {:>10}  {:>5}\n",
            "ID", "TITLE", "PRICE", "QTY"
        );
        for line in &self.items {
            out.push_str(&format!(
                "{:<id_width$}  {:<title_width$}  {:>10.2}  {:>5}\n",
                line.id, line.title, line.price, line.quantity
            ));
        }
        out.push_str(&format!("{} item(s)\n", self.total_quantity));
        out
    }
}

/// Input for `add`.
#[derive(Debug, Clone)]
pub struct AddLine {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub price: f64,
}

/// Shows the current cart.
pub fn list(ctx: &CartContext) -> Result<CartResponse, CliError> {
    debug!("list command");
    CartResponse::from_context(ctx, false)
}

/// Adds one unit of a product.
pub fn add(ctx: &CartContext, input: AddLine) -> Result<CartResponse, CliError> {
    debug!(id = %input.id, "add command");

    validate_line_id(&input.id)?;
    validate_title(&input.title)?;
    validate_price(input.price)?;

    // Ids are opaque and stored exactly as given
    let store = ctx.cart()?;
    let id = input.id.clone();
    match store.add_to_cart(CartLine::new(input.id, input.title, input.image_url, input.price)) {
        CartChange::Added => {}
        CartChange::Merged { quantity } => {
            debug!(id = %id, quantity, "Line already in cart, quantity raised");
        }
        CartChange::Rejected => {
            return Err(CliError::validation(format!("Line {:?} cannot be stored", id)));
        }
    }

    CartResponse::from_context(ctx, true)
}

/// Raises a line's quantity by one.
pub fn increment(ctx: &CartContext, id: &str) -> Result<CartResponse, CliError> {
    debug!(id = %id, "increment command");

    let store = ctx.cart()?;
    if store.get(id).is_none() {
        return Err(CliError::not_found(id));
    }

    let changed = store.increment(id);
    CartResponse::from_context(ctx, changed)
}

/// Lowers a line's quantity by one. A line at quantity 1 stays at 1.
pub fn decrement(ctx: &CartContext, id: &str) -> Result<CartResponse, CliError> {
    debug!(id = %id, "decrement command");

    let store = ctx.cart()?;
    if store.get(id).is_none() {
        return Err(CliError::not_found(id));
    }

    let changed = store.decrement(id);
    CartResponse::from_context(ctx, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use gomarket_cart::{CartConfig, CartStore};
    use gomarket_db::MemoryStore;
    use std::sync::Arc;

    async fn context() -> CartContext {
        let store = CartStore::open(Arc::new(MemoryStore::new()), &CartConfig::default()).await;
        CartContext::provide(store)
    }

    fn hat() -> AddLine {
        AddLine {
            id: "p1".to_string(),
            title: "Hat".to_string(),
            image_url: "https://img/hat.png".to_string(),
            price: 9.99,
        }
    }

    #[tokio::test]
    async fn test_add_twice_merges() {
        let ctx = context().await;

        add(&ctx, hat()).unwrap();
        let response = add(&ctx, hat()).unwrap();

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].quantity, 2);
        assert_eq!(response.total_quantity, 2);
        assert!(response.changed);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_input() {
        let ctx = context().await;

        let err = add(&ctx, AddLine { price: -1.0, ..hat() }).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = add(&ctx, AddLine { title: " ".into(), ..hat() }).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(list(&ctx).unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_add_keeps_id_verbatim() {
        let ctx = context().await;

        let response = add(&ctx, AddLine { id: " p1".into(), ..hat() }).unwrap();
        assert_eq!(response.items[0].id, " p1");

        assert_eq!(increment(&ctx, " p1").unwrap().total_quantity, 2);
        assert_eq!(increment(&ctx, "p1").unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_add_rejects_unstorable_id() {
        let ctx = context().await;

        let err = add(&ctx, AddLine { id: "x".repeat(129), ..hat() }).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = add(&ctx, AddLine { id: "  ".into(), ..hat() }).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(list(&ctx).unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_increment_and_decrement() {
        let ctx = context().await;
        add(&ctx, hat()).unwrap();

        assert_eq!(increment(&ctx, "p1").unwrap().total_quantity, 2);
        assert!(decrement(&ctx, "p1").unwrap().changed);

        let response = decrement(&ctx, "p1").unwrap();
        assert!(!response.changed);
        assert_eq!(response.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let ctx = context().await;

        assert_eq!(increment(&ctx, "p9").unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(decrement(&ctx, "p9").unwrap_err().code, ErrorCode::NotFound);
    }

    #[test]
    fn test_commands_without_store_fail() {
        let ctx = CartContext::empty();

        assert_eq!(list(&ctx).unwrap_err().code, ErrorCode::ConfigError);
        assert_eq!(add(&ctx, hat()).unwrap_err().code, ErrorCode::ConfigError);
    }

    #[test]
    fn test_render_table() {
        let response = CartResponse {
            items: vec![CartLine {
                quantity: 3,
                ..CartLine::new("p1", "Hat", "u", 9.99)
            }],
            total_quantity: 3,
            changed: false,
        };

        let table = response.render_table();

        assert!(table.starts_with("ID"));
        assert!(table.contains("Hat"));
        assert!(table.contains("9.99"));
        assert!(table.ends_with("3 item(s)\n"));
    }

    #[test]
    fn test_render_empty_table() {
        let response = CartResponse {
            items: Vec::new(),
            total_quantity: 0,
            changed: false,
        };

        assert_eq!(response.render_table(), "Cart is empty\n");
    }
}
