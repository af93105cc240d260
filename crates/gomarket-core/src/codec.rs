//! # Cart Payload Codec
//!
//! The persisted form of a cart is a JSON array of lines:
//!
//! ```json
//! [
//!   { "id": "p1", "title": "Hat", "imageUrl": "u", "price": 9.99, "quantity": 3 }
//! ]
//! ```
//!
//! Decoding also accepts `image_url`, which is what the earlier mobile client
//! wrote, and repairs carts that client left with repeated ids (see
//! [`Cart::from_lines`]).
//!
//! A line that cannot be read, or fails [`validate_line`], is skipped on its
//! own. Only a payload that is not a JSON array is rejected as a whole.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{Cart, CartLine};
use crate::validation::validate_line;

/// One stored line as written by any client version.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLine {
    id: String,
    title: String,
    #[serde(alias = "image_url")]
    image_url: String,
    price: f64,
    quantity: u32,
}

impl From<StoredLine> for CartLine {
    fn from(stored: StoredLine) -> Self {
        CartLine {
            id: stored.id,
            title: stored.title,
            image_url: stored.image_url,
            price: stored.price,
            quantity: stored.quantity,
        }
    }
}

/// Result of decoding a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCart {
    /// Normalized lines, unique by id.
    pub lines: Vec<CartLine>,

    /// Stored lines that were dropped as unreadable.
    pub skipped: usize,
}

/// Encodes cart lines as the storage payload.
pub fn encode_cart(lines: &[CartLine]) -> CoreResult<String> {
    serde_json::to_string(lines).map_err(|e| CoreError::Encode(e.to_string()))
}

/// Decodes a storage payload into normalized cart lines.
///
/// ## Errors
/// - `CoreError::Payload` if the text is not a JSON array
pub fn decode_cart(payload: &str) -> CoreResult<DecodedCart> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(payload).map_err(|e| CoreError::Payload(e.to_string()))?;

    let total = values.len();
    let lines: Vec<CartLine> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<StoredLine>(value).ok())
        .map(CartLine::from)
        .filter(|line| validate_line(line).is_ok())
        .collect();

    Ok(DecodedCart {
        skipped: total - lines.len(),
        lines: Cart::from_lines(lines).into_lines(),
    })
}
