//! Cart as reported by the remote commerce platform.
//!
//! These are the normalized shapes that leave the GraphQL boundary. The server
//! serializes them as the JSON body of every cart endpoint and the client
//! deserializes the same shapes, so both halves agree on field names
//! (`camelCase` on the wire).

use serde::{Deserialize, Serialize};

use super::id::{CartId, CartLineId, ProductId, VariantId};
use super::money::Money;
use super::product::Image;
use super::quantity::Quantity;

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart handle issued by the platform.
    pub id: CartId,
    /// Hosted checkout URL for this cart.
    pub checkout_url: String,
    /// Aggregate quantity across all lines.
    pub total_quantity: u32,
    /// Subtotal and total.
    pub cost: CartCost,
    /// Lines in the order the platform returned them.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Sum of the quantities of every line.
    #[must_use]
    pub fn line_quantity_sum(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity.get()).sum()
    }

    /// Whether the aggregate quantity matches the line detail.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total_quantity == self.line_quantity_sum()
    }

    /// Find a line by id.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart-level amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    /// Amount before taxes and cart-level discounts.
    pub subtotal: Money,
    /// Amount the buyer pays at checkout.
    pub total: Money,
}

/// One product variant entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Line handle, unique within the cart.
    pub id: CartLineId,
    /// Units of the variant.
    pub quantity: Quantity,
    /// The variant being purchased.
    pub merchandise: Merchandise,
    /// Line total after line-level discounts.
    pub line_total: Money,
}

/// The product variant referenced by a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchandise {
    /// Variant global id.
    pub id: VariantId,
    /// Variant title (`"Default Title"` for single-variant products).
    pub title: String,
    /// Unit price.
    pub price: Money,
    /// Parent product display data.
    pub product: MerchandiseProduct,
}

impl Merchandise {
    /// Variant title worth showing to a buyer, hiding the platform default.
    #[must_use]
    pub fn display_title(&self) -> Option<&str> {
        (self.title != "Default Title").then_some(self.title.as_str())
    }
}

/// Parent product of a cart line's variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseProduct {
    /// Product global id.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Featured image.
    pub featured_image: Option<Image>,
}

/// A business-rule rejection reported by a cart mutation (`userErrors`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUserError {
    /// Machine readable code (e.g. `INVALID`, `MERCHANDISE_NOT_ENOUGH_STOCK`).
    pub code: Option<String>,
    /// Path to the offending input field.
    #[serde(default)]
    pub field: Vec<String>,
    /// Message suitable for display.
    pub message: String,
}
