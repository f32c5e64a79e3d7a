//! Render-ready projections of a [`CartSnapshot`].
//!
//! The header badge, the slide-out drawer and the full cart page all derive
//! from the same snapshot, so they can never disagree about a quantity.

use rust_decimal::Decimal;

use heritage_core::{CartLineId, Money, Quantity};

use crate::store::CartSnapshot;

/// Item count in the site header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeView {
    pub count: u32,
}

impl From<&CartSnapshot> for BadgeView {
    fn from(snapshot: &CartSnapshot) -> Self {
        Self {
            count: snapshot.item_count(),
        }
    }
}

/// One row in the drawer or on the cart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawerLine {
    pub id: CartLineId,
    pub title: String,
    /// `None` for single-variant products.
    pub variant_title: Option<String>,
    pub image_url: Option<String>,
    /// Optimistic quantity.
    pub quantity: Quantity,
    /// A change for this line awaits the server.
    pub pending: bool,
    pub unit_price: Money,
    /// Server line total, or unit price times the displayed quantity while
    /// pending.
    pub line_total: Money,
}

/// The slide-out cart drawer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawerView {
    pub lines: Vec<DrawerLine>,
    /// Server subtotal; `None` without a cart.
    pub subtotal: Option<Money>,
    /// The subtotal predates a pending change.
    pub subtotal_pending: bool,
    pub is_empty: bool,
}

impl From<&CartSnapshot> for DrawerView {
    fn from(snapshot: &CartSnapshot) -> Self {
        let Some(cart) = &snapshot.cart else {
            return Self {
                is_empty: true,
                ..Self::default()
            };
        };

        let lines: Vec<DrawerLine> = cart
            .lines
            .iter()
            .map(|line| {
                let state = snapshot.line_state(&line.id);
                let quantity = state.map_or(line.quantity, |s| s.displayed());
                let pending = state.is_some_and(|s| s.is_pending());
                let price = &line.merchandise.price;
                let line_total = if pending {
                    Money::new(
                        price.amount * Decimal::from(quantity.get()),
                        price.currency_code.clone(),
                    )
                } else {
                    line.line_total.clone()
                };

                DrawerLine {
                    id: line.id.clone(),
                    title: line.merchandise.product.title.clone(),
                    variant_title: line.merchandise.display_title().map(str::to_owned),
                    image_url: line
                        .merchandise
                        .product
                        .featured_image
                        .as_ref()
                        .map(|img| img.url.clone()),
                    quantity,
                    pending,
                    unit_price: price.clone(),
                    line_total,
                }
            })
            .collect();

        Self {
            is_empty: lines.is_empty(),
            subtotal_pending: lines.iter().any(|l| l.pending),
            subtotal: Some(cart.cost.subtotal.clone()),
            lines,
        }
    }
}

/// The full cart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartPageView {
    pub drawer: DrawerView,
    /// Checkout is offered only for a non-empty, settled cart.
    pub checkout_url: Option<String>,
}

impl From<&CartSnapshot> for CartPageView {
    fn from(snapshot: &CartSnapshot) -> Self {
        let drawer = DrawerView::from(snapshot);
        let checkout_url = snapshot
            .cart
            .as_ref()
            .filter(|_| !drawer.is_empty && !drawer.subtotal_pending)
            .map(|cart| cart.checkout_url.clone());
        Self {
            drawer,
            checkout_url,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;

    use super::*;
    use crate::line::LineState;
    use crate::testing::cart_with;

    fn q(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_no_cart_is_empty() {
        let snapshot = CartSnapshot::default();
        assert_eq!(BadgeView::from(&snapshot).count, 0);
        let drawer = DrawerView::from(&snapshot);
        assert!(drawer.is_empty);
        assert!(drawer.subtotal.is_none());
        assert!(CartPageView::from(&snapshot).checkout_url.is_none());
    }

    #[test]
    fn test_settled_cart_uses_server_amounts() {
        let cart = cart_with(&[("line-1", 2), ("line-2", 1)]);
        let snapshot = CartSnapshot {
            lines: cart
                .lines
                .iter()
                .map(|l| (l.id.clone(), LineState::Stable(l.quantity)))
                .collect(),
            cart: Some(cart),
        };

        assert_eq!(BadgeView::from(&snapshot).count, 3);
        let page = CartPageView::from(&snapshot);
        assert_eq!(page.drawer.lines.len(), 2);
        assert_eq!(page.drawer.lines[0].line_total.amount, Decimal::new(2000, 2));
        assert_eq!(
            page.drawer.subtotal.as_ref().unwrap().amount,
            Decimal::new(3000, 2)
        );
        assert!(!page.drawer.subtotal_pending);
        assert!(page.checkout_url.is_some());
    }

    #[test]
    fn test_pending_line_shows_optimistic_values() {
        let cart = cart_with(&[("line-1", 1)]);
        let id = cart.lines[0].id.clone();
        let snapshot = CartSnapshot {
            cart: Some(cart),
            lines: HashMap::from([(id, LineState::Stable(q(1)).request(q(4)))]),
        };

        assert_eq!(BadgeView::from(&snapshot).count, 4);
        let page = CartPageView::from(&snapshot);
        let line = &page.drawer.lines[0];
        assert!(line.pending);
        assert_eq!(line.quantity, q(4));
        assert_eq!(line.line_total.amount, Decimal::new(4000, 2));
        assert!(page.drawer.subtotal_pending);
        assert!(page.checkout_url.is_none(), "no checkout while pending");
    }

    #[test]
    fn test_empty_cart_offers_no_checkout() {
        let snapshot = CartSnapshot {
            cart: Some(cart_with(&[])),
            lines: HashMap::new(),
        };
        let page = CartPageView::from(&snapshot);
        assert!(page.drawer.is_empty);
        assert!(page.checkout_url.is_none());
    }
}
