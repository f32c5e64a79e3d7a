//! Cart operations over a [`CartGateway`].

use tracing::{instrument, warn};

use heritage_core::{Cart, CartId, CartLineId, Quantity, VariantId};

use crate::shopify::{LineToAdd, LineToUpdate, ShopifyError};

use super::error::CartError;
use super::gateway::CartGateway;

/// Whether the HTTP layer must (re)write the cart cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Unchanged,
    /// A cart handle the browser does not hold yet.
    Issued(CartId),
}

/// Result of a successful mutation: the refetched cart plus any new handle.
#[derive(Debug, Clone)]
pub struct CartUpdate {
    pub cart: Cart,
    pub session: SessionChange,
}

/// Cart synchronization core.
///
/// The session handle is always an explicit parameter; this type never sees
/// cookies. Every mutation is followed by a full refetch of the cart.
#[derive(Debug, Clone)]
pub struct CartService<G> {
    gateway: G,
}

impl<G: CartGateway> CartService<G> {
    pub const fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Current cart, or `None` without a session.
    ///
    /// Upstream failures are logged and read as "no cart".
    #[instrument(skip(self))]
    pub async fn get_cart(&self, session: Option<&CartId>) -> Option<Cart> {
        let cart_id = session?;
        match self.gateway.fetch_cart(cart_id).await {
            Ok(cart) => cart,
            Err(e) => {
                warn!(cart_id = %cart_id, error = %e, "Cart read failed, treating as no cart");
                None
            }
        }
    }

    /// Add a variant to the cart, creating the cart on first use.
    ///
    /// `quantity` defaults to one.
    ///
    /// # Errors
    ///
    /// - [`CartError::Validation`] for a malformed variant reference or a
    ///   quantity below one
    /// - [`CartError::UpstreamBusiness`] when the platform rejects the line
    /// - [`CartError::UpstreamTransport`] when the platform is unreachable
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        session: Option<&CartId>,
        variant_reference: &str,
        quantity: Option<i64>,
    ) -> Result<CartUpdate, CartError> {
        let variant = VariantId::parse(variant_reference)?;
        let quantity = quantity.map_or(Ok(Quantity::ONE), Quantity::new)?;
        let lines = [LineToAdd { variant, quantity }];

        let (cart_id, session) = match session {
            None => {
                let created = self.gateway.create_cart(&lines).await?;
                (created.clone(), SessionChange::Issued(created))
            }
            Some(current) => {
                let touched = self.gateway.add_lines(current, &lines).await?;
                let change = if &touched == current {
                    SessionChange::Unchanged
                } else {
                    SessionChange::Issued(touched.clone())
                };
                (touched, change)
            }
        };

        let cart = self.refetch(&cart_id).await?;
        Ok(CartUpdate { cart, session })
    }

    /// Set a line's quantity. Zero is rejected; use [`Self::remove_lines`].
    ///
    /// # Errors
    ///
    /// - [`CartError::Validation`] for an empty line id or a quantity below one
    /// - [`CartError::NoCart`] without a session
    /// - [`CartError::UpstreamBusiness`] when the line is not in the cart
    /// - [`CartError::UpstreamTransport`] when the platform is unreachable
    #[instrument(skip(self))]
    pub async fn update_line(
        &self,
        session: Option<&CartId>,
        line_id: &str,
        quantity: i64,
    ) -> Result<CartUpdate, CartError> {
        let line = CartLineId::parse(line_id)?;
        let quantity = Quantity::new(quantity)?;
        let cart_id = session.ok_or(CartError::NoCart)?;

        let touched = self
            .gateway
            .update_lines(cart_id, &[LineToUpdate { line, quantity }])
            .await?;

        self.finish(cart_id, touched).await
    }

    /// Remove one or more lines in a single mutation.
    ///
    /// Duplicate ids are collapsed, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// - [`CartError::Validation`] for an empty list or an empty id
    /// - [`CartError::NoCart`] without a session
    /// - [`CartError::UpstreamBusiness`] when a line is not in the cart
    /// - [`CartError::UpstreamTransport`] when the platform is unreachable
    #[instrument(skip(self, line_ids), fields(lines = line_ids.len()))]
    pub async fn remove_lines<S: AsRef<str> + Sync>(
        &self,
        session: Option<&CartId>,
        line_ids: &[S],
    ) -> Result<CartUpdate, CartError> {
        if line_ids.is_empty() {
            return Err(CartError::validation("lineIds must be a non-empty array"));
        }
        let mut ids: Vec<CartLineId> = Vec::with_capacity(line_ids.len());
        for raw in line_ids {
            let id = CartLineId::parse(raw.as_ref())?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let cart_id = session.ok_or(CartError::NoCart)?;

        let touched = self.gateway.remove_lines(cart_id, &ids).await?;

        self.finish(cart_id, touched).await
    }

    /// Hosted checkout URL of the current cart.
    ///
    /// # Errors
    ///
    /// - [`CartError::NoCart`] without a session or when the cart has expired
    /// - [`CartError::UpstreamTransport`] when the platform is unreachable
    #[instrument(skip(self))]
    pub async fn checkout_url(&self, session: Option<&CartId>) -> Result<String, CartError> {
        let cart_id = session.ok_or(CartError::NoCart)?;
        let cart = self
            .gateway
            .fetch_cart(cart_id)
            .await?
            .ok_or(CartError::NoCart)?;
        Ok(cart.checkout_url)
    }

    async fn finish(&self, current: &CartId, touched: CartId) -> Result<CartUpdate, CartError> {
        let session = if &touched == current {
            SessionChange::Unchanged
        } else {
            SessionChange::Issued(touched.clone())
        };
        let cart = self.refetch(&touched).await?;
        Ok(CartUpdate { cart, session })
    }

    /// Read-after-write. A cart that vanished right after a successful
    /// mutation is an upstream fault.
    async fn refetch(&self, cart_id: &CartId) -> Result<Cart, CartError> {
        self.gateway.fetch_cart(cart_id).await?.ok_or_else(|| {
            CartError::UpstreamTransport(ShopifyError::Malformed(format!(
                "cart {cart_id} missing after mutation"
            )))
        })
    }
}
