//! Seam between the cart core and the remote cart service.

use std::future::Future;

use heritage_core::{Cart, CartId, CartLineId};

use crate::shopify::{LineToAdd, LineToUpdate, ShopifyError, StorefrontClient};

/// Remote cart operations.
///
/// Mutations return the id of the cart they touched; callers refetch the
/// full cart with [`CartGateway::fetch_cart`].
pub trait CartGateway: Send + Sync {
    /// `Ok(None)` when the cart does not exist (expired or unknown).
    fn fetch_cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<Cart>, ShopifyError>> + Send;

    fn create_cart(
        &self,
        lines: &[LineToAdd],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send;

    fn add_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineToAdd],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send;

    fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineToUpdate],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send;

    fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send;
}

impl CartGateway for StorefrontClient {
    fn fetch_cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<Cart>, ShopifyError>> + Send {
        self.get_cart(cart_id)
    }

    fn create_cart(
        &self,
        lines: &[LineToAdd],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send {
        Self::create_cart(self, lines)
    }

    fn add_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineToAdd],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send {
        Self::add_lines(self, cart_id, lines)
    }

    fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineToUpdate],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send {
        Self::update_lines(self, cart_id, lines)
    }

    fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> impl Future<Output = Result<CartId, ShopifyError>> + Send {
        Self::remove_lines(self, cart_id, line_ids)
    }
}
