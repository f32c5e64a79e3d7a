//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::{CartCookies, CartService};
use crate::catalog::CatalogService;
use crate::config::{ConfigError, StorefrontConfig};
use crate::services::{ResendClient, ResendError};
use crate::shopify::{ShopifyError, StorefrontClient};

/// Error assembling application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storefront client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("cart cookie: {0}")]
    Cookie(#[from] ConfigError),
    #[error("seller-interest relay: {0}")]
    Resend(#[from] ResendError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    cart: CartService<StorefrontClient>,
    catalog: CatalogService,
    cookies: CartCookies,
    seller_relay: Option<ResendClient>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build or the cookie secret
    /// is unusable.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let storefront = StorefrontClient::new(&config.shopify)?;
        let cookies = CartCookies::new(&config.cart_cookie, config.environment)?;
        let seller_relay = config
            .seller_interest
            .as_ref()
            .map(ResendClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cart: CartService::new(storefront.clone()),
                catalog: CatalogService::new(storefront.clone()),
                storefront,
                cookies,
                seller_relay,
                config,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Raw Storefront API client; handlers go through the services.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    #[must_use]
    pub fn cart(&self) -> &CartService<StorefrontClient> {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cookies(&self) -> &CartCookies {
        &self.inner.cookies
    }

    /// `None` when `RESEND_API_KEY` is not configured.
    #[must_use]
    pub fn seller_relay(&self) -> Option<&ResendClient> {
        self.inner.seller_relay.as_ref()
    }
}
