//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness
//! GET    /health/ready          - Readiness (Storefront API reachable)
//!
//! # Cart (JSON, signed cartId cookie)
//! GET    /api/cart              - Current cart or null
//! POST   /api/cart              - Add item, creating the cart on first use
//! PUT    /api/cart/line         - Set line quantity
//! DELETE /api/cart/line         - Remove lines
//! GET    /api/cart/count        - Item count
//! POST   /api/cart/checkout     - Hosted checkout URL
//! GET    /checkout              - Redirect to hosted checkout
//!
//! # Catalog
//! GET    /api/products          - Filtered listing
//! GET    /api/products/{handle} - Product detail
//!
//! # Sellers
//! POST   /api/seller-interest   - Relay seller-interest form by email
//! ```

pub mod cart;
pub mod health;
pub mod products;
pub mod seller_interest;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{cart_rate_limiter, seller_interest_rate_limiter};
use crate::state::AppState;

/// Create the cart API router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route(
            "/line",
            put(cart::update_line).delete(cart::remove_lines),
        )
        .route("/count", get(cart::count))
        .route("/checkout", post(cart::checkout_url))
}

/// Create the catalog API router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create all routes for the storefront.
///
/// With `rate_limited`, the cart and seller-interest groups are limited per
/// client IP. The key extractor needs proxy headers or `ConnectInfo`, so the
/// limits are left off for in-process callers.
pub fn routes(rate_limited: bool) -> Router<AppState> {
    let mut cart = cart_routes();
    let mut seller = Router::new().route("/", post(seller_interest::submit));

    if rate_limited {
        if let Some(limiter) = cart_rate_limiter() {
            cart = cart.layer(limiter);
        }
        if let Some(limiter) = seller_interest_rate_limiter() {
            seller = seller.layer(limiter);
        }
    }

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/cart", cart)
        .route("/checkout", get(cart::checkout))
        .nest("/api/products", product_routes())
        .nest("/api/seller-interest", seller)
}
