//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::shopify::ProductSortKey;
use crate::state::AppState;

/// Liveness: the process is serving requests. Checks no dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: the Storefront API answers a one-product query.
///
/// Served from the catalog cache when warm.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state
        .storefront()
        .get_products(1, None, ProductSortKey::CreatedAt, true)
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
