//! Catalog API handlers.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::header,
    response::IntoResponse,
};
use tracing::instrument;

use heritage_core::ProductSummary;

use crate::catalog::ProductFilters;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Browser caching for product detail; listings follow the default policy.
const PRODUCT_CACHE_CONTROL: &str = "public, max-age=60";

/// `GET /api/products`: filtered listing. Unknown filter values are ignored.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<Vec<ProductSummary>> {
    let filters = ProductFilters::from_query(query.as_deref().unwrap_or_default());
    Json(state.catalog().list_products(&filters).await)
}

/// `GET /api/products/{handle}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state
        .catalog()
        .product_by_handle(&handle)
        .await
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    Ok(([(header::CACHE_CONTROL, PRODUCT_CACHE_CONTROL)], Json(product)))
}
