//! Cart API handlers.
//!
//! The signed `cartId` cookie is read here and handed to the cart service as
//! an explicit session. A `Set-Cookie` is emitted only when the service
//! reports a newly issued cart handle.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use heritage_core::{Cart, Quantity};

use crate::cart::{CartError, CartUpdate, SessionChange};
use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// `POST /api/cart` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub merchandise_id: Option<String>,
    /// Kept raw so that fractional or non-numeric values are rejected
    /// rather than silently coerced.
    #[serde(default)]
    pub quantity: Value,
}

/// `PUT /api/cart/line` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLineRequest {
    #[serde(default)]
    pub line_id: String,
    #[serde(default)]
    pub quantity: Value,
}

/// `DELETE /api/cart/line` body. `lineIds` wins over `lineId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLinesRequest {
    pub line_ids: Option<Vec<String>>,
    pub line_id: Option<String>,
}

impl RemoveLinesRequest {
    fn into_ids(self) -> Vec<String> {
        self.line_ids
            .or_else(|| self.line_id.map(|id| vec![id]))
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
    pub total_quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// Render a mutation result, attaching the cookie for a new handle.
fn respond(state: &AppState, update: CartUpdate) -> Response {
    let mut response = Json(update.cart).into_response();
    if let SessionChange::Issued(cart_id) = update.session {
        info!(cart_id = %cart_id, "Issuing cart cookie");
        if let Some(cookie) = state.cookies().set_cookie(&cart_id) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

fn quantity_arg(raw: &Value) -> std::result::Result<Option<i64>, CartError> {
    if raw.is_null() {
        return Ok(None);
    }
    Ok(Some(i64::from(Quantity::from_json(raw)?.get())))
}

/// `GET /api/cart`: the current cart or `null`.
#[instrument(skip(state, headers))]
pub async fn show(State(state): State<AppState>, headers: HeaderMap) -> Json<Option<Cart>> {
    let session = state.cookies().read(&headers);
    Json(state.cart().get_cart(session.as_ref()).await)
}

/// `POST /api/cart`: add a variant, creating the cart on first use.
#[instrument(skip(state, headers, payload))]
pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let merchandise_id = body
        .merchandise_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| CartError::Validation("Missing or invalid 'merchandiseId'.".to_string()))?;
    let quantity = quantity_arg(&body.quantity)?;

    let session = state.cookies().read(&headers);
    add_breadcrumb("cart", "Add to cart", &[("merchandise_id", &merchandise_id)]);

    let update = state
        .cart()
        .add_item(session.as_ref(), &merchandise_id, quantity)
        .await?;
    Ok(respond(&state, update))
}

/// `PUT /api/cart/line`: set a line's quantity.
#[instrument(skip(state, headers, payload))]
pub async fn update_line(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<UpdateLineRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let quantity = quantity_arg(&body.quantity)?
        .ok_or_else(|| CartError::Validation("'quantity' must be an integer >= 1.".to_string()))?;

    let session = state.cookies().read(&headers);
    let update = state
        .cart()
        .update_line(session.as_ref(), &body.line_id, quantity)
        .await?;
    Ok(respond(&state, update))
}

/// `DELETE /api/cart/line`: remove one or more lines.
#[instrument(skip(state, headers, payload))]
pub async fn remove_lines(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<RemoveLinesRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let ids = body.into_ids();

    let session = state.cookies().read(&headers);
    let update = state.cart().remove_lines(session.as_ref(), &ids).await?;
    Ok(respond(&state, update))
}

/// `GET /api/cart/count`: item count for the badge. Zero without a cart.
#[instrument(skip(state, headers))]
pub async fn count(State(state): State<AppState>, headers: HeaderMap) -> Json<CartCount> {
    let session = state.cookies().read(&headers);
    let total_quantity = state
        .cart()
        .get_cart(session.as_ref())
        .await
        .map_or(0, |cart| cart.total_quantity);
    Json(CartCount { total_quantity })
}

/// `POST /api/cart/checkout`: hosted checkout URL.
#[instrument(skip(state, headers))]
pub async fn checkout_url(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CheckoutResponse>> {
    let session = state.cookies().read(&headers);
    let checkout_url = state.cart().checkout_url(session.as_ref()).await?;
    Ok(Json(CheckoutResponse { checkout_url }))
}

/// `GET /checkout`: redirect to hosted checkout, or back to the cart page
/// when there is nothing to check out.
#[instrument(skip(state, headers))]
pub async fn checkout(State(state): State<AppState>, headers: HeaderMap) -> Result<Redirect> {
    let session = state.cookies().read(&headers);
    match state.cart().checkout_url(session.as_ref()).await {
        Ok(url) => Ok(Redirect::to(&url)),
        Err(CartError::NoCart) => Ok(Redirect::to("/cart")),
        Err(e) => Err(e.into()),
    }
}
