//! Integration tests for the Heritage storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p heritage-integration-tests
//! ```
//!
//! No network access is needed: [`FakeShopify`] answers the Storefront
//! GraphQL operations the storefront sends (dispatching on `operationName`)
//! and the Resend `POST /emails` endpoint, and [`TestStorefront`] serves the
//! real router against it on loopback.
//!
//! # Test Categories
//!
//! - `cart_flow` - cart API over HTTP with the signed cookie
//! - `catalog` - product listing filters and detail lookups
//! - `client_store` - the client store driving a live storefront
//! - `seller_interest` - form relay through the fake Resend endpoint

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use heritage_core::Email;
use heritage_storefront::config::{
    CartCookieConfig, Environment, LogFormat, SellerInterestConfig, ShopifyStorefrontConfig,
    StorefrontConfig,
};
use heritage_storefront::state::AppState;

/// Price of every variant in the fake store.
pub const UNIT_PRICE: &str = "10.0";

const COOKIE_SECRET: &str = "k7Qp2xV9mL4tR8wZ1nB6cF3hJ5sD0gYe";

// =============================================================================
// Fake Shopify
// =============================================================================

#[derive(Debug, Clone)]
struct ShopLine {
    id: String,
    variant: String,
    quantity: u64,
}

#[derive(Default)]
struct ShopState {
    carts: HashMap<String, Vec<ShopLine>>,
    next_id: u64,
    calls: Vec<String>,
    failing: HashSet<String>,
    stock: HashMap<String, u64>,
    products: Vec<Value>,
    product_queries: Vec<Value>,
    emails: Vec<Value>,
    email_status: Option<StatusCode>,
}

impl ShopState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_stock(&self, variant: &str, quantity: u64) -> Option<Value> {
        let available = *self.stock.get(variant)?;
        (quantity > available).then(|| {
            json!({
                "code": "MERCHANDISE_NOT_ENOUGH_STOCK",
                "field": ["lines", "0", "quantity"],
                "message": format!("Only {available} items available"),
            })
        })
    }

    fn cart_json(&self, cart_id: &str) -> Option<Value> {
        let lines = self.carts.get(cart_id)?;
        let total: u64 = lines.iter().map(|l| l.quantity).sum();
        let edges: Vec<Value> = lines
            .iter()
            .map(|line| {
                let n = line.variant.rsplit('/').next().unwrap_or_default();
                json!({ "node": {
                    "id": line.id,
                    "quantity": line.quantity,
                    "cost": { "totalAmount": money(line.quantity) },
                    "merchandise": {
                        "id": line.variant,
                        "title": "Default Title",
                        "price": money(1),
                        "product": {
                            "id": format!("gid://shopify/Product/{n}"),
                            "handle": format!("product-{n}"),
                            "title": format!("Product {n}"),
                            "featuredImage": null,
                        },
                    },
                }})
            })
            .collect();

        Some(json!({
            "id": cart_id,
            "checkoutUrl": format!("https://checkout.example/{}", cart_id.rsplit('/').next().unwrap_or_default()),
            "totalQuantity": total,
            "cost": { "subtotalAmount": money(total), "totalAmount": money(total) },
            "lines": { "edges": edges },
        }))
    }

    /// Merge `lines` (`[{merchandiseId, quantity}]`) into a cart.
    fn add_lines(&mut self, cart_id: &str, lines: &[Value]) -> Result<(), Vec<Value>> {
        let mut pending = self.carts.get(cart_id).cloned().unwrap_or_default();
        for input in lines {
            let variant = input["merchandiseId"].as_str().unwrap_or_default().to_string();
            let quantity = input["quantity"].as_u64().unwrap_or(1);
            let existing = pending.iter().position(|l| l.variant == variant);
            let total = existing.map_or(0, |i| pending[i].quantity) + quantity;
            if let Some(error) = self.check_stock(&variant, total) {
                return Err(vec![error]);
            }
            match existing {
                Some(i) => pending[i].quantity = total,
                None => {
                    let id = format!("gid://shopify/CartLine/{}", self.next());
                    pending.push(ShopLine {
                        id,
                        variant,
                        quantity,
                    });
                }
            }
        }
        self.carts.insert(cart_id.to_string(), pending);
        Ok(())
    }

    fn update_lines(&mut self, cart_id: &str, lines: &[Value]) -> Result<(), Vec<Value>> {
        let mut pending = self.carts.get(cart_id).cloned().ok_or_else(no_cart)?;
        for (i, input) in lines.iter().enumerate() {
            let id = input["id"].as_str().unwrap_or_default();
            let quantity = input["quantity"].as_u64().unwrap_or_default();
            let line = pending
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or_else(|| vec![missing_line(i, id)])?;
            if let Some(error) = self.check_stock(&line.variant, quantity) {
                return Err(vec![error]);
            }
            line.quantity = quantity;
        }
        pending.retain(|l| l.quantity > 0);
        self.carts.insert(cart_id.to_string(), pending);
        Ok(())
    }

    fn remove_lines(&mut self, cart_id: &str, ids: &[Value]) -> Result<(), Vec<Value>> {
        let lines = self.carts.get_mut(cart_id).ok_or_else(no_cart)?;
        for (i, id) in ids.iter().enumerate() {
            let id = id.as_str().unwrap_or_default();
            if !lines.iter().any(|l| l.id == id) {
                return Err(vec![missing_line(i, id)]);
            }
        }
        lines.retain(|l| !ids.iter().any(|id| id.as_str() == Some(l.id.as_str())));
        Ok(())
    }

    fn mutation_payload(&self, cart_id: &str, result: Result<(), Vec<Value>>) -> Value {
        match result {
            Ok(()) => {
                let total: u64 = self
                    .carts
                    .get(cart_id)
                    .map_or(0, |lines| lines.iter().map(|l| l.quantity).sum());
                json!({ "cart": { "id": cart_id, "totalQuantity": total }, "userErrors": [] })
            }
            Err(errors) => json!({ "cart": null, "userErrors": errors }),
        }
    }
}

fn money(units: u64) -> Value {
    json!({ "amount": format!("{}.0", units * 10), "currencyCode": "USD" })
}

fn no_cart() -> Vec<Value> {
    vec![json!({
        "code": "INVALID",
        "field": ["cartId"],
        "message": "The specified cart does not exist.",
    })]
}

fn missing_line(index: usize, id: &str) -> Value {
    json!({
        "code": "INVALID",
        "field": ["lines", index.to_string(), "id"],
        "message": format!("The merchandise line with id {id} does not exist."),
    })
}

/// A product node carrying both the listing and the detail selections.
#[must_use]
pub fn product(id: u64, handle: &str, title: &str, product_type: &str, heritage: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{id}"),
        "title": title,
        "handle": handle,
        "productType": product_type,
        "tags": [format!("heritage:{heritage}")],
        "featuredImage": { "url": format!("https://cdn.example/{handle}.jpg"), "altText": title },
        "priceRange": { "minVariantPrice": { "amount": UNIT_PRICE, "currencyCode": "USD" } },
        "descriptionHtml": format!("<p>{title}</p>"),
        "vendor": "Heritage Makers",
        "images": { "edges": [] },
        "variants": { "edges": [{ "node": {
            "id": format!("gid://shopify/ProductVariant/{id}"),
            "title": "Default Title",
            "availableForSale": true,
            "price": { "amount": UNIT_PRICE, "currencyCode": "USD" },
        }}]},
    })
}

type Shared = Arc<Mutex<ShopState>>;

fn lock(state: &Shared) -> MutexGuard<'_, ShopState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn graphql(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let operation = body["operationName"].as_str().unwrap_or_default().to_string();
    let vars = &body["variables"];
    let mut shop = lock(&state);
    shop.calls.push(operation.clone());

    if shop.failing.contains(&operation) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let cart_id = vars["cartId"].as_str().unwrap_or_default().to_string();
    let lines = vars["lines"].as_array().cloned().unwrap_or_default();

    let data = match operation.as_str() {
        "GetCart" => json!({ "cart": shop.cart_json(&cart_id) }),
        "CreateCart" => {
            let id = format!("gid://shopify/Cart/c{}", shop.next());
            let result = shop.add_lines(&id, &lines);
            if result.is_err() {
                shop.carts.remove(&id);
            }
            json!({ "cartCreate": shop.mutation_payload(&id, result) })
        }
        "AddCartLines" => {
            let result = if shop.carts.contains_key(&cart_id) {
                shop.add_lines(&cart_id, &lines)
            } else {
                Err(no_cart())
            };
            json!({ "cartLinesAdd": shop.mutation_payload(&cart_id, result) })
        }
        "UpdateCartLines" => {
            let result = shop.update_lines(&cart_id, &lines);
            json!({ "cartLinesUpdate": shop.mutation_payload(&cart_id, result) })
        }
        "RemoveCartLines" => {
            let ids = vars["lineIds"].as_array().cloned().unwrap_or_default();
            let result = shop.remove_lines(&cart_id, &ids);
            json!({ "cartLinesRemove": shop.mutation_payload(&cart_id, result) })
        }
        "GetProducts" => {
            shop.product_queries.push(vars.clone());
            let first = vars["first"]
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(usize::MAX);
            let edges: Vec<Value> = shop
                .products
                .iter()
                .take(first)
                .map(|p| json!({ "node": p }))
                .collect();
            json!({ "products": { "edges": edges } })
        }
        "GetProductByHandle" => {
            let handle = vars["handle"].as_str().unwrap_or_default();
            let found = shop.products.iter().find(|p| p["handle"] == handle).cloned();
            json!({ "product": found })
        }
        other => {
            return Json(json!({ "errors": [{ "message": format!("unknown operation {other}") }] }))
                .into_response();
        }
    };

    Json(json!({ "data": data })).into_response()
}

async fn emails(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut shop = lock(&state);
    if let Some(status) = shop.email_status {
        return (status, Json(json!({ "message": "relay refused" }))).into_response();
    }
    shop.emails.push(body);
    let id = format!("email-{}", shop.emails.len());
    Json(json!({ "id": id })).into_response()
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Loopback stand-in for the Shopify Storefront API and Resend.
#[derive(Clone)]
pub struct FakeShopify {
    base: String,
    state: Shared,
}

impl FakeShopify {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let router = Router::new()
            .route("/graphql.json", post(graphql))
            .route("/emails", post(emails))
            .with_state(Arc::clone(&state));
        let addr = serve(router).await;
        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ShopState> {
        lock(&self.state)
    }

    #[must_use]
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql.json", self.base)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Cap the quantity of `variant` (a global id) any line may hold.
    pub fn set_stock(&self, variant: &str, available: u64) {
        self.lock().stock.insert(variant.to_string(), available);
    }

    /// Answer `operation` with HTTP 500 until [`Self::recover`].
    pub fn fail(&self, operation: &str) {
        self.lock().failing.insert(operation.to_string());
    }

    pub fn recover(&self, operation: &str) {
        self.lock().failing.remove(operation);
    }

    /// Times `operation` was received.
    #[must_use]
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == operation).count()
    }

    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.lock().carts.len()
    }

    pub fn add_product(&self, product: Value) {
        self.lock().products.push(product);
    }

    /// Variables of every `GetProducts` call.
    #[must_use]
    pub fn product_queries(&self) -> Vec<Value> {
        self.lock().product_queries.clone()
    }

    /// Bodies posted to `/emails`.
    #[must_use]
    pub fn emails(&self) -> Vec<Value> {
        self.lock().emails.clone()
    }

    /// Answer `/emails` with `status` instead of accepting.
    pub fn refuse_emails(&self, status: StatusCode) {
        self.lock().email_status = Some(status);
    }
}

// =============================================================================
// Storefront under test
// =============================================================================

/// Storefront configuration pointed at `shop`.
#[must_use]
pub fn config(shop: &FakeShopify, with_relay: bool) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        environment: Environment::Development,
        cart_cookie: CartCookieConfig {
            secret: SecretString::from(COOKIE_SECRET),
            max_age: Duration::from_secs(30 * 24 * 60 * 60),
        },
        shopify: ShopifyStorefrontConfig {
            store_domain: "heritage-test.myshopify.com".to_string(),
            api_version: "2024-10".to_string(),
            access_token: SecretString::from("test-token"),
            endpoint_override: Some(shop.graphql_url()),
        },
        seller_interest: with_relay.then(|| SellerInterestConfig {
            api_key: SecretString::from("re_test_key"),
            recipient: Email::parse("sellers@heritage.test").unwrap(),
            from: "Heritage <onboarding@resend.dev>".to_string(),
            api_base: shop.base_url().to_string(),
        }),
        sentry_dsn: None,
        sentry_traces_sample_rate: 0.0,
        log_format: LogFormat::Pretty,
    }
}

/// A running storefront backed by a [`FakeShopify`].
pub struct TestStorefront {
    pub shop: FakeShopify,
    base: String,
}

impl TestStorefront {
    /// Storefront without the seller-interest relay.
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    pub async fn start_with(with_relay: bool) -> Self {
        let shop = FakeShopify::start().await;
        let state = AppState::new(config(&shop, with_relay)).unwrap();
        let addr = serve(heritage_storefront::app(state)).await;
        Self {
            shop,
            base: format!("http://{addr}/"),
        }
    }

    /// Absolute URL for `path` (no leading slash).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    #[must_use]
    pub fn base_url(&self) -> url::Url {
        url::Url::parse(&self.base).unwrap()
    }

    /// A browser-like client: keeps cookies, does not follow redirects.
    #[must_use]
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }
}
