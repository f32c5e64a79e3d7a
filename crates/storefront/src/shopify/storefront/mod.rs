//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response types with `reqwest` 0.13 for HTTP.
//! Caches catalog reads using `moka` (5-minute TTL). Cart reads and
//! mutations always go to the API.

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use heritage_core::{Cart, CartId, CartLineId, Product, ProductSummary, Quantity, VariantId};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::{GraphQLError, ShopifyError};

use cache::{CacheKey, CacheValue};
use conversions::{convert_cart, convert_mutation_payload, convert_product, convert_product_list};
use queries::{
    AddCartLines, CartLineInput, CartLineUpdateInput, CreateCart, GetCart, GetProductByHandle,
    GetProducts, ProductSortKey, RemoveCartLines, UpdateCartLines, add_cart_lines, create_cart,
    get_cart, get_product_by_handle, get_products, remove_cart_lines, update_cart_lines,
};

/// Header carrying the Storefront API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Bound on establishing a connection. Requests themselves carry no timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest response body excerpt kept in logs and errors.
const BODY_EXCERPT: usize = 500;

/// A line to add to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToAdd {
    pub variant: VariantId,
    pub quantity: Quantity,
}

/// A new quantity for an existing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToUpdate {
    pub line: CartLineId,
    pub quantity: Quantity,
}

impl From<&LineToAdd> for CartLineInput {
    fn from(line: &LineToAdd) -> Self {
        Self {
            merchandise_id: line.variant.as_str().to_string(),
            quantity: line.quantity.get(),
        }
    }
}

impl From<&LineToUpdate> for CartLineUpdateInput {
    fn from(line: &LineToUpdate) -> Self {
        Self {
            id: line.line.as_str().to_string(),
            quantity: line.quantity.get(),
        }
    }
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ShopifyError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: config.endpoint(),
                access_token: config.access_token.expose_secret().to_string(),
                cache,
            }),
        })
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let body = excerpt(&response_text);
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %body,
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %excerpt(&response_text),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %excerpt(&response_text),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle. `Ok(None)` when no product has that handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Product>, ShopifyError> {
        let cache_key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };
        let data = self.execute::<GetProductByHandle>(variables).await?;

        let Some(product_data) = data.product else {
            return Ok(None);
        };
        let product = convert_product(product_data)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(Some(product))
    }

    /// Get one page of products matching a search query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        query: Option<String>,
        sort_key: ProductSortKey,
        reverse: bool,
    ) -> Result<Vec<ProductSummary>, ShopifyError> {
        let cache_key = CacheKey::Products {
            first,
            query: query.clone(),
            sort_key,
            reverse,
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let variables = get_products::Variables {
            first,
            query,
            sort_key: Some(sort_key),
            reverse: Some(reverse),
        };
        let data = self.execute::<GetProducts>(variables).await?;

        let products = convert_product_list(data.products.into_nodes());

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get a cart. `Ok(None)` when the cart no longer exists upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the cart is malformed.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.as_str().to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;

        data.cart.map(convert_cart).transpose()
    }

    /// Create a cart seeded with lines. Returns the new cart's id.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::UserErrors`] for business-rule rejections and
    /// other variants for transport failures.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_cart(&self, lines: &[LineToAdd]) -> Result<CartId, ShopifyError> {
        let variables = create_cart::Variables {
            lines: lines.iter().map(CartLineInput::from).collect(),
        };

        let data = self.execute::<CreateCart>(variables).await?;

        convert_mutation_payload(data.cart_create, "cartCreate")
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::UserErrors`] for business-rule rejections and
    /// other variants for transport failures.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    pub async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineToAdd],
    ) -> Result<CartId, ShopifyError> {
        let variables = add_cart_lines::Variables {
            cart_id: cart_id.as_str().to_string(),
            lines: lines.iter().map(CartLineInput::from).collect(),
        };

        let data = self.execute::<AddCartLines>(variables).await?;

        convert_mutation_payload(data.cart_lines_add, "cartLinesAdd")
    }

    /// Set line quantities.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::UserErrors`] for business-rule rejections and
    /// other variants for transport failures.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    pub async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineToUpdate],
    ) -> Result<CartId, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.as_str().to_string(),
            lines: lines.iter().map(CartLineUpdateInput::from).collect(),
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;

        convert_mutation_payload(data.cart_lines_update, "cartLinesUpdate")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::UserErrors`] for business-rule rejections and
    /// other variants for transport failures.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id, lines = line_ids.len()))]
    pub async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> Result<CartId, ShopifyError> {
        let variables = remove_cart_lines::Variables {
            cart_id: cart_id.as_str().to_string(),
            line_ids: line_ids.iter().map(|id| id.as_str().to_string()).collect(),
        };

        let data = self.execute::<RemoveCartLines>(variables).await?;

        convert_mutation_payload(data.cart_lines_remove, "cartLinesRemove")
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT).collect()
}
