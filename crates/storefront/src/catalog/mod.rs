//! Catalog Query Layer.
//!
//! Read-only product queries. Failures degrade to an empty listing or a
//! missing product; they are logged, never surfaced to shoppers.

mod filters;

pub use filters::{
    CATEGORY_OPTIONS, DEFAULT_PAGE_SIZE, HERITAGE_OPTIONS, MAX_PAGE_SIZE, ProductFilters,
    ProductSort, build_search_query,
};

use tracing::{instrument, warn};

use heritage_core::{Product, ProductSummary};

use crate::shopify::StorefrontClient;

/// Product listing and detail lookups.
#[derive(Clone)]
pub struct CatalogService {
    client: StorefrontClient,
}

impl CatalogService {
    #[must_use]
    pub const fn new(client: StorefrontClient) -> Self {
        Self { client }
    }

    /// Products matching `filters`. Empty when the upstream call fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filters: &ProductFilters) -> Vec<ProductSummary> {
        let (sort_key, reverse) = filters.sort.sort_key();
        let query = build_search_query(filters);

        match self
            .client
            .get_products(filters.first, query, sort_key, reverse)
            .await
        {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Product listing failed; returning no products");
                Vec::new()
            }
        }
    }

    /// The product with `handle`, or `None` when it does not exist or the
    /// lookup fails.
    #[instrument(skip(self))]
    pub async fn product_by_handle(&self, handle: &str) -> Option<Product> {
        let handle = handle.trim();
        if handle.is_empty() {
            return None;
        }

        self.client
            .get_product_by_handle(handle)
            .await
            .inspect_err(|e| warn!(error = %e, "Product lookup failed"))
            .ok()
            .flatten()
    }
}
