//! Cache types for catalog responses. Carts are never cached.

use heritage_core::{Product, ProductSummary};

use super::queries::ProductSortKey;

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    Products {
        first: i64,
        query: Option<String>,
        sort_key: ProductSortKey,
        reverse: bool,
    },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<ProductSummary>),
}
