//! Product conversion functions.

use tracing::warn;

use heritage_core::{Product, ProductId, ProductSummary, ProductVariant, VariantId};

use crate::shopify::ShopifyError;

use super::super::queries::{ProductSummaryFields, get_product_by_handle};
use super::cart::{convert_image, convert_money};

pub fn convert_product_summary(
    product: ProductSummaryFields,
) -> Result<ProductSummary, ShopifyError> {
    Ok(ProductSummary {
        id: ProductId::parse(&product.id).map_err(|e| ShopifyError::Malformed(e.to_string()))?,
        title: product.title,
        handle: product.handle,
        product_type: product.product_type,
        tags: product.tags,
        image: product.featured_image.map(convert_image),
        min_price: convert_money(product.price_range.min_variant_price)?,
    })
}

/// Convert a listing page, skipping products that fail to normalize.
pub fn convert_product_list(
    products: impl Iterator<Item = ProductSummaryFields>,
) -> Vec<ProductSummary> {
    products
        .filter_map(|p| {
            let handle = p.handle.clone();
            convert_product_summary(p)
                .inspect_err(|e| warn!(handle = %handle, error = %e, "Dropping product"))
                .ok()
        })
        .collect()
}

pub fn convert_product(
    product: get_product_by_handle::ProductFields,
) -> Result<Product, ShopifyError> {
    let summary = convert_product_summary(product.summary)?;

    let variants = product
        .variants
        .into_nodes()
        .map(|v| {
            Ok(ProductVariant {
                id: VariantId::parse(&v.id).map_err(|e| ShopifyError::Malformed(e.to_string()))?,
                title: v.title,
                available_for_sale: v.available_for_sale,
                price: convert_money(v.price)?,
            })
        })
        .collect::<Result<Vec<_>, ShopifyError>>()?;

    let mut images: Vec<_> = product.images.into_nodes().map(convert_image).collect();
    if images.is_empty()
        && let Some(featured) = summary.image.clone()
    {
        images.push(featured);
    }

    Ok(Product {
        id: summary.id,
        title: summary.title,
        handle: summary.handle,
        description_html: product.description_html,
        vendor: product.vendor,
        product_type: summary.product_type,
        tags: summary.tags,
        images,
        min_price: summary.min_price,
        variants,
    })
}
