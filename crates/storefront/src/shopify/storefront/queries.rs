//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with a module
//! of the same name (snake case) holding its `Variables` and `ResponseData`.
//! The documents live in `graphql/storefront/queries`; a document may hold
//! several operations, selected by `operationName`.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

const CART_DOCUMENT: &str = include_str!("../../../graphql/storefront/queries/cart.graphql");
const PRODUCTS_DOCUMENT: &str =
    include_str!("../../../graphql/storefront/queries/products.graphql");

macro_rules! operation {
    ($name:ident, $module:ident, $document:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

operation!(GetCart, get_cart, CART_DOCUMENT);
operation!(CreateCart, create_cart, CART_DOCUMENT);
operation!(AddCartLines, add_cart_lines, CART_DOCUMENT);
operation!(UpdateCartLines, update_cart_lines, CART_DOCUMENT);
operation!(RemoveCartLines, remove_cart_lines, CART_DOCUMENT);
operation!(GetProducts, get_products, PRODUCTS_DOCUMENT);
operation!(GetProductByHandle, get_product_by_handle, PRODUCTS_DOCUMENT);

// =============================================================================
// Shared shapes
// =============================================================================

/// `MoneyV2` as sent by the API (`amount` is a decimal string).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub url: String,
    pub alt_text: Option<String>,
}

/// Relay-style connection; only `edges.node` is selected.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

/// `CartLineInput`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: u32,
}

/// `CartLineUpdateInput`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: u32,
}

/// `CartMutationFields`: mutations report only the (possibly new) cart id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationFields {
    pub id: String,
    pub total_quantity: i64,
}

/// `UserErrorFields`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorFields {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartMutationFields>,
    #[serde(default)]
    pub user_errors: Vec<UserErrorFields>,
}

// =============================================================================
// Cart
// =============================================================================

pub mod get_cart {
    use super::{Connection, Deserialize, ImageFields, MoneyV2, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartFields {
        pub id: String,
        pub checkout_url: String,
        pub total_quantity: i64,
        pub cost: CartCost,
        pub lines: Connection<CartLineFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCost {
        pub subtotal_amount: MoneyV2,
        pub total_amount: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineFields {
        pub id: String,
        pub quantity: i64,
        pub cost: CartLineCost,
        pub merchandise: MerchandiseFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineCost {
        pub total_amount: MoneyV2,
    }

    /// `... on ProductVariant`. Merchandise of any other kind selects no
    /// fields and arrives as an empty object.
    #[derive(Debug, Clone, Deserialize)]
    pub struct MerchandiseFields {
        pub id: Option<String>,
        pub title: Option<String>,
        pub price: Option<MoneyV2>,
        pub product: Option<MerchandiseProduct>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MerchandiseProduct {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub featured_image: Option<ImageFields>,
    }
}

pub mod create_cart {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

pub mod add_cart_lines {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

pub mod update_cart_lines {
    use super::{CartLineUpdateInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

pub mod remove_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

// =============================================================================
// Products
// =============================================================================

/// `ProductSortKeys` values used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSortKey {
    CreatedAt,
    Price,
    Title,
}

/// `ProductSummaryFields`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummaryFields {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub featured_image: Option<ImageFields>,
    pub price_range: PriceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_variant_price: MoneyV2,
}

pub mod get_products {
    use super::{Connection, Deserialize, ProductSortKey, ProductSummaryFields, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub first: i64,
        pub query: Option<String>,
        pub sort_key: Option<ProductSortKey>,
        pub reverse: Option<bool>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductSummaryFields>,
    }
}

pub mod get_product_by_handle {
    use super::{Connection, Deserialize, ImageFields, MoneyV2, ProductSummaryFields, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductFields {
        #[serde(flatten)]
        pub summary: ProductSummaryFields,
        pub description_html: String,
        pub vendor: String,
        pub images: Connection<ImageFields>,
        pub variants: Connection<VariantFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantFields {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub price: MoneyV2,
    }
}
