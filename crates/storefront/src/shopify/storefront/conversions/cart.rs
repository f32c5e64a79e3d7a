//! Cart conversion functions.
//!
//! Raw payloads become `heritage_core` types here and nowhere else.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;

use heritage_core::{
    Cart, CartCost, CartId, CartLine, CartLineId, CartUserError, Image, Merchandise,
    MerchandiseProduct, Money, ProductId, Quantity, VariantId,
};

use crate::shopify::ShopifyError;

use super::super::queries::{CartMutationPayload, ImageFields, MoneyV2, UserErrorFields, get_cart};

pub fn convert_money(money: MoneyV2) -> Result<Money, ShopifyError> {
    let amount = Decimal::from_str(&money.amount).map_err(|e| {
        ShopifyError::Malformed(format!("invalid amount '{}': {e}", money.amount))
    })?;
    Ok(Money::new(amount, money.currency_code))
}

pub fn convert_image(image: ImageFields) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}

/// Normalize a fetched cart.
///
/// Lines that cannot be represented (non-variant merchandise, invalid ids or
/// quantities) are dropped with a warning rather than failing the whole cart.
pub fn convert_cart(cart: get_cart::CartFields) -> Result<Cart, ShopifyError> {
    let id = CartId::parse(&cart.id).map_err(|e| ShopifyError::Malformed(e.to_string()))?;
    let total_quantity = u32::try_from(cart.total_quantity).map_err(|_| {
        ShopifyError::Malformed(format!("invalid totalQuantity {}", cart.total_quantity))
    })?;

    let lines = cart
        .lines
        .into_nodes()
        .filter_map(|line| {
            let line_id = line.id.clone();
            convert_cart_line(line)
                .inspect_err(|e| warn!(line_id = %line_id, error = %e, "Dropping cart line"))
                .ok()
        })
        .collect();

    let cart = Cart {
        id,
        checkout_url: cart.checkout_url,
        total_quantity,
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount)?,
            total: convert_money(cart.cost.total_amount)?,
        },
        lines,
    };

    if !cart.is_consistent() {
        warn!(
            cart_id = %cart.id,
            total_quantity = cart.total_quantity,
            line_quantity_sum = cart.line_quantity_sum(),
            "Cart total quantity does not match its lines"
        );
    }

    Ok(cart)
}

fn convert_cart_line(line: get_cart::CartLineFields) -> Result<CartLine, ShopifyError> {
    let malformed = |e: &dyn std::fmt::Display| ShopifyError::Malformed(e.to_string());

    let get_cart::MerchandiseFields {
        id: Some(variant_id),
        title: Some(title),
        price: Some(price),
        product: Some(product),
    } = line.merchandise
    else {
        return Err(ShopifyError::Malformed(
            "merchandise is not a product variant".to_string(),
        ));
    };

    Ok(CartLine {
        id: CartLineId::parse(&line.id).map_err(|e| malformed(&e))?,
        quantity: Quantity::new(line.quantity).map_err(|e| malformed(&e))?,
        merchandise: Merchandise {
            id: VariantId::parse(&variant_id).map_err(|e| malformed(&e))?,
            title,
            price: convert_money(price)?,
            product: MerchandiseProduct {
                id: ProductId::parse(&product.id).map_err(|e| malformed(&e))?,
                handle: product.handle,
                title: product.title,
                featured_image: product.featured_image.map(convert_image),
            },
        },
        line_total: convert_money(line.cost.total_amount)?,
    })
}

pub fn convert_user_error(error: UserErrorFields) -> CartUserError {
    CartUserError {
        code: error.code,
        field: error.field.unwrap_or_default(),
        message: error.message,
    }
}

/// Resolve a cart mutation payload to the id of the cart it touched.
///
/// `userErrors` take precedence over a returned cart.
pub fn convert_mutation_payload(
    payload: Option<CartMutationPayload>,
    operation: &'static str,
) -> Result<CartId, ShopifyError> {
    let payload =
        payload.ok_or_else(|| ShopifyError::Malformed(format!("{operation} returned no payload")))?;

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserErrors(
            payload.user_errors.into_iter().map(convert_user_error).collect(),
        ));
    }

    let cart = payload
        .cart
        .ok_or_else(|| ShopifyError::Malformed(format!("{operation} returned no cart")))?;
    CartId::parse(&cart.id).map_err(|e| ShopifyError::Malformed(e.to_string()))
}
