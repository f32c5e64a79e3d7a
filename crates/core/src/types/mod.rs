//! Domain types for the Heritage storefront.
//!
//! Identifiers, quantities and money are validated newtypes; carts and
//! products are the normalized shapes produced at the GraphQL boundary.

pub mod cart;
pub mod email;
pub mod id;
pub mod money;
pub mod product;
pub mod quantity;

pub use cart::{Cart, CartCost, CartLine, CartUserError, Merchandise, MerchandiseProduct};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use product::{Image, Product, ProductSummary, ProductVariant};
pub use quantity::{Quantity, QuantityError};
