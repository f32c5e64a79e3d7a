//! Cart synchronization core, server half.
//!
//! - [`CartService`] validates input, issues one mutation, refetches the cart
//! - [`CartGateway`] is the seam to the remote cart service
//! - [`CartCookies`] owns the signed `cartId` cookie; only the HTTP layer
//!   touches it

pub mod cookie;
mod error;
mod gateway;
mod service;

pub use cookie::{CART_COOKIE, CartCookies};
pub use error::CartError;
pub use gateway::CartGateway;
pub use service::{CartService, CartUpdate, SessionChange};
