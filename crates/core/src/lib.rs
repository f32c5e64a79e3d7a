//! Heritage Core - Shared types library.
//!
//! This crate provides the types shared by the two halves of the cart:
//! - `heritage-storefront` - HTTP service that proxies the Shopify Storefront API
//! - `heritage-cart-client` - client-side cart store with optimistic updates
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Both the
//! server and the client deserialize the same [`Cart`] shape, so the wire
//! format is defined exactly once.
//!
//! # Modules
//!
//! - [`types`] - Identifiers (with variant normalization), quantities, money,
//!   carts, products and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
