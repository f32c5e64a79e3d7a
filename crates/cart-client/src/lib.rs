//! Client half of the cart synchronization core.
//!
//! [`CartStore`] holds the last cart confirmed by the storefront plus a
//! per-line [`LineState`]. Quantity changes are shown immediately, sent one
//! at a time per line, and reconciled with the cart the server returns.
//! Every consumer reads the same [`CartSnapshot`] from a `watch` channel.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod backend;
mod error;
mod line;
mod store;
mod views;

#[cfg(test)]
mod testing;

pub use backend::{CartBackend, HttpCartBackend};
pub use error::ClientError;
pub use line::LineState;
pub use store::{CartSnapshot, CartStore, Dispatch, Notice, NoticeKind};
pub use views::{BadgeView, CartPageView, DrawerLine, DrawerView};
