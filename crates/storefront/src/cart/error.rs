//! Cart operation errors.

use heritage_core::{CartUserError, IdError, QuantityError};
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Failure of a cart operation.
///
/// Validation failures are raised before any request is sent upstream.
#[derive(Debug, Error)]
pub enum CartError {
    /// Malformed or missing caller input.
    #[error("{0}")]
    Validation(String),

    /// A mutation that needs an existing cart was called without one.
    #[error("no cart")]
    NoCart,

    /// The platform rejected the mutation (`userErrors`).
    #[error("{}", summarize(.0))]
    UpstreamBusiness(Vec<CartUserError>),

    /// The platform could not be reached or answered with an error.
    #[error("upstream request failed: {0}")]
    UpstreamTransport(#[source] ShopifyError),
}

impl CartError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<ShopifyError> for CartError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::UserErrors(errors) => Self::UpstreamBusiness(errors),
            other => Self::UpstreamTransport(other),
        }
    }
}

impl From<IdError> for CartError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<QuantityError> for CartError {
    fn from(err: QuantityError) -> Self {
        Self::Validation(err.to_string())
    }
}

fn summarize(errors: &[CartUserError]) -> String {
    match errors {
        [] => "cart update rejected".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}
