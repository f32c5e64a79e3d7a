//! Client-side cart errors.

use heritage_core::{CartUserError, IdError, QuantityError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The storefront answered with an error status.
    #[error("storefront returned {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        user_errors: Vec<CartUserError>,
    },

    /// The storefront could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A successful response did not carry a cart.
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// `true` for 4xx rejections, which retrying will not fix.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Rejected {
                status: 400..=499,
                ..
            }
        )
    }
}

impl From<QuantityError> for ClientError {
    fn from(err: QuantityError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<IdError> for ClientError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}
