//! Resend transactional email client.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, instrument};

use crate::config::SellerInterestConfig;

/// Production API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.resend.com";

/// Errors that can occur when sending through Resend.
#[derive(Debug, Error)]
pub enum ResendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// API key cannot be used as a header value.
    #[error("invalid API key format")]
    InvalidKey,
}

/// An email to send.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Resend API client.
#[derive(Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    endpoint: String,
    from: String,
    recipient: String,
}

impl ResendClient {
    /// Create a client for the seller-interest relay.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SellerInterestConfig) -> Result<Self, ResendError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| ResendError::InvalidKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.api_base.trim_end_matches('/')),
            from: config.from.clone(),
            recipient: config.recipient.as_str().to_string(),
        })
    }

    /// Send an HTML notification to the configured recipient. Returns the
    /// Resend message id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Resend rejects the message.
    #[instrument(skip(self, html))]
    pub async fn notify(&self, subject: &str, html: String) -> Result<String, ResendError> {
        let email = OutgoingEmail {
            from: self.from.clone(),
            to: vec![self.recipient.clone()],
            subject: subject.to_string(),
            html,
        };

        let response = self.client.post(&self.endpoint).json(&email).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |e| e.message);
            error!(status = %status, message = %message, "Resend rejected email");
            return Err(ResendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendResponse = response.json().await?;
        Ok(sent.id)
    }
}
