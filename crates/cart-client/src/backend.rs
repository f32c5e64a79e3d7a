//! Transport between the client store and the storefront's cart API.

use std::future::Future;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use heritage_core::{Cart, CartLineId, CartUserError, Quantity};

use crate::error::ClientError;

/// Cart operations as exposed by the storefront's JSON API.
///
/// Every mutation returns the server-confirmed cart.
pub trait CartBackend: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Option<Cart>, ClientError>> + Send;

    fn add_item(
        &self,
        variant: &str,
        quantity: Quantity,
    ) -> impl Future<Output = Result<Cart, ClientError>> + Send;

    fn update_line(
        &self,
        line: &CartLineId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<Cart, ClientError>> + Send;

    fn remove_lines(
        &self,
        lines: &[CartLineId],
    ) -> impl Future<Output = Result<Cart, ClientError>> + Send;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(default)]
    user_errors: Vec<CartUserError>,
}

/// [`CartBackend`] over HTTP.
///
/// Holds its own cookie store, so the signed `cartId` cookie issued on the
/// first add is replayed on every later request.
#[derive(Clone)]
pub struct HttpCartBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpCartBackend {
    /// `base` is the storefront origin, e.g. `https://shop.example/`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base: Url) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Unexpected(format!("bad URL {path}: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self.client.request(method, self.url(path)?);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (message, user_errors) = serde_json::from_str::<ErrorBody>(&text)
            .map_or_else(|_| (text, Vec::new()), |b| (b.error, b.user_errors));
        debug!(status = %status, message = %message, "Cart request rejected");
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
            user_errors,
        })
    }

    async fn mutate(
        &self,
        method: Method,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Cart, ClientError> {
        let response = self.send(method, path, Some(body)).await?;
        response
            .json::<Option<Cart>>()
            .await?
            .ok_or_else(|| ClientError::Unexpected("mutation returned no cart".to_string()))
    }
}

impl CartBackend for HttpCartBackend {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Option<Cart>, ClientError> {
        let response = self.send(Method::GET, "api/cart", None).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn add_item(&self, variant: &str, quantity: Quantity) -> Result<Cart, ClientError> {
        self.mutate(
            Method::POST,
            "api/cart",
            json!({ "merchandiseId": variant, "quantity": quantity }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_line(&self, line: &CartLineId, quantity: Quantity) -> Result<Cart, ClientError> {
        self.mutate(
            Method::PUT,
            "api/cart/line",
            json!({ "lineId": line, "quantity": quantity }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn remove_lines(&self, lines: &[CartLineId]) -> Result<Cart, ClientError> {
        self.mutate(Method::DELETE, "api/cart/line", json!({ "lineIds": lines }))
            .await
    }
}
