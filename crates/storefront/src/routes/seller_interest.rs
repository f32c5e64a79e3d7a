//! Seller-interest form relay.

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::header,
};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::services::resend::ResendError;
use crate::services::seller_interest::SUBJECT;
use crate::services::{SellerInterest, SellerInterestForm};
use crate::state::AppState;

/// A submission posted as JSON or as a urlencoded form.
#[derive(Debug)]
pub struct Submission(pub SellerInterestForm);

impl<S: Send + Sync> FromRequest<S> for Submission {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(form) = Json::<SellerInterestForm>::from_request(req, state).await?;
            return Ok(Self(form));
        }

        let Form(form) = Form::<SellerInterestForm>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection.body_text(), "Rejected form body");
                AppError::BadRequest("Invalid form body.".to_string())
            })?;
        Ok(Self(form))
    }
}

/// `POST /api/seller-interest`
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Submission(form): Submission,
) -> Result<Json<Value>> {
    let relay = state.seller_relay().ok_or_else(|| {
        warn!("Seller-interest submission received but RESEND_API_KEY is not set");
        AppError::Unavailable("Email service is not configured.".to_string())
    })?;

    let interest = SellerInterest::try_from(form)?;

    match relay.notify(SUBJECT, interest.to_html()).await {
        Ok(message_id) => {
            info!(message_id = %message_id, "Relayed seller-interest submission");
            Ok(Json(json!({ "success": true })))
        }
        Err(ResendError::Api { status: 429, .. }) => Err(AppError::RateLimited),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{self, StatusCode};

    use super::*;

    fn request(content_type: &str, body: &'static str) -> Request {
        http::Request::post("/api/seller-interest")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_form_body_is_decoded() {
        let Submission(form) = Submission::from_request(
            request(
                "application/x-www-form-urlencoded",
                "name=Omar&email=omar%40example.com&notes=Tatreez+%26+kufiya&extra=1",
            ),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(form.name.as_deref(), Some("Omar"));
        assert_eq!(form.email.as_deref(), Some("omar@example.com"));
        assert_eq!(form.notes.as_deref(), Some("Tatreez & kufiya"));
        assert_eq!(form.country, None);
    }

    #[tokio::test]
    async fn test_json_body_is_decoded() {
        let Submission(form) = Submission::from_request(
            request(
                "application/json; charset=utf-8",
                r#"{"name":"Layla","email":"layla@example.com","heritage":"palestinian"}"#,
            ),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(form.name.as_deref(), Some("Layla"));
        assert_eq!(form.heritage.as_deref(), Some("palestinian"));
    }

    #[tokio::test]
    async fn test_other_bodies_are_rejected() {
        for (content_type, body) in [
            ("text/plain", "name=Omar&email=omar%40example.com"),
            ("application/json", "{not json"),
        ] {
            let err = Submission::from_request(request(content_type, body), &())
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{content_type}");
        }
    }
}
