//! Seller-interest submissions.

use serde::Deserialize;
use thiserror::Error;

use heritage_core::{Email, EmailError};

pub const SUBJECT: &str = "New Seller Interest Submission";

/// Shown for optional fields left blank.
const BLANK: &str = "\u{2014}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SellerInterestError {
    #[error("Name and email are required.")]
    MissingRequired,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Raw form fields, from JSON or a urlencoded body.
#[derive(Debug, Default, Deserialize)]
pub struct SellerInterestForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub instagram: Option<String>,
    pub country: Option<String>,
    pub heritage: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerInterest {
    pub name: String,
    pub email: Email,
    pub instagram: Option<String>,
    pub country: Option<String>,
    pub heritage: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<SellerInterestForm> for SellerInterest {
    type Error = SellerInterestError;

    fn try_from(form: SellerInterestForm) -> Result<Self, Self::Error> {
        let name = non_blank(form.name).ok_or(SellerInterestError::MissingRequired)?;
        let email = non_blank(form.email).ok_or(SellerInterestError::MissingRequired)?;

        Ok(Self {
            name,
            email: Email::parse(&email)?,
            instagram: non_blank(form.instagram),
            country: non_blank(form.country),
            heritage: non_blank(form.heritage),
            category: non_blank(form.category),
            notes: non_blank(form.notes),
        })
    }
}

impl SellerInterest {
    /// Notification body. Every submitted value is escaped.
    #[must_use]
    pub fn to_html(&self) -> String {
        let optional = |v: &Option<String>| v.as_deref().map_or_else(|| BLANK.to_string(), escape_html);

        format!(
            "<h2>New Seller Interest</h2>\n\
             <p><strong>Name:</strong> {}</p>\n\
             <p><strong>Email:</strong> {}</p>\n\
             <p><strong>Instagram/Website:</strong> {}</p>\n\
             <p><strong>Based in:</strong> {}</p>\n\
             <p><strong>Heritage:</strong> {}</p>\n\
             <p><strong>Sells:</strong> {}</p>\n\
             <p><strong>Notes:</strong> {}</p>\n",
            escape_html(&self.name),
            escape_html(self.email.as_str()),
            optional(&self.instagram),
            optional(&self.country),
            optional(&self.heritage),
            optional(&self.category),
            optional(&self.notes),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Escape text for HTML element content or a quoted attribute.
fn escape_html(value: &str) -> String {
    html_escape::encode_quoted_attribute(value).into_owned()
}
