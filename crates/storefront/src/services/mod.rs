//! Outbound integrations other than the Storefront API.

pub mod resend;
pub mod seller_interest;

pub use resend::{ResendClient, ResendError};
pub use seller_interest::{SellerInterest, SellerInterestError, SellerInterestForm};
