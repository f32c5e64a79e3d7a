//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and Sentry scope)
//! 4. Security headers
//! 5. Rate limiting, per route group (applied by the binary)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use rate_limit::{cart_rate_limiter, seller_interest_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
