//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_COOKIE_SECRET` - Cart cookie signing secret (min 32 chars, high entropy)
//! - `SHOPIFY_STORE_DOMAIN` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ENV` - `development` or `production` (default: development)
//! - `CART_COOKIE_MAX_AGE_DAYS` - Cart cookie lifetime (default: 30)
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-10)
//! - `SHOPIFY_STOREFRONT_ENDPOINT` - Full GraphQL endpoint override
//! - `RESEND_API_KEY` - Enables the seller-interest relay
//! - `SELLER_INTEREST_RECIPIENT` - Inbox for seller-interest submissions (required with `RESEND_API_KEY`)
//! - `SELLER_INTEREST_FROM` - Sender (default: `Our Arab Heritage <onboarding@resend.dev>`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_TRACES_SAMPLE_RATE` - Fraction of transactions traced (default: 0.1)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use heritage_core::Email;

const MIN_COOKIE_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SELLER_INTEREST_FROM: &str = "Our Arab Heritage <onboarding@resend.dev>";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment. Controls the `Secure` attribute of the cart cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Cart cookie settings
    pub cart_cookie: CartCookieConfig,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Seller-interest relay, `None` when `RESEND_API_KEY` is unset
    pub seller_interest: Option<SellerInterestConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
    /// Log output format
    pub log_format: LogFormat,
}

/// Signed cart cookie settings.
#[derive(Clone)]
pub struct CartCookieConfig {
    /// Key material for the cookie signature
    pub secret: SecretString,
    /// Cookie lifetime
    pub max_age: Duration,
}

impl std::fmt::Debug for CartCookieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartCookieConfig")
            .field("secret", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store_domain: String,
    /// Shopify API version (e.g., 2024-10)
    pub api_version: String,
    /// Storefront API access token
    pub access_token: SecretString,
    /// Full endpoint URL, overriding the one derived from the store domain
    pub endpoint_override: Option<String>,
}

impl ShopifyStorefrontConfig {
    /// GraphQL endpoint for this store and API version.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.endpoint_override.clone().unwrap_or_else(|| {
            format!(
                "https://{}/api/{}/graphql.json",
                self.store_domain, self.api_version
            )
        })
    }
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store_domain", &self.store_domain)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("endpoint_override", &self.endpoint_override)
            .finish()
    }
}

/// Resend relay for seller-interest submissions.
#[derive(Clone)]
pub struct SellerInterestConfig {
    /// Resend API key
    pub api_key: SecretString,
    /// Inbox that receives submissions
    pub recipient: Email,
    /// Sender shown on the notification
    pub from: String,
    /// Resend API base URL (overridable for tests)
    pub api_base: String,
}

impl std::fmt::Debug for SellerInterestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SellerInterestConfig")
            .field("api_key", &"[REDACTED]")
            .field("recipient", &self.recipient)
            .field("from", &self.from)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let environment = parse_environment(&get_env_or_default("STOREFRONT_ENV", "development"))?;

        let cart_cookie = CartCookieConfig::from_env()?;
        let shopify = ShopifyStorefrontConfig::from_env()?;
        let seller_interest = SellerInterestConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_traces_sample_rate = parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?;
        let log_format = match get_env_or_default("LOG_FORMAT", "pretty").as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'pretty' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            base_url,
            environment,
            cart_cookie,
            shopify,
            seller_interest,
            sentry_dsn,
            sentry_traces_sample_rate,
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CartCookieConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("STOREFRONT_COOKIE_SECRET")?;
        validate_cookie_secret(&secret, "STOREFRONT_COOKIE_SECRET")?;
        let days: u64 = parse_env("CART_COOKIE_MAX_AGE_DAYS", "30")?;
        if days == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_COOKIE_MAX_AGE_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            secret,
            max_age: Duration::from_secs(days * 24 * 60 * 60),
        })
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store_domain: get_required_env("SHOPIFY_STORE_DOMAIN")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2024-10"),
            access_token: get_required_secret("SHOPIFY_STOREFRONT_ACCESS_TOKEN")?,
            endpoint_override: get_optional_env("SHOPIFY_STOREFRONT_ENDPOINT"),
        })
    }
}

impl SellerInterestConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("RESEND_API_KEY") else {
            return Ok(None);
        };
        let recipient = get_required_env("SELLER_INTEREST_RECIPIENT")?;
        let recipient = Email::parse(&recipient).map_err(|e| {
            ConfigError::InvalidEnvVar("SELLER_INTEREST_RECIPIENT".to_string(), e.to_string())
        })?;
        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            recipient,
            from: get_env_or_default("SELLER_INTEREST_FROM", DEFAULT_SELLER_INTEREST_FROM),
            api_base: crate::services::resend::DEFAULT_API_BASE.to_string(),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_environment(value: &str) -> Result<Environment, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "development" | "dev" => Ok(Environment::Development),
        "production" | "prod" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_ENV".to_string(),
            format!("expected 'development' or 'production', got '{other}'"),
        )),
    }
}

/// Validate that the cookie secret meets the key derivation's minimum length.
fn validate_cookie_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_COOKIE_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_COOKIE_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
