//! Signed `cartId` cookie.
//!
//! The only place the cart handle crosses the HTTP boundary. Handlers read the
//! session with [`CartCookies::read`] and pass it to the cart service
//! explicitly; the cookie is written only when the service reports a newly
//! issued handle.

use axum::http::{HeaderMap, HeaderValue, header};
use cookie::{Cookie, CookieJar, Key, SameSite};
use secrecy::ExposeSecret;
use tracing::debug;

use heritage_core::CartId;

use crate::config::{CartCookieConfig, ConfigError, Environment};

/// Name of the cart cookie.
pub const CART_COOKIE: &str = "cartId";

/// Minimum master key length accepted by [`Key::derive_from`].
const MIN_KEY_BYTES: usize = 32;

/// Reads and writes the signed cart cookie.
#[derive(Clone)]
pub struct CartCookies {
    key: Key,
    secure: bool,
    max_age: cookie::time::Duration,
}

impl CartCookies {
    /// Derive the signing key from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is shorter than 32 bytes.
    pub fn new(config: &CartCookieConfig, environment: Environment) -> Result<Self, ConfigError> {
        let secret = config.secret.expose_secret().as_bytes();
        if secret.len() < MIN_KEY_BYTES {
            return Err(ConfigError::InsecureSecret(
                "STOREFRONT_COOKIE_SECRET".to_string(),
                format!("must be at least {MIN_KEY_BYTES} bytes"),
            ));
        }

        let max_age = i64::try_from(config.max_age.as_secs())
            .map(cookie::time::Duration::seconds)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CART_COOKIE_MAX_AGE_DAYS".to_string(), e.to_string())
            })?;

        Ok(Self {
            key: Key::derive_from(secret),
            secure: environment.is_production(),
            max_age,
        })
    }

    /// The cart handle carried by the request, if any.
    ///
    /// Cookies that fail signature verification are treated as absent.
    #[must_use]
    pub fn read(&self, headers: &HeaderMap) -> Option<CartId> {
        let mut jar = CookieJar::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse_encoded(value).flatten() {
                if cookie.name() == CART_COOKIE {
                    jar.add_original(cookie.into_owned());
                }
            }
        }

        jar.get(CART_COOKIE)?;
        let Some(verified) = jar.signed(&self.key).get(CART_COOKIE) else {
            debug!("Ignoring cart cookie with invalid signature");
            return None;
        };
        CartId::parse(verified.value()).ok()
    }

    /// `Set-Cookie` value pointing the browser at `cart_id`.
    #[must_use]
    pub fn set_cookie(&self, cart_id: &CartId) -> Option<HeaderValue> {
        let cookie = Cookie::build((CART_COOKIE, cart_id.as_str().to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.max_age);

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        let signed = jar.delta().next()?;
        HeaderValue::from_str(&signed.encoded().to_string()).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    const SECRET: &str = "k7Qp2xV9mL4tR8wZ1nB6cF3hJ5sD0gYe";

    fn cookies(secret: &str, environment: Environment) -> CartCookies {
        CartCookies::new(
            &CartCookieConfig {
                secret: SecretString::from(secret),
                max_age: Duration::from_secs(30 * 24 * 60 * 60),
            },
            environment,
        )
        .unwrap()
    }

    fn request_with(set_cookie: &HeaderValue) -> HeaderMap {
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[test]
    fn test_cookie_attributes() {
        let cart_id = CartId::parse("gid://shopify/Cart/c1?key=abc").unwrap();
        let value = cookies(SECRET, Environment::Development)
            .set_cookie(&cart_id)
            .unwrap();
        let value = value.to_str().unwrap();

        assert!(value.starts_with("cartId="));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=2592000"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_secure_in_production() {
        let cart_id = CartId::parse("gid://shopify/Cart/c1").unwrap();
        let value = cookies(SECRET, Environment::Production)
            .set_cookie(&cart_id)
            .unwrap();
        assert!(value.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_signed_value_is_read_back() {
        let jar = cookies(SECRET, Environment::Development);
        let cart_id = CartId::parse("gid://shopify/Cart/c1?key=abc").unwrap();
        let headers = request_with(&jar.set_cookie(&cart_id).unwrap());
        assert_eq!(jar.read(&headers), Some(cart_id));
    }

    #[test]
    fn test_unsigned_or_foreign_cookie_is_ignored() {
        let jar = cookies(SECRET, Environment::Development);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("cartId=gid://shopify/Cart/forged"),
        );
        assert_eq!(jar.read(&headers), None);

        let other = cookies("Zr8#Lq2@Wm5!Tx9$Kv3%Hb7^Np1&Fd4*", Environment::Development);
        let cart_id = CartId::parse("gid://shopify/Cart/c1").unwrap();
        let headers = request_with(&other.set_cookie(&cart_id).unwrap());
        assert_eq!(jar.read(&headers), None);
    }

    #[test]
    fn test_missing_cookie() {
        let jar = cookies(SECRET, Environment::Development);
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(jar.read(&headers), None);
        assert_eq!(jar.read(&HeaderMap::new()), None);
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = CartCookies::new(
            &CartCookieConfig {
                secret: SecretString::from("too-short"),
                max_age: Duration::from_secs(60),
            },
            Environment::Development,
        );
        assert!(result.is_err());
    }
}
