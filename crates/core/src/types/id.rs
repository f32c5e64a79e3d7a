//! Opaque identifiers issued by the remote commerce platform.
//!
//! The platform addresses every entity with a global id of the form
//! `gid://shopify/<Resource>/<id>`. Carts and cart lines are treated as opaque
//! handles; product variants are normalized so that callers may pass either
//! the global id or the bare numeric id shown in the admin.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every global id issued by the platform.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Errors produced when parsing an identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty or whitespace.
    #[error("{kind} cannot be empty")]
    Empty {
        /// Human readable name of the identifier kind.
        kind: &'static str,
    },
    /// The input is neither a global id nor a bare numeric id.
    #[error("invalid variant identifier format: {0}")]
    InvalidFormat(String),
    /// The input is a global id for a different resource type.
    #[error("expected a {expected} identifier but got a {found} identifier")]
    WrongResource {
        /// Resource the caller asked for.
        expected: &'static str,
        /// Resource found in the input.
        found: String,
    },
}

/// Macro to define an opaque, non-empty string handle.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` (`#[serde(try_from = "String")]`, so an empty
///   handle never deserializes)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()`, `as_str()`, `into_inner()`
/// - `Display` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use heritage_core::define_handle;
/// define_handle!(ShipmentId, "shipment id");
///
/// assert!(ShipmentId::parse("abc").is_ok());
/// assert!(ShipmentId::parse("  ").is_err());
/// ```
#[macro_export]
macro_rules! define_handle {
    ($name:ident, $kind:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse a handle, rejecting empty or whitespace-only input.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::Empty`](crate::IdError::Empty) when the
            /// trimmed input is empty.
            pub fn parse(value: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty { kind: $kind });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the handle as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the handle and returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(value: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }
    };
}

define_handle!(CartId, "cart id");
define_handle!(CartLineId, "cart line id");
define_handle!(ProductId, "product id");

/// A fully-qualified product variant id (`gid://shopify/ProductVariant/<n>`).
///
/// ```
/// use heritage_core::VariantId;
///
/// let bare = VariantId::parse("111").unwrap();
/// assert_eq!(bare.as_str(), "gid://shopify/ProductVariant/111");
///
/// // Normalizing twice is the same as normalizing once.
/// assert_eq!(VariantId::parse(bare.as_str()).unwrap(), bare);
///
/// assert!(VariantId::parse("gid://shopify/Product/111").is_err());
/// assert!(VariantId::parse("not-an-id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantId(String);

impl VariantId {
    /// Resource name of product variants in global ids.
    pub const RESOURCE: &'static str = "ProductVariant";

    /// Normalize a variant reference.
    ///
    /// # Errors
    ///
    /// - [`IdError::Empty`] for blank input
    /// - [`IdError::WrongResource`] for a global id of another resource
    /// - [`IdError::InvalidFormat`] for anything that is neither a global id
    ///   nor a bare numeric id
    pub fn parse(reference: &str) -> Result<Self, IdError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(IdError::Empty {
                kind: "variant id",
            });
        }

        if is_numeric(reference) {
            return Ok(Self(format!("{GID_PREFIX}{}/{reference}", Self::RESOURCE)));
        }

        let (resource, id) = split_gid(reference)
            .ok_or_else(|| IdError::InvalidFormat(reference.to_owned()))?;

        if resource != Self::RESOURCE {
            return Err(IdError::WrongResource {
                expected: Self::RESOURCE,
                found: resource.to_owned(),
            });
        }

        if !is_numeric(id) {
            return Err(IdError::InvalidFormat(reference.to_owned()));
        }

        Ok(Self(reference.to_owned()))
    }

    /// Returns the global id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric part of the id.
    #[must_use]
    pub fn numeric_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for VariantId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VariantId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VariantId> for String {
    fn from(id: VariantId) -> Self {
        id.0
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Split `gid://shopify/<Resource>/<id>` into `(resource, id)`.
fn split_gid(reference: &str) -> Option<(&str, &str)> {
    let rest = reference.strip_prefix(GID_PREFIX)?;
    let (resource, id) = rest.split_once('/')?;
    let resource_ok = !resource.is_empty() && resource.bytes().all(|b| b.is_ascii_alphabetic());
    (resource_ok && !id.is_empty()).then_some((resource, id))
}
