//! Line quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative. Removing a line is a separate operation.
    #[error("quantity must be an integer >= 1 (got {0})")]
    NotPositive(i64),
    /// Larger than a cart line can hold.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum accepted quantity.
        max: u32,
    },
    /// A fractional or non-numeric value.
    #[error("quantity must be an integer >= 1")]
    NotAnInteger,
}

/// Quantity of a cart line, always at least one.
///
/// ```
/// use heritage_core::Quantity;
///
/// assert_eq!(Quantity::new(2).unwrap().get(), 2);
/// assert!(Quantity::new(0).is_err());
/// assert!(Quantity::new(-1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Largest quantity accepted for a single line.
    pub const MAX: u32 = 99_999;

    /// Create a quantity from a signed integer.
    ///
    /// # Errors
    ///
    /// Returns an error for values below one or above [`Quantity::MAX`].
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        let value = u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })?;
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(QuantityError::NotPositive(0))
    }

    /// Parse a quantity from a JSON value.
    ///
    /// Integral floats such as `2.0` are accepted; `1.5`, strings and other
    /// types are not.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotAnInteger`] for non-integral input, or the
    /// range errors of [`Quantity::new`].
    pub fn from_json(value: &serde_json::Value) -> Result<Self, QuantityError> {
        let number = value.as_number().ok_or(QuantityError::NotAnInteger)?;
        if let Some(int) = number.as_i64() {
            return Self::new(int);
        }
        if number.as_u64().is_some() {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        let float = number.as_f64().ok_or(QuantityError::NotAnInteger)?;
        if !float.is_finite() || float.fract() != 0.0 {
            return Err(QuantityError::NotAnInteger);
        }
        if float > f64::from(Self::MAX) {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        if float < 1.0 {
            return Err(QuantityError::NotPositive(0));
        }
        #[allow(clippy::cast_possible_truncation)] // integral and within 1..=MAX
        Self::new(float as i64)
    }

    /// Returns the quantity as a `u32`.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The next quantity up, saturating at [`Quantity::MAX`].
    #[must_use]
    pub fn increment(self) -> Self {
        Self::new(i64::from(self.get()) + 1).unwrap_or(self)
    }

    /// The next quantity down, or `None` at one.
    #[must_use]
    pub fn decrement(self) -> Option<Self> {
        Self::new(i64::from(self.get()) - 1).ok()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.get()
    }
}

impl From<Quantity> for i64 {
    fn from(q: Quantity) -> Self {
        Self::from(q.get())
    }
}
