//! Line quantity with a floor of one.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Quantity of a single cart line.
///
/// Always at least 1 and at most `u32::MAX`. Any non-positive or absent
/// input is normalized to 1 rather than rejected, including when reading a
/// stored cart back. Larger requests are capped at `u32::MAX`.
///
/// ```
/// use cardfactory_core::Quantity;
///
/// assert_eq!(Quantity::normalize(Some(3)).get(), 3);
/// assert_eq!(Quantity::normalize(Some(0)).get(), 1);
/// assert_eq!(Quantity::normalize(Some(-5)).get(), 1);
/// assert_eq!(Quantity::normalize(None).get(), 1);
/// assert_eq!(Quantity::normalize(Some(i64::MAX)), Quantity::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// The smallest valid quantity.
    pub const ONE: Self = Self(1);

    /// The largest representable quantity.
    pub const MAX: Self = Self(u32::MAX);

    /// Normalize an optional requested quantity.
    ///
    /// Absent, zero and negative requests become [`Quantity::ONE`]; requests
    /// above `u32::MAX` become [`Quantity::MAX`].
    #[must_use]
    pub fn normalize(requested: Option<i64>) -> Self {
        match requested {
            Some(value) if value > 0 => u32::try_from(value).map_or(Self::MAX, Self),
            _ => Self::ONE,
        }
    }

    /// Get the quantity as a `u32`.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self::normalize(Some(value))
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
