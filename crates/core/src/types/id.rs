//! Catalog references carried by cart lines.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The catalog bar a cart line was added from. Opaque to the cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarId(i64);

impl BarId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BarId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<BarId> for i64 {
    fn from(id: BarId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_id_roundtrip_conversions() {
        let id = BarId::from(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_bar_id_serializes_transparently() {
        let json = serde_json::to_string(&BarId::new(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: BarId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, BarId::new(7));
    }
}
