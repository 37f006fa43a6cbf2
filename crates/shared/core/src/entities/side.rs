use serde::{Deserialize, Serialize};

use crate::values::Quantity;

/// Order side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Side implied by the sign of a signed quantity (None for zero)
    pub fn of(quantity: Quantity) -> Option<Self> {
        match quantity {
            q if q > 0 => Some(Side::Buy),
            q if q < 0 => Some(Side::Sell),
            _ => None,
        }
    }

    /// +1 for buys, -1 for sells
    pub fn sign(&self) -> Quantity {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}
