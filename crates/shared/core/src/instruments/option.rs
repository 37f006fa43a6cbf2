use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Price, ProductId};

/// Option kind: Call (right to buy) or Put (right to sell)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    #[default]
    Call,
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionKind::Call => write!(f, "C"),
            OptionKind::Put => write!(f, "P"),
        }
    }
}

/// A European option traded as its own product (e.g. a voucher on VOLCANIC_ROCK)
///
/// Static configuration: time to expiry is measured in trading days from the
/// start of the session and does not roll forward on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Underlying product
    pub underlying: ProductId,
    /// Strike price
    pub strike: Price,
    /// Remaining life in trading days
    pub time_to_expiry_days: f64,
    #[serde(default)]
    pub kind: OptionKind,
}

impl OptionSpec {
    pub fn new(
        underlying: impl Into<ProductId>,
        strike: Price,
        time_to_expiry_days: f64,
        kind: OptionKind,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            strike,
            time_to_expiry_days,
            kind,
        }
    }

    pub fn call(underlying: impl Into<ProductId>, strike: Price, time_to_expiry_days: f64) -> Self {
        Self::new(underlying, strike, time_to_expiry_days, OptionKind::Call)
    }

    /// Calculate intrinsic value
    pub fn intrinsic_value(&self, spot_price: Price) -> Decimal {
        match self.kind {
            OptionKind::Call => (spot_price - self.strike).max(Decimal::ZERO),
            OptionKind::Put => (self.strike - spot_price).max(Decimal::ZERO),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.time_to_expiry_days <= 0.0
    }
}

impl std::fmt::Display for OptionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{} ({}d)",
            self.underlying, self.strike, self.kind, self.time_to_expiry_days
        )
    }
}
