use serde::{Deserialize, Serialize};

use super::Side;
use crate::values::{Price, ProductId, Quantity, Timestamp};

/// Trade printed on the exchange's execution feed
///
/// Counterparties are attributed when the exchange discloses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketTrade {
    pub product: ProductId,
    pub price: Price,
    /// Absolute traded quantity
    pub quantity: Quantity,
    #[serde(default)]
    pub buyer: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub timestamp: Timestamp,
}

impl MarketTrade {
    pub fn new(product: impl Into<ProductId>, price: Price, quantity: Quantity) -> Self {
        Self {
            product: product.into(),
            price,
            quantity: quantity.abs(),
            buyer: None,
            seller: None,
            timestamp: 0,
        }
    }

    pub fn with_buyer(mut self, buyer: impl Into<String>) -> Self {
        self.buyer = Some(buyer.into());
        self
    }

    pub fn with_seller(mut self, seller: impl Into<String>) -> Self {
        self.seller = Some(seller.into());
        self
    }

    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Side taken by `counterparty` in this trade, if it participated
    pub fn side_of(&self, counterparty: &str) -> Option<Side> {
        if self.buyer.as_deref() == Some(counterparty) {
            Some(Side::Buy)
        } else if self.seller.as_deref() == Some(counterparty) {
            Some(Side::Sell)
        } else {
            None
        }
    }
}
