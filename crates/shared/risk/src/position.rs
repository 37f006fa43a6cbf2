//! Position Tracking
//!
//! Holds the exchange-reported position per product plus the orders already
//! handed off this tick. Capacity is worst case per side: if every pending
//! buy fills, the position must still be within the limit, and likewise for
//! sells.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tidewater_core::{Order, ProductId, Quantity, Side};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Pending {
    buys: Quantity,
    sells: Quantity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionTracker {
    limits: BTreeMap<ProductId, Quantity>,
    /// Exchange-reported net positions
    positions: BTreeMap<ProductId, Quantity>,
    /// Absolute quantity handed off this tick, per side
    pending: BTreeMap<ProductId, Pending>,
}

impl PositionTracker {
    pub fn new(limits: BTreeMap<ProductId, Quantity>) -> Self {
        Self {
            limits: limits.into_iter().map(|(p, l)| (p, l.abs())).collect(),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, product: impl Into<ProductId>, limit: Quantity) -> Self {
        self.set_limit(product, limit);
        self
    }

    pub fn set_limit(&mut self, product: impl Into<ProductId>, limit: Quantity) {
        self.limits.insert(product.into(), limit.abs());
    }

    /// Position limit; unknown products have none and so no capacity
    pub fn limit(&self, product: &str) -> Quantity {
        self.limits.get(product).copied().unwrap_or(0)
    }

    pub fn has_limit(&self, product: &str) -> bool {
        self.limits.contains_key(product)
    }

    /// Exchange-reported position at the start of the tick
    pub fn position(&self, product: &str) -> Quantity {
        self.positions.get(product).copied().unwrap_or(0)
    }

    /// Position if every order handed off this tick fills
    pub fn projected_position(&self, product: &str) -> Quantity {
        let pending = self.pending.get(product).cloned().unwrap_or_default();
        self.position(product) + pending.buys - pending.sells
    }

    /// Largest further quantity on `side` that keeps the worst case within the limit
    pub fn remaining_capacity(&self, product: &str, side: Side) -> Quantity {
        if !self.has_limit(product) {
            return 0;
        }
        let limit = self.limit(product);
        let position = self.position(product);
        let pending = self.pending.get(product).cloned().unwrap_or_default();
        let remaining = match side {
            Side::Buy => limit - position - pending.buys,
            Side::Sell => limit + position - pending.sells,
        };
        remaining.max(0)
    }

    /// Replace positions with the exchange's view and forget pending orders
    pub fn sync(&mut self, positions: &BTreeMap<ProductId, Quantity>) {
        self.positions.clear();
        self.pending.clear();
        for (product, &quantity) in positions {
            if quantity.abs() > self.limit(product) && self.has_limit(product) {
                warn!(
                    "[PositionTracker] {} reported at {} beyond limit {}",
                    product,
                    quantity,
                    self.limit(product)
                );
            }
            if quantity != 0 {
                self.positions.insert(product.clone(), quantity);
            }
        }
    }

    /// Record an order as handed off
    pub fn apply(&mut self, order: &Order) {
        let Some(side) = order.side() else {
            return;
        };
        let pending = self.pending.entry(order.product.clone()).or_default();
        match side {
            Side::Buy => pending.buys += order.abs_quantity(),
            Side::Sell => pending.sells += order.abs_quantity(),
        }
    }

    pub fn limits(&self) -> &BTreeMap<ProductId, Quantity> {
        &self.limits
    }
}
