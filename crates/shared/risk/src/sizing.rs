//! Order Sizing & Clamp
//!
//! Final gate between strategy candidates and the exchange. Quantities are
//! only ever reduced:
//! - to the remaining per-side capacity, counting orders already handed off
//!   this tick
//! - for taking orders, to the counter-side liquidity still resting at or
//!   better than the order price after earlier takes this tick
//!
//! An order is taking when it crosses the tick's original book (buy at or
//! above the best ask, sell at or below the best bid). Quotes rest and are
//! limited by capacity alone.

use log::debug;
use std::collections::BTreeMap;
use tidewater_core::{Order, OrderBookSnapshot, ProductId, Quantity, Side};

use crate::position::PositionTracker;

/// Built once per tick over that tick's books
#[derive(Debug, Clone)]
pub struct OrderSizer<'a> {
    books: &'a BTreeMap<ProductId, OrderBookSnapshot>,
    /// Books with this tick's takes removed, cloned on first take
    remaining: BTreeMap<ProductId, OrderBookSnapshot>,
}

impl<'a> OrderSizer<'a> {
    pub fn new(books: &'a BTreeMap<ProductId, OrderBookSnapshot>) -> Self {
        Self {
            books,
            remaining: BTreeMap::new(),
        }
    }

    /// Clamp each candidate in turn, dropping those reduced to zero
    pub fn clamp(&mut self, candidates: Vec<Order>, positions: &mut PositionTracker) -> Vec<Order> {
        let mut accepted = Vec::with_capacity(candidates.len());
        for order in candidates {
            if order.is_empty() {
                continue;
            }
            let allowed = self.size(&order, positions);
            if allowed == 0 {
                debug!("[OrderSizer] Dropped {}: no capacity or liquidity", order);
                continue;
            }
            if allowed < order.abs_quantity() {
                debug!("[OrderSizer] Reduced {} to {}", order, allowed);
            }
            accepted.push(self.commit(&order, allowed, positions));
        }
        accepted
    }

    /// Emit every leg unchanged, or nothing if any leg would be reduced
    pub fn clamp_all_or_none(
        &mut self,
        group: Vec<Order>,
        positions: &mut PositionTracker,
    ) -> Vec<Order> {
        let legs: Vec<Order> = group.into_iter().filter(|o| !o.is_empty()).collect();
        if legs.is_empty() {
            return legs;
        }

        let mut trial = self.clone();
        let mut trial_positions = positions.clone();
        for leg in &legs {
            let allowed = trial.size(leg, &trial_positions);
            if allowed < leg.abs_quantity() {
                debug!(
                    "[OrderSizer] Rejected {}-leg group: {} limited to {}",
                    legs.len(),
                    leg,
                    allowed
                );
                return Vec::new();
            }
            trial.commit(leg, allowed, &mut trial_positions);
        }

        self.remaining = trial.remaining;
        *positions = trial_positions;
        legs
    }

    /// Whether `order` crosses its product's book this tick
    pub fn is_taking(&self, order: &Order) -> bool {
        self.books
            .get(&order.product)
            .is_some_and(|book| book.is_taking(order))
    }

    fn size(&self, order: &Order, positions: &PositionTracker) -> Quantity {
        let Some(side) = order.side() else {
            return 0;
        };
        let mut allowed = order
            .abs_quantity()
            .min(positions.remaining_capacity(&order.product, side));
        if self.is_taking(order) {
            allowed = allowed.min(self.available(&order.product, side, order));
        }
        allowed.max(0)
    }

    fn available(&self, product: &str, side: Side, order: &Order) -> Quantity {
        self.remaining
            .get(product)
            .or_else(|| self.books.get(product))
            .map(|book| book.liquidity_at_or_better(side, order.price))
            .unwrap_or(0)
    }

    fn commit(&mut self, order: &Order, quantity: Quantity, positions: &mut PositionTracker) -> Order {
        let sized = order.with_abs_quantity(quantity);
        if self.is_taking(&sized) {
            self.consume(&sized);
        }
        positions.apply(&sized);
        sized
    }

    /// Remove the levels a taking order would hit, best first
    fn consume(&mut self, order: &Order) {
        let Some(side) = order.side() else {
            return;
        };
        let books = self.books;
        let Some(book) = books.get(&order.product) else {
            return;
        };
        let remaining = self
            .remaining
            .entry(order.product.clone())
            .or_insert_with(|| book.clone());

        let mut left = order.abs_quantity();
        for (price, quantity) in remaining.levels(side.opposite()) {
            if left == 0 {
                break;
            }
            let reachable = match side {
                Side::Buy => price <= order.price,
                Side::Sell => price >= order.price,
            };
            if !reachable {
                break;
            }
            let hit = left.min(quantity);
            left -= hit;
            match side {
                Side::Buy => remaining.set_ask(price, quantity - hit),
                Side::Sell => remaining.set_bid(price, quantity - hit),
            }
        }
    }
}

/// A fraction of the remaining capacity, at least one lot while any remains
pub fn capacity_share(capacity: Quantity, fraction: f64) -> Quantity {
    if capacity <= 0 {
        return 0;
    }
    let share = (capacity as f64 * fraction.clamp(0.0, 1.0)).floor() as Quantity;
    share.clamp(1, capacity)
}
