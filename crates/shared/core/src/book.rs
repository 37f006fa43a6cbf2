//! Order Book Snapshot
//!
//! One snapshot per product per tick, built by the exchange collaborator and
//! read-only inside the engine.

use crate::entities::{Order, Side};
use crate::error::{BookError, BookResult};
use crate::values::{Price, ProductId, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Depth of a single product at one tick
///
/// Uses BTreeMap for price levels to maintain sorted order.
/// Bids are read in descending order (highest first).
/// Asks are read in ascending order (lowest first).
/// Level quantities are always stored positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    product: ProductId,
    /// Bid levels: price -> quantity
    bids: BTreeMap<Price, Quantity>,
    /// Ask levels: price -> quantity
    asks: BTreeMap<Price, Quantity>,
}

impl OrderBookSnapshot {
    /// Create a new empty book
    pub fn new(product: impl Into<ProductId>) -> Self {
        Self {
            product: product.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    /// Build from raw levels. Signs are dropped and empty levels skipped, so
    /// feeds that report sell quantities as negatives are accepted as-is.
    pub fn from_levels(
        product: impl Into<ProductId>,
        bids: impl IntoIterator<Item = (Price, Quantity)>,
        asks: impl IntoIterator<Item = (Price, Quantity)>,
    ) -> Self {
        let mut book = Self::new(product);
        for (price, qty) in bids {
            book.set_bid(price, qty);
        }
        for (price, qty) in asks {
            book.set_ask(price, qty);
        }
        book
    }

    /// Set (or remove, when zero) a bid level
    pub fn set_bid(&mut self, price: Price, quantity: Quantity) {
        if quantity == 0 {
            self.bids.remove(&price);
        } else {
            self.bids.insert(price, quantity.abs());
        }
    }

    /// Set (or remove, when zero) an ask level
    pub fn set_ask(&mut self, price: Price, quantity: Quantity) {
        if quantity == 0 {
            self.asks.remove(&price);
        } else {
            self.asks.insert(price, quantity.abs());
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Reject books that cannot be traded against this tick
    pub fn validate(&self) -> BookResult<()> {
        if self.is_empty() {
            return Err(BookError::Empty(self.product.clone()));
        }
        if let (Some((bid, _)), Some((ask, _))) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(BookError::Crossed {
                    product: self.product.clone(),
                    bid,
                    ask,
                });
            }
        }
        Ok(())
    }

    // === Price Queries ===

    /// Get best bid price and quantity
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.iter().next_back().map(|(p, q)| (*p, *q))
    }

    /// Get best ask price and quantity
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.iter().next().map(|(p, q)| (*p, *q))
    }

    /// Get mid price (average of best bid and ask)
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Get spread (ask - bid)
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    // === Level Queries ===

    /// Bid levels, highest price first
    pub fn bid_levels(&self) -> impl Iterator<Item = (Price, Quantity)> + '_ {
        self.bids.iter().rev().map(|(p, q)| (*p, *q))
    }

    /// Ask levels, lowest price first
    pub fn ask_levels(&self) -> impl Iterator<Item = (Price, Quantity)> + '_ {
        self.asks.iter().map(|(p, q)| (*p, *q))
    }

    /// Levels on one side, best first
    pub fn levels(&self, side: Side) -> Vec<(Price, Quantity)> {
        match side {
            Side::Buy => self.bid_levels().collect(),
            Side::Sell => self.ask_levels().collect(),
        }
    }

    /// Check if book is empty
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Check if book has both sides
    pub fn is_two_sided(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    // === Taking Helpers ===

    /// Whether the order would cross the spread and trade immediately
    pub fn is_taking(&self, order: &Order) -> bool {
        match order.side() {
            Some(Side::Buy) => self.best_ask().is_some_and(|(ask, _)| order.price >= ask),
            Some(Side::Sell) => self.best_bid().is_some_and(|(bid, _)| order.price <= bid),
            None => false,
        }
    }

    /// Counter-side quantity an order on `side` limited at `price` can reach
    pub fn liquidity_at_or_better(&self, side: Side, price: Price) -> Quantity {
        match side {
            Side::Buy => self
                .asks
                .range(..=price)
                .map(|(_, q)| *q)
                .sum(),
            Side::Sell => self
                .bids
                .range(price..)
                .map(|(_, q)| *q)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_book() -> OrderBookSnapshot {
        OrderBookSnapshot::from_levels(
            "KELP",
            vec![(dec!(2030), 10), (dec!(2029), 5), (dec!(2028), 20)],
            vec![(dec!(2032), -8), (dec!(2033), -4), (dec!(2035), -30)],
        )
    }

    #[test]
    fn test_best_levels_and_mid() {
        let book = sample_book();

        assert_eq!(book.best_bid(), Some((dec!(2030), 10)));
        assert_eq!(book.best_ask(), Some((dec!(2032), 8)));
        assert_eq!(book.mid_price(), Some(dec!(2031)));
        assert_eq!(book.spread(), Some(dec!(2)));
    }

    #[test]
    fn test_level_ordering() {
        let book = sample_book();

        let bids: Vec<_> = book.bid_levels().map(|(p, _)| p).collect();
        assert_eq!(bids, vec![dec!(2030), dec!(2029), dec!(2028)]);

        let asks: Vec<_> = book.ask_levels().map(|(p, _)| p).collect();
        assert_eq!(asks, vec![dec!(2032), dec!(2033), dec!(2035)]);
    }

    #[test]
    fn test_crossed_book_rejected() {
        let book = OrderBookSnapshot::from_levels(
            "KELP",
            vec![(dec!(2033), 1)],
            vec![(dec!(2032), 1)],
        );

        assert!(matches!(book.validate(), Err(BookError::Crossed { .. })));
        assert!(sample_book().validate().is_ok());
    }

    #[test]
    fn test_locked_book_rejected() {
        let book =
            OrderBookSnapshot::from_levels("KELP", vec![(dec!(2032), 1)], vec![(dec!(2032), 1)]);
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_one_sided_book_is_valid() {
        let book = OrderBookSnapshot::from_levels("KELP", vec![(dec!(2030), 3)], vec![]);
        assert!(book.validate().is_ok());
        assert!(!book.is_two_sided());
        assert!(book.mid_price().is_none());
    }

    #[test]
    fn test_liquidity_at_or_better() {
        let book = sample_book();

        assert_eq!(book.liquidity_at_or_better(Side::Buy, dec!(2033)), 12);
        assert_eq!(book.liquidity_at_or_better(Side::Buy, dec!(2031)), 0);
        assert_eq!(book.liquidity_at_or_better(Side::Sell, dec!(2029)), 15);
    }

    #[test]
    fn test_is_taking() {
        let book = sample_book();

        assert!(book.is_taking(&Order::buy("KELP", dec!(2032), 1)));
        assert!(!book.is_taking(&Order::buy("KELP", dec!(2031), 1)));
        assert!(book.is_taking(&Order::sell("KELP", dec!(2030), 1)));
        assert!(!book.is_taking(&Order::sell("KELP", dec!(2031), 1)));
    }
}
