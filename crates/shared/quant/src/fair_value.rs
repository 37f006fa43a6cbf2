//! Fair value estimation from a single book snapshot

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidewater_core::{OrderBookSnapshot, Price, Quantity};

/// How a product's fair value is read off its book
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FairValuePolicy {
    /// Top-of-book midpoint weighted by the opposite side's size
    #[default]
    WeightedMid,
    /// Plain (bid + ask) / 2
    Mid,
    /// Midpoint between the outermost bid and ask walls when both exist
    WallAnchored {
        /// Level qualifies as a wall at this multiple of its side's average level size
        wall_multiplier: Decimal,
    },
}

#[derive(Debug, Clone, Default)]
pub struct FairValueEstimator {
    policy: FairValuePolicy,
}

impl FairValueEstimator {
    pub fn new(policy: FairValuePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FairValuePolicy {
        self.policy
    }

    /// Fair value of `book`, or `last_known` when the book is one-sided
    pub fn estimate(&self, book: &OrderBookSnapshot, last_known: Option<Price>) -> Option<Price> {
        if !book.is_two_sided() {
            return last_known;
        }
        match self.policy {
            FairValuePolicy::WeightedMid => weighted_mid(book),
            FairValuePolicy::Mid => book.mid_price(),
            FairValuePolicy::WallAnchored { wall_multiplier } => {
                wall_mid(book, wall_multiplier).or_else(|| weighted_mid(book))
            }
        }
        .or(last_known)
    }
}

/// `(bid * ask_qty + ask * bid_qty) / (bid_qty + ask_qty)` over the top of book
pub fn weighted_mid(book: &OrderBookSnapshot) -> Option<Price> {
    let (bid, bid_qty) = book.best_bid()?;
    let (ask, ask_qty) = book.best_ask()?;
    let total = bid_qty + ask_qty;
    if total <= 0 {
        return book.mid_price();
    }
    Some((bid * Decimal::from(ask_qty) + ask * Decimal::from(bid_qty)) / Decimal::from(total))
}

fn wall_mid(book: &OrderBookSnapshot, multiplier: Decimal) -> Option<Price> {
    // Outermost wall: lowest bid wall and highest ask wall
    let bid_wall = walls(book.bid_levels().collect(), multiplier)
        .into_iter()
        .min()?;
    let ask_wall = walls(book.ask_levels().collect(), multiplier)
        .into_iter()
        .max()?;
    if bid_wall >= ask_wall {
        return None;
    }
    Some((bid_wall + ask_wall) / Decimal::TWO)
}

fn walls(levels: Vec<(Price, Quantity)>, multiplier: Decimal) -> Vec<Price> {
    if levels.is_empty() {
        return Vec::new();
    }
    let total: Quantity = levels.iter().map(|(_, q)| q).sum();
    let average = Decimal::from(total) / Decimal::from(levels.len());
    let threshold = average * multiplier;
    levels
        .into_iter()
        .filter(|(_, q)| Decimal::from(*q) >= threshold)
        .map(|(p, _)| p)
        .collect()
}
