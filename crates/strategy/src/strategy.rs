//! Strategy Trait and Context
//!
//! Defines the interface every per-product strategy implements and the
//! read-only view of the tick it decides from.

use crate::basket_arbitrage::BasketState;
use crate::bollinger::BandEntry;
use crate::informed_mirror::MirrorState;
use crate::momentum_spread::TrendState;
use crate::option_reversion::VolMemory;
use crate::sunlight::SunlightState;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tidewater_core::{
    MarketTrade, Observation, Order, OrderBookSnapshot, Price, ProductId, Quantity, Side,
    Timestamp,
};
use tidewater_quant::{Indicators, PriceHistory, StatsTracker};
use tidewater_risk::PositionTracker;

/// Actions a strategy can request
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Submit a single order, clamped on its own
    Submit(Order),
    /// Submit every order unchanged or none of them
    AllOrNone(Vec<Order>),
}

impl Action {
    pub fn orders(&self) -> &[Order] {
        match self {
            Action::Submit(order) => std::slice::from_ref(order),
            Action::AllOrNone(orders) => orders,
        }
    }
}

/// Context provided to a strategy for one product on one tick
pub struct StrategyContext<'a> {
    /// Product being decided
    pub product: &'a str,
    /// Its validated book
    pub book: &'a OrderBookSnapshot,
    /// Indicators after this tick's update, None without a fair value
    pub indicators: Option<Indicators>,
    pub fair_value: Option<Price>,
    /// Positions and hand-offs so far this tick
    pub positions: &'a PositionTracker,
    /// Every validated book of the tick
    pub books: &'a BTreeMap<ProductId, OrderBookSnapshot>,
    pub all_indicators: &'a BTreeMap<ProductId, Indicators>,
    pub fair_values: &'a BTreeMap<ProductId, Price>,
    /// Rolling histories, for moving averages and horizon returns
    pub stats: &'a StatsTracker,
    pub market_trades: &'a [MarketTrade],
    pub observations: &'a BTreeMap<ProductId, Observation>,
    pub timestamp: Timestamp,
}

impl StrategyContext<'_> {
    /// Position including orders already handed off this tick
    pub fn position(&self) -> Quantity {
        self.positions.projected_position(self.product)
    }

    pub fn limit(&self) -> Quantity {
        self.positions.limit(self.product)
    }

    pub fn capacity(&self, side: Side) -> Quantity {
        self.positions.remaining_capacity(self.product, side)
    }

    pub fn history(&self) -> Option<&PriceHistory> {
        self.stats.history(self.product)
    }

    pub fn book_of(&self, product: &str) -> Option<&OrderBookSnapshot> {
        self.books.get(product)
    }

    pub fn fair_value_of(&self, product: &str) -> Option<Price> {
        self.fair_values.get(product).copied()
    }

    pub fn indicators_of(&self, product: &str) -> Option<Indicators> {
        self.all_indicators.get(product).copied()
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.observations.get(self.product)
    }

    /// This tick's trades in the decided product
    pub fn trades(&self) -> impl Iterator<Item = &MarketTrade> + '_ {
        self.market_trades
            .iter()
            .filter(move |t| t.product == self.product)
    }

    /// Order taking the best counter-side level for `quantity`, capped by capacity
    pub fn take(&self, side: Side, quantity: Quantity) -> Option<Order> {
        let (price, _) = match side {
            Side::Buy => self.book.best_ask()?,
            Side::Sell => self.book.best_bid()?,
        };
        let quantity = quantity.min(self.capacity(side));
        (quantity > 0).then(|| Order::on_side(self.product, side, price, quantity))
    }

    /// Orders moving the projected position to `target` by taking
    pub fn move_to(&self, target: Quantity) -> Option<Order> {
        let delta = target - self.position();
        let side = Side::of(delta)?;
        self.take(side, delta.abs())
    }

    /// Take down the counter side level by level, best first, up to `quantity`
    pub fn sweep(&self, side: Side, quantity: Quantity) -> Vec<Order> {
        let mut left = quantity.min(self.capacity(side));
        let mut orders = Vec::new();
        for (price, size) in self.book.levels(side.opposite()) {
            if left <= 0 {
                break;
            }
            let hit = left.min(size);
            if hit > 0 {
                orders.push(Order::on_side(self.product, side, price, hit));
                left -= hit;
            }
        }
        orders
    }

    /// Multi-level version of [`move_to`](Self::move_to)
    pub fn sweep_to(&self, target: Quantity) -> Vec<Order> {
        let delta = target - self.position();
        match Side::of(delta) {
            Some(side) => self.sweep(side, delta.abs()),
            None => Vec::new(),
        }
    }
}

/// Persisted per-strategy memory, moved in and out of the engine each tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyState {
    #[default]
    Stateless,
    Bollinger(BandEntry),
    OptionReversion(VolMemory),
    Basket(BasketState),
    Momentum(TrendState),
    Mirror(MirrorState),
    Sunlight(SunlightState),
}

/// Strategy trait - implement this for each product's trading logic
///
/// Strategies own their state; the engine exports it with
/// [`save_state`](Strategy::save_state) after each tick and restores it with
/// [`load_state`](Strategy::load_state) before the next.
pub trait Strategy: Send {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Candidate actions for this tick
    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action>;

    /// Called instead of `decide` when the product has no usable book this tick
    fn skip_tick(&mut self, _product: &str, _market_trades: &[MarketTrade]) {}

    fn save_state(&self) -> StrategyState {
        StrategyState::Stateless
    }

    /// Replace internal memory; a state of another kind resets it to fresh
    fn load_state(&mut self, _state: StrategyState) {}
}

// === Numeric helpers ===

pub(crate) fn to_f64(price: Price) -> Option<f64> {
    price.to_f64()
}

pub(crate) fn to_price(value: f64) -> Option<Price> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Round to the nearest multiple of `tick`
pub(crate) fn round_to_tick(value: f64, tick: Decimal) -> Option<Price> {
    let price = to_price(value)?;
    if tick <= Decimal::ZERO {
        return Some(price);
    }
    Some((price / tick).round() * tick)
}

/// Round down (bids) or up (asks) to a multiple of `tick`
pub(crate) fn round_for_side(value: f64, tick: Decimal, side: Side) -> Option<Price> {
    let price = to_price(value)?;
    if tick <= Decimal::ZERO {
        return Some(price);
    }
    let ticks = price / tick;
    let rounded = match side {
        Side::Buy => ticks.floor(),
        Side::Sell => ticks.ceil(),
    };
    Some(rounded * tick)
}

/// Reject quotes that would trade immediately
pub(crate) fn crosses(book: &OrderBookSnapshot, side: Side, price: Price) -> bool {
    match side {
        Side::Buy => book.best_ask().is_some_and(|(ask, _)| price >= ask),
        Side::Sell => book.best_bid().is_some_and(|(bid, _)| price <= bid),
    }
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Strategy({})", self.name())
    }
}
