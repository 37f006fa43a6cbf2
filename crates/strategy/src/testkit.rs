//! Builders for strategy unit tests

use crate::strategy::{Action, StrategyContext};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::BTreeMap;
use tidewater_core::{
    MarketTrade, Observation, Order, OrderBookSnapshot, Price, ProductId, Quantity,
};
use tidewater_quant::{Indicators, StatsTracker};
use tidewater_risk::PositionTracker;

#[derive(Default)]
pub struct Fixture {
    books: BTreeMap<ProductId, OrderBookSnapshot>,
    positions: PositionTracker,
    reported: BTreeMap<ProductId, Quantity>,
    stats: StatsTracker,
    indicators: BTreeMap<ProductId, Indicators>,
    fair_values: BTreeMap<ProductId, Price>,
    trades: Vec<MarketTrade>,
    observations: BTreeMap<ProductId, Observation>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            stats: StatsTracker::new(200),
            ..Default::default()
        }
    }

    pub fn book(mut self, product: &str, bids: &[(i64, Quantity)], asks: &[(i64, Quantity)]) -> Self {
        let book = OrderBookSnapshot::from_levels(
            product,
            bids.iter().map(|(p, q)| (Decimal::from(*p), *q)),
            asks.iter().map(|(p, q)| (Decimal::from(*p), *q)),
        );
        self.books.insert(product.to_string(), book);
        self
    }

    pub fn limit(mut self, product: &str, limit: Quantity) -> Self {
        self.positions.set_limit(product, limit);
        self.positions.sync(&self.reported);
        self
    }

    pub fn position(mut self, product: &str, quantity: Quantity) -> Self {
        self.reported.insert(product.to_string(), quantity);
        self.positions.sync(&self.reported);
        self
    }

    /// Feed fair values through the tracker; the last one becomes the fair value
    pub fn history(mut self, product: &str, values: &[f64]) -> Self {
        for value in values {
            let indicators = self.stats.update(product, *value);
            self.indicators.insert(product.to_string(), indicators);
        }
        if let Some(last) = values.last().and_then(|v| Decimal::from_f64(*v)) {
            self.fair_values.insert(product.to_string(), last);
        }
        self
    }

    pub fn window(mut self, product: &str, window: usize) -> Self {
        self.stats.set_window(product, window);
        self
    }

    /// Override the indicators the tracker produced
    pub fn indicators(mut self, product: &str, indicators: Indicators) -> Self {
        self.indicators.insert(product.to_string(), indicators);
        self
    }

    pub fn fair(mut self, product: &str, fair: Price) -> Self {
        self.fair_values.insert(product.to_string(), fair);
        self
    }

    pub fn trade(mut self, trade: MarketTrade) -> Self {
        self.trades.push(trade);
        self
    }

    pub fn observation(mut self, product: &str, observation: Observation) -> Self {
        self.observations.insert(product.to_string(), observation);
        self
    }

    /// Record orders as handed off, as the engine does between strategies
    pub fn handed_off(mut self, orders: &[Order]) -> Self {
        for order in orders {
            self.positions.apply(order);
        }
        self
    }

    pub fn ctx<'a>(&'a self, product: &'a str) -> StrategyContext<'a> {
        let book = self
            .books
            .get(product)
            .expect("fixture has no book for the product");
        StrategyContext {
            product,
            book,
            indicators: self.indicators.get(product).copied(),
            fair_value: self.fair_values.get(product).copied(),
            positions: &self.positions,
            books: &self.books,
            all_indicators: &self.indicators,
            fair_values: &self.fair_values,
            stats: &self.stats,
            market_trades: &self.trades,
            observations: &self.observations,
            timestamp: 0,
        }
    }
}

/// Indicators with the given mean and stddev, last value `last`
pub fn indicators(last: f64, mean: f64, std_dev: f64) -> Indicators {
    Indicators {
        last,
        mean,
        std_dev: Some(std_dev),
        momentum: last - mean,
        return_std: None,
        len: 50,
    }
}

/// Flatten actions into their orders
pub fn orders(actions: &[Action]) -> Vec<Order> {
    actions.iter().flat_map(|a| a.orders().to_vec()).collect()
}
