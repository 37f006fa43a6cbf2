//! Integration test: strategies feeding the order sizer
//!
//! Tests the flow the engine runs per product:
//! 1. Books are marked with fair values and indicators
//! 2. A strategy decides against the shared position tracker
//! 3. Its actions pass through the sizer, which records hand-offs
//! 4. The next strategy sees the reduced capacity and liquidity

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tidewater_core::{Order, OrderBookSnapshot, Price, ProductId, Side};
use tidewater_quant::{FairValueEstimator, FairValuePolicy, Indicators, StatsTracker};
use tidewater_risk::{OrderSizer, PositionTracker};
use tidewater_strategy::{
    Action, BasketArbitrage, BasketArbitrageConfig, BasketLeg, MarketMaking, MarketMakingConfig,
    Strategy, StrategyContext,
};

struct Market {
    books: BTreeMap<ProductId, OrderBookSnapshot>,
    fair_values: BTreeMap<ProductId, Price>,
    indicators: BTreeMap<ProductId, Indicators>,
    stats: StatsTracker,
}

impl Market {
    fn new(books: Vec<OrderBookSnapshot>) -> Self {
        let estimator = FairValueEstimator::new(FairValuePolicy::WeightedMid);
        let mut stats = StatsTracker::default();
        let mut fair_values = BTreeMap::new();
        let mut indicators = BTreeMap::new();
        let books: BTreeMap<ProductId, OrderBookSnapshot> = books
            .into_iter()
            .map(|b| (b.product().to_string(), b))
            .collect();
        for (product, book) in &books {
            if let Some(fair) = estimator.estimate(book, None) {
                fair_values.insert(product.clone(), fair);
                indicators.insert(product.clone(), stats.update(product, fair.to_f64().unwrap()));
            }
        }
        Self {
            books,
            fair_values,
            indicators,
            stats,
        }
    }

    /// Pin a product's fair value, as a wall-anchored estimate would
    fn with_fair(mut self, product: &str, fair: Price) -> Self {
        self.fair_values.insert(product.to_string(), fair);
        self
    }

    fn decide(
        &self,
        strategy: &mut dyn Strategy,
        product: &str,
        positions: &PositionTracker,
    ) -> Vec<Action> {
        let ctx = StrategyContext {
            product,
            book: &self.books[product],
            indicators: self.indicators.get(product).copied(),
            fair_value: self.fair_values.get(product).copied(),
            positions,
            books: &self.books,
            all_indicators: &self.indicators,
            fair_values: &self.fair_values,
            stats: &self.stats,
            market_trades: &[],
            observations: &BTreeMap::new(),
            timestamp: 0,
        };
        strategy.decide(&ctx)
    }
}

fn book(product: &str, bids: &[(i64, i64)], asks: &[(i64, i64)]) -> OrderBookSnapshot {
    OrderBookSnapshot::from_levels(
        product,
        bids.iter().map(|(p, q)| (Decimal::from(*p), *q)),
        asks.iter().map(|(p, q)| (Decimal::from(*p), *q)),
    )
}

fn submit(sizer: &mut OrderSizer<'_>, actions: Vec<Action>, positions: &mut PositionTracker) -> Vec<Order> {
    actions
        .into_iter()
        .flat_map(|action| match action {
            Action::Submit(order) => sizer.clamp(vec![order], positions),
            Action::AllOrNone(legs) => sizer.clamp_all_or_none(legs, positions),
        })
        .collect()
}

/// Test taking then quoting within a tight limit
#[test]
fn test_market_maker_through_sizer() {
    let _ = env_logger::try_init();

    let market = Market::new(vec![book(
        "RAINFOREST_RESIN",
        &[(9996, 5)],
        &[(9997, 4), (9999, 6), (10004, 20)],
    )])
    .with_fair("RAINFOREST_RESIN", dec!(10000));
    let mut positions = PositionTracker::default().with_limit("RAINFOREST_RESIN", 8);
    let mut mm = MarketMaking::new(MarketMakingConfig::default());

    let actions = market.decide(&mut mm, "RAINFOREST_RESIN", &positions);
    let mut sizer = OrderSizer::new(&market.books);
    let orders = submit(&mut sizer, actions, &mut positions);

    assert_eq!(
        orders,
        vec![
            Order::buy("RAINFOREST_RESIN", dec!(9997), 4),
            Order::buy("RAINFOREST_RESIN", dec!(9999), 4),
            Order::sell("RAINFOREST_RESIN", dec!(10002), 8),
        ]
    );
    assert_eq!(positions.remaining_capacity("RAINFOREST_RESIN", Side::Buy), 0);
    assert_eq!(positions.remaining_capacity("RAINFOREST_RESIN", Side::Sell), 0);
}

/// Test that a basket is rejected whole once an earlier take drained a leg
#[test]
fn test_basket_rejected_after_leg_drained() {
    let _ = env_logger::try_init();

    let market = Market::new(vec![
        book("PICNIC_BASKET2", &[(30400, 10)], &[(30402, 10)]),
        book("CROISSANTS", &[(4299, 100)], &[(4301, 100)]),
        book("JAMS", &[(6549, 100)], &[(6551, 100)]),
    ]);
    let mut positions = PositionTracker::default()
        .with_limit("PICNIC_BASKET2", 100)
        .with_limit("CROISSANTS", 250)
        .with_limit("JAMS", 350);
    let mut basket = BasketArbitrage::new(BasketArbitrageConfig::new(vec![
        BasketLeg::new("CROISSANTS", 4),
        BasketLeg::new("JAMS", 2),
    ]));
    let mut sizer = OrderSizer::new(&market.books);

    // Another strategy lifted almost all of the CROISSANTS ask first
    let early = sizer.clamp(vec![Order::buy("CROISSANTS", dec!(4301), 98)], &mut positions);
    assert_eq!(early.len(), 1);

    let actions = market.decide(&mut basket, "PICNIC_BASKET2", &positions);
    assert!(matches!(actions.as_slice(), [Action::AllOrNone(_)]));

    let orders = submit(&mut sizer, actions, &mut positions);
    assert!(orders.is_empty());
    assert_eq!(positions.projected_position("JAMS"), 0);
    assert_eq!(positions.projected_position("PICNIC_BASKET2"), 0);
}
