//! Tick Driver
//!
//! One decision cycle per call, synchronous and deterministic:
//!
//! ```text
//!  TickInput + EngineState
//!        │
//!        ├─► restore strategy states, sync positions
//!        ├─► validate books (crossed or empty → skip product)
//!        ├─► fair value → StatsTracker::update → Indicators
//!        ├─► registered products in sorted order: decide
//!        │     (no valid book → skip_tick)
//!        ├─► OrderSizer: clamp / all-or-none, apply hand-offs
//!        └─► export strategy states
//!        ▼
//!  TickOutput { orders, candidates, state }
//! ```
//!
//! Nothing inside the cycle returns an error: bad products are skipped and
//! the cycle always completes.

use crate::bootstrap::{build_estimators, build_positions, build_registry, configure_windows};
use crate::config::{ConfigResult, EngineConfig, load_default_config};
use crate::state::EngineState;
use log::{debug, info, warn};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tidewater_core::{
    MarketTrade, Observation, Order, OrderBookSnapshot, Price, ProductId, Quantity, Timestamp,
};
use tidewater_quant::{FairValueEstimator, Indicators, StatsTracker};
use tidewater_risk::{OrderSizer, PositionTracker};
use tidewater_strategy::{Action, StrategyContext, StrategyRegistry};

/// Market state delivered by the exchange for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub timestamp: Timestamp,
    pub books: BTreeMap<ProductId, OrderBookSnapshot>,
    #[serde(default)]
    pub market_trades: Vec<MarketTrade>,
    #[serde(default)]
    pub observations: BTreeMap<ProductId, Observation>,
    /// Positions as reported by the exchange
    #[serde(default)]
    pub positions: BTreeMap<ProductId, Quantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// Clamped orders per product
    pub orders: BTreeMap<ProductId, Vec<Order>>,
    /// Orders as the strategies proposed them, before clamping
    pub candidates: Vec<Order>,
    pub state: EngineState,
}

impl TickOutput {
    pub fn orders_for(&self, product: &str) -> &[Order] {
        self.orders.get(product).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn order_count(&self) -> usize {
        self.orders.values().map(Vec::len).sum()
    }
}

/// Per-tick values derived from the books
#[derive(Default)]
struct Marks {
    fair_values: BTreeMap<ProductId, Price>,
    indicators: BTreeMap<ProductId, Indicators>,
}

pub struct TradingEngine {
    config: EngineConfig,
    registry: StrategyRegistry,
    estimators: BTreeMap<ProductId, FairValueEstimator>,
}

impl TradingEngine {
    pub fn new(config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            registry: build_registry(&config),
            estimators: build_estimators(&config),
            config,
        })
    }

    pub fn with_default_config() -> ConfigResult<Self> {
        Self::new(load_default_config()?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh session state with the configured windows
    pub fn initial_state(&self) -> EngineState {
        let mut state = EngineState {
            stats: StatsTracker::new(self.config.default_window),
            ..Default::default()
        };
        configure_windows(&self.config, &mut state.stats);
        state
    }

    /// Run one decision cycle
    pub fn run_tick(&mut self, input: &TickInput, state: EngineState) -> TickOutput {
        let EngineState {
            mut stats,
            mut fair_values,
            strategies,
            ticks,
        } = state;
        configure_windows(&self.config, &mut stats);
        self.registry.load_states(&strategies);

        let mut positions = build_positions(&self.config);
        positions.sync(&input.positions);

        let books = valid_books(input);
        let marks = self.mark(&books, &fair_values, &mut stats);
        fair_values.extend(marks.fair_values.iter().map(|(p, f)| (p.clone(), *f)));

        let (orders, candidates) = self.dispatch(input, &books, &marks, &stats, &mut positions);

        info!(
            "[Engine] tick {} ts={}: {} books, {} candidates, {} orders",
            ticks + 1,
            input.timestamp,
            books.len(),
            candidates.len(),
            orders.values().map(Vec::len).sum::<usize>()
        );

        TickOutput {
            orders,
            candidates,
            state: EngineState {
                stats,
                fair_values,
                strategies: self.registry.save_states(),
                ticks: ticks + 1,
            },
        }
    }

    /// Fair values and refreshed indicators for every valid book
    fn mark(
        &self,
        books: &BTreeMap<ProductId, OrderBookSnapshot>,
        last_known: &BTreeMap<ProductId, Price>,
        stats: &mut StatsTracker,
    ) -> Marks {
        let mut marks = Marks::default();
        for (product, book) in books {
            let estimator = self.estimators.get(product).cloned().unwrap_or_default();
            let Some(fair) = estimator.estimate(book, last_known.get(product).copied()) else {
                debug!("[Engine] {} has no fair value yet", product);
                continue;
            };
            marks.fair_values.insert(product.clone(), fair);
            if let Some(value) = fair.to_f64() {
                marks
                    .indicators
                    .insert(product.clone(), stats.update(product, value));
            }
        }
        marks
    }

    fn dispatch(
        &mut self,
        input: &TickInput,
        books: &BTreeMap<ProductId, OrderBookSnapshot>,
        marks: &Marks,
        stats: &StatsTracker,
        positions: &mut PositionTracker,
    ) -> (BTreeMap<ProductId, Vec<Order>>, Vec<Order>) {
        let products: Vec<ProductId> = self.registry.products().cloned().collect();

        let mut sizer = OrderSizer::new(books);
        let mut orders: BTreeMap<ProductId, Vec<Order>> = BTreeMap::new();
        let mut candidates = Vec::new();

        for product in &products {
            let Some(strategy) = self.registry.get_mut(product) else {
                continue;
            };
            let Some(book) = books.get(product) else {
                strategy.skip_tick(product, &input.market_trades);
                continue;
            };
            let ctx = StrategyContext {
                product,
                book,
                indicators: marks.indicators.get(product).copied(),
                fair_value: marks.fair_values.get(product).copied(),
                positions: &*positions,
                books,
                all_indicators: &marks.indicators,
                fair_values: &marks.fair_values,
                stats,
                market_trades: &input.market_trades,
                observations: &input.observations,
                timestamp: input.timestamp,
            };
            let actions = strategy.decide(&ctx);
            if !actions.is_empty() {
                debug!("[Engine] {} -> {} actions from {}", product, actions.len(), strategy.name());
            }

            for action in actions {
                candidates.extend(action.orders().iter().cloned());
                let accepted = match action {
                    Action::Submit(order) => sizer.clamp(vec![order], positions),
                    Action::AllOrNone(legs) => sizer.clamp_all_or_none(legs, positions),
                };
                for order in accepted {
                    orders.entry(order.product.clone()).or_default().push(order);
                }
            }
        }
        (orders, candidates)
    }
}

/// Books fit to trade on; crossed and empty books are dropped for this tick
fn valid_books(input: &TickInput) -> BTreeMap<ProductId, OrderBookSnapshot> {
    input
        .books
        .iter()
        .filter_map(|(product, book)| match book.validate() {
            Ok(()) => Some((product.clone(), book.clone())),
            Err(e) => {
                warn!("[Engine] skipping {} this tick: {}", product, e);
                None
            }
        })
        .collect()
}
