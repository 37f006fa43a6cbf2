//! Basket Arbitrage
//!
//! Trades a basket against its synthetic replication:
//!
//! ```text
//! spread = basket_fair - sum(weight * component_fair)
//! ```
//!
//! When the (optionally de-meaned) spread clears the hurdle, the basket is
//! sold and the components bought (or the reverse). All legs go out as one
//! all-or-none group sized to the tightest leg, so a leg without room zeroes
//! the trade.
//!
//! ```text
//! hurdle = max(threshold, z_entry * spread_std) * (1 + vol_scale * basket_vol) + cost
//! ```
//!
//! `cost` is the half-spread of crossing every leg and `basket_vol` the
//! basket's annualized log-return volatility.
//!
//! The component hedge is accounted per leg. A group's legs are credited
//! only once the reported basket position confirms the fill; if the basket
//! position and the credited hedge disagree (partial fills, a restart with
//! inventory) each leg is topped up or trimmed on its own at the best level.

use crate::strategy::{Action, Strategy, StrategyContext, StrategyState, to_f64};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tidewater_core::{Order, ProductId, Quantity, Side};
use tidewater_quant::{TRADING_DAYS_PER_YEAR, annualize, population_std};
use tidewater_risk::capacity_share;

/// One component and its units per basket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketLeg {
    pub product: ProductId,
    pub weight: Quantity,
}

impl BasketLeg {
    pub fn new(product: impl Into<ProductId>, weight: Quantity) -> Self {
        Self {
            product: product.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketArbitrageConfig {
    pub components: Vec<BasketLeg>,
    /// Spread beyond costs needed to trade
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Baskets per signal
    #[serde(default = "default_max_units")]
    pub max_units: Quantity,
    /// Spreads remembered for de-meaning; zero trades the raw spread
    #[serde(default)]
    pub spread_window: usize,
    /// Spreads needed before de-meaning applies
    #[serde(default = "default_min_spread_history")]
    pub min_spread_history: usize,
    /// Hurdle floor in spread standard deviations; zero disables
    #[serde(default)]
    pub z_entry: f64,
    /// Hurdle widening per unit of annualized basket volatility
    #[serde(default)]
    pub vol_scale: f64,
    /// Share of the basket's remaining capacity one signal may use
    #[serde(default = "default_capacity_fraction")]
    pub capacity_fraction: f64,
    /// Keep component legs matched to the basket position
    #[serde(default = "default_hedge")]
    pub hedge: bool,
}

fn default_threshold() -> f64 {
    30.0
}

fn default_max_units() -> Quantity {
    5
}

fn default_min_spread_history() -> usize {
    20
}

fn default_capacity_fraction() -> f64 {
    1.0
}

fn default_hedge() -> bool {
    true
}

impl BasketArbitrageConfig {
    pub fn new(components: Vec<BasketLeg>) -> Self {
        Self {
            components,
            threshold: default_threshold(),
            max_units: default_max_units(),
            spread_window: 0,
            min_spread_history: default_min_spread_history(),
            z_entry: 0.0,
            vol_scale: 0.0,
            capacity_fraction: default_capacity_fraction(),
            hedge: default_hedge(),
        }
    }
}

/// A group sent last tick, waiting for the basket position to confirm it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGroup {
    pub basket_before: Quantity,
    /// Signed basket quantity sent
    pub basket_quantity: Quantity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasketState {
    /// Recent raw spreads, oldest first
    pub spreads: VecDeque<f64>,
    /// Component quantity credited to this basket, per leg
    #[serde(default)]
    pub hedge: BTreeMap<ProductId, Quantity>,
    #[serde(default)]
    pub pending: Option<PendingGroup>,
}

pub struct BasketArbitrage {
    config: BasketArbitrageConfig,
    state: BasketState,
}

/// Price and top-of-book size a leg would take at
struct LegQuote {
    product: ProductId,
    side: Side,
    weight: Quantity,
    price: rust_decimal::Decimal,
    size: Quantity,
}

impl BasketArbitrage {
    pub fn new(config: BasketArbitrageConfig) -> Self {
        Self {
            config,
            state: BasketState::default(),
        }
    }

    pub fn spreads(&self) -> &VecDeque<f64> {
        &self.state.spreads
    }

    pub fn state(&self) -> &BasketState {
        &self.state
    }

    /// Credit the legs of last tick's group for the basket quantity that filled
    fn confirm(&mut self, position: Quantity) {
        let Some(pending) = self.state.pending.take() else {
            return;
        };
        let moved = position - pending.basket_before;
        let filled = if pending.basket_quantity > 0 {
            moved.clamp(0, pending.basket_quantity)
        } else {
            moved.clamp(pending.basket_quantity, 0)
        };
        if filled != pending.basket_quantity {
            debug!(
                "[BasketArbitrage] group of {} filled {}",
                pending.basket_quantity, filled
            );
        }
        if filled == 0 {
            return;
        }
        for leg in &self.config.components {
            *self.state.hedge.entry(leg.product.clone()).or_default() -= leg.weight * filled;
        }
    }

    /// Independent leg orders closing the gap to weight * -basket_position
    fn rebalance(&mut self, ctx: &StrategyContext<'_>, position: Quantity) -> Vec<Action> {
        let mut actions = Vec::new();
        for leg in &self.config.components {
            let held = self.state.hedge.get(&leg.product).copied().unwrap_or(0);
            let gap = -leg.weight * position - held;
            let Some(side) = Side::of(gap) else {
                continue;
            };
            let Some(quote) = Self::quote(ctx, &leg.product, side, leg.weight) else {
                continue;
            };
            let capacity = ctx.positions.remaining_capacity(&leg.product, side);
            let quantity = gap.abs().min(quote.size).min(capacity);
            if quantity <= 0 {
                continue;
            }
            info!(
                "[BasketArbitrage] {} hedge {} off by {}, {:?} {}",
                ctx.product, leg.product, gap, side, quantity
            );
            let order = Order::on_side(quote.product, side, quote.price, quantity);
            *self.state.hedge.entry(leg.product.clone()).or_default() += order.quantity;
            actions.push(Action::Submit(order));
        }
        actions
    }

    fn synthetic(&self, ctx: &StrategyContext<'_>) -> Option<f64> {
        self.config.components.iter().try_fold(0.0, |acc, leg| {
            let fair = ctx.fair_value_of(&leg.product).and_then(to_f64)?;
            Some(acc + leg.weight as f64 * fair)
        })
    }

    /// Half of each leg's spread, weighted
    fn crossing_cost(&self, ctx: &StrategyContext<'_>) -> Option<f64> {
        let basket = to_f64(ctx.book.spread()?)? / 2.0;
        self.config.components.iter().try_fold(basket, |acc, leg| {
            let spread = to_f64(ctx.book_of(&leg.product)?.spread()?)?;
            Some(acc + leg.weight as f64 * spread / 2.0)
        })
    }

    fn remember(&mut self, spread: f64) {
        if self.config.spread_window == 0 {
            return;
        }
        while self.state.spreads.len() >= self.config.spread_window {
            self.state.spreads.pop_front();
        }
        self.state.spreads.push_back(spread);
    }

    /// Standard deviation of the spread history once enough has built up
    fn spread_std(&self) -> Option<f64> {
        let history = &self.state.spreads;
        if self.config.spread_window == 0 || history.len() < self.config.min_spread_history {
            return None;
        }
        population_std(history.iter().copied())
    }

    fn hurdle(&self, ctx: &StrategyContext<'_>, cost: f64) -> f64 {
        let floor = self
            .spread_std()
            .map_or(self.config.threshold, |std| {
                self.config.threshold.max(self.config.z_entry * std)
            });
        let vol = ctx
            .indicators
            .and_then(|ind| ind.return_std)
            .map_or(0.0, |std| annualize(std, 1.0, TRADING_DAYS_PER_YEAR));
        floor * (1.0 + self.config.vol_scale * vol) + cost
    }

    fn signal(&self, spread: f64) -> f64 {
        let history = &self.state.spreads;
        if self.config.spread_window == 0
            || history.is_empty()
            || history.len() < self.config.min_spread_history
        {
            return spread;
        }
        spread - history.iter().sum::<f64>() / history.len() as f64
    }

    fn quote(ctx: &StrategyContext<'_>, product: &str, side: Side, weight: Quantity) -> Option<LegQuote> {
        let book = ctx.book_of(product)?;
        let (price, size) = match side {
            Side::Buy => book.best_ask()?,
            Side::Sell => book.best_bid()?,
        };
        Some(LegQuote {
            product: product.to_string(),
            side,
            weight,
            price,
            size,
        })
    }

    /// Baskets every leg can carry: capacity and top-of-book size per weight
    fn units(&self, ctx: &StrategyContext<'_>, legs: &[LegQuote]) -> Quantity {
        legs.iter()
            .map(|leg| {
                let capacity = ctx.positions.remaining_capacity(&leg.product, leg.side);
                capacity.min(leg.size) / leg.weight.max(1)
            })
            .min()
            .unwrap_or(0)
            .min(self.config.max_units)
            .max(0)
    }
}

impl Strategy for BasketArbitrage {
    fn name(&self) -> &str {
        "BasketArbitrage"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let position = ctx.position();
        self.confirm(position);
        let hedges = if self.config.hedge {
            self.rebalance(ctx, position)
        } else {
            Vec::new()
        };

        let (Some(basket), Some(synthetic)) = (ctx.fair_value.and_then(to_f64), self.synthetic(ctx))
        else {
            debug!("[BasketArbitrage] {} missing a leg fair value", ctx.product);
            return hedges;
        };
        let Some(cost) = self.crossing_cost(ctx) else {
            debug!("[BasketArbitrage] {} missing a two-sided leg", ctx.product);
            return hedges;
        };

        let spread = basket - synthetic;
        let signal = self.signal(spread);
        let hurdle = self.hurdle(ctx, cost);
        self.remember(spread);
        if !hedges.is_empty() {
            return hedges;
        }

        let basket_side = if signal > hurdle {
            Side::Sell
        } else if signal < -hurdle {
            Side::Buy
        } else {
            return Vec::new();
        };

        let mut legs = Vec::with_capacity(self.config.components.len() + 1);
        let Some(basket_leg) = Self::quote(ctx, ctx.product, basket_side, 1) else {
            return Vec::new();
        };
        legs.push(basket_leg);
        for component in &self.config.components {
            let Some(leg) = Self::quote(ctx, &component.product, basket_side.opposite(), component.weight)
            else {
                return Vec::new();
            };
            legs.push(leg);
        }

        let share = capacity_share(ctx.capacity(basket_side), self.config.capacity_fraction);
        let units = self.units(ctx, &legs).min(share);
        if units == 0 {
            debug!(
                "[BasketArbitrage] {} signal {:.1} but a leg has no room",
                ctx.product, signal
            );
            return Vec::new();
        }

        info!(
            "[BasketArbitrage] {} {:?} {} units: spread={:.1} signal={:.1} hurdle={:.1}",
            ctx.product, basket_side, units, spread, signal, hurdle
        );
        let orders = legs
            .into_iter()
            .map(|leg| Order::on_side(leg.product, leg.side, leg.price, units * leg.weight))
            .collect();
        self.state.pending = Some(PendingGroup {
            basket_before: position,
            basket_quantity: units * basket_side.sign(),
        });
        vec![Action::AllOrNone(orders)]
    }

    fn save_state(&self) -> StrategyState {
        StrategyState::Basket(self.state.clone())
    }

    fn load_state(&mut self, state: StrategyState) {
        self.state = match state {
            StrategyState::Basket(state) => state,
            _ => BasketState::default(),
        };
    }
}
