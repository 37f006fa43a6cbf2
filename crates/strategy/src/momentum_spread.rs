//! Momentum & Spread Adjustment
//!
//! Market making with a directional lean:
//!
//! ```text
//!  trend      = sign(MA(short) - MA(long)), held when they tie
//!  fair       = fair_value + trend * |momentum| * momentum_weight
//!  half       = base_half_spread + vol_multiplier * std
//!  size       = floor(max_size / (1 + size_damping * std))
//!
//!  bearish:  bid = fair - 1.2 * half    ask = fair + 0.8 * half
//!  bullish:  bid = fair - 0.8 * half    ask = fair + 1.2 * half
//! ```
//!
//! Quotes widen and shrink as realized volatility rises.

use crate::strategy::{Action, Strategy, StrategyContext, StrategyState, crosses, round_for_side, to_f64};
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tidewater_core::{Order, Quantity, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumSpreadConfig {
    pub short_window: usize,
    pub long_window: usize,
    /// Half-spread at zero volatility
    pub base_half_spread: f64,
    /// Half-spread added per stddev
    pub vol_multiplier: f64,
    /// Fraction of |momentum| the fair value leans with the trend
    pub momentum_weight: f64,
    pub max_size: Quantity,
    pub size_damping: f64,
    /// Half-spread multiplier on the side leaning against the trend
    pub skew: f64,
    pub tick_size: Decimal,
}

impl Default for MomentumSpreadConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            base_half_spread: 1.0,
            vol_multiplier: 2.0,
            momentum_weight: 0.5,
            max_size: 20,
            size_damping: 0.5,
            skew: 1.2,
            tick_size: dec!(1),
        }
    }
}

/// Last crossover direction: 1 bullish, -1 bearish, 0 none yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendState {
    pub trend: i8,
}

pub struct MomentumSpread {
    config: MomentumSpreadConfig,
    state: TrendState,
}

impl MomentumSpread {
    pub fn new(config: MomentumSpreadConfig) -> Self {
        Self {
            config,
            state: TrendState::default(),
        }
    }

    pub fn trend(&self) -> i8 {
        self.state.trend
    }

    /// (bid, ask) multipliers on the half-spread
    fn skew(&self) -> (f64, f64) {
        let lean = self.config.skew;
        let other = (2.0 - lean).max(0.0);
        match self.state.trend {
            t if t < 0 => (lean, other),
            t if t > 0 => (other, lean),
            _ => (1.0, 1.0),
        }
    }

    fn size(&self, std_dev: f64) -> Quantity {
        (self.config.max_size as f64 / (1.0 + self.config.size_damping * std_dev)).floor() as Quantity
    }

    fn quote(ctx: &StrategyContext<'_>, side: Side, price: Decimal, size: Quantity) -> Option<Order> {
        if crosses(ctx.book, side, price) {
            debug!("[MomentumSpread] {} {:?} quote {} would cross", ctx.product, side, price);
            return None;
        }
        let qty = size.min(ctx.capacity(side));
        (qty > 0).then(|| Order::on_side(ctx.product, side, price, qty))
    }
}

impl Strategy for MomentumSpread {
    fn name(&self) -> &str {
        "MomentumSpread"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let (Some(ind), Some(fair)) = (ctx.indicators, ctx.fair_value.and_then(to_f64)) else {
            return Vec::new();
        };
        let Some(history) = ctx.history() else {
            return Vec::new();
        };
        let (Some(short), Some(long)) = (
            history.mean_of_last(self.config.short_window),
            history.mean_of_last(self.config.long_window),
        ) else {
            return Vec::new();
        };

        if short > long {
            self.state.trend = 1;
        } else if short < long {
            self.state.trend = -1;
        }

        let Some(std_dev) = ind.tradable_std() else {
            debug!("[MomentumSpread] {} stddev undefined, not quoting", ctx.product);
            return Vec::new();
        };

        let lean = f64::from(self.state.trend) * ind.momentum.abs() * self.config.momentum_weight;
        let center = fair + lean;
        let half = self.config.base_half_spread + self.config.vol_multiplier * std_dev;
        let (bid_mult, ask_mult) = self.skew();
        let size = self.size(std_dev);
        if size <= 0 {
            return Vec::new();
        }

        let tick = self.config.tick_size;
        let bid = round_for_side(center - half * bid_mult, tick, Side::Buy);
        let ask = round_for_side(center + half * ask_mult, tick, Side::Sell);

        let mut actions = Vec::with_capacity(2);
        if let Some(order) = bid.and_then(|p| Self::quote(ctx, Side::Buy, p, size)) {
            actions.push(Action::Submit(order));
        }
        if let Some(order) = ask.and_then(|p| Self::quote(ctx, Side::Sell, p, size)) {
            actions.push(Action::Submit(order));
        }

        info!(
            "[MomentumSpread] {} trend={} center={:.2} half={:.2} size={} orders={}",
            ctx.product,
            self.state.trend,
            center,
            half,
            size,
            actions.len()
        );
        actions
    }

    fn save_state(&self) -> StrategyState {
        StrategyState::Momentum(self.state)
    }

    fn load_state(&mut self, state: StrategyState) {
        self.state = match state {
            StrategyState::Momentum(state) => state,
            _ => TrendState::default(),
        };
    }
}
