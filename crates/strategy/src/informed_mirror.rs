//! Informed-Trader Mirroring
//!
//! Follows a counterparty whose trades lead the price. Each of its trades
//! sets the direction and restarts the clock; without a confirming trade the
//! target fades linearly and reaches zero after `decay_ticks`:
//!
//! ```text
//! target = direction * mirror_size * (1 - ticks_since / decay_ticks)
//! ```
//!
//! The product may also be held by other strategies (basket hedges), so the
//! mirror trades its own contribution `held` toward the target instead of
//! the net position. Its takes are sized within capacity and the best level,
//! and are counted as filled.

use crate::strategy::{Action, Strategy, StrategyContext, StrategyState};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tidewater_core::{MarketTrade, Quantity, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InformedMirrorConfig {
    /// Counterparty id as printed on the trade feed
    pub counterparty: String,
    pub mirror_size: Quantity,
    /// Ticks without confirmation until the mirror is fully unwound
    pub decay_ticks: u32,
}

impl Default for InformedMirrorConfig {
    fn default() -> Self {
        Self {
            counterparty: "Olivia".to_string(),
            mirror_size: 10,
            decay_ticks: 20,
        }
    }
}

/// Current signal: direction 1 long, -1 short, 0 none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorState {
    pub direction: i8,
    pub ticks_since: u32,
    /// Part of the position the mirror built itself
    #[serde(default)]
    pub held: Quantity,
}

pub struct InformedMirror {
    config: InformedMirrorConfig,
    state: MirrorState,
}

impl InformedMirror {
    pub fn new(config: InformedMirrorConfig) -> Self {
        Self {
            config,
            state: MirrorState::default(),
        }
    }

    pub fn state(&self) -> MirrorState {
        self.state
    }

    /// Counterparty's side on its last trade in `product` this tick
    fn last_seen<'t>(&self, product: &str, trades: impl Iterator<Item = &'t MarketTrade>) -> Option<Side> {
        trades
            .filter(|t| t.product == product)
            .filter_map(|t| t.side_of(&self.config.counterparty))
            .last()
    }

    /// Advance the signal by one tick given the counterparty's latest side
    fn observe(&mut self, seen: Option<Side>) {
        if let Some(side) = seen {
            self.state.direction = side.sign() as i8;
            self.state.ticks_since = 0;
            return;
        }
        if self.state.direction == 0 {
            return;
        }
        self.state.ticks_since += 1;
        if self.state.ticks_since >= self.config.decay_ticks {
            self.state.direction = 0;
            self.state.ticks_since = 0;
        }
    }

    /// Target position, truncated toward zero
    fn target(&self) -> Quantity {
        if self.state.direction == 0 || self.config.decay_ticks == 0 {
            return 0;
        }
        let remaining = 1.0 - f64::from(self.state.ticks_since) / f64::from(self.config.decay_ticks);
        let target = f64::from(self.state.direction) * self.config.mirror_size as f64 * remaining.max(0.0);
        target.trunc() as Quantity
    }
}

impl Strategy for InformedMirror {
    fn name(&self) -> &str {
        "InformedMirror"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let seen = self.last_seen(ctx.product, ctx.trades());
        let before = self.state;
        self.observe(seen);

        if seen.is_some() {
            info!(
                "[InformedMirror] {} {} traded {:?}, mirroring",
                ctx.product, self.config.counterparty, seen
            );
        } else if before.direction != 0 && self.state.direction == 0 {
            info!(
                "[InformedMirror] {} no confirmation in {} ticks, unwinding",
                ctx.product, self.config.decay_ticks
            );
        }

        let delta = self.target() - self.state.held;
        let Some(side) = Side::of(delta) else {
            return Vec::new();
        };
        let level = match side {
            Side::Buy => ctx.book.best_ask(),
            Side::Sell => ctx.book.best_bid(),
        };
        let visible = level.map(|(_, size)| size).unwrap_or(0);
        let Some(order) = ctx.take(side, delta.abs().min(visible)) else {
            return Vec::new();
        };
        self.state.held += order.quantity;
        vec![Action::Submit(order)]
    }

    fn skip_tick(&mut self, product: &str, market_trades: &[MarketTrade]) {
        let seen = self.last_seen(product, market_trades.iter());
        self.observe(seen);
        debug!(
            "[InformedMirror] {} not tradable, signal clock at {}",
            product, self.state.ticks_since
        );
    }

    fn save_state(&self) -> StrategyState {
        StrategyState::Mirror(self.state)
    }

    fn load_state(&mut self, state: StrategyState) {
        self.state = match state {
            StrategyState::Mirror(state) => state,
            _ => MirrorState::default(),
        };
    }
}
