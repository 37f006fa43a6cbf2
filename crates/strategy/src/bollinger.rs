//! Bollinger Band Mean Reversion
//!
//! Enters against moves outside mean +/- k*stddev and exits once the fair
//! value crosses back through the mean:
//! - fair < mean - k*std: BUY at the best ask
//! - fair > mean + k*std: SELL at the best bid
//! - long and fair >= mean, or short and fair <= mean: flatten
//!
//! The band edge itself does not trigger.

use crate::strategy::{Action, Strategy, StrategyContext, StrategyState};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tidewater_core::{Quantity, Side};
use tidewater_quant::Indicators;

/// Configuration for Bollinger reversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerConfig {
    /// Band half-width in standard deviations
    pub k: f64,
    /// Size per stddev of distance beyond the band
    pub base_size: Quantity,
    /// Cap on a single entry order
    pub max_order: Quantity,
    /// Observations required before entering
    pub min_observations: usize,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            k: 2.0,
            base_size: 10,
            max_order: 50,
            min_observations: 20,
        }
    }
}

/// Open reversion trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandEntry {
    pub side: Side,
    pub price: f64,
}

/// Which side of the band `fair` has left, if any
pub fn band_signal(fair: f64, mean: f64, std_dev: f64, k: f64) -> Option<Side> {
    let width = k * std_dev;
    if fair < mean - width {
        Some(Side::Buy)
    } else if fair > mean + width {
        Some(Side::Sell)
    } else {
        None
    }
}

pub struct BollingerReversion {
    config: BollingerConfig,
    entry: Option<BandEntry>,
}

impl BollingerReversion {
    pub fn new(config: BollingerConfig) -> Self {
        Self {
            config,
            entry: None,
        }
    }

    pub fn entry(&self) -> Option<BandEntry> {
        self.entry
    }

    /// ceil(base_size * distance / std), at least one lot, at most max_order
    fn entry_size(&self, distance: f64, std_dev: f64) -> Quantity {
        let raw = (self.config.base_size as f64 * distance / std_dev).ceil();
        (raw.max(1.0) as Quantity).min(self.config.max_order)
    }

    fn exit(&mut self, ctx: &StrategyContext<'_>, ind: &Indicators) -> Option<Action> {
        let position = ctx.position();
        let held = self
            .entry
            .map(|e| e.side)
            .or_else(|| Side::of(position))?;

        let reverted = match held {
            Side::Buy => ind.last >= ind.mean,
            Side::Sell => ind.last <= ind.mean,
        };
        if !reverted {
            return None;
        }

        self.entry = None;
        if position == 0 {
            return None;
        }
        info!(
            "[Bollinger] {} EXIT: closing {} at fair={:.2} mean={:.2}",
            ctx.product, position, ind.last, ind.mean
        );
        ctx.move_to(0).map(Action::Submit)
    }
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &str {
        "BollingerReversion"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let Some(ind) = ctx.indicators else {
            return Vec::new();
        };

        if let Some(action) = self.exit(ctx, &ind) {
            return vec![action];
        }

        if ind.len < self.config.min_observations {
            return Vec::new();
        }
        let Some(std_dev) = ind.tradable_std() else {
            debug!("[Bollinger] {} stddev undefined, not trading", ctx.product);
            return Vec::new();
        };
        let Some(side) = band_signal(ind.last, ind.mean, std_dev, self.config.k) else {
            return Vec::new();
        };

        let band = self.config.k * std_dev;
        let distance = (ind.last - ind.mean).abs() - band;
        let qty = self.entry_size(distance, std_dev);
        let Some(order) = ctx.take(side, qty) else {
            return Vec::new();
        };

        info!(
            "[Bollinger] {} {:?} signal: fair={:.2} mean={:.2} std={:.2} qty={}",
            ctx.product,
            side,
            ind.last,
            ind.mean,
            std_dev,
            order.abs_quantity()
        );
        self.entry = Some(BandEntry {
            side,
            price: ind.last,
        });
        vec![Action::Submit(order)]
    }

    fn save_state(&self) -> StrategyState {
        match self.entry {
            Some(entry) => StrategyState::Bollinger(entry),
            None => StrategyState::Stateless,
        }
    }

    fn load_state(&mut self, state: StrategyState) {
        self.entry = match state {
            StrategyState::Bollinger(entry) => Some(entry),
            _ => None,
        };
    }
}
