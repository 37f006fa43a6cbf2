//! Sunlight-Driven Regime
//!
//! Trades on the auxiliary sunlight index rather than the book:
//!
//! ```text
//!   index > threshold and rising    →  Long
//!   index < threshold and falling   →  Short
//!   otherwise                       →  hold the regime
//! ```
//!
//! "Rising" and "falling" are the gradient of the index smoothed over
//! `smoothing` ticks. Take-profit and stop-loss offsets from the entry
//! price force the regime to Flat whatever the index says, and that
//! direction stays locked out until an observed index signal differs.
//! Position changes sweep the book level by level.

use crate::strategy::{Action, Strategy, StrategyContext, StrategyState, to_f64};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tidewater_core::Quantity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunlightConfig {
    pub sunlight_threshold: f64,
    /// Ticks the index is averaged over
    pub smoothing: usize,
    /// Minimum |gradient| that counts as a trend
    pub gradient_threshold: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub target_size: Quantity,
}

impl Default for SunlightConfig {
    fn default() -> Self {
        Self {
            sunlight_threshold: 50.0,
            smoothing: 10,
            gradient_threshold: 0.01,
            take_profit: 20.0,
            stop_loss: 15.0,
            target_size: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    #[default]
    Flat,
    Long,
    Short,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SunlightState {
    /// Recent index readings, oldest first
    pub indices: VecDeque<f64>,
    pub regime: Regime,
    pub entry_price: Option<f64>,
    /// Direction barred after a forced exit
    pub locked: Option<Regime>,
}

pub struct SunlightRegime {
    config: SunlightConfig,
    state: SunlightState,
}

impl SunlightRegime {
    pub fn new(config: SunlightConfig) -> Self {
        Self {
            config,
            state: SunlightState::default(),
        }
    }

    pub fn state(&self) -> &SunlightState {
        &self.state
    }

    fn record(&mut self, index: f64) {
        let capacity = self.config.smoothing.max(1) + 1;
        while self.state.indices.len() >= capacity {
            self.state.indices.pop_front();
        }
        self.state.indices.push_back(index);
    }

    /// Change of the smoothed index over the last tick
    fn gradient(&self) -> Option<f64> {
        let n = self.config.smoothing.max(1);
        let indices = &self.state.indices;
        if indices.len() < n + 1 {
            return None;
        }
        let newest = indices.back()?;
        let dropped = indices.get(indices.len() - n - 1)?;
        Some((newest - dropped) / n as f64)
    }

    fn signal(&self, index: f64) -> Option<Regime> {
        let gradient = self.gradient()?;
        let threshold = self.config.sunlight_threshold;
        if index > threshold && gradient > self.config.gradient_threshold {
            Some(Regime::Long)
        } else if index < threshold && gradient < -self.config.gradient_threshold {
            Some(Regime::Short)
        } else {
            None
        }
    }

    /// Take-profit or stop-loss hit for the open regime
    fn exit_hit(&self, price: f64) -> bool {
        let Some(entry) = self.state.entry_price else {
            return false;
        };
        match self.state.regime {
            Regime::Long => {
                price >= entry + self.config.take_profit || price <= entry - self.config.stop_loss
            }
            Regime::Short => {
                price <= entry - self.config.take_profit || price >= entry + self.config.stop_loss
            }
            Regime::Flat => false,
        }
    }

    fn target(&self) -> Quantity {
        match self.state.regime {
            Regime::Long => self.config.target_size,
            Regime::Short => -self.config.target_size,
            Regime::Flat => 0,
        }
    }
}

impl Strategy for SunlightRegime {
    fn name(&self) -> &str {
        "SunlightRegime"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let price = ctx
            .fair_value
            .or_else(|| ctx.book.mid_price())
            .and_then(to_f64);

        let signal = match ctx.observation().and_then(|o| o.sunlight_index) {
            Some(index) => {
                self.record(index);
                let signal = self.signal(index);
                if self.state.locked.is_some() && self.state.locked != signal {
                    self.state.locked = None;
                }
                signal
            }
            None => {
                debug!("[Sunlight] {} no sunlight reading", ctx.product);
                None
            }
        };

        if let Some(price) = price {
            if self.exit_hit(price) {
                info!(
                    "[Sunlight] {} forced exit of {:?} at {:.1} (entry {:?})",
                    ctx.product, self.state.regime, price, self.state.entry_price
                );
                self.state.locked = Some(self.state.regime);
                self.state.regime = Regime::Flat;
                self.state.entry_price = None;
            } else if let Some(next) = signal
                .filter(|next| *next != self.state.regime && self.state.locked != Some(*next))
            {
                info!(
                    "[Sunlight] {} regime {:?} -> {:?} at {:.1}",
                    ctx.product, self.state.regime, next, price
                );
                self.state.regime = next;
                self.state.entry_price = Some(price);
            }
        }

        ctx.sweep_to(self.target())
            .into_iter()
            .map(Action::Submit)
            .collect()
    }

    fn save_state(&self) -> StrategyState {
        StrategyState::Sunlight(self.state.clone())
    }

    fn load_state(&mut self, state: StrategyState) {
        self.state = match state {
            StrategyState::Sunlight(state) => state,
            _ => SunlightState::default(),
        };
    }
}
