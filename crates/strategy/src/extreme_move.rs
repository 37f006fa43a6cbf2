//! Extreme Move Detection
//!
//! Compares the move over a short horizon with the rolling stddev and trades
//! only when it exceeds `vol_multiplier` standard deviations. The trigger
//! scales with volatility, so quiet and noisy regimes get the same treatment.

use crate::strategy::{Action, Strategy, StrategyContext};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tidewater_core::{Quantity, Side};

/// Which way to trade an extreme move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// Fade the move
    #[default]
    Contrarian,
    /// Follow the move
    Momentum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremeMoveConfig {
    /// Ticks back the return is measured over
    pub horizon: usize,
    pub vol_multiplier: f64,
    pub direction: MoveDirection,
    /// Cap on a single order; the best level's size also caps it
    pub max_order: Quantity,
    pub min_observations: usize,
}

impl Default for ExtremeMoveConfig {
    fn default() -> Self {
        Self {
            horizon: 5,
            vol_multiplier: 2.0,
            direction: MoveDirection::Contrarian,
            max_order: 50,
            min_observations: 50,
        }
    }
}

pub struct ExtremeMove {
    config: ExtremeMoveConfig,
}

impl ExtremeMove {
    pub fn new(config: ExtremeMoveConfig) -> Self {
        Self { config }
    }

    /// Side to trade for a move of `ret` against threshold `threshold`
    fn side_for(&self, ret: f64, threshold: f64) -> Option<Side> {
        if ret.abs() <= threshold {
            return None;
        }
        let with_move = if ret > 0.0 { Side::Buy } else { Side::Sell };
        Some(match self.config.direction {
            MoveDirection::Momentum => with_move,
            MoveDirection::Contrarian => with_move.opposite(),
        })
    }
}

impl Strategy for ExtremeMove {
    fn name(&self) -> &str {
        "ExtremeMove"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let Some(ind) = ctx.indicators else {
            return Vec::new();
        };
        if ind.len < self.config.min_observations {
            return Vec::new();
        }
        let Some(std_dev) = ind.tradable_std() else {
            return Vec::new();
        };
        let Some(past) = ctx.history().and_then(|h| h.value_back(self.config.horizon)) else {
            return Vec::new();
        };

        let ret = ind.last - past;
        let threshold = self.config.vol_multiplier * std_dev;
        let Some(side) = self.side_for(ret, threshold) else {
            return Vec::new();
        };

        let level = match side {
            Side::Buy => ctx.book.best_ask(),
            Side::Sell => ctx.book.best_bid(),
        };
        let Some((_, level_qty)) = level else {
            debug!("[ExtremeMove] {} no level to take", ctx.product);
            return Vec::new();
        };
        let Some(order) = ctx.take(side, level_qty.min(self.config.max_order)) else {
            return Vec::new();
        };

        info!(
            "[ExtremeMove] {} {:?}: return={:.2} threshold={:.2} qty={}",
            ctx.product,
            side,
            ret,
            threshold,
            order.abs_quantity()
        );
        vec![Action::Submit(order)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{Fixture, orders};
    use rust_decimal_macros::dec;
    use tidewater_core::Order;

    /// Flat series with alternating noise, then a jump of `jump`
    fn series(jump: f64) -> Vec<f64> {
        let mut values: Vec<f64> = (0..59)
            .map(|i| if i % 2 == 0 { 1999.0 } else { 2001.0 })
            .collect();
        values.push(2000.0 + jump);
        values
    }

    fn squid(jump: f64) -> Fixture {
        Fixture::new()
            .window("SQUID_INK", 50)
            .limit("SQUID_INK", 50)
            .book("SQUID_INK", &[(2010, 7)], &[(2012, 9)])
            .history("SQUID_INK", &series(jump))
    }

    #[test]
    fn test_contrarian_sells_spike() {
        let fixture = squid(15.0);
        let mut strategy = ExtremeMove::new(ExtremeMoveConfig::default());

        let orders = orders(&strategy.decide(&fixture.ctx("SQUID_INK")));
        assert_eq!(orders, vec![Order::sell("SQUID_INK", dec!(2010), 7)]);
    }

    #[test]
    fn test_momentum_follows_spike() {
        let fixture = squid(15.0);
        let mut strategy = ExtremeMove::new(ExtremeMoveConfig {
            direction: MoveDirection::Momentum,
            ..Default::default()
        });

        let orders = orders(&strategy.decide(&fixture.ctx("SQUID_INK")));
        assert_eq!(orders, vec![Order::buy("SQUID_INK", dec!(2012), 9)]);
    }

    #[test]
    fn test_ordinary_move_ignored() {
        let fixture = squid(1.0);
        let mut strategy = ExtremeMove::new(ExtremeMoveConfig::default());
        assert!(strategy.decide(&fixture.ctx("SQUID_INK")).is_empty());
    }

    #[test]
    fn test_waits_for_history() {
        let fixture = Fixture::new()
            .limit("SQUID_INK", 50)
            .book("SQUID_INK", &[(2010, 7)], &[(2012, 9)])
            .history("SQUID_INK", &[2000.0, 2001.0, 2030.0]);
        let mut strategy = ExtremeMove::new(ExtremeMoveConfig::default());
        assert!(strategy.decide(&fixture.ctx("SQUID_INK")).is_empty());
    }
}
