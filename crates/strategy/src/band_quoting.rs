//! Volatility Band Quoting
//!
//! Rests a bid and an ask at `mean -/+ width * std`, rounded to the tick.
//! A quote that lands through the book takes, and the sizer clamps it to
//! the visible size like any other taking order.

use crate::strategy::{Action, Strategy, StrategyContext, round_to_tick};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tidewater_core::{Order, Quantity, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandQuotingConfig {
    /// Distance from the mean in standard deviations
    pub width: f64,
    pub quote_size: Quantity,
    pub tick_size: Decimal,
    pub min_observations: usize,
}

impl Default for BandQuotingConfig {
    fn default() -> Self {
        Self {
            width: 0.8,
            quote_size: 10,
            tick_size: dec!(1),
            min_observations: 15,
        }
    }
}

pub struct BandQuoting {
    config: BandQuotingConfig,
}

impl BandQuoting {
    pub fn new(config: BandQuotingConfig) -> Self {
        Self { config }
    }
}

impl Strategy for BandQuoting {
    fn name(&self) -> &str {
        "BandQuoting"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let Some(ind) = ctx.indicators else {
            return Vec::new();
        };
        if ind.len < self.config.min_observations {
            return Vec::new();
        }
        let Some(std_dev) = ind.tradable_std() else {
            debug!("[BandQuoting] {} stddev undefined, not quoting", ctx.product);
            return Vec::new();
        };

        let offset = self.config.width * std_dev;
        let quotes = [
            (Side::Buy, round_to_tick(ind.mean - offset, self.config.tick_size)),
            (Side::Sell, round_to_tick(ind.mean + offset, self.config.tick_size)),
        ];

        quotes
            .into_iter()
            .filter_map(|(side, price)| {
                let qty = self.config.quote_size.min(ctx.capacity(side));
                (qty > 0).then_some(Order::on_side(ctx.product, side, price?, qty))
            })
            .map(Action::Submit)
            .collect()
    }
}
