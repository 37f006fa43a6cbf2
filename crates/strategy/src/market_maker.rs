//! Wall-Anchored Market Maker
//!
//! A market making strategy for a product with a stable fair value that:
//! - Takes every resting ask at or below fair - take_width
//! - Takes every resting bid at or above fair + take_width
//! - Quotes a small ladder around fair +/- edge with what capacity is left
//! - Never quotes a price that would cross the book
//!
//! Taking is emitted before quoting so it consumes capacity first.

use crate::strategy::{Action, Strategy, StrategyContext, crosses};
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tidewater_core::{Order, Price, Quantity, Side};

/// Configuration for the market maker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMakingConfig {
    /// Distance from fair at which resting orders are taken
    pub take_width: Decimal,
    /// Distance from fair of the innermost quote
    pub edge: Decimal,
    /// Quote size per level
    pub quote_size: Quantity,
    /// Number of quote levels per side, one tick apart
    pub quote_levels: u32,
    /// Minimum tick size for price rounding
    pub tick_size: Decimal,
    /// Used when the book yields no fair value yet
    pub fallback_fair_value: Option<Price>,
}

impl Default for MarketMakingConfig {
    fn default() -> Self {
        Self {
            take_width: dec!(1),   // take anything strictly through fair
            edge: dec!(2),         // quote fair +/- 2
            quote_size: 10,        // 10 lots per level
            quote_levels: 3,       // fair +/- 2, 3, 4
            tick_size: dec!(1),    // integer prices
            fallback_fair_value: Some(dec!(10000)),
        }
    }
}

/// Market maker around a wall-anchored fair value
pub struct MarketMaking {
    config: MarketMakingConfig,
}

impl MarketMaking {
    pub fn new(config: MarketMakingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarketMakingConfig {
        &self.config
    }

    /// Taking orders against mispriced resting levels
    fn take_orders(&self, ctx: &StrategyContext<'_>, fair: Price) -> (Vec<Order>, Quantity, Quantity) {
        let mut orders = Vec::new();
        let mut buy_room = ctx.capacity(Side::Buy);
        let mut sell_room = ctx.capacity(Side::Sell);

        for (price, quantity) in ctx.book.ask_levels() {
            if price > fair - self.config.take_width || buy_room == 0 {
                break;
            }
            let qty = quantity.min(buy_room);
            buy_room -= qty;
            orders.push(Order::buy(ctx.product, price, qty));
        }

        for (price, quantity) in ctx.book.bid_levels() {
            if price < fair + self.config.take_width || sell_room == 0 {
                break;
            }
            let qty = quantity.min(sell_room);
            sell_room -= qty;
            orders.push(Order::sell(ctx.product, price, qty));
        }

        (orders, buy_room, sell_room)
    }

    /// Passive ladder on both sides with the remaining room
    fn quote_orders(
        &self,
        ctx: &StrategyContext<'_>,
        fair: Price,
        mut buy_room: Quantity,
        mut sell_room: Quantity,
    ) -> Vec<Order> {
        let mut orders = Vec::new();
        for level in 0..self.config.quote_levels {
            let offset = self.config.edge + self.config.tick_size * Decimal::from(level);
            let bid = fair - offset;
            let ask = fair + offset;

            if buy_room > 0 && !crosses(ctx.book, Side::Buy, bid) {
                let qty = self.config.quote_size.min(buy_room);
                buy_room -= qty;
                orders.push(Order::buy(ctx.product, bid, qty));
            }
            if sell_room > 0 && !crosses(ctx.book, Side::Sell, ask) {
                let qty = self.config.quote_size.min(sell_room);
                sell_room -= qty;
                orders.push(Order::sell(ctx.product, ask, qty));
            }
        }
        orders
    }
}

impl Strategy for MarketMaking {
    fn name(&self) -> &str {
        "MarketMaking"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let Some(fair) = ctx.fair_value.or(self.config.fallback_fair_value) else {
            debug!("[MarketMaking] {} has no fair value, skipping", ctx.product);
            return Vec::new();
        };
        let tick = self.config.tick_size;
        let fair = if tick > Decimal::ZERO {
            (fair / tick).round() * tick
        } else {
            fair
        };

        let (mut orders, buy_room, sell_room) = self.take_orders(ctx, fair);
        let taken = orders.len();
        orders.extend(self.quote_orders(ctx, fair, buy_room, sell_room));

        if !orders.is_empty() {
            info!(
                "[MarketMaking] {} fair={} pos={} took={} quotes={}",
                ctx.product,
                fair,
                ctx.position(),
                taken,
                orders.len() - taken
            );
        }

        orders.into_iter().map(Action::Submit).collect()
    }
}
