//! Option Relative Value
//!
//! Trades a voucher against its Black-Scholes value:
//! 1. Implied volatility of the voucher mid (abstain when the solve fails)
//! 2. Reference volatility: annualized realized vol of the underlying,
//!    or the mean of recently remembered implied vols
//! 3. Mispricing signal = mid - theoretical(reference vol)
//! 4. Outside the dead zone, trade against the signal, sized by its excess
//!    and optionally capped so the position's gamma stays under a budget

use crate::strategy::{Action, Strategy, StrategyContext, StrategyState, to_f64};
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tidewater_core::{OptionSpec, Quantity, Side};
use tidewater_quant::{OptionPricer, annualize};

/// Per-strike replacement of the sizing curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeOverride {
    pub strike: Decimal,
    #[serde(default)]
    pub dead_zone: Option<f64>,
    #[serde(default)]
    pub size_per_unit: Option<f64>,
    #[serde(default)]
    pub max_order: Option<Quantity>,
}

/// Configuration for option reversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionReversionConfig {
    /// Contract terms of the traded voucher
    pub option: OptionSpec,
    /// |signal| at or below this does not trade
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,
    /// Lots per price unit of signal beyond the dead zone
    #[serde(default = "default_size_per_unit")]
    pub size_per_unit: f64,
    #[serde(default = "default_max_order")]
    pub max_order: Quantity,
    /// Implied vols remembered for the fallback reference vol
    #[serde(default = "default_iv_memory")]
    pub iv_memory: usize,
    #[serde(default)]
    pub special_strikes: Vec<StrikeOverride>,
    /// Largest |position * gamma| the strategy will build
    #[serde(default)]
    pub max_gamma_exposure: Option<f64>,
}

fn default_dead_zone() -> f64 {
    2.0
}

fn default_size_per_unit() -> f64 {
    5.0
}

fn default_max_order() -> Quantity {
    30
}

fn default_iv_memory() -> usize {
    50
}

impl OptionReversionConfig {
    pub fn new(option: OptionSpec) -> Self {
        Self {
            option,
            dead_zone: default_dead_zone(),
            size_per_unit: default_size_per_unit(),
            max_order: default_max_order(),
            iv_memory: default_iv_memory(),
            special_strikes: Vec::new(),
            max_gamma_exposure: None,
        }
    }

    /// Sizing curve after applying any override for this strike
    fn curve(&self) -> (f64, f64, Quantity) {
        let special = self
            .special_strikes
            .iter()
            .find(|o| o.strike == self.option.strike);
        match special {
            Some(o) => (
                o.dead_zone.unwrap_or(self.dead_zone),
                o.size_per_unit.unwrap_or(self.size_per_unit),
                o.max_order.unwrap_or(self.max_order),
            ),
            None => (self.dead_zone, self.size_per_unit, self.max_order),
        }
    }
}

/// Recently observed implied vols, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolMemory {
    pub implied_vols: VecDeque<f64>,
}

impl VolMemory {
    fn remember(&mut self, iv: f64, capacity: usize) {
        while self.implied_vols.len() >= capacity.max(1) {
            self.implied_vols.pop_front();
        }
        self.implied_vols.push_back(iv);
    }

    fn mean(&self) -> Option<f64> {
        if self.implied_vols.is_empty() {
            return None;
        }
        Some(self.implied_vols.iter().sum::<f64>() / self.implied_vols.len() as f64)
    }
}

pub struct OptionReversion {
    config: OptionReversionConfig,
    pricer: OptionPricer,
    ticks_per_day: f64,
    trading_days_per_year: f64,
    dead_zone: f64,
    size_per_unit: f64,
    max_order: Quantity,
    memory: VolMemory,
}

impl OptionReversion {
    pub fn new(config: OptionReversionConfig) -> Self {
        let (dead_zone, size_per_unit, max_order) = config.curve();
        Self {
            config,
            pricer: OptionPricer::default(),
            ticks_per_day: 10_000.0,
            trading_days_per_year: 252.0,
            dead_zone,
            size_per_unit,
            max_order,
            memory: VolMemory::default(),
        }
    }

    /// Calendar used to annualize tick returns and measure expiry
    pub fn with_calendar(mut self, ticks_per_day: f64, trading_days_per_year: f64) -> Self {
        self.pricer = OptionPricer::new(trading_days_per_year);
        self.ticks_per_day = ticks_per_day;
        self.trading_days_per_year = trading_days_per_year;
        self
    }

    pub fn memory(&self) -> &VolMemory {
        &self.memory
    }

    /// round(size_per_unit * (|signal| - dead_zone)) in [1, max_order]
    fn size_for(&self, signal: f64) -> Quantity {
        let raw = (self.size_per_unit * (signal.abs() - self.dead_zone)).round();
        (raw.max(1.0) as Quantity).clamp(1, self.max_order.max(1))
    }

    /// Largest quantity on `side` keeping |position * gamma| within budget
    fn gamma_room(&self, position: Quantity, side: Side, gamma: f64) -> Option<Quantity> {
        let budget = self.config.max_gamma_exposure?;
        if gamma <= 0.0 {
            return None;
        }
        let max_position = (budget / gamma).floor().max(0.0) as Quantity;
        Some((max_position - side.sign() * position).max(0))
    }

    fn reference_vol(&self, ctx: &StrategyContext<'_>) -> Option<f64> {
        let realized = ctx
            .indicators_of(&self.config.option.underlying)
            .and_then(|ind| ind.return_std)
            .map(|std| annualize(std, self.ticks_per_day, self.trading_days_per_year))
            .filter(|vol| *vol > 0.0);
        realized.or_else(|| self.memory.mean())
    }
}

impl Strategy for OptionReversion {
    fn name(&self) -> &str {
        "OptionReversion"
    }

    fn decide(&mut self, ctx: &StrategyContext<'_>) -> Vec<Action> {
        let spec = &self.config.option;
        if spec.is_expired() {
            debug!("[OptionReversion] {} {} is expired", ctx.product, spec);
            return Vec::new();
        }
        let Some(mid_price) = ctx.book.mid_price() else {
            return Vec::new();
        };
        let Some(mid) = to_f64(mid_price) else {
            return Vec::new();
        };
        let underlying_fair = ctx.fair_value_of(&spec.underlying);
        if let Some(fair) = underlying_fair.filter(|fair| mid_price < spec.intrinsic_value(*fair)) {
            debug!(
                "[OptionReversion] {} mid {} below intrinsic at {} {}, abstaining",
                ctx.product, mid_price, spec.underlying, fair
            );
            return Vec::new();
        }
        let underlying = underlying_fair
            .and_then(to_f64)
            .or_else(|| ctx.indicators_of(&spec.underlying).map(|ind| ind.last));
        let Some(underlying) = underlying else {
            debug!(
                "[OptionReversion] {} has no {} price, abstaining",
                ctx.product, spec.underlying
            );
            return Vec::new();
        };

        let iv = match self.pricer.implied_volatility(spec, mid, underlying) {
            Ok(iv) => iv,
            Err(e) => {
                debug!("[OptionReversion] {} abstaining: {}", ctx.product, e);
                return Vec::new();
            }
        };
        self.memory.remember(iv, self.config.iv_memory);

        let Some(vol) = self.reference_vol(ctx) else {
            return Vec::new();
        };
        let theo = match self.pricer.theoretical_value(spec, underlying, vol) {
            Ok(theo) => theo,
            Err(e) => {
                debug!("[OptionReversion] {} abstaining: {}", ctx.product, e);
                return Vec::new();
            }
        };

        let signal = mid - theo;
        if signal.abs() <= self.dead_zone {
            return Vec::new();
        }

        // Rich voucher is sold, cheap voucher bought
        let side = if signal > 0.0 { Side::Sell } else { Side::Buy };
        let mut qty = self.size_for(signal);
        let (delta, gamma) = match (
            self.pricer.delta(spec, underlying, vol),
            self.pricer.gamma(spec, underlying, vol),
        ) {
            (Ok(delta), Ok(gamma)) => (delta, gamma),
            _ => (0.0, 0.0),
        };
        if let Some(room) = self.gamma_room(ctx.position(), side, gamma) {
            if room < qty {
                debug!(
                    "[OptionReversion] {} gamma {:.6} limits {} to {}",
                    ctx.product, gamma, qty, room
                );
            }
            qty = qty.min(room);
        }
        let Some(order) = ctx.take(side, qty) else {
            return Vec::new();
        };

        info!(
            "[OptionReversion] {} {:?}: mid={:.2} theo={:.2} iv={:.4} ref_vol={:.4} delta={:.3} gamma={:.6} qty={}",
            ctx.product,
            side,
            mid,
            theo,
            iv,
            vol,
            delta,
            gamma,
            order.abs_quantity()
        );
        vec![Action::Submit(order)]
    }

    fn save_state(&self) -> StrategyState {
        StrategyState::OptionReversion(self.memory.clone())
    }

    fn load_state(&mut self, state: StrategyState) {
        let StrategyState::OptionReversion(mut memory) = state else {
            self.memory = VolMemory::default();
            return;
        };
        while memory.implied_vols.len() > self.config.iv_memory.max(1) {
            memory.implied_vols.pop_front();
        }
        self.memory = memory;
    }
}
