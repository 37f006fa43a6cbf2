//! Strategy selection by configuration
//!
//! Each product names one strategy kind and its parameters:
//!
//! ```json
//! { "kind": "bollinger_reversion", "k": 1.2, "base_size": 10 }
//! ```

use crate::band_quoting::{BandQuoting, BandQuotingConfig};
use crate::basket_arbitrage::{BasketArbitrage, BasketArbitrageConfig};
use crate::bollinger::{BollingerConfig, BollingerReversion};
use crate::extreme_move::{ExtremeMove, ExtremeMoveConfig};
use crate::informed_mirror::{InformedMirror, InformedMirrorConfig};
use crate::market_maker::{MarketMaking, MarketMakingConfig};
use crate::momentum_spread::{MomentumSpread, MomentumSpreadConfig};
use crate::option_reversion::{OptionReversion, OptionReversionConfig};
use crate::strategy::Strategy;
use crate::sunlight::{SunlightConfig, SunlightRegime};
use serde::{Deserialize, Serialize};

/// Calendar used to annualize tick volatility and age vouchers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub ticks_per_day: f64,
    pub trading_days_per_year: f64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            ticks_per_day: 10_000.0,
            trading_days_per_year: 252.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    MarketMaking(MarketMakingConfig),
    BollingerReversion(BollingerConfig),
    OptionReversion(OptionReversionConfig),
    ExtremeMove(ExtremeMoveConfig),
    BasketArbitrage(BasketArbitrageConfig),
    MomentumSpread(MomentumSpreadConfig),
    InformedMirror(InformedMirrorConfig),
    SunlightRegime(SunlightConfig),
    BandQuoting(BandQuotingConfig),
}

impl StrategyConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyConfig::MarketMaking(_) => "market_making",
            StrategyConfig::BollingerReversion(_) => "bollinger_reversion",
            StrategyConfig::OptionReversion(_) => "option_reversion",
            StrategyConfig::ExtremeMove(_) => "extreme_move",
            StrategyConfig::BasketArbitrage(_) => "basket_arbitrage",
            StrategyConfig::MomentumSpread(_) => "momentum_spread",
            StrategyConfig::InformedMirror(_) => "informed_mirror",
            StrategyConfig::SunlightRegime(_) => "sunlight_regime",
            StrategyConfig::BandQuoting(_) => "band_quoting",
        }
    }

    /// Products besides its own whose data the strategy reads
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            StrategyConfig::OptionReversion(c) => vec![c.option.underlying.as_str()],
            StrategyConfig::BasketArbitrage(c) => {
                c.components.iter().map(|leg| leg.product.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn build(&self, options: &OptionsConfig) -> Box<dyn Strategy> {
        match self {
            StrategyConfig::MarketMaking(c) => Box::new(MarketMaking::new(c.clone())),
            StrategyConfig::BollingerReversion(c) => Box::new(BollingerReversion::new(c.clone())),
            StrategyConfig::OptionReversion(c) => Box::new(
                OptionReversion::new(c.clone())
                    .with_calendar(options.ticks_per_day, options.trading_days_per_year),
            ),
            StrategyConfig::ExtremeMove(c) => Box::new(ExtremeMove::new(c.clone())),
            StrategyConfig::BasketArbitrage(c) => Box::new(BasketArbitrage::new(c.clone())),
            StrategyConfig::MomentumSpread(c) => Box::new(MomentumSpread::new(c.clone())),
            StrategyConfig::InformedMirror(c) => Box::new(InformedMirror::new(c.clone())),
            StrategyConfig::SunlightRegime(c) => Box::new(SunlightRegime::new(c.clone())),
            StrategyConfig::BandQuoting(c) => Box::new(BandQuoting::new(c.clone())),
        }
    }
}
