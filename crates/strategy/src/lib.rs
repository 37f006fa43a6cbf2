//! Tidewater Strategy Framework
//!
//! Provides the per-product decision logic of the engine:
//! - Strategy trait and the read-only tick context
//! - Nine strategy variants, one per product family
//! - Configuration that selects and parameterizes them
//! - The registry that dispatches each product to its strategy
//!
//! ## Architecture
//!
//! ```text
//!   books, indicators, fair values, trades, observations, positions
//!                               │
//!                               ▼
//!                     ┌───────────────────┐
//!                     │ StrategyRegistry  │  product → Box<dyn Strategy>
//!                     └─────────┬─────────┘
//!                               │ decide(ctx)
//!                               ▼
//!                     ┌───────────────────┐
//!                     │     Strategy      │◄── load_state / save_state
//!                     └─────────┬─────────┘
//!                               │ Actions
//!                               ▼
//!                  Submit(order) / AllOrNone(legs)  ──► OrderSizer
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tidewater_strategy::{BollingerConfig, BollingerReversion, StrategyRegistry};
//!
//! let mut registry = StrategyRegistry::new();
//! registry.register("KELP", Box::new(BollingerReversion::new(BollingerConfig::default())));
//! ```

pub mod band_quoting;
pub mod basket_arbitrage;
pub mod bollinger;
pub mod config;
pub mod extreme_move;
pub mod informed_mirror;
pub mod market_maker;
pub mod momentum_spread;
pub mod option_reversion;
pub mod registry;
pub mod strategy;
pub mod sunlight;

#[cfg(test)]
mod testkit;

// Re-export main types
pub use band_quoting::{BandQuoting, BandQuotingConfig};
pub use basket_arbitrage::{
    BasketArbitrage, BasketArbitrageConfig, BasketLeg, BasketState, PendingGroup,
};
pub use bollinger::{BandEntry, BollingerConfig, BollingerReversion, band_signal};
pub use config::{OptionsConfig, StrategyConfig};
pub use extreme_move::{ExtremeMove, ExtremeMoveConfig, MoveDirection};
pub use informed_mirror::{InformedMirror, InformedMirrorConfig, MirrorState};
pub use market_maker::{MarketMaking, MarketMakingConfig};
pub use momentum_spread::{MomentumSpread, MomentumSpreadConfig, TrendState};
pub use option_reversion::{OptionReversion, OptionReversionConfig, StrikeOverride, VolMemory};
pub use registry::StrategyRegistry;
pub use strategy::{Action, Strategy, StrategyContext, StrategyState};
pub use sunlight::{Regime, SunlightConfig, SunlightRegime, SunlightState};
