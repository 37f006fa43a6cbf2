//! Tidewater Quant
//!
//! Numeric building blocks shared by every strategy:
//!
//! ```text
//! OrderBookSnapshot ──► FairValueEstimator ──► StatsTracker ──► Indicators
//!                                                   │
//!                                                   └──► OptionPricer (realized vol)
//! ```
//!
//! Prices cross the boundary as `Decimal`; statistics and option math run in `f64`.

pub mod fair_value;
pub mod options;
pub mod rolling;

pub use fair_value::{FairValueEstimator, FairValuePolicy, weighted_mid};
pub use options::{
    OptionPricer, PricingError, PricingResult, TRADING_DAYS_PER_YEAR, annualize, norm_cdf,
    norm_pdf,
};
pub use rolling::{Indicators, PriceHistory, StatsTracker, population_std};
