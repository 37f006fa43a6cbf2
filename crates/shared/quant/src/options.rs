//! Options Pricing
//!
//! Black-Scholes with a zero risk-free rate, time measured in trading days.
//!
//! Implied volatility is solved by bisection on a fixed bracket with a hard
//! iteration cap, so a solve always terminates and reports `NoConvergence`
//! instead of looping when the market price is out of reach.

use log::trace;
use rust_decimal::prelude::ToPrimitive;
use std::f64::consts::PI;
use thiserror::Error;
use tidewater_core::{OptionKind, OptionSpec};

/// Lower end of the implied volatility search bracket
pub const MIN_VOLATILITY: f64 = 1e-4;
/// Upper end of the implied volatility search bracket
pub const MAX_VOLATILITY: f64 = 5.0;
pub const MAX_ITERATIONS: usize = 100;
/// Price tolerance for the implied volatility solve
pub const PRICE_TOLERANCE: f64 = 1e-6;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Implied volatility did not converge after {iterations} iterations (target {target})")]
    NoConvergence { iterations: usize, target: f64 },

    #[error("Invalid pricing input: {0}")]
    InvalidInput(String),
}

pub type PricingResult<T> = std::result::Result<T, PricingError>;

/// Standard normal CDF (Abramowitz-Stegun 7.1.26 erf approximation)
pub fn norm_cdf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let z = x.abs() / 2.0_f64.sqrt();

    let t = 1.0 / (1.0 + p * z);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-z * z).exp();

    0.5 * (1.0 + sign * y)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-x * x / 2.0).exp() / (2.0 * PI).sqrt()
}

/// Scale a per-tick return stddev to an annual volatility
pub fn annualize(tick_return_std: f64, ticks_per_day: f64, trading_days_per_year: f64) -> f64 {
    tick_return_std * (ticks_per_day.max(0.0) * trading_days_per_year.max(0.0)).sqrt()
}

/// Black-Scholes pricer for European options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionPricer {
    trading_days_per_year: f64,
}

impl Default for OptionPricer {
    fn default() -> Self {
        Self::new(TRADING_DAYS_PER_YEAR)
    }
}

impl OptionPricer {
    pub fn new(trading_days_per_year: f64) -> Self {
        Self {
            trading_days_per_year: if trading_days_per_year > 0.0 {
                trading_days_per_year
            } else {
                TRADING_DAYS_PER_YEAR
            },
        }
    }

    /// Time to expiry in years
    pub fn years(&self, spec: &OptionSpec) -> f64 {
        (spec.time_to_expiry_days / self.trading_days_per_year).max(0.0)
    }

    /// Theoretical premium; intrinsic value at zero time or zero volatility
    pub fn theoretical_value(
        &self,
        spec: &OptionSpec,
        underlying: f64,
        volatility: f64,
    ) -> PricingResult<f64> {
        let strike = strike_of(spec)?;
        check_positive("underlying", underlying)?;
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "volatility must be non-negative, got {volatility}"
            )));
        }

        let t = self.years(spec);
        if t <= 0.0 || volatility <= 0.0 {
            return Ok(intrinsic(spec.kind, underlying, strike));
        }

        let (d1, d2) = d1_d2(underlying, strike, volatility, t);
        let value = match spec.kind {
            OptionKind::Call => underlying * norm_cdf(d1) - strike * norm_cdf(d2),
            OptionKind::Put => strike * norm_cdf(-d2) - underlying * norm_cdf(-d1),
        };
        Ok(value.max(0.0))
    }

    /// Volatility that reproduces `market_price`, by bounded bisection
    pub fn implied_volatility(
        &self,
        spec: &OptionSpec,
        market_price: f64,
        underlying: f64,
    ) -> PricingResult<f64> {
        check_positive("market price", market_price)?;

        let mut lo = MIN_VOLATILITY;
        let mut hi = MAX_VOLATILITY;
        let price_lo = self.theoretical_value(spec, underlying, lo)?;
        let price_hi = self.theoretical_value(spec, underlying, hi)?;

        if market_price < price_lo - PRICE_TOLERANCE || market_price > price_hi + PRICE_TOLERANCE {
            return Err(PricingError::NoConvergence {
                iterations: 0,
                target: market_price,
            });
        }

        for iteration in 1..=MAX_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            let diff = self.theoretical_value(spec, underlying, mid)? - market_price;
            if diff.abs() < PRICE_TOLERANCE {
                trace!("IV converged to {mid:.6} after {iteration} iterations");
                return Ok(mid);
            }
            if diff > 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        Err(PricingError::NoConvergence {
            iterations: MAX_ITERATIONS,
            target: market_price,
        })
    }

    /// dV/dS
    pub fn delta(&self, spec: &OptionSpec, underlying: f64, volatility: f64) -> PricingResult<f64> {
        let strike = strike_of(spec)?;
        check_positive("underlying", underlying)?;
        let t = self.years(spec);
        if t <= 0.0 || volatility <= 0.0 {
            let itm = intrinsic(spec.kind, underlying, strike) > 0.0;
            return Ok(match (spec.kind, itm) {
                (OptionKind::Call, true) => 1.0,
                (OptionKind::Put, true) => -1.0,
                _ => 0.0,
            });
        }
        let (d1, _) = d1_d2(underlying, strike, volatility, t);
        Ok(match spec.kind {
            OptionKind::Call => norm_cdf(d1),
            OptionKind::Put => norm_cdf(d1) - 1.0,
        })
    }

    /// d²V/dS², the same for calls and puts
    pub fn gamma(&self, spec: &OptionSpec, underlying: f64, volatility: f64) -> PricingResult<f64> {
        let strike = strike_of(spec)?;
        check_positive("underlying", underlying)?;
        let t = self.years(spec);
        if t <= 0.0 || volatility <= 0.0 {
            return Ok(0.0);
        }
        let (d1, _) = d1_d2(underlying, strike, volatility, t);
        Ok(norm_pdf(d1) / (underlying * volatility * t.sqrt()))
    }

    /// dV/dσ, per unit of volatility
    pub fn vega(&self, spec: &OptionSpec, underlying: f64, volatility: f64) -> PricingResult<f64> {
        let strike = strike_of(spec)?;
        check_positive("underlying", underlying)?;
        let t = self.years(spec);
        if t <= 0.0 || volatility <= 0.0 {
            return Ok(0.0);
        }
        let (d1, _) = d1_d2(underlying, strike, volatility, t);
        Ok(underlying * norm_pdf(d1) * t.sqrt())
    }
}

fn d1_d2(underlying: f64, strike: f64, volatility: f64, t: f64) -> (f64, f64) {
    let vol_sqrt_t = volatility * t.sqrt();
    let d1 = ((underlying / strike).ln() + 0.5 * volatility * volatility * t) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

fn intrinsic(kind: OptionKind, underlying: f64, strike: f64) -> f64 {
    match kind {
        OptionKind::Call => (underlying - strike).max(0.0),
        OptionKind::Put => (strike - underlying).max(0.0),
    }
}

fn strike_of(spec: &OptionSpec) -> PricingResult<f64> {
    let strike = spec
        .strike
        .to_f64()
        .ok_or_else(|| PricingError::InvalidInput(format!("strike {} out of range", spec.strike)))?;
    check_positive("strike", strike)?;
    Ok(strike)
}

fn check_positive(what: &str, value: f64) -> PricingResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidInput(format!(
            "{what} must be positive, got {value}"
        )))
    }
}
