//! Rolling statistics over bounded per-product fair value histories

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tidewater_core::ProductId;

/// Window used for products without an explicit one
pub const DEFAULT_WINDOW: usize = 20;

/// Bounded ring buffer of fair value observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// Values in the window, oldest first
    values: VecDeque<f64>,
    /// Window size
    capacity: usize,
}

impl PriceHistory {
    /// Create a new history holding at most `capacity` values
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a value, evicting the oldest when full
    #[inline]
    pub fn push(&mut self, value: f64) {
        while self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Change the window size, dropping the oldest values if it shrinks
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Value `n` observations before the latest (0 is the latest)
    pub fn value_back(&self, n: usize) -> Option<f64> {
        let len = self.values.len();
        if n >= len {
            return None;
        }
        self.values.get(len - 1 - n).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Get current mean
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Mean of the latest `n` values; None until `n` values exist
    pub fn mean_of_last(&self, n: usize) -> Option<f64> {
        if n == 0 || self.values.len() < n {
            return None;
        }
        Some(self.values.iter().rev().take(n).sum::<f64>() / n as f64)
    }

    /// Population standard deviation; None below two observations
    pub fn std_dev(&self) -> Option<f64> {
        population_std(self.values.iter().copied())
    }

    /// Population standard deviation of consecutive log returns
    ///
    /// Needs at least three observations and strictly positive values.
    pub fn log_return_std(&self) -> Option<f64> {
        if self.values.len() < 3 || self.values.iter().any(|v| *v <= 0.0) {
            return None;
        }
        let returns = self
            .values
            .iter()
            .zip(self.values.iter().skip(1))
            .map(|(prev, next)| (next / prev).ln());
        population_std(returns)
    }

    /// Indicators over the current window, None while empty
    pub fn indicators(&self) -> Option<Indicators> {
        let last = self.last()?;
        let mean = self.mean()?;
        Some(Indicators {
            last,
            mean,
            std_dev: self.std_dev(),
            momentum: last - mean,
            return_std: self.log_return_std(),
            len: self.values.len(),
        })
    }
}

/// Population standard deviation, None for fewer than two values
pub fn population_std(values: impl Iterator<Item = f64> + Clone) -> Option<f64> {
    let n = values.clone().count();
    if n < 2 {
        return None;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values.map(|x| (x - mean) * (x - mean)).sum::<f64>() / n as f64;
    Some(variance.sqrt())
}

/// Summary of a product's window after the latest update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    /// Latest fair value
    pub last: f64,
    pub mean: f64,
    /// None while fewer than two observations exist; treat as "do not trade"
    pub std_dev: Option<f64>,
    /// last - mean
    pub momentum: f64,
    /// Tick-level stddev of log returns, None below three observations
    pub return_std: Option<f64>,
    /// Observations in the window
    pub len: usize,
}

impl Indicators {
    /// Standard deviation if it is defined and strictly positive
    pub fn tradable_std(&self) -> Option<f64> {
        self.std_dev.filter(|s| *s > f64::EPSILON)
    }

    /// (value - mean) / std, None when std is undefined or zero
    pub fn z_score(&self, value: f64) -> Option<f64> {
        self.tradable_std().map(|std| (value - self.mean) / std)
    }
}

/// Per-product rolling histories
///
/// Part of the persisted engine state, so it serializes whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsTracker {
    histories: BTreeMap<ProductId, PriceHistory>,
    windows: BTreeMap<ProductId, usize>,
    default_window: usize,
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl StatsTracker {
    pub fn new(default_window: usize) -> Self {
        Self {
            histories: BTreeMap::new(),
            windows: BTreeMap::new(),
            default_window: default_window.max(1),
        }
    }

    /// Set a product's window, resizing any existing history
    pub fn set_window(&mut self, product: &str, window: usize) {
        let window = window.max(1);
        self.windows.insert(product.to_string(), window);
        if let Some(history) = self.histories.get_mut(product) {
            if history.capacity() != window {
                history.resize(window);
            }
        }
    }

    pub fn window(&self, product: &str) -> usize {
        self.windows
            .get(product)
            .copied()
            .unwrap_or(self.default_window)
    }

    /// Append a fair value observation and return the refreshed indicators
    pub fn update(&mut self, product: &str, fair_value: f64) -> Indicators {
        let window = self.window(product);
        let history = self
            .histories
            .entry(product.to_string())
            .or_insert_with(|| PriceHistory::new(window));
        history.push(fair_value);

        let mean = history.mean().unwrap_or(fair_value);
        Indicators {
            last: fair_value,
            mean,
            std_dev: history.std_dev(),
            momentum: fair_value - mean,
            return_std: history.log_return_std(),
            len: history.len(),
        }
    }

    pub fn history(&self, product: &str) -> Option<&PriceHistory> {
        self.histories.get(product)
    }

    pub fn indicators(&self, product: &str) -> Option<Indicators> {
        self.histories.get(product).and_then(|h| h.indicators())
    }
}
