//! Engine configuration
//!
//! Which strategy trades each product, with its limit, window and fair
//! value policy. Loaded from JSON; an embedded default covers every product
//! of the exchange.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tidewater_core::{ProductId, Quantity};
use tidewater_quant::FairValuePolicy;
use tidewater_strategy::{OptionsConfig, StrategyConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("No products in config")]
    NoProducts,
    #[error("Position limit of {0} must be positive")]
    InvalidLimit(ProductId),
    #[error("Window of {0} must hold at least two observations")]
    InvalidWindow(ProductId),
    #[error("{product} depends on unconfigured product {dependency}")]
    UnknownDependency {
        product: ProductId,
        dependency: ProductId,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Per-product settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Absolute position limit
    pub limit: Quantity,
    /// Rolling window; the engine default when absent
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub fair_value: FairValuePolicy,
    /// Products without a strategy are tracked but never traded
    #[serde(default)]
    pub strategy: Option<StrategyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_window")]
    pub default_window: usize,
    #[serde(default)]
    pub options: OptionsConfig,
    pub products: BTreeMap<ProductId, ProductConfig>,
}

fn default_window() -> usize {
    20
}

/// Load engine configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> ConfigResult<EngineConfig> {
    let config: EngineConfig = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> ConfigResult<EngineConfig> {
    let default_config = include_str!("default_config.json");
    load_config_from_str(default_config)
}

impl EngineConfig {
    pub fn product(&self, product: &str) -> Option<&ProductConfig> {
        self.products.get(product)
    }

    pub fn limits(&self) -> BTreeMap<ProductId, Quantity> {
        self.products
            .iter()
            .map(|(product, config)| (product.clone(), config.limit))
            .collect()
    }

    pub fn window(&self, product: &str) -> usize {
        self.product(product)
            .and_then(|p| p.window)
            .unwrap_or(self.default_window)
    }

    /// Products that have a strategy
    pub fn traded(&self) -> impl Iterator<Item = (&ProductId, &StrategyConfig)> {
        self.products
            .iter()
            .filter_map(|(product, config)| config.strategy.as_ref().map(|s| (product, s)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.products.is_empty() {
            return Err(ConfigError::NoProducts);
        }
        for (product, config) in &self.products {
            if config.limit <= 0 {
                return Err(ConfigError::InvalidLimit(product.clone()));
            }
            if config.window.is_some_and(|w| w < 2) {
                return Err(ConfigError::InvalidWindow(product.clone()));
            }
        }
        for (product, strategy) in self.traded() {
            if let Some(missing) = strategy
                .dependencies()
                .into_iter()
                .find(|d| !self.products.contains_key(*d))
            {
                return Err(ConfigError::UnknownDependency {
                    product: product.clone(),
                    dependency: missing.to_string(),
                });
            }
        }
        Ok(())
    }
}
