//! Bootstrap - engine setup from configuration
//!
//! Turns an [`EngineConfig`] into the pieces the tick driver owns:
//! - one strategy per traded product, registered with the dispatcher
//! - one fair value estimator per product
//! - position limits

use crate::config::EngineConfig;
use log::info;
use std::collections::BTreeMap;
use tidewater_core::ProductId;
use tidewater_quant::{FairValueEstimator, StatsTracker};
use tidewater_risk::PositionTracker;
use tidewater_strategy::StrategyRegistry;

pub fn build_registry(config: &EngineConfig) -> StrategyRegistry {
    let mut registry = StrategyRegistry::new();
    for (product, strategy) in config.traded() {
        registry.register(product.clone(), strategy.build(&config.options));
    }
    info!(
        "[Bootstrap] {} of {} products traded",
        registry.len(),
        config.products.len()
    );
    registry
}

pub fn build_estimators(config: &EngineConfig) -> BTreeMap<ProductId, FairValueEstimator> {
    config
        .products
        .iter()
        .map(|(product, p)| (product.clone(), FairValueEstimator::new(p.fair_value)))
        .collect()
}

pub fn build_positions(config: &EngineConfig) -> PositionTracker {
    PositionTracker::new(config.limits())
}

/// Apply configured windows to a (possibly restored) tracker
pub fn configure_windows(config: &EngineConfig, stats: &mut StatsTracker) {
    for product in config.products.keys() {
        let window = config.window(product);
        if stats.window(product) != window {
            stats.set_window(product, window);
        }
    }
}
