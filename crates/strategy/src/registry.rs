//! Strategy Dispatcher
//!
//! Maps each product to the one strategy that trades it. Products without
//! a registered strategy are never traded.

use crate::strategy::{Strategy, StrategyState};
use log::{debug, info};
use std::collections::BTreeMap;
use tidewater_core::ProductId;

#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<ProductId, Box<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` for `product`, returning any strategy it replaces
    pub fn register(
        &mut self,
        product: impl Into<ProductId>,
        strategy: Box<dyn Strategy>,
    ) -> Option<Box<dyn Strategy>> {
        let product = product.into();
        info!("[Registry] {} -> {}", product, strategy.name());
        self.strategies.insert(product, strategy)
    }

    pub fn get_mut(&mut self, product: &str) -> Option<&mut Box<dyn Strategy>> {
        self.strategies.get_mut(product)
    }

    pub fn contains(&self, product: &str) -> bool {
        self.strategies.contains_key(product)
    }

    /// Registered products in sorted order
    pub fn products(&self) -> impl Iterator<Item = &ProductId> {
        self.strategies.keys()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Export every strategy's memory keyed by product
    pub fn save_states(&self) -> BTreeMap<ProductId, StrategyState> {
        self.strategies
            .iter()
            .map(|(product, strategy)| (product.clone(), strategy.save_state()))
            .collect()
    }

    /// Restore memories; a registered product missing from `states` starts fresh
    pub fn load_states(&mut self, states: &BTreeMap<ProductId, StrategyState>) {
        for (product, strategy) in self.strategies.iter_mut() {
            let state = states.get(product).cloned().unwrap_or_default();
            strategy.load_state(state);
        }
        for product in states.keys().filter(|p| !self.strategies.contains_key(*p)) {
            debug!("[Registry] dropping state of unregistered {}", product);
        }
    }
}
