//! Persisted engine state
//!
//! Everything the engine remembers between ticks, moved in and out of
//! [`TradingEngine::run_tick`](crate::TradingEngine::run_tick) by value. The
//! harness carries it as an opaque string between invocations.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tidewater_core::{Price, ProductId};
use tidewater_quant::StatsTracker;
use tidewater_strategy::StrategyState;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to encode engine state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode engine state: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Rolling fair value histories
    #[serde(default)]
    pub stats: StatsTracker,
    /// Last fair value per product, used while a book is one-sided
    #[serde(default)]
    pub fair_values: BTreeMap<ProductId, Price>,
    #[serde(default)]
    pub strategies: BTreeMap<ProductId, StrategyState>,
    /// Ticks processed since the session started
    #[serde(default)]
    pub ticks: u64,
}

impl EngineState {
    pub fn encode(&self) -> StateResult<String> {
        serde_json::to_string(self).map_err(StateError::Encode)
    }

    /// Decode a previous tick's state; an empty string is a new session
    pub fn decode(data: &str) -> StateResult<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(data).map_err(StateError::Decode)
    }

    /// Decode, starting fresh when the data is unreadable
    pub fn decode_or_fresh(data: &str) -> Self {
        Self::decode(data).unwrap_or_else(|e| {
            warn!("[EngineState] {}, starting a fresh session", e);
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tidewater_core::Side;
    use tidewater_strategy::BandEntry;

    #[test]
    fn test_encode_decode_round_trip() {
        let mut state = EngineState::default();
        state.stats.update("KELP", 2031.0);
        state.stats.update("KELP", 2032.5);
        state.fair_values.insert("KELP".to_string(), dec!(2032.5));
        state.strategies.insert(
            "KELP".to_string(),
            StrategyState::Bollinger(BandEntry {
                side: Side::Buy,
                price: 2025.0,
            }),
        );
        state.ticks = 7;

        let encoded = state.encode().unwrap();
        let decoded = EngineState::decode(&encoded).unwrap();

        assert_eq!(decoded, state);
    }

    #[test]
    fn test_empty_is_new_session() {
        assert_eq!(EngineState::decode("").unwrap(), EngineState::default());
    }

    #[test]
    fn test_garbage_starts_fresh() {
        assert!(matches!(
            EngineState::decode("not state"),
            Err(StateError::Decode(_))
        ));
        assert_eq!(EngineState::decode_or_fresh("not state"), EngineState::default());
    }
}
