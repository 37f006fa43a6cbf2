//! Tidewater Runner - Tick Driver
//!
//! Maps (market state, persisted state, positions) to (orders, updated
//! state), one tick at a time:
//!
//! - **Config**: per-product limits, windows, fair value policies and strategies
//! - **Bootstrap**: registry, estimators and limits built from the config
//! - **State**: everything carried between ticks, encoded as JSON
//! - **Engine**: the decision cycle itself
//!
//! ## Architecture
//!
//! ```text
//!            ┌─────────────────────────┐
//!            │   Exchange / harness    │
//!            └────┬───────────────▲────┘
//!    TickInput +  │               │  orders +
//!    EngineState  ▼               │  EngineState
//!   ┌─────────────────────────────┴──────────────┐
//!   │               TradingEngine                 │
//!   │                                             │
//!   │  books ─► FairValueEstimator ─► StatsTracker│
//!   │                    │                        │
//!   │                    ▼                        │
//!   │            StrategyRegistry ─► Actions      │
//!   │                    │                        │
//!   │                    ▼                        │
//!   │   PositionTracker ◄─► OrderSizer            │
//!   └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tidewater_runner::{EngineState, TradingEngine};
//!
//! let mut engine = TradingEngine::with_default_config()?;
//! let state = EngineState::decode_or_fresh(&trader_data);
//! let output = engine.run_tick(&input, state);
//! let trader_data = output.state.encode()?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod state;

// Re-export main types
pub use config::{
    ConfigError, ConfigResult, EngineConfig, ProductConfig, load_config, load_config_from_str,
    load_default_config,
};
pub use engine::{TickInput, TickOutput, TradingEngine};
pub use state::{EngineState, StateError, StateResult};
