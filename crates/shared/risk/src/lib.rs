//! Tidewater Risk
//!
//! Position limits are the only hard risk constraint. Every candidate order
//! passes through [`OrderSizer`] before leaving the engine:
//!
//! ```text
//! exchange positions ──► PositionTracker::sync
//!                               │
//! strategy candidates ──► OrderSizer::clamp ──► final orders
//!                               │
//!                               └──► PositionTracker::apply (pending)
//! ```

pub mod position;
pub mod sizing;

pub use position::PositionTracker;
pub use sizing::{OrderSizer, capacity_share};
