//! Tidewater Core Domain
//!
//! Pure domain types for the Tidewater decision engine.
//! This crate contains no I/O and is 100% unit testable.

pub mod book;
pub mod entities;
pub mod error;
pub mod instruments;
pub mod values;

// Re-export commonly used types at crate root
pub use book::OrderBookSnapshot;
pub use entities::{MarketTrade, Observation, Order, Side};
pub use error::{BookError, BookResult};
pub use instruments::{OptionKind, OptionSpec};
pub use values::{Price, ProductId, Quantity, Timestamp};
