//! Instrument definitions for derivative products
//!
//! Plain products need no static description beyond their id and position
//! limit. Options carry their contract terms so they can be priced.

mod option;

pub use option::{OptionKind, OptionSpec};
