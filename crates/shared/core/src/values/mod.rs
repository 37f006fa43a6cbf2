use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Signed quantity. Positive buys, negative sells; book levels store it positive.
pub type Quantity = i64;

/// Product identifier as delivered by the exchange (e.g. "KELP")
pub type ProductId = String;

/// Exchange timestamp of a tick
pub type Timestamp = i64;
