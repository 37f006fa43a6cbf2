mod observation;
mod order;
mod side;
mod trade;

pub use observation::Observation;
pub use order::Order;
pub use side::Side;
pub use trade::MarketTrade;
