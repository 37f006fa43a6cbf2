use serde::{Deserialize, Serialize};

use super::Side;
use crate::values::{Price, ProductId, Quantity};

/// Order handed to the exchange collaborator.
///
/// The sign of `quantity` carries the side: positive buys, negative sells.
/// Orders are values; sizing produces new orders instead of mutating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub product: ProductId,
    pub price: Price,
    pub quantity: Quantity,
}

impl Order {
    pub fn new(product: impl Into<ProductId>, price: Price, quantity: Quantity) -> Self {
        Self {
            product: product.into(),
            price,
            quantity,
        }
    }

    /// Buy `quantity` (taken as absolute) at `price`
    pub fn buy(product: impl Into<ProductId>, price: Price, quantity: Quantity) -> Self {
        Self::new(product, price, quantity.abs())
    }

    /// Sell `quantity` (taken as absolute) at `price`
    pub fn sell(product: impl Into<ProductId>, price: Price, quantity: Quantity) -> Self {
        Self::new(product, price, -quantity.abs())
    }

    /// Order on `side` for an absolute `quantity`
    pub fn on_side(
        product: impl Into<ProductId>,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self::new(product, price, side.sign() * quantity.abs())
    }

    /// Side of the order, None for a zero-quantity order
    pub fn side(&self) -> Option<Side> {
        Side::of(self.quantity)
    }

    pub fn abs_quantity(&self) -> Quantity {
        self.quantity.abs()
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Same order with a different absolute size, keeping the side
    pub fn with_abs_quantity(&self, quantity: Quantity) -> Self {
        Self {
            product: self.product.clone(),
            price: self.price,
            quantity: self.quantity.signum() * quantity.abs(),
        }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}@{}", self.product, self.quantity, self.price)
    }
}
