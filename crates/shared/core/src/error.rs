use thiserror::Error;

use crate::values::{Price, ProductId};

/// Reasons a product's book is unusable for a tick
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Crossed book for {product}: best bid {bid} >= best ask {ask}")]
    Crossed {
        product: ProductId,
        bid: Price,
        ask: Price,
    },

    #[error("Empty book for {0}")]
    Empty(ProductId),

    #[error("No book for {0} this tick")]
    MissingProduct(ProductId),
}

pub type BookResult<T> = std::result::Result<T, BookError>;
