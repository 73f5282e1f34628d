//! Domain error types.

use thiserror::Error;

use crate::basket::BasketError;
use crate::order::OrderError;
use crate::product::ProductError;
use crate::value_objects::{MoneyError, QuantityError};

/// Any rule violation raised by the domain model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Basket(#[from] BasketError),

    #[error(transparent)]
    Order(#[from] OrderError),
}
