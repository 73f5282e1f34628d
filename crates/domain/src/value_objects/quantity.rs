//! Non-negative unit counts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by [`Quantity`] construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Value is below zero.
    #[error("Negative quantity: {value}")]
    NegativeQuantity { value: i64 },

    /// Subtraction would go below zero.
    #[error("Negative result: cannot subtract {subtrahend} from {minuend}")]
    NegativeResult { minuend: u32, subtrahend: u32 },

    /// Value does not fit the supported range.
    #[error("Quantity too large: {value}")]
    TooLarge { value: i64 },
}

/// Validated non-negative count of units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Creates a quantity from a signed value, rejecting negatives.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 0 {
            return Err(QuantityError::NegativeQuantity { value });
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge { value })
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn add(&self, other: Quantity) -> Result<Quantity, QuantityError> {
        self.0
            .checked_add(other.0)
            .map(Quantity)
            .ok_or(QuantityError::TooLarge {
                value: i64::from(self.0) + i64::from(other.0),
            })
    }

    /// Subtracts, failing instead of going below zero.
    pub fn subtract(&self, other: Quantity) -> Result<Quantity, QuantityError> {
        self.0
            .checked_sub(other.0)
            .map(Quantity)
            .ok_or(QuantityError::NegativeResult {
                minuend: self.0,
                subtrahend: other.0,
            })
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
