//! Currency-tagged money amounts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currency used when a zero amount has no items to take a currency from.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Errors raised by [`Money`] construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Amount is below zero.
    #[error("Invalid amount: {amount} (cannot be negative)")]
    InvalidAmount { amount: i64 },

    /// Currency code is empty.
    #[error("Invalid currency: currency code cannot be empty")]
    InvalidCurrency,

    /// The operands carry different currencies.
    #[error("Currency mismatch: cannot combine {left} with {right}")]
    CurrencyMismatch { left: String, right: String },

    /// Multiplication factor is below zero.
    #[error("Invalid factor: {factor} (cannot be negative)")]
    InvalidFactor { factor: i64 },

    /// Result does not fit in 64 bits of cents.
    #[error("Money arithmetic overflow")]
    Overflow,
}

/// Wire shape of [`Money`]; deserialization re-runs validation.
#[derive(Deserialize)]
struct RawMoney {
    amount: i64,
    currency: String,
}

/// Non-negative amount in cents tagged with a currency code.
///
/// Money is immutable: every operation returns a new value. Amounts of
/// different currencies never combine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMoney")]
pub struct Money {
    amount: i64,
    currency: String,
}

impl Money {
    /// Creates a money value, rejecting negative amounts and empty currencies.
    pub fn new(amount: i64, currency: impl Into<String>) -> Result<Self, MoneyError> {
        let currency = currency.into();
        if amount < 0 {
            return Err(MoneyError::InvalidAmount { amount });
        }
        if currency.trim().is_empty() {
            return Err(MoneyError::InvalidCurrency);
        }
        Ok(Self { amount, currency })
    }

    /// Zero in the given currency.
    pub fn zero(currency: impl Into<String>) -> Result<Self, MoneyError> {
        Self::new(0, currency)
    }

    /// Zero in [`DEFAULT_CURRENCY`].
    pub fn default_zero() -> Self {
        Self {
            amount: 0,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Amount in cents.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Adds two amounts of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money {
            amount,
            currency: self.currency.clone(),
        })
    }

    /// Multiplies by a non-negative factor. Cents arithmetic is exact.
    pub fn multiply(&self, factor: i64) -> Result<Money, MoneyError> {
        if factor < 0 {
            return Err(MoneyError::InvalidFactor { factor });
        }
        let amount = self
            .amount
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money {
            amount,
            currency: self.currency.clone(),
        })
    }

    /// Structural equality on amount and currency.
    pub fn equals(&self, other: &Money) -> bool {
        self == other
    }
}

impl TryFrom<RawMoney> for Money {
    type Error = MoneyError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::new(raw.amount, raw.currency)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency,
            self.amount / 100,
            self.amount % 100
        )
    }
}
