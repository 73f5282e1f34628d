//! Service error types.

use std::str::FromStr;

use common::{BasketId, OrderId, ParseIdError, ProductId};
use domain::{
    BasketError, DomainError, MoneyError, OrderError, ProductError, QuantityError,
    RepositoryError,
};
use thiserror::Error;

/// Errors returned by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request data failed validation before reaching the domain.
    #[error("{0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Basket not found: {0}")]
    BasketNotFound(BasketId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Checkout was attempted on a basket with no items.
    #[error("Cannot checkout an empty basket")]
    EmptyBasket,

    /// A product has fewer units in stock than requested.
    #[error(
        "Insufficient stock for product '{product_name}': requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// A domain rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The storage backend failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Persistence,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::ProductNotFound(_)
            | ServiceError::BasketNotFound(_)
            | ServiceError::OrderNotFound(_) => ErrorKind::NotFound,
            ServiceError::EmptyBasket | ServiceError::InsufficientStock { .. } => {
                ErrorKind::Conflict
            }
            ServiceError::Domain(err) => domain_kind(err),
            ServiceError::Repository(err) => match err {
                RepositoryError::NotFound { .. } => ErrorKind::NotFound,
                RepositoryError::Conflict(_) => ErrorKind::Conflict,
                RepositoryError::Corrupt { .. } | RepositoryError::Backend(_) => {
                    ErrorKind::Persistence
                }
            },
        }
    }
}

fn domain_kind(err: &DomainError) -> ErrorKind {
    match err {
        DomainError::Money(e) => money_kind(e),
        DomainError::Quantity(e) => quantity_kind(e),
        DomainError::Product(ProductError::EmptyName) => ErrorKind::Validation,
        DomainError::Product(ProductError::InsufficientStock { .. }) => ErrorKind::Conflict,
        DomainError::Basket(e) => match e {
            BasketError::EmptyProductId | BasketError::ZeroQuantity => ErrorKind::Validation,
            BasketError::ItemNotFound { .. } => ErrorKind::Conflict,
            BasketError::Quantity(e) => quantity_kind(e),
            BasketError::Money(e) => money_kind(e),
        },
        DomainError::Order(e) => match e {
            OrderError::EmptyProductId | OrderError::ZeroQuantity => ErrorKind::Validation,
            OrderError::EmptyBasket
            | OrderError::InvalidTransition { .. }
            | OrderError::AlreadyDelivered
            | OrderError::AlreadyCancelled => ErrorKind::Conflict,
            OrderError::Money(e) => money_kind(e),
        },
    }
}

fn money_kind(err: &MoneyError) -> ErrorKind {
    match err {
        MoneyError::InvalidAmount { .. }
        | MoneyError::InvalidCurrency
        | MoneyError::InvalidFactor { .. } => ErrorKind::Validation,
        MoneyError::CurrencyMismatch { .. } | MoneyError::Overflow => ErrorKind::Conflict,
    }
}

fn quantity_kind(err: &QuantityError) -> ErrorKind {
    match err {
        QuantityError::NegativeQuantity { .. } | QuantityError::TooLarge { .. } => {
            ErrorKind::Validation
        }
        QuantityError::NegativeResult { .. } => ErrorKind::Conflict,
    }
}

macro_rules! from_domain_error {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for ServiceError {
                fn from(err: $err) -> Self {
                    ServiceError::Domain(err.into())
                }
            }
        )*
    };
}

from_domain_error!(MoneyError, QuantityError, ProductError, BasketError, OrderError);

impl From<ParseIdError> for ServiceError {
    fn from(err: ParseIdError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Parses an identifier received as text.
pub fn parse_id<T>(input: &str) -> Result<T>
where
    T: FromStr<Err = ParseIdError>,
{
    Ok(input.trim().parse()?)
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
