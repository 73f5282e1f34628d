//! Order aggregate and related types.

mod aggregate;
mod state;

pub use aggregate::{Order, OrderItem};
pub use state::{OrderStatus, UnknownStatus};

use thiserror::Error;

use crate::value_objects::MoneyError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Orders need at least one item.
    #[error("Cannot create order from empty basket")]
    EmptyBasket,

    /// Product id is the nil UUID.
    #[error("Product ID cannot be empty")]
    EmptyProductId,

    /// Items must carry at least one unit.
    #[error("Quantity must be greater than zero")]
    ZeroQuantity,

    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Delivered orders cannot be cancelled.
    #[error("Delivered orders cannot be cancelled")]
    AlreadyDelivered,

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error(transparent)]
    Money(#[from] MoneyError),
}
