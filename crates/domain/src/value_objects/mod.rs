//! Value objects shared by the catalog, basket and order aggregates.

mod money;
mod quantity;

pub use money::{DEFAULT_CURRENCY, Money, MoneyError};
pub use quantity::{Quantity, QuantityError};
