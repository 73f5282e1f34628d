//! Domain layer for the shop backend.
//!
//! This crate provides:
//! - `Money` and `Quantity` value objects enforcing monetary and count invariants
//! - `Product`, `Basket` and `Order` entities with their mutation rules
//! - Repository and unit-of-work traits implemented by storage backends

pub mod basket;
pub mod error;
pub mod order;
pub mod product;
pub mod repository;
pub mod value_objects;

pub use basket::{Basket, BasketError, BasketItem};
pub use common::{BasketId, OrderId, ProductId};
pub use error::DomainError;
pub use order::{Order, OrderError, OrderItem, OrderStatus, UnknownStatus};
pub use product::{Product, ProductError};
pub use repository::{
    BasketRepository, OrderRepository, ProductRepository, RepositoryError, RepositoryResult,
    Transaction, UnitOfWork,
};
pub use value_objects::{DEFAULT_CURRENCY, Money, MoneyError, Quantity, QuantityError};
