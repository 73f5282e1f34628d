//! Application services for the shop backend.
//!
//! Each service loads entities through the repository traits, applies a
//! domain operation and persists the result, returning plain DTOs.
//! Checkout runs inside a single [`domain::UnitOfWork`] transaction.

pub mod basket;
pub mod dto;
pub mod error;
pub mod order;
pub mod product;

pub use basket::BasketService;
pub use error::{ErrorKind, Result, ServiceError};
pub use order::OrderService;
pub use product::ProductService;
