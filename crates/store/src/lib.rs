//! Storage backends implementing the domain repository traits.
//!
//! - [`InMemoryStore`]: process-local, used by tests and when no database is configured
//! - [`PostgresStore`]: `sqlx` over PostgreSQL with row-level locking for checkout

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
