//! Storage contracts consumed by the application layer.
//!
//! Each repository call is atomic on its own but calls are not composed.
//! Operations that must commit or abort together go through a
//! [`UnitOfWork`] transaction instead.

use async_trait::async_trait;
use common::{BasketId, OrderId, ProductId};
use thiserror::Error;

use crate::basket::Basket;
use crate::order::Order;
use crate::product::Product;

/// Errors reported by storage backends.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A write clashed with existing data (e.g. duplicate id).
    #[error("Storage conflict: {0}")]
    Conflict(String),

    /// A stored record can't be turned back into a valid entity.
    #[error("Corrupt {entity} record {id}: {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// The backend itself failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn corrupt(entity: &'static str, id: impl ToString, reason: impl ToString) -> Self {
        RepositoryError::Corrupt {
            entity,
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Product persistence.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts a new product.
    async fn save(&self, product: &Product) -> RepositoryResult<()>;

    /// Returns None if the product doesn't exist.
    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;

    /// All products, newest first.
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    /// Overwrites an existing product. Fails with `NotFound` if absent.
    async fn update(&self, product: &Product) -> RepositoryResult<()>;

    /// Removes a product. Fails with `NotFound` if absent.
    async fn delete(&self, id: ProductId) -> RepositoryResult<()>;

    async fn exists_by_id(&self, id: ProductId) -> RepositoryResult<bool>;
}

/// Basket persistence. Items are stored and loaded with their basket.
#[async_trait]
pub trait BasketRepository: Send + Sync {
    async fn save(&self, basket: &Basket) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: BasketId) -> RepositoryResult<Option<Basket>>;

    async fn find_all(&self) -> RepositoryResult<Vec<Basket>>;

    /// Replaces the stored basket, items included. Fails with `NotFound` if absent.
    async fn update(&self, basket: &Basket) -> RepositoryResult<()>;

    async fn delete(&self, id: BasketId) -> RepositoryResult<()>;

    async fn exists_by_id(&self, id: BasketId) -> RepositoryResult<bool>;
}

/// Order persistence. Orders are never deleted.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save(&self, order: &Order) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: OrderId) -> RepositoryResult<Option<Order>>;

    /// All orders, newest first.
    async fn find_all(&self) -> RepositoryResult<Vec<Order>>;

    /// Persists status changes. Fails with `NotFound` if absent.
    async fn update(&self, order: &Order) -> RepositoryResult<()>;

    async fn exists_by_id(&self, id: OrderId) -> RepositoryResult<bool>;
}

/// Source of scoped transactions spanning several aggregates.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Transaction: Transaction;

    /// Starts a transaction. It must be committed explicitly; dropping it
    /// discards every write made through it.
    async fn begin(&self) -> RepositoryResult<Self::Transaction>;
}

/// A transaction handle covering everything a checkout touches.
#[async_trait]
pub trait Transaction: Send {
    async fn find_basket(&mut self, id: BasketId) -> RepositoryResult<Option<Basket>>;

    /// Loads a product and holds it exclusively until the transaction ends.
    async fn find_product_for_update(
        &mut self,
        id: ProductId,
    ) -> RepositoryResult<Option<Product>>;

    async fn update_product(&mut self, product: &Product) -> RepositoryResult<()>;

    async fn save_order(&mut self, order: &Order) -> RepositoryResult<()>;

    async fn update_basket(&mut self, basket: &Basket) -> RepositoryResult<()>;

    async fn commit(self) -> RepositoryResult<()>;

    async fn rollback(self) -> RepositoryResult<()>;
}
