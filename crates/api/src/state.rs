//! Shared application state.

use application::{BasketService, OrderService, ProductService};
use domain::{BasketRepository, OrderRepository, ProductRepository, UnitOfWork};

/// Everything a storage backend must provide to serve the API.
pub trait Store:
    ProductRepository + BasketRepository + OrderRepository + UnitOfWork + Clone + 'static
{
}

impl<T> Store for T where
    T: ProductRepository + BasketRepository + OrderRepository + UnitOfWork + Clone + 'static
{
}

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub products: ProductService<S>,
    pub baskets: BasketService<S>,
    pub orders: OrderService<S>,
}

impl<S: Store> AppState<S> {
    /// Builds every service over clones of one store handle.
    pub fn new(store: S) -> Self {
        Self {
            products: ProductService::new(store.clone()),
            baskets: BasketService::new(store.clone()),
            orders: OrderService::new(store),
        }
    }
}
