use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BasketId, OrderId, ProductId};
use domain::{
    Basket, BasketRepository, Order, OrderRepository, Product, ProductRepository,
    RepositoryError, RepositoryResult, Transaction, UnitOfWork,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
struct StoreState {
    products: HashMap<ProductId, Product>,
    baskets: HashMap<BasketId, Basket>,
    orders: HashMap<OrderId, Order>,
}

impl StoreState {
    fn insert_order(&mut self, order: &Order) -> RepositoryResult<()> {
        if self.orders.contains_key(&order.id()) {
            return Err(duplicate("Order", order.id()));
        }
        self.orders.insert(order.id(), order.clone());
        Ok(())
    }

    fn replace_product(&mut self, product: &Product) -> RepositoryResult<()> {
        let slot = self
            .products
            .get_mut(&product.id())
            .ok_or_else(|| RepositoryError::not_found("Product", product.id()))?;
        *slot = product.clone();
        Ok(())
    }

    fn replace_basket(&mut self, basket: &Basket) -> RepositoryResult<()> {
        let slot = self
            .baskets
            .get_mut(&basket.id())
            .ok_or_else(|| RepositoryError::not_found("Basket", basket.id()))?;
        *slot = basket.clone();
        Ok(())
    }
}

/// In-memory store implementing every repository and the unit of work.
///
/// All clones share the same state. A transaction holds the state lock for
/// its whole lifetime, so checkouts against one store never interleave.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    fail_order_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent order write fail with a backend error.
    pub fn set_fail_order_writes(&self, fail: bool) {
        self.fail_order_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    fn check_order_writes(&self) -> RepositoryResult<()> {
        check_order_writes(&self.fail_order_writes)
    }
}

fn check_order_writes(flag: &AtomicBool) -> RepositoryResult<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(StoreError::Unavailable("order writes are disabled").into());
    }
    Ok(())
}

fn duplicate(entity: &str, id: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Conflict(format!("{entity} {id} already exists"))
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn save(&self, product: &Product) -> RepositoryResult<()> {
        let mut state = self.state.lock().await;
        if state.products.contains_key(&product.id()) {
            return Err(duplicate("Product", product.id()));
        }
        state.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let products: Vec<Product> = self.state.lock().await.products.values().cloned().collect();
        Ok(newest_first(products, Product::created_at))
    }

    async fn update(&self, product: &Product) -> RepositoryResult<()> {
        self.state.lock().await.replace_product(product)
    }

    async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        self.state
            .lock()
            .await
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Product", id))
    }

    async fn exists_by_id(&self, id: ProductId) -> RepositoryResult<bool> {
        Ok(self.state.lock().await.products.contains_key(&id))
    }
}

#[async_trait]
impl BasketRepository for InMemoryStore {
    async fn save(&self, basket: &Basket) -> RepositoryResult<()> {
        let mut state = self.state.lock().await;
        if state.baskets.contains_key(&basket.id()) {
            return Err(duplicate("Basket", basket.id()));
        }
        state.baskets.insert(basket.id(), basket.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BasketId) -> RepositoryResult<Option<Basket>> {
        Ok(self.state.lock().await.baskets.get(&id).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Basket>> {
        let baskets: Vec<Basket> = self.state.lock().await.baskets.values().cloned().collect();
        Ok(newest_first(baskets, Basket::created_at))
    }

    async fn update(&self, basket: &Basket) -> RepositoryResult<()> {
        self.state.lock().await.replace_basket(basket)
    }

    async fn delete(&self, id: BasketId) -> RepositoryResult<()> {
        self.state
            .lock()
            .await
            .baskets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Basket", id))
    }

    async fn exists_by_id(&self, id: BasketId) -> RepositoryResult<bool> {
        Ok(self.state.lock().await.baskets.contains_key(&id))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn save(&self, order: &Order) -> RepositoryResult<()> {
        self.check_order_writes()?;
        self.state.lock().await.insert_order(order)
    }

    async fn find_by_id(&self, id: OrderId) -> RepositoryResult<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Order>> {
        let orders: Vec<Order> = self.state.lock().await.orders.values().cloned().collect();
        Ok(newest_first(orders, Order::created_at))
    }

    async fn update(&self, order: &Order) -> RepositoryResult<()> {
        self.check_order_writes()?;
        let mut state = self.state.lock().await;
        let slot = state
            .orders
            .get_mut(&order.id())
            .ok_or_else(|| RepositoryError::not_found("Order", order.id()))?;
        *slot = order.clone();
        Ok(())
    }

    async fn exists_by_id(&self, id: OrderId) -> RepositoryResult<bool> {
        Ok(self.state.lock().await.orders.contains_key(&id))
    }
}

/// Transaction over an [`InMemoryStore`].
///
/// Writes go to a private copy of the state; `commit` publishes the copy.
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
    fail_order_writes: Arc<AtomicBool>,
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> RepositoryResult<InMemoryTransaction> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction {
            guard,
            working,
            fail_order_writes: self.fail_order_writes.clone(),
        })
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn find_basket(&mut self, id: BasketId) -> RepositoryResult<Option<Basket>> {
        Ok(self.working.baskets.get(&id).cloned())
    }

    async fn find_product_for_update(
        &mut self,
        id: ProductId,
    ) -> RepositoryResult<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn update_product(&mut self, product: &Product) -> RepositoryResult<()> {
        self.working.replace_product(product)
    }

    async fn save_order(&mut self, order: &Order) -> RepositoryResult<()> {
        check_order_writes(&self.fail_order_writes)?;
        self.working.insert_order(order)
    }

    async fn update_basket(&mut self, basket: &Basket) -> RepositoryResult<()> {
        self.working.replace_basket(basket)
    }

    async fn commit(mut self) -> RepositoryResult<()> {
        *self.guard = self.working;
        Ok(())
    }

    async fn rollback(self) -> RepositoryResult<()> {
        Ok(())
    }
}
