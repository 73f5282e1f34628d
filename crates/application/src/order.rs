//! Checkout and order lifecycle.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use common::{BasketId, OrderId, ProductId};
use domain::{Order, OrderError, OrderRepository, Transaction, UnitOfWork};

use crate::dto::{CheckoutRequest, OrderResponse};
use crate::error::{Result, ServiceError, parse_id};

/// Service for placing orders and moving them through their lifecycle.
pub struct OrderService<S> {
    store: S,
}

impl<S> OrderService<S>
where
    S: OrderRepository + UnitOfWork,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts a basket into a pending order.
    ///
    /// Stock checks, stock reductions, the order insert and the basket clear
    /// run in one transaction. Any failure leaves every entity unchanged.
    #[tracing::instrument(skip(self, request), fields(basket_id = %request.basket_id))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<OrderResponse> {
        let basket_id: BasketId = parse_id(&request.basket_id)?;
        metrics::counter!("checkouts_total").increment(1);
        let started = Instant::now();

        match self.place_order(basket_id).await {
            Ok(order) => {
                let duration = started.elapsed().as_secs_f64();
                metrics::histogram!("checkout_duration_seconds").record(duration);
                tracing::info!(
                    order_id = %order.id(),
                    total = %order.total(),
                    duration,
                    "order placed"
                );
                Ok(OrderResponse::try_from(&order)?)
            }
            Err(err) => {
                metrics::counter!("checkouts_failed").increment(1);
                tracing::warn!(%basket_id, error = %err, "checkout failed");
                Err(err)
            }
        }
    }

    async fn place_order(&self, basket_id: BasketId) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let mut basket = tx
            .find_basket(basket_id)
            .await?
            .ok_or(ServiceError::BasketNotFound(basket_id))?;
        if basket.is_empty() {
            return Err(ServiceError::EmptyBasket);
        }

        // Rows are locked in id order so crossing checkouts cannot deadlock.
        let ids: BTreeSet<ProductId> = basket.items().iter().map(|item| item.product_id()).collect();
        let mut locked = BTreeMap::new();
        for id in ids {
            let product = tx
                .find_product_for_update(id)
                .await?
                .ok_or(ServiceError::ProductNotFound(id))?;
            locked.insert(id, product);
        }

        // Every line is checked before any stock moves.
        for item in basket.items() {
            let Some(product) = locked.get(&item.product_id()) else {
                continue;
            };
            if product.stock() < item.quantity() {
                return Err(ServiceError::InsufficientStock {
                    product_id: product.id(),
                    product_name: product.name().to_string(),
                    requested: item.quantity().value(),
                    available: product.stock().value(),
                });
            }
        }

        for item in basket.items() {
            if let Some(product) = locked.get_mut(&item.product_id()) {
                product.reduce_stock(item.quantity())?;
                tx.update_product(product).await?;
            }
        }

        let order = Order::new(basket.items())?;
        tx.save_order(&order).await?;

        basket.clear();
        tx.update_basket(&basket).await?;

        tx.commit().await?;
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderResponse> {
        let order = self.load(id).await?;
        Ok(OrderResponse::try_from(&order)?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>> {
        let orders = self.store.find_all().await?;
        Ok(orders
            .iter()
            .map(OrderResponse::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub async fn confirm_order(&self, id: OrderId) -> Result<OrderResponse> {
        self.transition(id, "confirm", Order::confirm).await
    }

    pub async fn ship_order(&self, id: OrderId) -> Result<OrderResponse> {
        self.transition(id, "ship", Order::ship).await
    }

    pub async fn deliver_order(&self, id: OrderId) -> Result<OrderResponse> {
        self.transition(id, "deliver", Order::deliver).await
    }

    pub async fn cancel_order(&self, id: OrderId) -> Result<OrderResponse> {
        self.transition(id, "cancel", Order::cancel).await
    }

    #[tracing::instrument(skip(self, apply))]
    async fn transition<F>(
        &self,
        id: OrderId,
        transition: &'static str,
        apply: F,
    ) -> Result<OrderResponse>
    where
        F: FnOnce(&mut Order) -> std::result::Result<(), OrderError> + Send,
    {
        let mut order = self.load(id).await?;
        apply(&mut order)?;
        self.store.update(&order).await?;

        metrics::counter!("order_transitions_total", "transition" => transition).increment(1);
        tracing::info!(order_id = %id, status = %order.status(), "order status changed");
        Ok(OrderResponse::try_from(&order)?)
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::OrderNotFound(id))
    }
}
