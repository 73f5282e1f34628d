//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};

use crate::basket::{BasketItem, sum_subtotals};
use crate::value_objects::{Money, MoneyError, Quantity};

use super::{OrderError, OrderStatus};

/// An immutable line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    product_id: ProductId,
    quantity: Quantity,
    price: Money,
}

impl OrderItem {
    pub fn new(
        product_id: ProductId,
        quantity: Quantity,
        price: Money,
    ) -> Result<Self, OrderError> {
        if product_id.as_uuid().is_nil() {
            return Err(OrderError::EmptyProductId);
        }
        if quantity.is_zero() {
            return Err(OrderError::ZeroQuantity);
        }
        Ok(Self {
            product_id,
            quantity,
            price,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn price(&self) -> &Money {
        &self.price
    }

    pub fn subtotal(&self) -> Result<Money, MoneyError> {
        self.price.multiply(i64::from(self.quantity.value()))
    }
}

/// Order aggregate root.
///
/// Items and total are fixed at creation; only the status moves afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    items: Vec<OrderItem>,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a new order from a snapshot of basket items.
    ///
    /// The items are copied, so later basket changes don't affect the order.
    pub fn new(basket_items: &[BasketItem]) -> Result<Self, OrderError> {
        if basket_items.is_empty() {
            return Err(OrderError::EmptyBasket);
        }

        let items = basket_items
            .iter()
            .map(|item| OrderItem::new(item.product_id(), item.quantity(), item.price().clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let total = sum_subtotals(items.iter().map(|item| (&item.price, item.quantity)))?;

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            items,
            total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order from storage, trusting the persisted total and status.
    pub fn reconstruct(
        id: OrderId,
        items: Vec<OrderItem>,
        total: Money,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            items,
            total,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total(&self) -> &Money {
        &self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if !self.status.can_confirm() {
            return Err(self.invalid_transition("confirm"));
        }
        self.transition(OrderStatus::Confirmed);
        Ok(())
    }

    pub fn ship(&mut self) -> Result<(), OrderError> {
        if !self.status.can_ship() {
            return Err(self.invalid_transition("ship"));
        }
        self.transition(OrderStatus::Shipped);
        Ok(())
    }

    pub fn deliver(&mut self) -> Result<(), OrderError> {
        if !self.status.can_deliver() {
            return Err(self.invalid_transition("deliver"));
        }
        self.transition(OrderStatus::Delivered);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Delivered => Err(OrderError::AlreadyDelivered),
            OrderStatus::Cancelled => Err(OrderError::AlreadyCancelled),
            _ => {
                self.transition(OrderStatus::Cancelled);
                Ok(())
            }
        }
    }

    pub fn is_cancellable(&self) -> bool {
        self.status.can_cancel()
    }

    fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    fn invalid_transition(&self, action: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            current_status: self.status,
            action,
        }
    }
}
