//! Shopping basket aggregate.

use chrono::{DateTime, Utc};
use common::{BasketId, ProductId};
use thiserror::Error;

use crate::value_objects::{Money, MoneyError, Quantity, QuantityError};

/// Errors raised by basket operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BasketError {
    /// Product id is the nil UUID.
    #[error("Product ID cannot be empty")]
    EmptyProductId,

    /// Items must carry at least one unit.
    #[error("Quantity must be greater than zero")]
    ZeroQuantity,

    /// The product is not in the basket.
    #[error("Item not found in basket: {product_id}")]
    ItemNotFound { product_id: ProductId },

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A line in a basket: a product, how many units, and the unit price
/// captured when the line was last added to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketItem {
    product_id: ProductId,
    quantity: Quantity,
    price: Money,
}

impl BasketItem {
    pub fn new(
        product_id: ProductId,
        quantity: Quantity,
        price: Money,
    ) -> Result<Self, BasketError> {
        if product_id.as_uuid().is_nil() {
            return Err(BasketError::EmptyProductId);
        }
        if quantity.is_zero() {
            return Err(BasketError::ZeroQuantity);
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

    /// Unit price snapshot.
    pub fn price(&self) -> &Money {
        &self.price
    }

    /// Unit price times quantity.
    pub fn subtotal(&self) -> Result<Money, MoneyError> {
        self.price.multiply(i64::from(self.quantity.value()))
    }
}

/// A mutable, in-progress cart. Holds at most one item per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basket {
    id: BasketId,
    items: Vec<BasketItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Basket {
    /// Creates an empty basket with a fresh id and timestamps.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: BasketId::new(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a basket from storage.
    pub fn reconstruct(
        id: BasketId,
        items: Vec<BasketItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            items,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> BasketId {
        self.id
    }

    pub fn items(&self) -> &[BasketItem] {
        &self.items
    }

    pub fn get_item(&self, product_id: ProductId) -> Option<&BasketItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Adds units of a product.
    ///
    /// If the product is already in the basket the quantities are summed and
    /// the stored unit price is replaced by `price`.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
        price: Money,
    ) -> Result<(), BasketError> {
        match self.position(product_id) {
            Some(index) => {
                let combined = self.items[index].quantity.add(quantity)?;
                self.items[index] = BasketItem::new(product_id, combined, price)?;
            }
            None => {
                let item = BasketItem::new(product_id, quantity, price)?;
                self.items.push(item);
            }
        }
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), BasketError> {
        let index = self
            .position(product_id)
            .ok_or(BasketError::ItemNotFound { product_id })?;
        self.items.remove(index);
        self.touch();
        Ok(())
    }

    /// Sets the quantity of an existing line, keeping its price snapshot.
    /// A zero quantity removes the line.
    pub fn update_item_quantity(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), BasketError> {
        if quantity.is_zero() {
            return self.remove_item(product_id);
        }

        let index = self
            .position(product_id)
            .ok_or(BasketError::ItemNotFound { product_id })?;
        let price = self.items[index].price.clone();
        self.items[index] = BasketItem::new(product_id, quantity, price)?;
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line subtotals.
    ///
    /// An empty basket totals zero in the default currency; otherwise the
    /// first item's currency is used and a mixed basket fails with
    /// [`MoneyError::CurrencyMismatch`].
    pub fn total(&self) -> Result<Money, MoneyError> {
        sum_subtotals(self.items.iter().map(|item| (&item.price, item.quantity)))
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.value()))
            .sum()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product_id == product_id)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Basket {
    fn default() -> Self {
        Self::new()
    }
}

/// Sums `price * quantity` over the lines, starting from zero in the first
/// line's currency (or the default currency when there are none).
pub(crate) fn sum_subtotals<'a>(
    mut lines: impl Iterator<Item = (&'a Money, Quantity)>,
) -> Result<Money, MoneyError> {
    let Some((price, quantity)) = lines.next() else {
        return Ok(Money::default_zero());
    };
    let mut total = price.multiply(i64::from(quantity.value()))?;
    for (price, quantity) in lines {
        total = total.add(&price.multiply(i64::from(quantity.value()))?)?;
    }
    Ok(total)
}
