//! Catalog product entity.

use chrono::{DateTime, Utc};
use common::ProductId;
use thiserror::Error;

use crate::value_objects::{Money, Quantity};

/// Errors raised by [`Product`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// Product name is empty.
    #[error("Product name cannot be empty")]
    EmptyName,

    /// Requested more units than are in stock.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
}

/// A product in the catalog.
///
/// Price and stock are required by construction, so a product can never be
/// observed without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: Money,
    stock: Quantity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a fresh id and timestamps.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        stock: Quantity,
    ) -> Result<Self, ProductError> {
        let name = validate_name(name.into())?;
        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            name,
            description: description.into(),
            price,
            stock,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a product from storage. No validation is repeated.
    pub fn reconstruct(
        id: ProductId,
        name: String,
        description: String,
        price: Money,
        stock: Quantity,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            price,
            stock,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> &Money {
        &self.price
    }

    pub fn stock(&self) -> Quantity {
        self.stock
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces name, description and price.
    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
    ) -> Result<(), ProductError> {
        self.name = validate_name(name.into())?;
        self.description = description.into();
        self.price = price;
        self.touch();
        Ok(())
    }

    /// Replaces the stock level wholesale.
    pub fn update_stock(&mut self, stock: Quantity) {
        self.stock = stock;
        self.touch();
    }

    /// Takes `quantity` units out of stock. Stock is left untouched on failure.
    pub fn reduce_stock(&mut self, quantity: Quantity) -> Result<(), ProductError> {
        let remaining =
            self.stock
                .subtract(quantity)
                .map_err(|_| ProductError::InsufficientStock {
                    requested: quantity.value(),
                    available: self.stock.value(),
                })?;
        self.stock = remaining;
        self.touch();
        Ok(())
    }

    /// Returns true if at least one unit is in stock.
    pub fn is_available(&self) -> bool {
        !self.stock.is_zero()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_name(name: String) -> Result<String, ProductError> {
    if name.trim().is_empty() {
        return Err(ProductError::EmptyName);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(amount: i64) -> Money {
        Money::new(amount, "USD").unwrap()
    }

    fn widget(stock: u32) -> Product {
        Product::new("Widget", "A widget", usd(1999), Quantity::from(stock)).unwrap()
    }

    #[test]
    fn test_new_product() {
        let product = widget(10);
        assert_eq!(product.name(), "Widget");
        assert_eq!(product.description(), "A widget");
        assert_eq!(product.price(), &usd(1999));
        assert_eq!(product.stock().value(), 10);
        assert_eq!(product.created_at(), product.updated_at());
    }

    #[test]
    fn test_new_products_get_unique_ids() {
        assert_ne!(widget(1).id(), widget(1).id());
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Product::new("", "desc", usd(100), Quantity::from(1));
        assert_eq!(result.unwrap_err(), ProductError::EmptyName);

        let result = Product::new("   ", "desc", usd(100), Quantity::from(1));
        assert_eq!(result.unwrap_err(), ProductError::EmptyName);
    }

    #[test]
    fn test_update_details() {
        let mut product = widget(10);
        let before = product.updated_at();

        product
            .update_details("Gadget", "A gadget", usd(2499))
            .unwrap();

        assert_eq!(product.name(), "Gadget");
        assert_eq!(product.description(), "A gadget");
        assert_eq!(product.price().amount(), 2499);
        assert!(product.updated_at() >= before);
    }

    #[test]
    fn test_update_details_rejects_empty_name_without_changes() {
        let mut product = widget(10);
        let original = product.clone();

        let err = product.update_details("", "x", usd(1)).unwrap_err();

        assert_eq!(err, ProductError::EmptyName);
        assert_eq!(product, original);
    }

    #[test]
    fn test_update_stock() {
        let mut product = widget(10);
        product.update_stock(Quantity::from(3));
        assert_eq!(product.stock().value(), 3);
    }

    #[test]
    fn test_reduce_stock() {
        let mut product = widget(5);
        product.reduce_stock(Quantity::from(2)).unwrap();
        assert_eq!(product.stock().value(), 3);
    }

    #[test]
    fn test_reduce_stock_insufficient_leaves_stock_unchanged() {
        let mut product = widget(1);
        let original = product.clone();

        let err = product.reduce_stock(Quantity::from(2)).unwrap_err();

        assert_eq!(
            err,
            ProductError::InsufficientStock {
                requested: 2,
                available: 1
            }
        );
        assert_eq!(product, original);
    }

    #[test]
    fn test_is_available() {
        assert!(widget(1).is_available());
        assert!(!widget(0).is_available());

        let mut product = widget(2);
        product.reduce_stock(Quantity::from(2)).unwrap();
        assert!(!product.is_available());
    }
}
