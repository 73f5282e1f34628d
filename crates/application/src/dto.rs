//! Request and response shapes exchanged with the API layer.
//!
//! Monetary values are integer cents with a separate currency field.

use chrono::{DateTime, Utc};
use common::{BasketId, OrderId, ProductId};
use domain::{Basket, BasketItem, MoneyError, Order, OrderItem, Product};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub stock: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStockRequest {
    pub stock: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub basket_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price().amount(),
            currency: product.price().currency().to_string(),
            stock: product.stock().value(),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
        }
    }
}

/// One line of a basket or order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: i64,
    pub currency: String,
    pub subtotal: i64,
}

impl TryFrom<&BasketItem> for ItemResponse {
    type Error = MoneyError;

    fn try_from(item: &BasketItem) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: item.product_id(),
            quantity: item.quantity().value(),
            price: item.price().amount(),
            currency: item.price().currency().to_string(),
            subtotal: item.subtotal()?.amount(),
        })
    }
}

impl TryFrom<&OrderItem> for ItemResponse {
    type Error = MoneyError;

    fn try_from(item: &OrderItem) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: item.product_id(),
            quantity: item.quantity().value(),
            price: item.price().amount(),
            currency: item.price().currency().to_string(),
            subtotal: item.subtotal()?.amount(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketResponse {
    pub id: BasketId,
    pub items: Vec<ItemResponse>,
    pub total: i64,
    pub currency: String,
    pub item_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Basket> for BasketResponse {
    type Error = MoneyError;

    fn try_from(basket: &Basket) -> Result<Self, Self::Error> {
        let items = basket
            .items()
            .iter()
            .map(ItemResponse::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let total = basket.total()?;

        Ok(Self {
            id: basket.id(),
            items,
            total: total.amount(),
            currency: total.currency().to_string(),
            item_count: basket.item_count(),
            created_at: basket.created_at(),
            updated_at: basket.updated_at(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub items: Vec<ItemResponse>,
    pub total: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Order> for OrderResponse {
    type Error = MoneyError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        let items = order
            .items()
            .iter()
            .map(ItemResponse::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: order.id(),
            items,
            total: order.total().amount(),
            currency: order.total().currency().to_string(),
            status: order.status().as_str().to_string(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, Quantity};

    use super::*;

    #[test]
    fn empty_basket_reports_default_currency() {
        let response = BasketResponse::try_from(&Basket::new()).unwrap();
        assert_eq!(response.total, 0);
        assert_eq!(response.currency, "USD");
        assert_eq!(response.item_count, 0);
        assert!(response.items.is_empty());
    }

    #[test]
    fn basket_response_carries_subtotals() {
        let mut basket = Basket::new();
        basket
            .add_item(
                ProductId::new(),
                Quantity::from(3),
                Money::new(250, "EUR").unwrap(),
            )
            .unwrap();

        let response = BasketResponse::try_from(&basket).unwrap();

        assert_eq!(response.items[0].subtotal, 750);
        assert_eq!(response.total, 750);
        assert_eq!(response.currency, "EUR");
        assert_eq!(response.item_count, 3);
    }

    #[test]
    fn order_response_serializes_status_name() {
        let mut basket = Basket::new();
        basket
            .add_item(
                ProductId::new(),
                Quantity::from(1),
                Money::new(100, "USD").unwrap(),
            )
            .unwrap();
        let order = Order::new(basket.items()).unwrap();

        let json = serde_json::to_value(OrderResponse::try_from(&order).unwrap()).unwrap();

        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["total"], 100);
        assert_eq!(json["id"], order.id().to_string());
    }

    #[test]
    fn create_request_description_is_optional() {
        let request: CreateProductRequest = serde_json::from_str(
            r#"{"name":"Widget","price":100,"currency":"USD","stock":-1}"#,
        )
        .unwrap();
        assert_eq!(request.description, "");
        assert_eq!(request.stock, -1);
    }
}
