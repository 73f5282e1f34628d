//! Service-level tests against the in-memory store.

use application::dto::{
    AddItemRequest, CheckoutRequest, CreateProductRequest, UpdateItemQuantityRequest,
    UpdateProductRequest, UpdateStockRequest,
};
use application::{BasketService, ErrorKind, OrderService, ProductService, ServiceError};
use common::{BasketId, OrderId, ProductId};
use store::InMemoryStore;

struct Services {
    store: InMemoryStore,
    products: ProductService<InMemoryStore>,
    baskets: BasketService<InMemoryStore>,
    orders: OrderService<InMemoryStore>,
}

fn services() -> Services {
    let store = InMemoryStore::new();
    Services {
        products: ProductService::new(store.clone()),
        baskets: BasketService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        store,
    }
}

fn create_request(name: &str, price: i64, stock: i64) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: format!("{name} description"),
        price,
        currency: "USD".to_string(),
        stock,
    }
}

fn add(product_id: ProductId, quantity: i64) -> AddItemRequest {
    AddItemRequest {
        product_id: product_id.to_string(),
        quantity,
    }
}

fn checkout(basket_id: BasketId) -> CheckoutRequest {
    CheckoutRequest {
        basket_id: basket_id.to_string(),
    }
}

async fn stock_of(s: &Services, id: ProductId) -> u32 {
    s.products.get_product(id).await.unwrap().stock
}

#[tokio::test]
async fn create_and_update_product() {
    let s = services();
    let created = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    assert_eq!(created.price, 1000);
    assert_eq!(created.currency, "USD");
    assert_eq!(created.stock, 5);

    let updated = s
        .products
        .update_product(
            created.id,
            UpdateProductRequest {
                name: "Gadget".to_string(),
                description: String::new(),
                price: 1500,
                currency: "EUR".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Gadget");
    assert_eq!(updated.price, 1500);
    assert_eq!(updated.currency, "EUR");
    assert!(updated.updated_at >= created.updated_at);

    let restocked = s
        .products
        .update_stock(created.id, UpdateStockRequest { stock: 9 })
        .await
        .unwrap();
    assert_eq!(restocked.stock, 9);
}

#[tokio::test]
async fn invalid_product_requests_are_validation_errors() {
    let s = services();

    let blank = s.products.create_product(create_request("  ", 100, 1)).await;
    assert_eq!(blank.unwrap_err().kind(), ErrorKind::Validation);

    let negative_price = s.products.create_product(create_request("A", -1, 1)).await;
    assert_eq!(negative_price.unwrap_err().kind(), ErrorKind::Validation);

    let negative_stock = s.products.create_product(create_request("A", 1, -1)).await;
    assert_eq!(negative_stock.unwrap_err().kind(), ErrorKind::Validation);

    let mut no_currency = create_request("A", 1, 1);
    no_currency.currency = String::new();
    let result = s.products.create_product(no_currency).await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);

    assert!(s.products.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_product_is_not_found() {
    let s = services();
    let id = ProductId::new();

    let err = s.products.delete_product(id).await.unwrap_err();

    assert!(matches!(err, ServiceError::ProductNotFound(missing) if missing == id));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_product_removes_it() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 100, 1))
        .await
        .unwrap();

    s.products.delete_product(product.id).await.unwrap();

    let err = s.products.get_product(product.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn adding_items_totals_the_basket() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();

    let basket = s
        .baskets
        .add_item(basket.id, add(product.id, 2))
        .await
        .unwrap();

    assert_eq!(basket.total, 2000);
    assert_eq!(basket.item_count, 2);
    assert_eq!(basket.currency, "USD");
    assert_eq!(basket.items.len(), 1);
    assert_eq!(basket.items[0].subtotal, 2000);
}

#[tokio::test]
async fn adding_more_than_stock_is_rejected() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 1))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();

    let err = s
        .baskets
        .add_item(basket.id, add(product.id, 2))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(s.baskets.get_basket(basket.id).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn add_item_validates_request() {
    let s = services();
    let basket = s.baskets.create_basket().await.unwrap();

    let zero = s.baskets.add_item(basket.id, add(ProductId::new(), 0)).await;
    assert_eq!(zero.unwrap_err().kind(), ErrorKind::Validation);

    let bad_id = s
        .baskets
        .add_item(
            basket.id,
            AddItemRequest {
                product_id: "nope".to_string(),
                quantity: 1,
            },
        )
        .await;
    assert_eq!(bad_id.unwrap_err().kind(), ErrorKind::Validation);

    let missing = s.baskets.add_item(basket.id, add(ProductId::new(), 1)).await;
    assert!(matches!(missing, Err(ServiceError::ProductNotFound(_))));

    let no_basket = s.baskets.add_item(BasketId::new(), add(ProductId::new(), 1)).await;
    assert!(matches!(no_basket, Err(ServiceError::BasketNotFound(_))));
}

#[tokio::test]
async fn update_quantity_keeps_price_and_zero_removes() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 10))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(product.id, 1))
        .await
        .unwrap();

    s.products
        .update_product(
            product.id,
            UpdateProductRequest {
                name: "Widget".to_string(),
                description: String::new(),
                price: 1200,
                currency: "USD".to_string(),
            },
        )
        .await
        .unwrap();

    let updated = s
        .baskets
        .update_item_quantity(basket.id, product.id, UpdateItemQuantityRequest { quantity: 3 })
        .await
        .unwrap();
    assert_eq!(updated.items[0].price, 1000);
    assert_eq!(updated.total, 3000);

    let too_many = s
        .baskets
        .update_item_quantity(basket.id, product.id, UpdateItemQuantityRequest { quantity: 11 })
        .await;
    assert!(matches!(too_many, Err(ServiceError::InsufficientStock { .. })));

    let negative = s
        .baskets
        .update_item_quantity(basket.id, product.id, UpdateItemQuantityRequest { quantity: -1 })
        .await;
    assert_eq!(negative.unwrap_err().kind(), ErrorKind::Validation);

    let removed = s
        .baskets
        .update_item_quantity(basket.id, product.id, UpdateItemQuantityRequest { quantity: 0 })
        .await
        .unwrap();
    assert!(removed.items.is_empty());
}

#[tokio::test]
async fn removing_absent_item_is_a_conflict() {
    let s = services();
    let basket = s.baskets.create_basket().await.unwrap();

    let err = s
        .baskets
        .remove_item(basket.id, ProductId::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn clear_and_delete_basket() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 100, 10))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(product.id, 4))
        .await
        .unwrap();

    let cleared = s.baskets.clear_basket(basket.id).await.unwrap();
    assert!(cleared.items.is_empty());
    assert_eq!(cleared.total, 0);

    s.baskets.delete_basket(basket.id).await.unwrap();
    let err = s.baskets.get_basket(basket.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::BasketNotFound(_)));

    let again = s.baskets.delete_basket(basket.id).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn checkout_places_order_and_reduces_stock() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(product.id, 2))
        .await
        .unwrap();

    let order = s.orders.checkout(checkout(basket.id)).await.unwrap();

    assert_eq!(order.status, "PENDING");
    assert_eq!(order.total, 2000);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(stock_of(&s, product.id).await, 3);
    assert!(s.baskets.get_basket(basket.id).await.unwrap().items.is_empty());
    assert_eq!(s.orders.get_order(order.id).await.unwrap(), order);
}

#[tokio::test]
async fn checkout_with_short_stock_changes_nothing() {
    let s = services();
    let plenty = s
        .products
        .create_product(create_request("Plenty", 500, 5))
        .await
        .unwrap();
    let scarce = s
        .products
        .create_product(create_request("Scarce", 700, 5))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(plenty.id, 2))
        .await
        .unwrap();
    s.baskets
        .add_item(basket.id, add(scarce.id, 2))
        .await
        .unwrap();
    s.products
        .update_stock(scarce.id, UpdateStockRequest { stock: 1 })
        .await
        .unwrap();
    let before = s.baskets.get_basket(basket.id).await.unwrap();

    let err = s.orders.checkout(checkout(basket.id)).await.unwrap_err();

    match err {
        ServiceError::InsufficientStock {
            product_id,
            ref product_name,
            requested,
            available,
        } => {
            assert_eq!(product_id, scarce.id);
            assert_eq!(product_name, "Scarce");
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }
    assert_eq!(stock_of(&s, plenty.id).await, 5);
    assert_eq!(stock_of(&s, scarce.id).await, 1);
    assert_eq!(s.baskets.get_basket(basket.id).await.unwrap(), before);
    assert!(s.orders.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_order_write_rolls_back_stock() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(product.id, 2))
        .await
        .unwrap();
    s.store.set_fail_order_writes(true);

    let err = s.orders.checkout(checkout(basket.id)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(stock_of(&s, product.id).await, 5);
    assert_eq!(s.baskets.get_basket(basket.id).await.unwrap().item_count, 2);
    assert_eq!(s.store.order_count().await, 0);
}

#[tokio::test]
async fn checkout_rejects_empty_and_unknown_baskets() {
    let s = services();
    let basket = s.baskets.create_basket().await.unwrap();

    let empty = s.orders.checkout(checkout(basket.id)).await.unwrap_err();
    assert!(matches!(empty, ServiceError::EmptyBasket));
    assert_eq!(empty.kind(), ErrorKind::Conflict);

    let unknown = s.orders.checkout(checkout(BasketId::new())).await.unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::NotFound);

    let malformed = s
        .orders
        .checkout(CheckoutRequest {
            basket_id: "basket-1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(malformed.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn checkout_of_deleted_product_is_not_found() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(product.id, 1))
        .await
        .unwrap();
    s.products.delete_product(product.id).await.unwrap();

    let err = s.orders.checkout(checkout(basket.id)).await.unwrap_err();

    assert!(matches!(err, ServiceError::ProductNotFound(id) if id == product.id));
    assert_eq!(s.baskets.get_basket(basket.id).await.unwrap().item_count, 1);
}

#[tokio::test]
async fn order_lifecycle_through_delivery() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(product.id, 1))
        .await
        .unwrap();
    let order = s.orders.checkout(checkout(basket.id)).await.unwrap();

    assert_eq!(s.orders.confirm_order(order.id).await.unwrap().status, "CONFIRMED");
    assert_eq!(s.orders.ship_order(order.id).await.unwrap().status, "SHIPPED");
    assert_eq!(s.orders.deliver_order(order.id).await.unwrap().status, "DELIVERED");

    let err = s.orders.cancel_order(order.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(s.orders.get_order(order.id).await.unwrap().status, "DELIVERED");
}

#[tokio::test]
async fn invalid_transitions_are_conflicts() {
    let s = services();
    let product = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(product.id, 1))
        .await
        .unwrap();
    let order = s.orders.checkout(checkout(basket.id)).await.unwrap();

    let err = s.orders.ship_order(order.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let cancelled = s.orders.cancel_order(order.id).await.unwrap();
    assert_eq!(cancelled.status, "CANCELLED");
    let again = s.orders.cancel_order(order.id).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Conflict);

    let missing = s.orders.confirm_order(OrderId::new()).await.unwrap_err();
    assert!(matches!(missing, ServiceError::OrderNotFound(_)));
}

#[tokio::test]
async fn mixed_currency_add_leaves_basket_unchanged() {
    let s = services();
    let dollars = s
        .products
        .create_product(create_request("Widget", 1000, 5))
        .await
        .unwrap();
    let mut euro_request = create_request("Gadget", 800, 5);
    euro_request.currency = "EUR".to_string();
    let euros = s.products.create_product(euro_request).await.unwrap();
    let basket = s.baskets.create_basket().await.unwrap();
    s.baskets
        .add_item(basket.id, add(dollars.id, 1))
        .await
        .unwrap();

    let err = s
        .baskets
        .add_item(basket.id, add(euros.id, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let stored = s.baskets.get_basket(basket.id).await.unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].product_id, dollars.id);
    assert_eq!(stored.total, 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_sell_last_unit_once() {
    const BUYERS: usize = 8;
    let s = services();
    let product = s
        .products
        .create_product(create_request("Last one", 500, 1))
        .await
        .unwrap();
    let mut baskets = Vec::with_capacity(BUYERS);
    for _ in 0..BUYERS {
        let basket = s.baskets.create_basket().await.unwrap();
        s.baskets
            .add_item(basket.id, add(product.id, 1))
            .await
            .unwrap();
        baskets.push(basket.id);
    }

    let orders = std::sync::Arc::new(OrderService::new(s.store.clone()));
    let handles: Vec<_> = baskets
        .into_iter()
        .map(|basket_id| {
            let orders = orders.clone();
            tokio::spawn(async move { orders.checkout(checkout(basket_id)).await })
        })
        .collect();

    let mut placed = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(ServiceError::InsufficientStock { available: 0, .. }) => short += 1,
            Err(other) => panic!("unexpected checkout error: {other}"),
        }
    }

    assert_eq!(placed, 1);
    assert_eq!(short, BUYERS - 1);
    assert_eq!(stock_of(&s, product.id).await, 0);
    assert_eq!(s.store.order_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossing_baskets_check_out_concurrently() {
    const PAIRS: usize = 5;
    let s = services();
    let first = s
        .products
        .create_product(create_request("First", 100, PAIRS as i64 * 2))
        .await
        .unwrap();
    let second = s
        .products
        .create_product(create_request("Second", 200, PAIRS as i64 * 2))
        .await
        .unwrap();

    let mut baskets = Vec::new();
    for i in 0..PAIRS * 2 {
        let (a, b) = if i % 2 == 0 {
            (first.id, second.id)
        } else {
            (second.id, first.id)
        };
        let basket = s.baskets.create_basket().await.unwrap();
        s.baskets.add_item(basket.id, add(a, 1)).await.unwrap();
        s.baskets.add_item(basket.id, add(b, 1)).await.unwrap();
        baskets.push(basket.id);
    }

    let orders = std::sync::Arc::new(OrderService::new(s.store.clone()));
    let handles: Vec<_> = baskets
        .into_iter()
        .map(|basket_id| {
            let orders = orders.clone();
            tokio::spawn(async move { orders.checkout(checkout(basket_id)).await })
        })
        .collect();
    for handle in handles {
        let order = handle.await.unwrap().unwrap();
        assert_eq!(order.total, 300);
    }

    assert_eq!(stock_of(&s, first.id).await, 0);
    assert_eq!(stock_of(&s, second.id).await, 0);
}
