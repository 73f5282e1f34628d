//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = Arc::new(api::AppState::new(InMemoryStore::new()));
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_product(app: &axum::Router, price: i64, stock: i64) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/products",
        Some(json!({
            "name": "Widget",
            "description": "A widget",
            "price": price,
            "currency": "USD",
            "stock": stock
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn create_basket(app: &axum::Router) -> String {
    let (status, json) = send(app, "POST", "/api/v1/baskets", None).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_product_crud() {
    let app = setup();
    let id = create_product(&app, 1000, 5).await;

    let (status, json) = send(&app, "GET", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"], 1000);
    assert_eq!(json["currency"], "USD");
    assert_eq!(json["stock"], 5);

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/v1/products/{id}"),
        Some(json!({"name": "Gadget", "description": "", "price": 1500, "currency": "USD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Gadget");

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/api/v1/products/{id}/stock"),
        Some(json!({"stock": 12})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stock"], 12);

    let (status, json) = send(&app, "GET", "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(&app, "GET", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_invalid_product_is_bad_request() {
    let app = setup();

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/products",
        Some(json!({"name": "Widget", "price": -5, "currency": "USD", "stock": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/products")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/api/v1/orders/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("not-a-uuid"));
}

#[tokio::test]
async fn test_basket_flow() {
    let app = setup();
    let product_id = create_product(&app, 1000, 5).await;
    let basket_id = create_basket(&app).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/baskets/{basket_id}/items"),
        Some(json!({"product_id": product_id, "quantity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2000);
    assert_eq!(json["item_count"], 2);
    assert_eq!(json["items"][0]["subtotal"], 2000);

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/api/v1/baskets/{basket_id}/items/{product_id}"),
        Some(json!({"quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3000);

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/baskets/{basket_id}/items/{product_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/baskets/{basket_id}/items/{product_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/baskets/{basket_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/api/v1/baskets/{basket_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_basket() {
    let app = setup();
    let product_id = create_product(&app, 250, 10).await;
    let basket_id = create_basket(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/baskets/{basket_id}/items"),
        Some(json!({"product_id": product_id, "quantity": 4})),
    )
    .await;

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/baskets/{basket_id}/items"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);
    assert_eq!(json["currency"], "USD");
}

#[tokio::test]
async fn test_checkout_and_lifecycle() {
    let app = setup();
    let product_id = create_product(&app, 1000, 5).await;
    let basket_id = create_basket(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/baskets/{basket_id}/items"),
        Some(json!({"product_id": product_id, "quantity": 2})),
    )
    .await;

    let (status, order) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(json!({"basket_id": basket_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total"], 2000);
    let order_id = order["id"].as_str().unwrap().to_string();

    let (_, product) = send(&app, "GET", &format!("/api/v1/products/{product_id}"), None).await;
    assert_eq!(product["stock"], 3);
    let (_, basket) = send(&app, "GET", &format!("/api/v1/baskets/{basket_id}"), None).await;
    assert_eq!(basket["items"].as_array().unwrap().len(), 0);

    for (action, expected) in [
        ("confirm", "CONFIRMED"),
        ("ship", "SHIPPED"),
        ("deliver", "DELIVERED"),
    ] {
        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/v1/orders/{order_id}/{action}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], expected);
    }

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/orders/{order_id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = send(&app, "GET", "/api/v1/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_insufficient_stock() {
    let app = setup();
    let product_id = create_product(&app, 1000, 5).await;
    let basket_id = create_basket(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/baskets/{basket_id}/items"),
        Some(json!({"product_id": product_id, "quantity": 2})),
    )
    .await;
    send(
        &app,
        "PATCH",
        &format!("/api/v1/products/{product_id}/stock"),
        Some(json!({"stock": 1})),
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(json!({"basket_id": basket_id})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Insufficient stock"));
    let (_, product) = send(&app, "GET", &format!("/api/v1/products/{product_id}"), None).await;
    assert_eq!(product["stock"], 1);
}

#[tokio::test]
async fn test_checkout_unknown_basket_is_not_found() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(json!({"basket_id": "6f1c1f3e-5a49-4d6b-9a2e-0c7f6f3f2a10"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}
