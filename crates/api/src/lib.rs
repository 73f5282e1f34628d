//! HTTP API server with observability for the shop backend.
//!
//! Provides REST endpoints for the catalog, baskets and orders under
//! `/api/v1`, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, Store};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/products",
            post(routes::products::create::<S>).get(routes::products::list::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        .route(
            "/products/{id}/stock",
            patch(routes::products::update_stock::<S>),
        )
        .route("/baskets", post(routes::baskets::create::<S>))
        .route(
            "/baskets/{id}",
            get(routes::baskets::get::<S>).delete(routes::baskets::delete::<S>),
        )
        .route(
            "/baskets/{id}/items",
            post(routes::baskets::add_item::<S>).delete(routes::baskets::clear::<S>),
        )
        .route(
            "/baskets/{id}/items/{product_id}",
            patch(routes::baskets::update_item::<S>).delete(routes::baskets::remove_item::<S>),
        )
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/confirm", post(routes::orders::confirm::<S>))
        .route("/orders/{id}/ship", post(routes::orders::ship::<S>))
        .route("/orders/{id}/deliver", post(routes::orders::deliver::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api/v1", api)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
