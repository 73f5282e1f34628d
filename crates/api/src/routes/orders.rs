//! Checkout and order lifecycle endpoints.

use std::sync::Arc;

use application::dto::{CheckoutRequest, OrderResponse};
use application::error::parse_id;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::state::{AppState, Store};

/// POST /api/v1/orders: check out a basket into a new order.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(request) = body?;
    let order = state.orders.checkout(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/v1/orders
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /api/v1/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(state.orders.get_order(parse_id(&id)?).await?))
}

/// POST /api/v1/orders/{id}/confirm
#[tracing::instrument(skip(state))]
pub async fn confirm<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(state.orders.confirm_order(parse_id(&id)?).await?))
}

/// POST /api/v1/orders/{id}/ship
#[tracing::instrument(skip(state))]
pub async fn ship<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(state.orders.ship_order(parse_id(&id)?).await?))
}

/// POST /api/v1/orders/{id}/deliver
#[tracing::instrument(skip(state))]
pub async fn deliver<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(state.orders.deliver_order(parse_id(&id)?).await?))
}

/// POST /api/v1/orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(state.orders.cancel_order(parse_id(&id)?).await?))
}
