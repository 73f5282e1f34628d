//! Basket endpoints.

use std::sync::Arc;

use application::dto::{AddItemRequest, BasketResponse, UpdateItemQuantityRequest};
use application::error::parse_id;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::state::{AppState, Store};

/// POST /api/v1/baskets
#[tracing::instrument(skip(state))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<(StatusCode, Json<BasketResponse>), ApiError> {
    let basket = state.baskets.create_basket().await?;
    Ok((StatusCode::CREATED, Json(basket)))
}

/// GET /api/v1/baskets/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BasketResponse>, ApiError> {
    Ok(Json(state.baskets.get_basket(parse_id(&id)?).await?))
}

/// DELETE /api/v1/baskets/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.baskets.delete_basket(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/baskets/{id}/items
#[tracing::instrument(skip(state, body))]
pub async fn add_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<BasketResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = body?;
    Ok(Json(state.baskets.add_item(id, request).await?))
}

/// DELETE /api/v1/baskets/{id}/items
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BasketResponse>, ApiError> {
    Ok(Json(state.baskets.clear_basket(parse_id(&id)?).await?))
}

/// PATCH /api/v1/baskets/{id}/items/{product_id}
#[tracing::instrument(skip(state, body))]
pub async fn update_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, product_id)): Path<(String, String)>,
    body: Result<Json<UpdateItemQuantityRequest>, JsonRejection>,
) -> Result<Json<BasketResponse>, ApiError> {
    let id = parse_id(&id)?;
    let product_id = parse_id(&product_id)?;
    let Json(request) = body?;
    let basket = state
        .baskets
        .update_item_quantity(id, product_id, request)
        .await?;
    Ok(Json(basket))
}

/// DELETE /api/v1/baskets/{id}/items/{product_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, product_id)): Path<(String, String)>,
) -> Result<Json<BasketResponse>, ApiError> {
    let id = parse_id(&id)?;
    let product_id = parse_id(&product_id)?;
    Ok(Json(state.baskets.remove_item(id, product_id).await?))
}
