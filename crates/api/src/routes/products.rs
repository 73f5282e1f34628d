//! Catalog endpoints.

use std::sync::Arc;

use application::dto::{
    CreateProductRequest, ProductResponse, UpdateProductRequest, UpdateStockRequest,
};
use application::error::parse_id;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::state::{AppState, Store};

/// POST /api/v1/products
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(request) = body?;
    let product = state.products.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/v1/products
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    Ok(Json(state.products.list_products().await?))
}

/// GET /api/v1/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.products.get_product(parse_id(&id)?).await?;
    Ok(Json(product))
}

/// PUT /api/v1/products/{id}
#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = body?;
    Ok(Json(state.products.update_product(id, request).await?))
}

/// PATCH /api/v1/products/{id}/stock
#[tracing::instrument(skip(state, body))]
pub async fn update_stock<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStockRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = body?;
    Ok(Json(state.products.update_stock(id, request).await?))
}

/// DELETE /api/v1/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.products.delete_product(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
