//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Category, CategoryCreate, CategoryUpdate, Product};

use crate::api::{ApiResult, ok};
use crate::catalog::CategoryDeletion;
use crate::core::ServerState;

/// GET /api/categories
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<Category>> {
    ok(state.catalog.list_categories()?)
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Category> {
    ok(state.catalog.get_category(&id)?)
}

/// GET /api/categories/{id}/products
pub async fn list_products(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Product>> {
    state.catalog.get_category(&id)?;
    ok(state.catalog.list_products_in(&id)?)
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> ApiResult<Category> {
    ok(state.catalog.create_category(payload)?)
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> ApiResult<Category> {
    ok(state.catalog.update_category(&id, payload)?)
}

/// DELETE /api/categories/{id} - removes its products too
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<CategoryDeletion> {
    ok(state.catalog.delete_category(&id)?)
}
