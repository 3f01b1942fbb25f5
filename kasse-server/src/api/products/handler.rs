//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Product, ProductCreate, ProductUpdate};

use crate::api::{ApiResult, ok};
use crate::core::ServerState;

/// GET /api/products
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<Product>> {
    ok(state.catalog.list_products()?)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/products/search?q= - umlaut-tolerant name search
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<Product>> {
    ok(state.catalog.search_products(&query.q)?)
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    ok(state.catalog.get_product(&id)?)
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> ApiResult<Product> {
    ok(state.catalog.create_product(payload)?)
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    ok(state.catalog.update_product(&id, payload)?)
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    state.catalog.delete_product(&id)?;
    ok(true)
}
