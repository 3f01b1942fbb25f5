//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};

use crate::api::{ApiResult, ok};
use crate::core::ServerState;

/// GET /api/tables
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<DiningTable>> {
    ok(state.catalog.list_tables()?)
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<DiningTable> {
    ok(state.catalog.get_table(&id)?)
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> ApiResult<DiningTable> {
    ok(state.catalog.create_table(payload)?)
}

/// PUT /api/tables/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<DiningTableUpdate>,
) -> ApiResult<DiningTable> {
    ok(state.catalog.update_table(&id, payload)?)
}

/// DELETE /api/tables/{id} - rejected while the table has an open tab
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    state.catalog.delete_table(&id)?;
    ok(true)
}
