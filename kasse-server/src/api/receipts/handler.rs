//! Receipt Archive API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;

use crate::api::{ApiResult, ok};
use crate::archive::{ArchiveSettings, ArchivedReceipt, ReceiptQuery};
use crate::core::ServerState;

/// GET /api/receipts?from&to&role&type&q - newest first
pub async fn query(
    State(state): State<ServerState>,
    Query(query): Query<ReceiptQuery>,
) -> ApiResult<Vec<ArchivedReceipt>> {
    ok(state.printing.archive().query(&query)?)
}

/// GET /api/receipts/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<ArchivedReceipt> {
    ok(state.printing.archive().get(&id)?)
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub removed: u64,
}

/// DELETE /api/receipts - empty the archive
pub async fn clear(State(state): State<ServerState>) -> ApiResult<Cleared> {
    ok(Cleared {
        removed: state.printing.archive().clear()?,
    })
}

#[derive(Debug, Serialize)]
pub struct ReprintQueued {
    pub job_id: String,
}

/// POST /api/receipts/{id}/reprint - queue the stored text again
pub async fn reprint(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<ReprintQueued> {
    let job_id = state.printing.reprint(&id)?;
    ok(ReprintQueued { job_id })
}

/// GET /api/receipts/settings
pub async fn get_settings(State(state): State<ServerState>) -> ApiResult<ArchiveSettings> {
    ok(state.printing.archive().settings()?)
}

/// PUT /api/receipts/settings
pub async fn set_settings(
    State(state): State<ServerState>,
    Json(payload): Json<ArchiveSettings>,
) -> ApiResult<ArchiveSettings> {
    ok(state.printing.archive().set_settings(payload)?)
}
