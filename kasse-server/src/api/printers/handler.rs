//! Printer Registry API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::models::{Printer, PrinterCreate, PrinterUpdate};

use crate::api::{ApiResult, ok};
use crate::catalog::PrinterDeletion;
use crate::core::ServerState;
use crate::printing::PrinterStatus;

/// GET /api/printers
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<Printer>> {
    ok(state.catalog.list_printers()?)
}

/// GET /api/printers/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Printer> {
    ok(state.catalog.get_printer(&id)?)
}

/// POST /api/printers
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PrinterCreate>,
) -> ApiResult<Printer> {
    ok(state.catalog.create_printer(payload)?)
}

/// PUT /api/printers/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PrinterUpdate>,
) -> ApiResult<Printer> {
    ok(state.catalog.update_printer(&id, payload)?)
}

/// DELETE /api/printers/{id} - categories routed to it fall back to the default
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<PrinterDeletion> {
    ok(state.catalog.delete_printer(&id)?)
}

#[derive(Debug, Serialize)]
pub struct TestPrintQueued {
    pub job_id: String,
}

/// POST /api/printers/{id}/test - queue a test page
pub async fn test_print(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<TestPrintQueued> {
    let job_id = state.printing.test_print(&id)?;
    ok(TestPrintQueued { job_id })
}

/// GET /api/printers/{id}/status - is the printer reachable right now
pub async fn status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<PrinterStatus> {
    ok(state.printing.printer_status(&id).await?)
}
