//! Print Queue API Handlers

use axum::extract::{Path, State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};

use crate::api::{ApiResult, ok};
use crate::core::ServerState;
use crate::printing::QueuedJob;

fn job_not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::NotFound, format!("Print job not found: {id}"))
        .with_detail("id", id.to_string())
}

/// GET /api/print-queue
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<QueuedJob>> {
    ok(state.printing.queue().jobs())
}

/// GET /api/print-queue/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<QueuedJob> {
    state
        .printing
        .queue()
        .get(&id)
        .ok_or_else(|| job_not_found(&id))
        .and_then(ok)
}

/// POST /api/print-queue/{id}/cancel - only pending jobs
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<QueuedJob> {
    let queue = state.printing.queue();
    let job = queue.get(&id).ok_or_else(|| job_not_found(&id))?;
    if !queue.cancel(&id) {
        return Err(AppError::with_message(
            ErrorCode::InvalidRequest,
            format!("Job {id} is {:?} and cannot be cancelled", job.status),
        ));
    }
    ok(job)
}

/// POST /api/print-queue/{id}/retry - only failed jobs
pub async fn retry(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<QueuedJob> {
    let queue = state.printing.queue();
    let job = queue.get(&id).ok_or_else(|| job_not_found(&id))?;
    if !queue.retry(&id) {
        return Err(AppError::with_message(
            ErrorCode::InvalidRequest,
            format!("Job {id} is {:?} and cannot be retried", job.status),
        ));
    }
    queue.get(&id).ok_or_else(|| job_not_found(&id)).and_then(ok)
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub removed: usize,
}

/// DELETE /api/print-queue/finished - drop succeeded and failed jobs
pub async fn clear_finished(State(state): State<ServerState>) -> ApiResult<Cleared> {
    ok(Cleared {
        removed: state.printing.queue().clear_completed(),
    })
}
