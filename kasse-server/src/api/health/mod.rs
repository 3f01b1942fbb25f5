//! Health API

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/health", get(handler::health))
        .route("/api/health/relay", get(handler::relay))
}
