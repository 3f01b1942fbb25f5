//! Order API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/summary", get(handler::summary))
        .route("/summary/print", post(handler::print_summary))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/print", post(handler::print))
}
