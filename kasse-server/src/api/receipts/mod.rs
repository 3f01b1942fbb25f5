//! Receipt Archive API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/receipts", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::query).delete(handler::clear))
        .route(
            "/settings",
            get(handler::get_settings).put(handler::set_settings),
        )
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/reprint", post(handler::reprint))
}
