//! Catalog maintenance API: deposit setting, umlaut migration, import/export

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/catalog", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/deposit",
            get(handler::get_deposit).put(handler::set_deposit),
        )
        .route(
            "/migration/umlauts",
            get(handler::preview_migration).post(handler::apply_migration),
        )
        .route("/export", get(handler::export))
        .route("/import", post(handler::import))
}
