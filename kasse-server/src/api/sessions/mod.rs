//! Terminal Session API

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::start))
        .route("/{terminal_id}", get(handler::get).delete(handler::end))
        .route("/{terminal_id}/items", post(handler::add_product))
        .route(
            "/{terminal_id}/items/{product_id}",
            put(handler::set_quantity).delete(handler::remove_line),
        )
        .route(
            "/{terminal_id}/items/{product_id}/increment",
            post(handler::increment),
        )
        .route(
            "/{terminal_id}/items/{product_id}/decrement",
            post(handler::decrement),
        )
        .route("/{terminal_id}/deposit", put(handler::set_deposit))
        .route("/{terminal_id}/service", put(handler::set_service))
        .route("/{terminal_id}/table", put(handler::select_table))
        .route("/{terminal_id}/checkout", post(handler::checkout))
}
