//! HTTP API
//!
//! One router per resource, each under `/api/<resource>`:
//!
//! - [`health`] - liveness and print relay health
//! - [`sessions`] - terminal login, cart, deposit counters, checkout
//! - [`orders`] - order history and daily summary
//! - [`tabs`] - open table tabs and their settlement
//! - [`categories`], [`products`], [`tables`] - catalog records
//! - [`catalog`] - deposit setting, umlaut migration, import and export
//! - [`printers`] - printer registry and test pages
//! - [`receipts`] - receipt archive and reprints
//! - [`print_queue`] - retry queue inspection
//!
//! Every handler answers with the [`ApiResponse`](shared::error::ApiResponse)
//! envelope; errors are [`AppError`](shared::error::AppError)s.

pub mod catalog;
pub mod categories;
pub mod health;
pub mod orders;
pub mod print_queue;
pub mod printers;
pub mod products;
pub mod receipts;
pub mod sessions;
pub mod tables;
pub mod tabs;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub use crate::utils::{ApiResult, ok};

/// All routes, without middleware or state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(sessions::router())
        .merge(orders::router())
        .merge(tabs::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(tables::router())
        .merge(catalog::router())
        .merge(printers::router())
        .merge(receipts::router())
        .merge(print_queue::router())
}

/// The application with middleware and state, ready to serve
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
