//! Health API Handlers

use axum::extract::State;
use kasse_printer::RelayHealth;
use serde::Serialize;

use crate::api::{ApiResult, ok};
use crate::core::ServerState;
use crate::printing::RoutingMode;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub routing_mode: RoutingMode,
    pub relay_configured: bool,
    pub open_tabs: usize,
}

/// GET /api/health - server liveness
pub async fn health(State(state): State<ServerState>) -> ApiResult<HealthStatus> {
    let open_tabs = state.orders.open_tabs()?.len();
    ok(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        routing_mode: state.printing.routing_mode(),
        relay_configured: state.config.print_relay_url.is_some(),
        open_tabs,
    })
}

/// GET /api/health/relay - print relay reachability
pub async fn relay(State(state): State<ServerState>) -> ApiResult<RelayHealth> {
    ok(state.printing.relay_health().await?)
}
