//! Table Tab API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::order::{Order, TableTab};

use crate::api::{ApiResult, ok};
use crate::core::ServerState;
use crate::orders::{Payment, TabSettlement};

/// GET /api/tabs - open tabs, oldest first
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<TableTab>> {
    ok(state.orders.open_tabs()?)
}

#[derive(Debug, Serialize)]
pub struct TabDetail {
    #[serde(flatten)]
    pub tab: TableTab,
    pub orders: Vec<Order>,
}

/// GET /api/tabs/{table_id} - tab with its orders
pub async fn get_by_table(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
) -> ApiResult<TabDetail> {
    let tab = state.orders.get_tab(&table_id)?;
    let orders = state.orders.tab_orders(&table_id)?;
    ok(TabDetail { tab, orders })
}

/// POST /api/tabs/{table_id}/settle - pay the whole tab
pub async fn settle(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
    Json(payment): Json<Payment>,
) -> ApiResult<TabSettlement> {
    ok(state.orders.settle_tab(&table_id, &payment)?)
}
