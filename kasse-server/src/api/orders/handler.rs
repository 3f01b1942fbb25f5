//! Order API Handlers

use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::order::{Order, PaymentMethod, ServiceType};
use shared::models::Role;

use crate::api::{ApiResult, ok};
use crate::core::ServerState;
use crate::orders::DailySummary;
use crate::printing::DispatchOutcome;

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    /// Local business day
    pub date: Option<NaiveDate>,
    pub role: Option<Role>,
    #[serde(rename = "type")]
    pub service_type: Option<ServiceType>,
    pub method: Option<PaymentMethod>,
    pub paid: Option<bool>,
}

/// GET /api/orders - newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Vec<Order>> {
    let tz = state.orders.timezone();
    let mut orders = state.orders.list_orders()?;
    orders.retain(|o| {
        query
            .date
            .is_none_or(|d| o.created_at.with_timezone(&tz).date_naive() == d)
            && query.role.is_none_or(|r| o.role == r)
            && query.service_type.is_none_or(|t| o.service_type == t)
            && query.method.is_none_or(|m| o.payment_method == Some(m))
            && query.paid.is_none_or(|p| o.is_paid == p)
    });
    ok(orders)
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    ok(state.orders.get_order(&id)?)
}

/// POST /api/orders/{id}/print - print an order again on its routed printers
pub async fn print(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<DispatchOutcome> {
    let order = state.orders.get_order(&id)?;
    ok(state.printing.print_order(&order).await?)
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub date: Option<NaiveDate>,
}

/// GET /api/orders/summary?date=YYYY-MM-DD - today when absent
pub async fn summary(
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<DailySummary> {
    ok(state.orders.daily_summary(query.date)?)
}

#[derive(Debug, Serialize)]
pub struct QueuedPrint {
    pub job_id: String,
}

/// POST /api/orders/summary/print?date=YYYY-MM-DD - queue the daily report
pub async fn print_summary(
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<QueuedPrint> {
    let summary = state.orders.daily_summary(query.date)?;
    let job_id = state.printing.print_daily_summary(&summary)?;
    ok(QueuedPrint { job_id })
}
