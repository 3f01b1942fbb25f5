//! Terminal Session API Handlers
//!
//! Every cart mutation answers with the whole session view so a terminal
//! can redraw from one response.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;
use shared::order::ServiceType;

use crate::api::{ApiResult, ok};
use crate::core::{CheckoutOutcome, ServerState};
use crate::orders::{Payment, Settlement};
use crate::pricing::PriceBreakdown;
use crate::session::{SessionResult, TerminalSession};

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: TerminalSession,
    pub totals: PriceBreakdown,
    pub can_checkout: bool,
}

fn view(state: &ServerState, session: TerminalSession) -> ApiResult<SessionView> {
    let active_tables = state.catalog.has_active_tables()?;
    ok(SessionView {
        totals: session.totals(),
        can_checkout: session.can_checkout(active_tables),
        session,
    })
}

fn mutate<F>(state: &ServerState, terminal_id: &str, f: F) -> ApiResult<SessionView>
where
    F: FnOnce(&mut TerminalSession) -> SessionResult<()>,
{
    let session = state.sessions.update(terminal_id, f)?;
    view(state, session)
}

#[derive(Debug, Deserialize)]
pub struct StartSession {
    pub terminal_id: String,
    pub role: Role,
}

/// POST /api/sessions - log a terminal in with a role
pub async fn start(
    State(state): State<ServerState>,
    Json(payload): Json<StartSession>,
) -> ApiResult<SessionView> {
    let terminal_id = payload.terminal_id.trim();
    if terminal_id.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "terminal_id is required",
        ));
    }
    let deposit = state.catalog.deposit_per_glass()?;
    let session = state.sessions.start(terminal_id, payload.role, deposit);
    view(&state, session)
}

/// GET /api/sessions
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<TerminalSession>> {
    ok(state.sessions.list())
}

/// GET /api/sessions/{terminal_id}
pub async fn get(
    State(state): State<ServerState>,
    Path(terminal_id): Path<String>,
) -> ApiResult<SessionView> {
    let session = state.sessions.get(&terminal_id)?;
    view(&state, session)
}

/// DELETE /api/sessions/{terminal_id} - log out, the cart is discarded
pub async fn end(
    State(state): State<ServerState>,
    Path(terminal_id): Path<String>,
) -> ApiResult<bool> {
    ok(state.sessions.end(&terminal_id).is_some())
}

#[derive(Debug, Deserialize)]
pub struct AddProduct {
    pub product_id: String,
}

/// POST /api/sessions/{terminal_id}/items - product tile tap
pub async fn add_product(
    State(state): State<ServerState>,
    Path(terminal_id): Path<String>,
    Json(payload): Json<AddProduct>,
) -> ApiResult<SessionView> {
    let (product, category) = state.catalog.product_with_category(&payload.product_id)?;
    mutate(&state, &terminal_id, |s| s.add_product(&product, &category))
}

/// POST /api/sessions/{terminal_id}/items/{product_id}/increment
pub async fn increment(
    State(state): State<ServerState>,
    Path((terminal_id, product_id)): Path<(String, String)>,
) -> ApiResult<SessionView> {
    mutate(&state, &terminal_id, |s| {
        s.increment_line_quantity(&product_id).map(|_| ())
    })
}

/// POST /api/sessions/{terminal_id}/items/{product_id}/decrement
pub async fn decrement(
    State(state): State<ServerState>,
    Path((terminal_id, product_id)): Path<(String, String)>,
) -> ApiResult<SessionView> {
    mutate(&state, &terminal_id, |s| {
        s.decrement_line_quantity(&product_id).map(|_| ())
    })
}

#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: u32,
}

/// PUT /api/sessions/{terminal_id}/items/{product_id} - 0 removes the line
pub async fn set_quantity(
    State(state): State<ServerState>,
    Path((terminal_id, product_id)): Path<(String, String)>,
    Json(payload): Json<SetQuantity>,
) -> ApiResult<SessionView> {
    mutate(&state, &terminal_id, |s| {
        s.set_line_quantity(&product_id, payload.quantity)
    })
}

/// DELETE /api/sessions/{terminal_id}/items/{product_id}
pub async fn remove_line(
    State(state): State<ServerState>,
    Path((terminal_id, product_id)): Path<(String, String)>,
) -> ApiResult<SessionView> {
    mutate(&state, &terminal_id, |s| s.remove_line(&product_id))
}

#[derive(Debug, Deserialize)]
pub struct SetDeposit {
    pub new_deposits: Option<u32>,
    pub returned_deposits: Option<u32>,
}

/// PUT /api/sessions/{terminal_id}/deposit - manual glass counters
pub async fn set_deposit(
    State(state): State<ServerState>,
    Path(terminal_id): Path<String>,
    Json(payload): Json<SetDeposit>,
) -> ApiResult<SessionView> {
    mutate(&state, &terminal_id, |s| {
        if let Some(count) = payload.new_deposits {
            s.set_new_deposits(count)?;
        }
        if let Some(count) = payload.returned_deposits {
            s.set_returned_deposits(count)?;
        }
        Ok(())
    })
}

#[derive(Debug, Deserialize)]
pub struct SetService {
    pub service_type: ServiceType,
}

/// PUT /api/sessions/{terminal_id}/service
pub async fn set_service(
    State(state): State<ServerState>,
    Path(terminal_id): Path<String>,
    Json(payload): Json<SetService>,
) -> ApiResult<SessionView> {
    mutate(&state, &terminal_id, |s| {
        s.set_service_type(payload.service_type);
        Ok(())
    })
}

#[derive(Debug, Deserialize)]
pub struct SelectTable {
    pub table_id: Option<String>,
}

/// PUT /api/sessions/{terminal_id}/table - `null` clears the selection
pub async fn select_table(
    State(state): State<ServerState>,
    Path(terminal_id): Path<String>,
    Json(payload): Json<SelectTable>,
) -> ApiResult<SessionView> {
    if let Some(table_id) = payload.table_id.as_deref() {
        let table = state.catalog.get_table(table_id)?;
        if !table.is_active {
            return Err(AppError::with_message(
                ErrorCode::TableNotFound,
                format!("Table {} is not active", table.name),
            )
            .with_detail("table_id", table.id));
        }
    }
    mutate(&state, &terminal_id, |s| {
        s.select_table(payload.table_id);
        Ok(())
    })
}

/// How the cart is settled
#[derive(Debug, Deserialize)]
#[serde(tag = "settlement", rename_all = "snake_case")]
pub enum CheckoutBody {
    PayNow { payment: Payment },
    DeferToTab,
}

/// POST /api/sessions/{terminal_id}/checkout
///
/// Records the order, clears the cart and prints. Print failures are part of
/// the successful response.
pub async fn checkout(
    State(state): State<ServerState>,
    Path(terminal_id): Path<String>,
    Json(payload): Json<CheckoutBody>,
) -> ApiResult<CheckoutOutcome> {
    let settlement = match payload {
        CheckoutBody::PayNow { payment } => Settlement::PayNow(payment),
        CheckoutBody::DeferToTab => Settlement::DeferToTab,
    };
    ok(state.checkout(&terminal_id, settlement).await?)
}
