//! Catalog maintenance API Handlers

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiResult, ok};
use crate::catalog::{CatalogExport, ImportReport, MigrationPreview, MigrationReport};
use crate::core::ServerState;

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositSetting {
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_per_glass: Decimal,
}

/// GET /api/catalog/deposit
pub async fn get_deposit(State(state): State<ServerState>) -> ApiResult<DepositSetting> {
    ok(DepositSetting {
        deposit_per_glass: state.catalog.deposit_per_glass()?,
    })
}

/// PUT /api/catalog/deposit - applies to carts started or cleared afterwards
pub async fn set_deposit(
    State(state): State<ServerState>,
    Json(payload): Json<DepositSetting>,
) -> ApiResult<DepositSetting> {
    ok(DepositSetting {
        deposit_per_glass: state
            .catalog
            .set_deposit_per_glass(payload.deposit_per_glass)?,
    })
}

/// GET /api/catalog/migration/umlauts - names the migration would change
pub async fn preview_migration(State(state): State<ServerState>) -> ApiResult<MigrationPreview> {
    ok(state.catalog.preview_umlaut_migration()?)
}

/// POST /api/catalog/migration/umlauts
pub async fn apply_migration(State(state): State<ServerState>) -> ApiResult<MigrationReport> {
    ok(state.catalog.apply_umlaut_migration()?)
}

/// GET /api/catalog/export
pub async fn export(State(state): State<ServerState>) -> ApiResult<CatalogExport> {
    ok(state.catalog.export()?)
}

/// POST /api/catalog/import - replaces the sections present in the document
///
/// Takes raw JSON so a malformed document is reported as an import error
/// instead of a generic body rejection.
pub async fn import(
    State(state): State<ServerState>,
    Json(doc): Json<Value>,
) -> ApiResult<ImportReport> {
    ok(state.catalog.import(doc)?)
}
