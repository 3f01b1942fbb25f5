//! Receipt archive
//!
//! Every rendered receipt is kept with its text so it can be searched and
//! reprinted later. Archiving can be switched off; existing entries stay.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;
use shared::order::{Order, ServiceType};
use thiserror::Error;

use crate::catalog::fuzzy_includes;
use crate::db::{ARCHIVE, Storage, StorageError};
use crate::printing::{ReceiptMode, RenderedJob};

const ENABLED_SETTING_KEY: &str = "archive_enabled";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Receipt not found: {0}")]
    NotFound(String),
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        let message = err.to_string();
        match err {
            ArchiveError::Storage(e) => {
                tracing::error!(error = %e, "Archive storage failure");
                AppError::database(message)
            }
            ArchiveError::NotFound(id) => {
                AppError::with_message(ErrorCode::NotFound, message).with_detail("id", id)
            }
        }
    }
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// A printed receipt as it left the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedReceipt {
    pub id: String,
    pub order_id: String,
    pub printer_id: String,
    pub printer_name: String,
    pub role: Role,
    pub service_type: ServiceType,
    pub mode: ReceiptMode,
    pub table_name: Option<String>,
    pub togo_number: Option<u32>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ArchivedReceipt {
    pub fn from_job(order: &Order, job: &RenderedJob) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            printer_id: job.printer.id.clone(),
            printer_name: job.printer.display_name.clone(),
            role: order.role,
            service_type: order.service_type,
            mode: job.mode,
            table_name: order.table_name.clone(),
            togo_number: order.togo_number,
            text: job.text.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Filter for `GET /api/receipts`; dates are local business days, inclusive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub role: Option<Role>,
    #[serde(rename = "type")]
    pub service_type: Option<ServiceType>,
    /// Free text, matched umlaut-tolerant against text, order id and printer
    pub q: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    pub enabled: bool,
}

/// Receipt archive on the shared storage
#[derive(Debug, Clone)]
pub struct ReceiptArchive {
    storage: Storage,
    timezone: Tz,
}

impl ReceiptArchive {
    pub fn new(storage: Storage, timezone: Tz) -> Self {
        Self { storage, timezone }
    }

    pub fn settings(&self) -> ArchiveResult<ArchiveSettings> {
        let enabled: Option<bool> = self.storage.get_setting(ENABLED_SETTING_KEY)?;
        Ok(ArchiveSettings {
            enabled: enabled.unwrap_or(true),
        })
    }

    pub fn set_settings(&self, settings: ArchiveSettings) -> ArchiveResult<ArchiveSettings> {
        self.storage
            .set_setting(ENABLED_SETTING_KEY, &settings.enabled)?;
        tracing::info!(enabled = settings.enabled, "Receipt archive toggled");
        Ok(settings)
    }

    /// Store a receipt if archiving is on; returns whether it was stored
    pub fn record(&self, receipt: &ArchivedReceipt) -> ArchiveResult<bool> {
        if !self.settings()?.enabled {
            return Ok(false);
        }
        self.storage.put(ARCHIVE, &receipt.id, receipt)?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> ArchiveResult<ArchivedReceipt> {
        self.storage
            .get(ARCHIVE, id)?
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))
    }

    /// Matching receipts, newest first
    pub fn query(&self, query: &ReceiptQuery) -> ArchiveResult<Vec<ArchivedReceipt>> {
        let mut receipts: Vec<ArchivedReceipt> = self.storage.list(ARCHIVE)?;
        receipts.retain(|r| self.matches(r, query));
        receipts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(receipts)
    }

    fn matches(&self, receipt: &ArchivedReceipt, query: &ReceiptQuery) -> bool {
        let day = receipt.created_at.with_timezone(&self.timezone).date_naive();
        if query.from.is_some_and(|from| day < from) || query.to.is_some_and(|to| day > to) {
            return false;
        }
        if query.role.is_some_and(|role| role != receipt.role) {
            return false;
        }
        if query
            .service_type
            .is_some_and(|service_type| service_type != receipt.service_type)
        {
            return false;
        }
        match query.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                fuzzy_includes(&receipt.text, q)
                    || receipt.order_id.contains(q)
                    || fuzzy_includes(&receipt.printer_name, q)
            }
            _ => true,
        }
    }

    /// Delete every archived receipt, returns how many there were
    pub fn clear(&self) -> ArchiveResult<u64> {
        let removed = self.storage.clear(ARCHIVE)?;
        tracing::info!(removed, "Receipt archive cleared");
        Ok(removed)
    }
}
