//! Error classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category, derived from the code range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 0xxx
    General,
    /// 4xxx
    Order,
    /// 5xxx
    Payment,
    /// 6xxx
    Catalog,
    /// 7xxx
    Table,
    /// 8xxx
    Printing,
    /// 9xxx and anything unassigned
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            4000..5000 => Self::Order,
            5000..6000 => Self::Payment,
            6000..7000 => Self::Catalog,
            7000..8000 => Self::Table,
            8000..9000 => Self::Printing,
            _ => Self::System,
        }
    }
}

/// How a caller should react to an error
///
/// - `Validation`: the input is wrong, fix it and retry
/// - `Precondition`: the state does not allow the operation yet
/// - `TransientIo`: an outside device or service failed, the same call may succeed later
/// - `DataFormat`: a document could not be parsed or failed structural checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Precondition,
    NotFound,
    Conflict,
    TransientIo,
    DataFormat,
    Internal,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::EmptyCheckout
            | Self::InvalidQuantity
            | Self::InsufficientCash
            | Self::CardNotConfirmed
            | Self::InvalidAmount => ErrorKind::Validation,

            Self::TableRequired | Self::DeferNotAllowed | Self::TableHasOpenTab => {
                ErrorKind::Precondition
            }

            Self::NotFound
            | Self::OrderNotFound
            | Self::TabNotFound
            | Self::CartItemNotFound
            | Self::SessionNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::PrinterNotFound
            | Self::TableNotFound => ErrorKind::NotFound,

            Self::AlreadyExists => ErrorKind::Conflict,

            Self::InvalidFormat | Self::ImportInvalid => ErrorKind::DataFormat,

            Self::PrintFailed | Self::PrintRelayUnavailable | Self::NoPrinterConfigured => {
                ErrorKind::TransientIo
            }

            Self::Success
            | Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => ErrorKind::Internal,
        }
    }
}
