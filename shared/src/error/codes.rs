//! Unified error codes
//!
//! Error codes are organized by range:
//! - 0xxx: General errors
//! - 4xxx: Order, cart and tab errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors (products, categories, printers, import)
//! - 7xxx: Table errors
//! - 8xxx: Printing errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as its `u16` value so terminals can switch on it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    Unknown = 1,
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    InvalidRequest = 5,
    InvalidFormat = 6,
    RequiredField = 7,
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    /// Nothing to check out: empty cart and zero deposit delta
    EmptyCheckout = 4002,
    /// Service order while active tables exist, but none selected
    TableRequired = 4003,
    /// Only service orders with a table may be deferred
    DeferNotAllowed = 4004,
    TabNotFound = 4005,
    InvalidQuantity = 4006,
    CartItemNotFound = 4007,
    SessionNotFound = 4008,

    // ==================== 5xxx: Payment ====================
    InsufficientCash = 5001,
    CardNotConfirmed = 5002,
    InvalidAmount = 5003,

    // ==================== 6xxx: Catalog ====================
    ProductNotFound = 6001,
    CategoryNotFound = 6002,
    PrinterNotFound = 6003,
    /// Import document failed validation, store untouched
    ImportInvalid = 6004,

    // ==================== 7xxx: Table ====================
    TableNotFound = 7001,
    TableHasOpenTab = 7002,

    // ==================== 8xxx: Printing ====================
    PrintFailed = 8001,
    PrintRelayUnavailable = 8002,
    NoPrinterConfigured = 8003,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::EmptyCheckout => "Cart is empty and no deposit is open",
            ErrorCode::TableRequired => "A table must be selected for service orders",
            ErrorCode::DeferNotAllowed => "Only service orders with a table can be deferred",
            ErrorCode::TabNotFound => "No open tab for this table",
            ErrorCode::InvalidQuantity => "Quantity is invalid",
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::SessionNotFound => "Terminal session not found",

            ErrorCode::InsufficientCash => "Amount received does not cover the total",
            ErrorCode::CardNotConfirmed => "Card payment was not confirmed",
            ErrorCode::InvalidAmount => "Amount is invalid",

            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::PrinterNotFound => "Printer not found",
            ErrorCode::ImportInvalid => "Import document is invalid",

            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableHasOpenTab => "Table has an open tab",

            ErrorCode::PrintFailed => "Printing failed",
            ErrorCode::PrintRelayUnavailable => "Print relay is unavailable",
            ErrorCode::NoPrinterConfigured => "No printer is configured",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Returned when a `u16` does not name a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            6 => ErrorCode::InvalidFormat,
            7 => ErrorCode::RequiredField,
            8 => ErrorCode::ValueOutOfRange,

            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::EmptyCheckout,
            4003 => ErrorCode::TableRequired,
            4004 => ErrorCode::DeferNotAllowed,
            4005 => ErrorCode::TabNotFound,
            4006 => ErrorCode::InvalidQuantity,
            4007 => ErrorCode::CartItemNotFound,
            4008 => ErrorCode::SessionNotFound,

            5001 => ErrorCode::InsufficientCash,
            5002 => ErrorCode::CardNotConfirmed,
            5003 => ErrorCode::InvalidAmount,

            6001 => ErrorCode::ProductNotFound,
            6002 => ErrorCode::CategoryNotFound,
            6003 => ErrorCode::PrinterNotFound,
            6004 => ErrorCode::ImportInvalid,

            7001 => ErrorCode::TableNotFound,
            7002 => ErrorCode::TableHasOpenTab,

            8001 => ErrorCode::PrintFailed,
            8002 => ErrorCode::PrintRelayUnavailable,
            8003 => ErrorCode::NoPrinterConfigured,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9003 => ErrorCode::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::EmptyCheckout.code(), 4002);
        assert_eq!(ErrorCode::InsufficientCash.code(), 5001);
        assert_eq!(ErrorCode::ImportInvalid.code(), 6004);
        assert_eq!(ErrorCode::TableHasOpenTab.code(), 7002);
        assert_eq!(ErrorCode::PrintFailed.code(), 8001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(4003), Ok(ErrorCode::TableRequired));
        assert_eq!(ErrorCode::try_from(8002), Ok(ErrorCode::PrintRelayUnavailable));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
        assert_eq!(InvalidErrorCode(1234).to_string(), "invalid error code: 1234");
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::TabNotFound).unwrap();
        assert_eq!(json, "4005");
        let back: ErrorCode = serde_json::from_str("5002").unwrap();
        assert_eq!(back, ErrorCode::CardNotConfirmed);
        assert!(serde_json::from_str::<ErrorCode>("4242").is_err());
    }

    #[test]
    fn test_every_code_roundtrips_through_u16() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::InvalidFormat,
            ErrorCode::SessionNotFound,
            ErrorCode::InvalidAmount,
            ErrorCode::PrinterNotFound,
            ErrorCode::TableNotFound,
            ErrorCode::NoPrinterConfigured,
            ErrorCode::ConfigError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(u16::from(code)), Ok(code));
        }
    }
}
