use crate::db::StorageError;
use crate::pricing::{CheckoutBlocked, TenderError};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use super::super::payment::TenderFailure;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Blocked(#[from] CheckoutBlocked),

    #[error(transparent)]
    Tender(#[from] TenderError),

    #[error("Card payment was not confirmed")]
    CardNotConfirmed,

    #[error("Only service orders with a table can be put on a tab")]
    DeferNotAllowed,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: u32 },

    #[error("Invalid price for product {0}")]
    InvalidPrice(String),

    #[error("Table not found or inactive: {0}")]
    TableNotFound(String),

    #[error("No open tab for table {0}")]
    TabNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

impl From<TenderFailure> for ManagerError {
    fn from(failure: TenderFailure) -> Self {
        match failure {
            TenderFailure::Cash(e) => ManagerError::Tender(e),
            TenderFailure::CardNotConfirmed => ManagerError::CardNotConfirmed,
        }
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        let message = err.to_string();
        match err {
            ManagerError::Storage(e) => {
                tracing::error!(error = %e, "Order storage failure");
                AppError::database(message)
            }
            ManagerError::Blocked(e) => e.into(),
            ManagerError::Tender(e) => e.into(),
            ManagerError::CardNotConfirmed => AppError::new(ErrorCode::CardNotConfirmed),
            ManagerError::DeferNotAllowed => {
                AppError::with_message(ErrorCode::DeferNotAllowed, message)
            }
            ManagerError::InvalidQuantity { product_id, .. } => {
                AppError::with_message(ErrorCode::InvalidQuantity, message)
                    .with_detail("product_id", product_id)
            }
            ManagerError::InvalidPrice(_) => AppError::with_message(ErrorCode::InvalidAmount, message),
            ManagerError::TableNotFound(id) => {
                AppError::with_message(ErrorCode::TableNotFound, message).with_detail("table_id", id)
            }
            ManagerError::TabNotFound(id) => {
                AppError::with_message(ErrorCode::TabNotFound, message).with_detail("table_id", id)
            }
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
