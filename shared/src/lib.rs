//! Shared types for the Festkasse workspace
//!
//! Used by `kasse-server` and by terminals talking to it.

pub mod error;
pub mod models;
pub mod money;
pub mod order;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode, ErrorKind};
pub use serde::{Deserialize, Serialize};
