//! Unified error system
//!
//! - [`ErrorCode`]: standardized numeric codes, grouped by range
//! - [`ErrorKind`]: how a caller should react (fix input, wait for state, retry I/O)
//! - [`AppError`]: code + message + optional details
//! - [`ApiResponse`]: the JSON envelope every endpoint answers with
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorKind};
//!
//! let err = AppError::new(ErrorCode::InsufficientCash).with_detail("required", "12.50");
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::{ErrorCategory, ErrorKind};
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
