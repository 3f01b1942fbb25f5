//! Utilities
//!
//! - [`logger`]: tracing subscriber setup
//! - [`ok`]: wrap handler data in the [`ApiResponse`] envelope

pub mod logger;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

/// Handler result carrying the response envelope
pub type ApiResult<T> = AppResult<ApiResponse<T>>;

/// Successful response with data
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::success(data))
}
