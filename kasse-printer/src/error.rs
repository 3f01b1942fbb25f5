//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The relay answered, but not with success
    #[error("Relay rejected job ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Printer or relay is offline or reports itself unhealthy
    #[error("Printer offline: {0}")]
    Offline(String),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for PrintError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PrintError::Timeout(e.to_string())
        } else if e.is_connect() {
            PrintError::Connection(e.to_string())
        } else {
            PrintError::Offline(e.to_string())
        }
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
