//! Core module - configuration, state, server and background tasks
//!
//! - [`Config`] - environment configuration
//! - [`ServerState`] - shared service handles
//! - [`Server`] - HTTP server
//! - [`ServerError`] - fatal server errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::{Config, VenueInfo};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::{CheckoutOutcome, ServerState};
pub use tasks::{BackgroundTasks, TaskKind};
