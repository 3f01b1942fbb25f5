//! Festkasse server
//!
//! The coordinating process of a festival point of sale: terminals keep
//! their carts here, check out against one order and tab authority, and
//! every order is routed to the venue's receipt printers.
//!
//! # Modules
//!
//! ```text
//! kasse-server/src/
//! ├── core/       # config, state, server, background tasks
//! ├── api/        # HTTP routers and handlers
//! ├── db/         # redb document store
//! ├── pricing/    # totals, deposit delta, checkout eligibility
//! ├── session.rs  # per-terminal carts
//! ├── orders/     # orders, table tabs, daily summary
//! ├── catalog/    # categories, products, tables, printers, import/export
//! ├── printing/   # routing, receipts, dispatch, retry queue
//! ├── archive.rs  # printed receipt archive
//! └── utils/      # logging, response helpers
//! ```

pub mod api;
pub mod archive;
pub mod catalog;
pub mod core;
pub mod db;
pub mod orders;
pub mod pricing;
pub mod printing;
pub mod session;
pub mod utils;

pub use crate::core::{Config, Server, ServerState};
pub use orders::OrdersManager;
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Make sure the work directory exists and start logging
pub fn setup_environment(config: &Config) -> std::io::Result<()> {
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    if let Some(dir) = config.log_dir.as_deref() {
        match cleanup_old_logs(dir, 14) {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Old log files removed"),
            Err(e) => tracing::warn!(error = %e, "Log cleanup failed"),
        }
    }
    Ok(())
}
