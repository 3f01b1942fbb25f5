//! Catalog and configuration models
//!
//! Shared between kasse-server and terminals (via API). IDs are strings so
//! catalog exports stay stable across installations.

pub mod category;
pub mod dining_table;
pub mod printer;
pub mod product;
pub mod role;

// Re-exports
pub use category::*;
pub use dining_table::*;
pub use printer::*;
pub use product::*;
pub use role::*;

pub(crate) fn default_true() -> bool {
    true
}
