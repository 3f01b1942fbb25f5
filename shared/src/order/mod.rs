//! Order types
//!
//! - [`CartItem`] / [`DepositInfo`]: the transient state of a terminal session
//! - [`Order`]: immutable priced record created at checkout
//! - [`TableTab`]: unpaid orders collected per table until settlement

pub mod cart;
pub mod order;
pub mod tab;
pub mod types;

// Re-exports
pub use cart::{CartItem, DepositInfo};
pub use order::Order;
pub use tab::TableTab;
pub use types::*;
