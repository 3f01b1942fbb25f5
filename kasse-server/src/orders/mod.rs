//! Order lifecycle and table tabs
//!
//! - **manager**: [`OrdersManager`], the single authority that turns carts into
//!   orders, keeps table tabs and settles them
//! - **payment**: how a transaction is paid ([`Settlement`], [`Payment`]) and
//!   the pluggable card confirmation
//! - **summary**: daily figures over recorded orders
//!
//! # Lifecycle
//!
//! ```text
//! Building ──checkout──┬─ PayNow ────────────▶ Order { is_paid: true }
//!                      └─ DeferToTab ────────▶ Order { is_paid: false } ──▶ TableTab
//!                                                                           │
//!                                              settle_tab(payment) ◀────────┘
//!                                              every order marked paid, tab removed
//! ```
//!
//! Every mutation runs in one redb write transaction and is broadcast as an
//! [`OrderChange`] after commit.

pub mod manager;
pub mod payment;
pub mod summary;

pub use manager::{
    CheckoutRequest, ManagerError, ManagerResult, OrderChange, OrdersManager, TabSettlement,
};
pub use payment::{CardConfirmation, ManualConfirmation, Payment, Settlement};
pub use summary::DailySummary;
