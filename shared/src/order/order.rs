//! Immutable order record

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartItem, DepositInfo};
use super::types::{PaymentMethod, ServiceType};
use crate::models::Role;

/// A priced, persisted transaction
///
/// Never mutated after creation, except for the payment fields which a tab
/// settlement sets exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// UUID v4
    pub id: String,
    pub items: Vec<CartItem>,
    pub deposit: DepositInfo,
    pub service_type: ServiceType,
    /// Absent while the order waits on a table tab
    pub payment_method: Option<PaymentMethod>,
    #[serde(with = "rust_decimal::serde::float")]
    pub items_total: Decimal,
    /// Signed: returned glasses make it negative
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount_paid: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub change: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub role: Role,
    pub table_id: Option<String>,
    pub table_name: Option<String>,
    /// Daily pickup number of ToGo orders
    pub togo_number: Option<u32>,
    pub is_paid: bool,
}

impl Order {
    /// Deferred to a table tab and not settled yet
    pub fn is_open(&self) -> bool {
        !self.is_paid
    }

    /// Record the settlement of the tab this order belongs to
    pub fn mark_paid(
        &mut self,
        method: PaymentMethod,
        amount_paid: Option<Decimal>,
        change: Option<Decimal>,
    ) {
        self.is_paid = true;
        self.payment_method = Some(method);
        self.amount_paid = amount_paid;
        self.change = change;
    }
}
