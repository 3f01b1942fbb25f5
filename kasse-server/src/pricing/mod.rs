//! Pricing and deposit engine
//!
//! Pure functions over a cart and its deposit counters. Everything stays an
//! exact `Decimal`; rounding to cents happens only when a value is printed or
//! displayed (see [`shared::money`]).
//!
//! ```text
//! items_total   = Σ price × quantity
//! deposit_delta = (new − returned) × deposit_value      (may be negative)
//! grand_total   = items_total + deposit_delta
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::money::MAX_AMOUNT;
use shared::order::{CartItem, DepositInfo, ServiceType};
use thiserror::Error;

/// Largest quantity a single cart line may hold
pub const MAX_QUANTITY: u32 = 9999;

/// Sum of price × quantity over all lines
pub fn items_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// Signed deposit amount: issued glasses cost, returned glasses credit
pub fn deposit_delta(deposit: &DepositInfo) -> Decimal {
    let net = i64::from(deposit.new_deposits) - i64::from(deposit.returned_deposits);
    Decimal::from(net) * deposit.deposit_value
}

/// Totals of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub items_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

pub fn price(items: &[CartItem], deposit: &DepositInfo) -> PriceBreakdown {
    let items_total = items_total(items);
    let deposit_total = deposit_delta(deposit);
    PriceBreakdown {
        items_total,
        deposit_total,
        grand_total: items_total + deposit_total,
    }
}

// ============================================================================
// Checkout eligibility
// ============================================================================

/// Facts about the venue and the session that decide whether checkout is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutContext {
    pub service_type: ServiceType,
    pub table_selected: bool,
    pub active_tables_exist: bool,
}

/// Why a checkout is not offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutBlocked {
    #[error("Nothing to check out: the cart is empty and the deposit is balanced")]
    EmptyTransaction,

    #[error("Service orders need a table while tables are active")]
    TableRequired,
}

impl From<CheckoutBlocked> for AppError {
    fn from(err: CheckoutBlocked) -> Self {
        let code = match err {
            CheckoutBlocked::EmptyTransaction => ErrorCode::EmptyCheckout,
            CheckoutBlocked::TableRequired => ErrorCode::TableRequired,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Checkout is allowed iff something is being sold or the deposit moves, and
/// a service order names a table whenever active tables exist.
pub fn check_checkout(
    items: &[CartItem],
    deposit: &DepositInfo,
    ctx: CheckoutContext,
) -> Result<(), CheckoutBlocked> {
    if items.is_empty() && deposit_delta(deposit).is_zero() {
        return Err(CheckoutBlocked::EmptyTransaction);
    }
    if ctx.service_type == ServiceType::Service && ctx.active_tables_exist && !ctx.table_selected {
        return Err(CheckoutBlocked::TableRequired);
    }
    Ok(())
}

pub fn can_checkout(items: &[CartItem], deposit: &DepositInfo, ctx: CheckoutContext) -> bool {
    check_checkout(items, deposit, ctx).is_ok()
}

// ============================================================================
// Cash
// ============================================================================

/// Rejected tender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TenderError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Cash {given} does not cover {required}")]
    InsufficientCash { required: Decimal, given: Decimal },
}

impl From<TenderError> for AppError {
    fn from(err: TenderError) -> Self {
        match err {
            TenderError::InvalidAmount(amount) => {
                AppError::with_message(ErrorCode::InvalidAmount, err.to_string())
                    .with_detail("amount", amount.to_string())
            }
            TenderError::InsufficientCash { required, given } => {
                AppError::with_message(ErrorCode::InsufficientCash, err.to_string())
                    .with_detail("required", required.to_string())
                    .with_detail("given", given.to_string())
            }
        }
    }
}

/// Change for a cash payment of `amount_paid` against `required`
///
/// A negative `required` (more glasses returned than bought) is paid out in
/// full, so any non-negative tender is accepted for it.
pub fn cash_change(required: Decimal, amount_paid: Decimal) -> Result<Decimal, TenderError> {
    if amount_paid.is_sign_negative() || amount_paid > MAX_AMOUNT {
        return Err(TenderError::InvalidAmount(amount_paid));
    }
    if amount_paid < required {
        return Err(TenderError::InsufficientCash {
            required,
            given: amount_paid,
        });
    }
    Ok(amount_paid - required)
}
