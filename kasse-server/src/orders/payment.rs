//! Payment of a transaction

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::order::PaymentMethod;

use crate::pricing::{self, TenderError};

/// Payment handed over at checkout or tab settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payment {
    Cash {
        #[serde(with = "rust_decimal::serde::float")]
        amount_paid: Decimal,
    },
    /// `confirmed` is the operator's acknowledgement that the card terminal
    /// approved the amount
    Card {
        #[serde(default)]
        confirmed: bool,
    },
}

impl Payment {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Payment::Cash { .. } => PaymentMethod::Cash,
            Payment::Card { .. } => PaymentMethod::Card,
        }
    }
}

/// How a checkout is settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Paid on the spot
    PayNow(Payment),
    /// Booked on the selected table's tab, paid later
    DeferToTab,
}

/// Confirms a card payment before an order is recorded as paid
///
/// No terminal protocol is integrated; the default implementation trusts the
/// operator's acknowledgement.
pub trait CardConfirmation: Send + Sync {
    fn confirm(&self, amount: Decimal, operator_confirmed: bool) -> bool;
}

/// Card payments count as approved when the operator says so
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualConfirmation;

impl CardConfirmation for ManualConfirmation {
    fn confirm(&self, _amount: Decimal, operator_confirmed: bool) -> bool {
        operator_confirmed
    }
}

/// Payment fields recorded on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tendered {
    pub method: PaymentMethod,
    pub amount_paid: Option<Decimal>,
    pub change: Option<Decimal>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TenderFailure {
    Cash(TenderError),
    CardNotConfirmed,
}

/// Check a payment against the amount due
pub(crate) fn tender(
    payment: &Payment,
    required: Decimal,
    card: &dyn CardConfirmation,
) -> Result<Tendered, TenderFailure> {
    match payment {
        Payment::Cash { amount_paid } => {
            let change = pricing::cash_change(required, *amount_paid).map_err(TenderFailure::Cash)?;
            Ok(Tendered {
                method: PaymentMethod::Cash,
                amount_paid: Some(*amount_paid),
                change: Some(change),
            })
        }
        Payment::Card { confirmed } => {
            if !card.confirm(required, *confirmed) {
                return Err(TenderFailure::CardNotConfirmed);
            }
            Ok(Tendered {
                method: PaymentMethod::Card,
                amount_paid: None,
                change: None,
            })
        }
    }
}
