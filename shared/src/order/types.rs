//! Order enums shared between server and terminals

use serde::{Deserialize, Serialize};

// ============================================================================
// Service Type
// ============================================================================

/// Service type of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    /// Served at a table
    #[default]
    Service,
    /// Taken away, gets a ToGo number
    #[serde(rename = "TOGO")]
    ToGo,
}

// ============================================================================
// Payment
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    /// Label printed on receipts
    pub fn receipt_label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Bar",
            PaymentMethod::Card => "Karte",
        }
    }
}
