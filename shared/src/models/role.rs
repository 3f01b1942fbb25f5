//! Terminal role

use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::CategoryType;

/// Role a terminal is logged in with
///
/// Decides which categories are offered and which printers receive receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Bar,
    Food,
    Combined,
    Admin,
}

impl Role {
    /// Role used for printer routing. Admin terminals print like combined ones.
    pub fn print_role(self) -> Role {
        match self {
            Role::Admin => Role::Combined,
            other => other,
        }
    }

    /// Label printed in the receipt header
    pub fn receipt_label(self) -> &'static str {
        match self.print_role() {
            Role::Bar => "Bar",
            Role::Food => "Essen",
            _ => "Komplett",
        }
    }

    /// Whether terminals of this role offer products of the given category type
    pub fn sells(self, category_type: CategoryType) -> bool {
        match self {
            Role::Bar => category_type == CategoryType::Drinks,
            Role::Food => category_type == CategoryType::Food,
            Role::Combined | Role::Admin => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Bar => "bar",
            Role::Food => "food",
            Role::Combined => "combined",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
