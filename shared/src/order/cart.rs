//! Cart line and deposit counters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Product;

/// One cart line: a product snapshot and how many of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    /// Always >= 1 while the line exists
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    /// Unit price x quantity, unrounded
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Glass deposit (Pfand) counters of a transaction
///
/// `deposit_value` is the per-glass amount frozen when the cart was started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositInfo {
    pub new_deposits: u32,
    pub returned_deposits: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_value: Decimal,
}

impl DepositInfo {
    pub fn new(deposit_value: Decimal) -> Self {
        Self {
            new_deposits: 0,
            returned_deposits: 0,
            deposit_value,
        }
    }

    /// Either counter is nonzero
    pub fn has_activity(&self) -> bool {
        self.new_deposits > 0 || self.returned_deposits > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_is_exact() {
        let item = CartItem {
            product: Product {
                id: "p".into(),
                name: "Wasser".into(),
                price: Decimal::new(110, 2),
                category_id: "c".into(),
                sort_order: 0,
                has_deposit: false,
                image_url: None,
            },
            quantity: 3,
        };
        assert_eq!(item.line_total(), Decimal::new(330, 2));
    }

    #[test]
    fn deposit_activity() {
        let mut d = DepositInfo::new(Decimal::TWO);
        assert!(!d.has_activity());
        d.returned_deposits = 1;
        assert!(d.has_activity());
    }
}
