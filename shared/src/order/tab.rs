//! Table tab

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unpaid orders of one table, settled together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableTab {
    pub table_id: String,
    pub table_name: String,
    /// Ids of the deferred orders, in creation order
    pub order_ids: Vec<String>,
    /// Sum of the grand totals of those orders
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableTab {
    pub fn open(table_id: String, table_name: String, now: DateTime<Utc>) -> Self {
        Self {
            table_id,
            table_name,
            order_ids: Vec::new(),
            total_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn append(&mut self, order_id: String, grand_total: Decimal, now: DateTime<Utc>) {
        self.order_ids.push(order_id);
        self.total_amount += grand_total;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_total() {
        let now = Utc::now();
        let mut tab = TableTab::open("t5".into(), "5".into(), now);
        tab.append("a".into(), Decimal::new(1250, 2), now);
        tab.append("b".into(), Decimal::new(800, 2), now);
        assert_eq!(tab.order_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(tab.total_amount, Decimal::new(2050, 2));
    }
}
