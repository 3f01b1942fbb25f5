//! Daily figures (Tagesabschluss)

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::order::{Order, PaymentMethod};

/// Count and amount of one payment bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl Bucket {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.total += amount;
    }
}

/// Figures over all orders of one local business day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub order_count: u32,
    /// Sum of grand totals, deferred orders included
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub items_total: Decimal,
    /// Net deposit: issued minus returned glasses, in money
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_total: Decimal,
    pub cash: Bucket,
    pub card: Bucket,
    /// Orders still waiting on a table tab
    pub open: Bucket,
}

impl DailySummary {
    /// Summarize the orders whose creation time falls on `date` in `tz`
    pub fn from_orders<'a>(
        date: NaiveDate,
        tz: Tz,
        orders: impl IntoIterator<Item = &'a Order>,
    ) -> Self {
        let mut summary = Self {
            date,
            order_count: 0,
            revenue: Decimal::ZERO,
            items_total: Decimal::ZERO,
            deposit_total: Decimal::ZERO,
            cash: Bucket::default(),
            card: Bucket::default(),
            open: Bucket::default(),
        };

        for order in orders {
            if order.created_at.with_timezone(&tz).date_naive() != date {
                continue;
            }
            summary.order_count += 1;
            summary.revenue += order.grand_total;
            summary.items_total += order.items_total;
            summary.deposit_total += order.deposit_total;
            match (order.is_paid, order.payment_method) {
                (true, Some(PaymentMethod::Cash)) => summary.cash.add(order.grand_total),
                (true, Some(PaymentMethod::Card)) => summary.card.add(order.grand_total),
                _ => summary.open.add(order.grand_total),
            }
        }
        summary
    }
}
