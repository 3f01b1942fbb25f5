//! OrdersManager - the order and tab authority
//!
//! Every terminal goes through one manager. Each command runs inside a single
//! redb write transaction, and redb admits one writer at a time, so two
//! terminals settling the same tab or appending to it are serialized.
//!
//! # Checkout Flow
//!
//! ```text
//! checkout(req)
//!     ├─ 1. Validate lines (quantity, price)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Resolve table, check eligibility (empty cart, table required)
//!     ├─ 4. Price the cart
//!     ├─ 5. Tender payment, or check the tab is allowed
//!     ├─ 6. Assign ToGo number
//!     ├─ 7. Persist order (+ append to tab)
//!     ├─ 8. Commit transaction
//!     └─ 9. Broadcast change(s)
//! ```

mod error;
pub use error::*;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{DiningTable, Role};
use shared::money::MAX_AMOUNT;
use shared::order::{CartItem, DepositInfo, Order, PaymentMethod, ServiceType, TableTab};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::payment::{self, CardConfirmation, ManualConfirmation, Payment, Settlement};
use super::summary::DailySummary;
use crate::db::{DINING_TABLES, ORDERS, Storage, TABS};
use crate::pricing::{self, CheckoutContext, MAX_QUANTITY};

/// Change broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Everything needed to turn a cart into an order
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    pub deposit: DepositInfo,
    pub service_type: ServiceType,
    pub role: Role,
    pub table_id: Option<String>,
    pub settlement: Settlement,
}

/// Committed mutation, for subscribers that keep a view up to date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderChange {
    OrderCreated {
        order_id: String,
    },
    TabUpdated {
        table_id: String,
        #[serde(with = "rust_decimal::serde::float")]
        total_amount: Decimal,
    },
    TabSettled {
        table_id: String,
        order_ids: Vec<String>,
    },
}

/// Result of settling a table tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSettlement {
    pub table_id: String,
    pub table_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount_paid: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub change: Option<Decimal>,
    /// The settled orders, now paid
    pub orders: Vec<Order>,
}

/// OrdersManager for checkout and tab settlement
pub struct OrdersManager {
    storage: Storage,
    event_tx: broadcast::Sender<OrderChange>,
    card: Arc<dyn CardConfirmation>,
    /// Business time zone (ToGo day, daily summary)
    tz: Tz,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<Storage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("tz", &self.tz)
            .finish()
    }
}

impl OrdersManager {
    pub fn new(storage: Storage, tz: Tz) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            event_tx,
            card: Arc::new(ManualConfirmation),
            tz,
        }
    }

    /// Replace the card confirmation step (default: operator acknowledgement)
    pub fn with_card_confirmation(mut self, card: Arc<dyn CardConfirmation>) -> Self {
        self.card = card;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Subscribe to committed changes
    pub fn subscribe(&self) -> broadcast::Receiver<OrderChange> {
        self.event_tx.subscribe()
    }

    fn broadcast(&self, change: OrderChange) {
        // no subscribers is fine
        let _ = self.event_tx.send(change);
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    // ========== Commands ==========

    /// Record a cart as an order
    #[tracing::instrument(skip(self, req), fields(role = %req.role, service = ?req.service_type))]
    pub fn checkout(&self, req: CheckoutRequest) -> ManagerResult<Order> {
        validate_lines(&req.items)?;

        let txn = self.storage.begin_write()?;

        let tables: Vec<DiningTable> = self.storage.list_txn(&txn, DINING_TABLES)?;
        let active_tables_exist = tables.iter().any(|t| t.is_active);

        // ToGo orders never carry a table
        let table = match (&req.service_type, &req.table_id) {
            (ServiceType::Service, Some(id)) => Some(
                tables
                    .iter()
                    .find(|t| &t.id == id && t.is_active)
                    .cloned()
                    .ok_or_else(|| ManagerError::TableNotFound(id.clone()))?,
            ),
            _ => None,
        };

        pricing::check_checkout(
            &req.items,
            &req.deposit,
            CheckoutContext {
                service_type: req.service_type,
                table_selected: table.is_some(),
                active_tables_exist,
            },
        )?;

        let totals = pricing::price(&req.items, &req.deposit);

        let (tendered, deferred_table) = match &req.settlement {
            Settlement::PayNow(payment) => (
                Some(payment::tender(payment, totals.grand_total, self.card.as_ref())?),
                None,
            ),
            Settlement::DeferToTab => match (&req.service_type, &table) {
                (ServiceType::Service, Some(table)) => (None, Some(table.clone())),
                _ => return Err(ManagerError::DeferNotAllowed),
            },
        };

        let togo_number = match req.service_type {
            ServiceType::ToGo => Some(self.storage.next_togo_number(&txn, self.today())?),
            ServiceType::Service => None,
        };

        let now = Utc::now();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            items: req.items,
            deposit: req.deposit,
            service_type: req.service_type,
            payment_method: tendered.map(|t| t.method),
            items_total: totals.items_total,
            deposit_total: totals.deposit_total,
            grand_total: totals.grand_total,
            amount_paid: tendered.and_then(|t| t.amount_paid),
            change: tendered.and_then(|t| t.change),
            created_at: now,
            role: req.role,
            table_id: table.as_ref().map(|t| t.id.clone()),
            table_name: table.as_ref().map(|t| t.name.clone()),
            togo_number,
            is_paid: tendered.is_some(),
        };
        self.storage.put_txn(&txn, ORDERS, &order.id, &order)?;

        let tab = match deferred_table {
            Some(table) => Some(self.append_to_tab(&txn, &table, &order)?),
            None => None,
        };

        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            grand_total = %order.grand_total,
            paid = order.is_paid,
            togo_number = ?order.togo_number,
            "Order recorded"
        );

        self.broadcast(OrderChange::OrderCreated {
            order_id: order.id.clone(),
        });
        if let Some(tab) = tab {
            self.broadcast(OrderChange::TabUpdated {
                table_id: tab.table_id,
                total_amount: tab.total_amount,
            });
        }

        Ok(order)
    }

    fn append_to_tab(
        &self,
        txn: &WriteTransaction,
        table: &DiningTable,
        order: &Order,
    ) -> ManagerResult<TableTab> {
        let mut tab = self
            .storage
            .get_txn::<TableTab>(txn, TABS, &table.id)?
            .unwrap_or_else(|| TableTab::open(table.id.clone(), table.name.clone(), order.created_at));
        tab.append(order.id.clone(), order.grand_total, order.created_at);
        self.storage.put_txn(txn, TABS, &table.id, &tab)?;
        Ok(tab)
    }

    /// Pay a table tab in full
    ///
    /// Insufficient cash or an unconfirmed card leaves the tab and its orders
    /// untouched.
    #[tracing::instrument(skip(self, payment), fields(method = ?payment.method()))]
    pub fn settle_tab(&self, table_id: &str, payment: &Payment) -> ManagerResult<TabSettlement> {
        let txn = self.storage.begin_write()?;

        let tab: TableTab = self
            .storage
            .get_txn(&txn, TABS, table_id)?
            .ok_or_else(|| ManagerError::TabNotFound(table_id.to_string()))?;

        let tendered = payment::tender(payment, tab.total_amount, self.card.as_ref())?;

        let mut orders = Vec::with_capacity(tab.order_ids.len());
        for order_id in &tab.order_ids {
            let mut order: Order = self
                .storage
                .get_txn(&txn, ORDERS, order_id)?
                .ok_or_else(|| ManagerError::OrderNotFound(order_id.clone()))?;
            order.mark_paid(tendered.method, tendered.amount_paid, tendered.change);
            self.storage.put_txn(&txn, ORDERS, order_id, &order)?;
            orders.push(order);
        }
        self.storage.remove_txn(&txn, TABS, table_id)?;

        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            table_id,
            total = %tab.total_amount,
            orders = orders.len(),
            "Tab settled"
        );
        self.broadcast(OrderChange::TabSettled {
            table_id: tab.table_id.clone(),
            order_ids: tab.order_ids.clone(),
        });

        Ok(TabSettlement {
            table_id: tab.table_id,
            table_name: tab.table_name,
            total_amount: tab.total_amount,
            method: tendered.method,
            amount_paid: tendered.amount_paid,
            change: tendered.change,
            orders,
        })
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.storage
            .get(ORDERS, order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// All orders, newest first
    pub fn list_orders(&self) -> ManagerResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.storage.list(ORDERS)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Open tabs, oldest first
    pub fn open_tabs(&self) -> ManagerResult<Vec<TableTab>> {
        let mut tabs: Vec<TableTab> = self.storage.list(TABS)?;
        tabs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tabs)
    }

    pub fn get_tab(&self, table_id: &str) -> ManagerResult<TableTab> {
        self.storage
            .get(TABS, table_id)?
            .ok_or_else(|| ManagerError::TabNotFound(table_id.to_string()))
    }

    /// Orders of an open tab, in the order they were booked
    pub fn tab_orders(&self, table_id: &str) -> ManagerResult<Vec<Order>> {
        let tab = self.get_tab(table_id)?;
        tab.order_ids.iter().map(|id| self.get_order(id)).collect()
    }

    pub fn has_open_tab(&self, table_id: &str) -> ManagerResult<bool> {
        Ok(self.storage.get::<TableTab>(TABS, table_id)?.is_some())
    }

    pub fn daily_summary(&self, date: Option<NaiveDate>) -> ManagerResult<DailySummary> {
        let date = date.unwrap_or_else(|| self.today());
        let orders: Vec<Order> = self.storage.list(ORDERS)?;
        Ok(DailySummary::from_orders(date, self.tz, &orders))
    }
}

fn validate_lines(items: &[CartItem]) -> ManagerResult<()> {
    for item in items {
        if item.quantity == 0 || item.quantity > MAX_QUANTITY {
            return Err(ManagerError::InvalidQuantity {
                product_id: item.product.id.clone(),
                quantity: item.quantity,
            });
        }
        if item.product.price.is_sign_negative() || item.product.price > MAX_AMOUNT {
            return Err(ManagerError::InvalidPrice(item.product.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
