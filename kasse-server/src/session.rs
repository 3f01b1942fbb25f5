//! Terminal sessions
//!
//! A session is the transient cart of one logged-in terminal: cart lines,
//! deposit counters, service type and table selection. Sessions live in
//! memory only. Checkout turns a session into a durable [`Order`] and clears
//! it; logout drops it.
//!
//! Tapping a product tile ([`TerminalSession::add_product`]) issues a glass
//! for deposit products. The quantity stepper and line removal never touch the
//! deposit counters; the operator adjusts those explicitly.
//!
//! [`Order`]: shared::order::Order

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Category, Product, Role};
use shared::order::{CartItem, DepositInfo, ServiceType};
use thiserror::Error;

use crate::orders::{CheckoutRequest, Settlement};
use crate::pricing::{self, CheckoutContext, MAX_QUANTITY, PriceBreakdown};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No session for terminal {0}")]
    NotFound(String),

    #[error("Product {0} is not in the cart")]
    LineNotFound(String),

    #[error("Quantity must be between 1 and {max}, got {0}", max = MAX_QUANTITY)]
    InvalidQuantity(u32),

    #[error("Deposit count must be at most {max}, got {0}", max = MAX_QUANTITY)]
    InvalidDepositCount(u32),

    #[error("Role {role} does not sell products of category {category}")]
    NotOffered { role: Role, category: String },
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let code = match &err {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::LineNotFound(_) => ErrorCode::CartItemNotFound,
            SessionError::InvalidQuantity(_) | SessionError::InvalidDepositCount(_) => {
                ErrorCode::InvalidQuantity
            }
            SessionError::NotOffered { .. } => ErrorCode::ValidationFailed,
        };
        AppError::with_message(code, err.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Cart and deposit state of one terminal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalSession {
    pub terminal_id: String,
    pub role: Role,
    /// Unique by product id, in the order lines were first added
    pub items: Vec<CartItem>,
    pub deposit: DepositInfo,
    pub service_type: ServiceType,
    pub table_id: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl TerminalSession {
    /// `deposit_value` is frozen into the cart until it is cleared
    pub fn new(terminal_id: impl Into<String>, role: Role, deposit_value: Decimal) -> Self {
        Self {
            terminal_id: terminal_id.into(),
            role,
            items: Vec::new(),
            deposit: DepositInfo::new(deposit_value),
            service_type: ServiceType::Service,
            table_id: None,
            started_at: Utc::now(),
        }
    }

    fn line_mut(&mut self, product_id: &str) -> SessionResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product.id == product_id)
            .ok_or_else(|| SessionError::LineNotFound(product_id.to_string()))
    }

    fn check_quantity(quantity: u32) -> SessionResult<()> {
        if quantity == 0 || quantity > MAX_QUANTITY {
            return Err(SessionError::InvalidQuantity(quantity));
        }
        Ok(())
    }

    // ========== Product tile ==========

    /// Add one unit of `product`: a new line with quantity 1 or the existing
    /// line bumped by one. Deposit products also issue one glass.
    pub fn add_product(&mut self, product: &Product, category: &Category) -> SessionResult<()> {
        if !self.role.sells(category.category_type) {
            return Err(SessionError::NotOffered {
                role: self.role,
                category: category.name.clone(),
            });
        }

        match self.items.iter_mut().find(|i| i.product.id == product.id) {
            Some(line) => {
                Self::check_quantity(line.quantity + 1)?;
                line.quantity += 1;
            }
            None => self.items.push(CartItem::new(product.clone())),
        }

        if product.has_deposit {
            self.deposit.new_deposits += 1;
        }
        Ok(())
    }

    // ========== Quantity stepper (deposit untouched) ==========

    pub fn increment_line_quantity(&mut self, product_id: &str) -> SessionResult<u32> {
        let line = self.line_mut(product_id)?;
        Self::check_quantity(line.quantity + 1)?;
        line.quantity += 1;
        Ok(line.quantity)
    }

    /// Returns the remaining quantity; at 0 the line is gone
    pub fn decrement_line_quantity(&mut self, product_id: &str) -> SessionResult<u32> {
        let line = self.line_mut(product_id)?;
        line.quantity -= 1;
        let remaining = line.quantity;
        if remaining == 0 {
            self.items.retain(|i| i.product.id != product_id);
        }
        Ok(remaining)
    }

    /// Quantity 0 removes the line
    pub fn set_line_quantity(&mut self, product_id: &str, quantity: u32) -> SessionResult<()> {
        if quantity == 0 {
            return self.remove_line(product_id);
        }
        Self::check_quantity(quantity)?;
        self.line_mut(product_id)?.quantity = quantity;
        Ok(())
    }

    pub fn remove_line(&mut self, product_id: &str) -> SessionResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product.id != product_id);
        if self.items.len() == before {
            return Err(SessionError::LineNotFound(product_id.to_string()));
        }
        Ok(())
    }

    // ========== Deposit counters ==========

    pub fn set_new_deposits(&mut self, count: u32) -> SessionResult<()> {
        if count > MAX_QUANTITY {
            return Err(SessionError::InvalidDepositCount(count));
        }
        self.deposit.new_deposits = count;
        Ok(())
    }

    pub fn set_returned_deposits(&mut self, count: u32) -> SessionResult<()> {
        if count > MAX_QUANTITY {
            return Err(SessionError::InvalidDepositCount(count));
        }
        self.deposit.returned_deposits = count;
        Ok(())
    }

    // ========== Service ==========

    /// ToGo orders never belong to a table, so switching to ToGo drops the selection
    pub fn set_service_type(&mut self, service_type: ServiceType) {
        self.service_type = service_type;
        if service_type == ServiceType::ToGo {
            self.table_id = None;
        }
    }

    pub fn select_table(&mut self, table_id: Option<String>) {
        self.table_id = table_id;
    }

    // ========== Derived ==========

    pub fn totals(&self) -> PriceBreakdown {
        pricing::price(&self.items, &self.deposit)
    }

    pub fn can_checkout(&self, active_tables_exist: bool) -> bool {
        pricing::can_checkout(
            &self.items,
            &self.deposit,
            CheckoutContext {
                service_type: self.service_type,
                table_selected: self.table_id.is_some(),
                active_tables_exist,
            },
        )
    }

    pub fn checkout_request(&self, settlement: Settlement) -> CheckoutRequest {
        CheckoutRequest {
            items: self.items.clone(),
            deposit: self.deposit.clone(),
            service_type: self.service_type,
            role: self.role,
            table_id: self.table_id.clone(),
            settlement,
        }
    }

    /// Empty the cart after checkout, freezing the current deposit value
    pub fn clear(&mut self, deposit_value: Decimal) {
        self.items.clear();
        self.deposit = DepositInfo::new(deposit_value);
        self.table_id = None;
    }
}

/// Sessions keyed by terminal id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, TerminalSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a terminal in, replacing any previous session of it
    pub fn start(&self, terminal_id: &str, role: Role, deposit_value: Decimal) -> TerminalSession {
        let session = TerminalSession::new(terminal_id, role, deposit_value);
        self.sessions
            .insert(terminal_id.to_string(), session.clone());
        tracing::info!(terminal_id, role = %role, "Terminal session started");
        session
    }

    /// Log a terminal out; its cart is discarded
    pub fn end(&self, terminal_id: &str) -> Option<TerminalSession> {
        let removed = self.sessions.remove(terminal_id).map(|(_, s)| s);
        if removed.is_some() {
            tracing::info!(terminal_id, "Terminal session ended");
        }
        removed
    }

    pub fn get(&self, terminal_id: &str) -> SessionResult<TerminalSession> {
        self.sessions
            .get(terminal_id)
            .map(|s| s.clone())
            .ok_or_else(|| SessionError::NotFound(terminal_id.to_string()))
    }

    pub fn list(&self) -> Vec<TerminalSession> {
        let mut all: Vec<_> = self.sessions.iter().map(|s| s.clone()).collect();
        all.sort_by(|a, b| a.terminal_id.cmp(&b.terminal_id));
        all
    }

    /// Run a mutation on one session and return its new state
    pub fn update<F>(&self, terminal_id: &str, f: F) -> SessionResult<TerminalSession>
    where
        F: FnOnce(&mut TerminalSession) -> SessionResult<()>,
    {
        self.with_session(terminal_id, |session| {
            f(session)?;
            Ok(session.clone())
        })
    }

    /// Run `f` while holding the session's entry lock
    ///
    /// Calls for the same terminal are serialized, so `f` sees the cart
    /// exactly as the previous call left it. `f` must not await.
    pub fn with_session<T, E, F>(&self, terminal_id: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut TerminalSession) -> Result<T, E>,
        E: From<SessionError>,
    {
        let mut entry = self
            .sessions
            .get_mut(terminal_id)
            .ok_or_else(|| SessionError::NotFound(terminal_id.to_string()))?;
        f(entry.value_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::AppResult;
    use shared::models::CategoryType;

    fn drinks() -> Category {
        Category {
            id: "cat-wine".into(),
            name: "Wein".into(),
            color: "amber".into(),
            category_type: CategoryType::Drinks,
            printer_id: None,
            sort_order: 0,
        }
    }

    fn food() -> Category {
        Category {
            id: "cat-food".into(),
            name: "Essen".into(),
            color: "green".into(),
            category_type: CategoryType::Food,
            printer_id: None,
            sort_order: 1,
        }
    }

    fn product(id: &str, cents: i64, has_deposit: bool) -> Product {
        Product {
            id: id.into(),
            name: id.into(),
            price: Decimal::new(cents, 2),
            category_id: "cat-wine".into(),
            sort_order: 0,
            has_deposit,
            image_url: None,
        }
    }

    fn session(role: Role) -> TerminalSession {
        TerminalSession::new("t1", role, Decimal::new(200, 2))
    }

    #[test]
    fn test_add_product_issues_glass() {
        let mut s = session(Role::Bar);
        let riesling = product("riesling", 550, false);
        let pils = product("pils", 350, true);

        s.add_product(&riesling, &drinks()).unwrap();
        s.add_product(&riesling, &drinks()).unwrap();
        s.add_product(&pils, &drinks()).unwrap();

        assert_eq!(s.items.len(), 2);
        assert_eq!(s.items[0].quantity, 2);
        assert_eq!(s.deposit.new_deposits, 1);

        let totals = s.totals();
        assert_eq!(totals.items_total, Decimal::new(1450, 2));
        assert_eq!(totals.grand_total, Decimal::new(1650, 2));
    }

    #[test]
    fn test_stepper_leaves_deposit_alone() {
        let mut s = session(Role::Bar);
        let pils = product("pils", 350, true);
        s.add_product(&pils, &drinks()).unwrap();

        assert_eq!(s.increment_line_quantity("pils").unwrap(), 2);
        assert_eq!(s.deposit.new_deposits, 1);

        assert_eq!(s.decrement_line_quantity("pils").unwrap(), 1);
        assert_eq!(s.decrement_line_quantity("pils").unwrap(), 0);
        assert!(s.items.is_empty());
        assert_eq!(s.deposit.new_deposits, 1);
    }

    #[test]
    fn test_set_line_quantity() {
        let mut s = session(Role::Combined);
        s.add_product(&product("wasser", 110, false), &drinks())
            .unwrap();
        s.set_line_quantity("wasser", 5).unwrap();
        assert_eq!(s.items[0].quantity, 5);

        assert!(matches!(
            s.set_line_quantity("wasser", MAX_QUANTITY + 1),
            Err(SessionError::InvalidQuantity(_))
        ));
        s.set_line_quantity("wasser", 0).unwrap();
        assert!(s.items.is_empty());
        assert!(matches!(
            s.remove_line("wasser"),
            Err(SessionError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_role_restricts_categories() {
        let mut bar = session(Role::Bar);
        let err = bar
            .add_product(&product("wurst", 450, false), &food())
            .unwrap_err();
        assert!(matches!(err, SessionError::NotOffered { .. }));
        assert!(bar.items.is_empty());

        let mut admin = session(Role::Admin);
        admin
            .add_product(&product("wurst", 450, false), &food())
            .unwrap();
    }

    #[test]
    fn test_togo_drops_table() {
        let mut s = session(Role::Combined);
        s.select_table(Some("t5".into()));
        s.set_service_type(ServiceType::ToGo);
        assert_eq!(s.table_id, None);
    }

    #[test]
    fn test_can_checkout() {
        let mut s = session(Role::Bar);
        assert!(!s.can_checkout(false));

        s.set_returned_deposits(2).unwrap();
        assert!(s.can_checkout(false));
        assert!(!s.can_checkout(true));

        s.select_table(Some("t1".into()));
        assert!(s.can_checkout(true));
    }

    #[test]
    fn test_clear_refreezes_deposit_value() {
        let mut s = session(Role::Bar);
        s.add_product(&product("pils", 350, true), &drinks())
            .unwrap();
        s.select_table(Some("t1".into()));
        s.clear(Decimal::new(250, 2));

        assert!(s.items.is_empty());
        assert_eq!(s.deposit, DepositInfo::new(Decimal::new(250, 2)));
        assert_eq!(s.table_id, None);
    }

    #[test]
    fn test_registry_lifecycle() {
        let registry = SessionRegistry::new();
        registry.start("bar-1", Role::Bar, Decimal::TWO);

        let updated = registry
            .update("bar-1", |s| s.set_new_deposits(3))
            .unwrap();
        assert_eq!(updated.deposit.new_deposits, 3);
        assert_eq!(registry.get("bar-1").unwrap().deposit.new_deposits, 3);

        assert!(registry.end("bar-1").is_some());
        assert!(matches!(
            registry.get("bar-1"),
            Err(SessionError::NotFound(_))
        ));
        assert!(registry.update("bar-1", |_| Ok(())).is_err());
    }

    #[test]
    fn test_with_session_error_keeps_cart() {
        let registry = SessionRegistry::new();
        registry.start("bar-1", Role::Bar, Decimal::TWO);
        registry
            .update("bar-1", |s| s.add_product(&product("pils", 350, true), &drinks()))
            .unwrap();

        let result: AppResult<()> = registry.with_session("bar-1", |_| {
            Err(AppError::new(ErrorCode::InsufficientCash))
        });
        assert_eq!(result.unwrap_err().code, ErrorCode::InsufficientCash);
        assert_eq!(registry.get("bar-1").unwrap().items.len(), 1);

        let missing: AppResult<()> = registry.with_session("nobody", |_| Ok(()));
        assert_eq!(missing.unwrap_err().code, ErrorCode::SessionNotFound);
    }

    #[test]
    fn test_error_codes() {
        let err: AppError = SessionError::NotFound("x".into()).into();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
        let err: AppError = SessionError::InvalidQuantity(0).into();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);
    }
}
