//! Catalog Service - categories, products, dining tables, printers and the
//! deposit setting
//!
//! Deletes never leave dangling references:
//! - deleting a category deletes its products
//! - deleting a printer clears it from every category
//! - a table with an open tab cannot be deleted

pub mod migration;
pub mod search;
pub mod transfer;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Category, CategoryCreate, CategoryUpdate, DiningTable, DiningTableCreate, DiningTableUpdate,
    Printer, PrinterCreate, PrinterEndpoint, PrinterUpdate, Product, ProductCreate, ProductUpdate,
};
use shared::money::MAX_AMOUNT;
use std::fmt;
use thiserror::Error;

use crate::db::{
    CATEGORIES, DINING_TABLES, JsonTable, PRINTERS, PRODUCTS, Storage, StorageError, TABS,
};

pub use migration::{MigrationPreview, MigrationReport, restore_umlauts};
pub use search::{fuzzy_includes, normalize_for_search};
pub use transfer::{CatalogExport, ImportReport};

const DEPOSIT_SETTING_KEY: &str = "deposit_per_glass";

/// Kind of catalog record, for not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Category,
    Product,
    Table,
    Printer,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Category => "Category",
            Resource::Product => "Product",
            Resource::Table => "Table",
            Resource::Printer => "Printer",
        })
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0} not found: {1}")]
    NotFound(Resource, String),

    #[error("{0}")]
    Validation(String),

    #[error("Table {0} has an open tab")]
    TableHasOpenTab(String),

    #[error("Invalid import: {0}")]
    Import(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::Storage(e) => {
                tracing::error!(error = %e, "Catalog storage failure");
                AppError::database(message)
            }
            CatalogError::NotFound(resource, id) => {
                let code = match resource {
                    Resource::Category => ErrorCode::CategoryNotFound,
                    Resource::Product => ErrorCode::ProductNotFound,
                    Resource::Table => ErrorCode::TableNotFound,
                    Resource::Printer => ErrorCode::PrinterNotFound,
                };
                AppError::with_message(code, message).with_detail("id", id)
            }
            CatalogError::Validation(_) => AppError::validation(message),
            CatalogError::TableHasOpenTab(id) => {
                AppError::with_message(ErrorCode::TableHasOpenTab, message)
                    .with_detail("table_id", id)
            }
            CatalogError::Import(_) => AppError::with_message(ErrorCode::ImportInvalid, message),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result of a category delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDeletion {
    pub category_id: String,
    pub removed_products: usize,
}

/// Result of a printer delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrinterDeletion {
    pub printer_id: String,
    pub cleared_categories: usize,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn require_name(name: &str, what: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{what} name must not be empty")));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> CatalogResult<()> {
    if price.is_sign_negative() || price > MAX_AMOUNT {
        return Err(CatalogError::Validation(format!(
            "Price must be between 0 and {MAX_AMOUNT}, got {price}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_endpoint(endpoint: &PrinterEndpoint) -> CatalogResult<()> {
    match endpoint {
        PrinterEndpoint::Relay { queue } if queue.trim().is_empty() => Err(
            CatalogError::Validation("Relay queue must not be empty".into()),
        ),
        PrinterEndpoint::Network { host, .. } if host.trim().is_empty() => Err(
            CatalogError::Validation("Printer host must not be empty".into()),
        ),
        PrinterEndpoint::Network { port: 0, .. } => {
            Err(CatalogError::Validation("Printer port must not be 0".into()))
        }
        _ => Ok(()),
    }
}

/// Catalog Service
#[derive(Debug, Clone)]
pub struct CatalogService {
    storage: Storage,
    default_deposit: Decimal,
}

impl CatalogService {
    pub fn new(storage: Storage, default_deposit: Decimal) -> Self {
        Self {
            storage,
            default_deposit,
        }
    }

    fn require<T: serde::de::DeserializeOwned>(
        &self,
        table: JsonTable,
        resource: Resource,
        id: &str,
    ) -> CatalogResult<T> {
        self.storage
            .get(table, id)?
            .ok_or_else(|| CatalogError::NotFound(resource, id.to_string()))
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Ordered by sort order, then name
    pub fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.storage.list(CATEGORIES)?;
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(categories)
    }

    pub fn get_category(&self, id: &str) -> CatalogResult<Category> {
        self.require(CATEGORIES, Resource::Category, id)
    }

    pub fn create_category(&self, data: CategoryCreate) -> CatalogResult<Category> {
        require_name(&data.name, "Category")?;
        if let Some(printer_id) = &data.printer_id {
            self.require::<Printer>(PRINTERS, Resource::Printer, printer_id)?;
        }
        let category = Category {
            id: new_id(),
            name: data.name.trim().to_string(),
            color: data.color,
            category_type: data.category_type,
            printer_id: data.printer_id,
            sort_order: data.sort_order.unwrap_or(0),
        };
        self.storage.put(CATEGORIES, &category.id, &category)?;
        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub fn update_category(&self, id: &str, data: CategoryUpdate) -> CatalogResult<Category> {
        let mut category: Category = self.get_category(id)?;
        if let Some(name) = &data.name {
            require_name(name, "Category")?;
        }
        if let Some(Some(printer_id)) = &data.printer_id {
            self.require::<Printer>(PRINTERS, Resource::Printer, printer_id)?;
        }
        category.apply(data);
        self.storage.put(CATEGORIES, id, &category)?;
        Ok(category)
    }

    /// Delete a category and every product in it
    pub fn delete_category(&self, id: &str) -> CatalogResult<CategoryDeletion> {
        let txn = self.storage.begin_write()?;
        if !self.storage.remove_txn(&txn, CATEGORIES, id)? {
            return Err(CatalogError::NotFound(Resource::Category, id.to_string()));
        }
        let products: Vec<Product> = self.storage.list_txn(&txn, PRODUCTS)?;
        let mut removed_products = 0;
        for product in products.iter().filter(|p| p.category_id == id) {
            self.storage.remove_txn(&txn, PRODUCTS, &product.id)?;
            removed_products += 1;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(category_id = %id, removed_products, "Category deleted");
        Ok(CategoryDeletion {
            category_id: id.to_string(),
            removed_products,
        })
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Ordered by sort order, then name
    pub fn list_products(&self) -> CatalogResult<Vec<Product>> {
        let mut products: Vec<Product> = self.storage.list(PRODUCTS)?;
        products.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(products)
    }

    pub fn list_products_in(&self, category_id: &str) -> CatalogResult<Vec<Product>> {
        let mut products = self.list_products()?;
        products.retain(|p| p.category_id == category_id);
        Ok(products)
    }

    pub fn get_product(&self, id: &str) -> CatalogResult<Product> {
        self.require(PRODUCTS, Resource::Product, id)
    }

    /// Product together with the category it is sold under
    pub fn product_with_category(&self, id: &str) -> CatalogResult<(Product, Category)> {
        let product = self.get_product(id)?;
        let category = self.get_category(&product.category_id)?;
        Ok((product, category))
    }

    pub fn create_product(&self, data: ProductCreate) -> CatalogResult<Product> {
        require_name(&data.name, "Product")?;
        validate_price(data.price)?;
        self.get_category(&data.category_id)?;
        let product = Product {
            id: new_id(),
            name: data.name.trim().to_string(),
            price: data.price,
            category_id: data.category_id,
            sort_order: data.sort_order.unwrap_or(0),
            has_deposit: data.has_deposit,
            image_url: data.image_url,
        };
        self.storage.put(PRODUCTS, &product.id, &product)?;
        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub fn update_product(&self, id: &str, data: ProductUpdate) -> CatalogResult<Product> {
        let mut product = self.get_product(id)?;
        if let Some(name) = &data.name {
            require_name(name, "Product")?;
        }
        if let Some(price) = data.price {
            validate_price(price)?;
        }
        if let Some(category_id) = &data.category_id {
            self.get_category(category_id)?;
        }
        product.apply(data);
        self.storage.put(PRODUCTS, id, &product)?;
        Ok(product)
    }

    pub fn delete_product(&self, id: &str) -> CatalogResult<()> {
        if !self.storage.remove(PRODUCTS, id)? {
            return Err(CatalogError::NotFound(Resource::Product, id.to_string()));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Products whose name contains `query`, umlaut-tolerant
    pub fn search_products(&self, query: &str) -> CatalogResult<Vec<Product>> {
        Ok(search::search_products(self.list_products()?, query))
    }

    // =========================================================================
    // Dining tables
    // =========================================================================

    pub fn list_tables(&self) -> CatalogResult<Vec<DiningTable>> {
        let mut tables: Vec<DiningTable> = self.storage.list(DINING_TABLES)?;
        tables.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(tables)
    }

    pub fn get_table(&self, id: &str) -> CatalogResult<DiningTable> {
        self.require(DINING_TABLES, Resource::Table, id)
    }

    /// While this is true, service orders must name a table
    pub fn has_active_tables(&self) -> CatalogResult<bool> {
        Ok(self.list_tables()?.iter().any(|t| t.is_active))
    }

    pub fn create_table(&self, data: DiningTableCreate) -> CatalogResult<DiningTable> {
        require_name(&data.name, "Table")?;
        let table = DiningTable {
            id: new_id(),
            name: data.name.trim().to_string(),
            is_active: data.is_active.unwrap_or(true),
            sort_order: data.sort_order.unwrap_or(0),
        };
        self.storage.put(DINING_TABLES, &table.id, &table)?;
        Ok(table)
    }

    pub fn update_table(&self, id: &str, data: DiningTableUpdate) -> CatalogResult<DiningTable> {
        let mut table = self.get_table(id)?;
        if let Some(name) = &data.name {
            require_name(name, "Table")?;
        }
        table.apply(data);
        self.storage.put(DINING_TABLES, id, &table)?;
        Ok(table)
    }

    /// Rejected while the table has an open tab
    pub fn delete_table(&self, id: &str) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        if self
            .storage
            .get_txn::<serde_json::Value>(&txn, TABS, id)?
            .is_some()
        {
            return Err(CatalogError::TableHasOpenTab(id.to_string()));
        }
        if !self.storage.remove_txn(&txn, DINING_TABLES, id)? {
            return Err(CatalogError::NotFound(Resource::Table, id.to_string()));
        }
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(table_id = %id, "Table deleted");
        Ok(())
    }

    // =========================================================================
    // Printers
    // =========================================================================

    pub fn list_printers(&self) -> CatalogResult<Vec<Printer>> {
        let mut printers: Vec<Printer> = self.storage.list(PRINTERS)?;
        printers.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(printers)
    }

    pub fn get_printer(&self, id: &str) -> CatalogResult<Printer> {
        self.require(PRINTERS, Resource::Printer, id)
    }

    /// At most one printer carries `is_default`; setting it on one clears the rest
    fn save_printer(&self, printer: &Printer) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        if printer.is_default {
            let others: Vec<Printer> = self.storage.list_txn(&txn, PRINTERS)?;
            for mut other in others
                .into_iter()
                .filter(|p| p.id != printer.id && p.is_default)
            {
                other.is_default = false;
                self.storage.put_txn(&txn, PRINTERS, &other.id, &other)?;
            }
        }
        self.storage.put_txn(&txn, PRINTERS, &printer.id, printer)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn create_printer(&self, data: PrinterCreate) -> CatalogResult<Printer> {
        require_name(&data.display_name, "Printer")?;
        validate_endpoint(&data.endpoint)?;
        let printer = Printer {
            id: new_id(),
            display_name: data.display_name.trim().to_string(),
            endpoint: data.endpoint,
            enabled: data.enabled.unwrap_or(true),
            is_default: data.is_default.unwrap_or(false),
            assigned_roles: data.assigned_roles,
            render: data.render,
        };
        self.save_printer(&printer)?;
        tracing::info!(
            printer_id = %printer.id,
            name = %printer.display_name,
            endpoint = %printer.endpoint.label(),
            "Printer created"
        );
        Ok(printer)
    }

    pub fn update_printer(&self, id: &str, data: PrinterUpdate) -> CatalogResult<Printer> {
        let mut printer = self.get_printer(id)?;
        if let Some(name) = &data.display_name {
            require_name(name, "Printer")?;
        }
        if let Some(endpoint) = &data.endpoint {
            validate_endpoint(endpoint)?;
        }
        printer.apply(data);
        self.save_printer(&printer)?;
        Ok(printer)
    }

    /// Delete a printer and clear it from every category routed to it
    pub fn delete_printer(&self, id: &str) -> CatalogResult<PrinterDeletion> {
        let txn = self.storage.begin_write()?;
        if !self.storage.remove_txn(&txn, PRINTERS, id)? {
            return Err(CatalogError::NotFound(Resource::Printer, id.to_string()));
        }
        let categories: Vec<Category> = self.storage.list_txn(&txn, CATEGORIES)?;
        let mut cleared_categories = 0;
        for mut category in categories
            .into_iter()
            .filter(|c| c.printer_id.as_deref() == Some(id))
        {
            category.printer_id = None;
            self.storage
                .put_txn(&txn, CATEGORIES, &category.id, &category)?;
            cleared_categories += 1;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(printer_id = %id, cleared_categories, "Printer deleted");
        Ok(PrinterDeletion {
            printer_id: id.to_string(),
            cleared_categories,
        })
    }

    // =========================================================================
    // Deposit
    // =========================================================================

    /// Current per-glass deposit; new carts freeze this value
    pub fn deposit_per_glass(&self) -> CatalogResult<Decimal> {
        let stored: Option<Decimal> = self.storage.get_setting(DEPOSIT_SETTING_KEY)?;
        Ok(stored.unwrap_or(self.default_deposit))
    }

    pub fn set_deposit_per_glass(&self, value: Decimal) -> CatalogResult<Decimal> {
        if value.is_sign_negative() || value > MAX_AMOUNT {
            return Err(CatalogError::Validation(format!(
                "Deposit must be between 0 and {MAX_AMOUNT}, got {value}"
            )));
        }
        self.storage.set_setting(DEPOSIT_SETTING_KEY, &value)?;
        tracing::info!(deposit = %value, "Deposit per glass changed");
        Ok(value)
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }
}
