//! Catalog export and import
//!
//! The export document carries configuration only: categories, products,
//! printers, tables and the deposit value. Orders and tabs are never part of
//! it, and an import leaves them alone.
//!
//! An import is validated completely before the first write and applied in a
//! single transaction, so a bad file changes nothing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{Category, DiningTable, Printer, Product};
use shared::money::MAX_AMOUNT;
use std::collections::HashSet;

use super::{CatalogError, CatalogResult, CatalogService, DEPOSIT_SETTING_KEY, validate_endpoint};
use crate::db::{CATEGORIES, DINING_TABLES, PRINTERS, PRODUCTS, SETTINGS, StorageError, TABS};

/// Version written into new exports
pub const EXPORT_VERSION: &str = "1.0";

/// Fields an import cannot do without
const REQUIRED_FIELDS: [&str; 3] = ["version", "categories", "products"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExport {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub printers: Vec<Printer>,
    pub tables: Vec<DiningTable>,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_per_glass: Decimal,
}

/// Import document as read: optional sections stay optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    categories: Vec<Category>,
    products: Vec<Product>,
    printers: Option<Vec<Printer>>,
    tables: Option<Vec<DiningTable>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    deposit_per_glass: Option<Decimal>,
}

/// What an import replaced; `None` means the section was absent and kept
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub version: String,
    pub categories: usize,
    pub products: usize,
    pub printers: Option<usize>,
    pub tables: Option<usize>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub deposit_per_glass: Option<Decimal>,
}

fn import_err(msg: impl Into<String>) -> CatalogError {
    CatalogError::Import(msg.into())
}

fn read_version(doc: &Value) -> CatalogResult<String> {
    match doc.get("version") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(import_err("version must be a non-empty string or number")),
    }
}

fn unique_ids<'a>(what: &str, ids: impl Iterator<Item = &'a str>) -> CatalogResult<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(import_err(format!("{what} with empty id")));
        }
        if !seen.insert(id) {
            return Err(import_err(format!("duplicate {what} id {id}")));
        }
    }
    Ok(seen)
}

impl CatalogService {
    pub fn export(&self) -> CatalogResult<CatalogExport> {
        Ok(CatalogExport {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            categories: self.list_categories()?,
            products: self.list_products()?,
            printers: self.list_printers()?,
            tables: self.list_tables()?,
            deposit_per_glass: self.deposit_per_glass()?,
        })
    }

    /// Replace catalog sections from an export document
    ///
    /// `categories` and `products` are always replaced. `printers`, `tables`
    /// and `depositPerGlass` only when present.
    pub fn import(&self, doc: Value) -> CatalogResult<ImportReport> {
        if !doc.is_object() {
            return Err(import_err("document must be a JSON object"));
        }
        if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| doc.get(**f).is_none()) {
            return Err(import_err(format!("missing field {missing}")));
        }
        let version = read_version(&doc)?;
        let mut data: ImportDocument =
            serde_json::from_value(doc).map_err(|e| import_err(e.to_string()))?;

        self.validate_import(&mut data)?;

        let storage = self.storage();
        let txn = storage.begin_write()?;

        storage.clear_txn(&txn, CATEGORIES)?;
        for category in &data.categories {
            storage.put_txn(&txn, CATEGORIES, &category.id, category)?;
        }
        storage.clear_txn(&txn, PRODUCTS)?;
        for product in &data.products {
            storage.put_txn(&txn, PRODUCTS, &product.id, product)?;
        }
        if let Some(printers) = &data.printers {
            storage.clear_txn(&txn, PRINTERS)?;
            for printer in printers {
                storage.put_txn(&txn, PRINTERS, &printer.id, printer)?;
            }
        }
        if let Some(tables) = &data.tables {
            let open_tabs: Vec<Value> = storage.list_txn(&txn, TABS)?;
            let kept: HashSet<&str> = tables.iter().map(|t| t.id.as_str()).collect();
            if let Some(orphan) = open_tabs
                .iter()
                .filter_map(|tab| tab.get("table_id").and_then(Value::as_str))
                .find(|id| !kept.contains(id))
            {
                return Err(CatalogError::TableHasOpenTab(orphan.to_string()));
            }
            storage.clear_txn(&txn, DINING_TABLES)?;
            for table in tables {
                storage.put_txn(&txn, DINING_TABLES, &table.id, table)?;
            }
        }
        if let Some(deposit) = data.deposit_per_glass {
            storage.put_txn(&txn, SETTINGS, DEPOSIT_SETTING_KEY, &deposit)?;
        }
        txn.commit().map_err(StorageError::from)?;

        let report = ImportReport {
            version,
            categories: data.categories.len(),
            products: data.products.len(),
            printers: data.printers.as_ref().map(Vec::len),
            tables: data.tables.as_ref().map(Vec::len),
            deposit_per_glass: data.deposit_per_glass,
        };
        tracing::info!(
            version = %report.version,
            categories = report.categories,
            products = report.products,
            printers = ?report.printers,
            tables = ?report.tables,
            "Catalog imported"
        );
        Ok(report)
    }

    /// Reject anything that would leave the catalog inconsistent
    ///
    /// Category printer references that point nowhere are cleared.
    fn validate_import(&self, data: &mut ImportDocument) -> CatalogResult<()> {
        let category_ids = unique_ids("category", data.categories.iter().map(|c| c.id.as_str()))?;
        unique_ids("product", data.products.iter().map(|p| p.id.as_str()))?;

        for product in &data.products {
            if !category_ids.contains(product.category_id.as_str()) {
                return Err(import_err(format!(
                    "product {} references unknown category {}",
                    product.id, product.category_id
                )));
            }
            if product.price.is_sign_negative() || product.price > MAX_AMOUNT {
                return Err(import_err(format!(
                    "product {} has invalid price {}",
                    product.id, product.price
                )));
            }
        }

        if let Some(tables) = &data.tables {
            unique_ids("table", tables.iter().map(|t| t.id.as_str()))?;
        }

        let printer_ids: HashSet<String> = match &data.printers {
            Some(printers) => {
                for printer in printers {
                    validate_endpoint(&printer.endpoint)
                        .map_err(|e| import_err(format!("printer {}: {e}", printer.id)))?;
                }
                unique_ids("printer", printers.iter().map(|p| p.id.as_str()))?
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            }
            None => self.list_printers()?.into_iter().map(|p| p.id).collect(),
        };
        for category in &mut data.categories {
            if let Some(printer_id) = &category.printer_id
                && !printer_ids.contains(printer_id)
            {
                tracing::warn!(
                    category_id = %category.id,
                    printer_id = %printer_id,
                    "Imported category references unknown printer, clearing"
                );
                category.printer_id = None;
            }
        }

        if let Some(deposit) = data.deposit_per_glass
            && (deposit.is_sign_negative() || deposit > MAX_AMOUNT)
        {
            return Err(import_err(format!("invalid depositPerGlass {deposit}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Storage;
    use serde_json::json;
    use shared::models::{CategoryCreate, CategoryType, DiningTableCreate, ProductCreate};

    fn service() -> CatalogService {
        CatalogService::new(Storage::open_in_memory().unwrap(), Decimal::TWO)
    }

    fn seeded() -> CatalogService {
        let svc = service();
        let wine = svc
            .create_category(CategoryCreate {
                name: "Wein".into(),
                color: "rose".into(),
                category_type: CategoryType::Drinks,
                printer_id: None,
                sort_order: Some(1),
            })
            .unwrap();
        svc.create_product(ProductCreate {
            name: "Riesling 0,25l".into(),
            price: Decimal::new(550, 2),
            category_id: wine.id,
            sort_order: None,
            has_deposit: true,
            image_url: None,
        })
        .unwrap();
        svc.create_table(DiningTableCreate {
            name: "1".into(),
            is_active: None,
            sort_order: None,
        })
        .unwrap();
        svc
    }

    #[test]
    fn test_export_document_shape() {
        let svc = seeded();
        let json = serde_json::to_value(svc.export().unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert!(json["exportedAt"].is_string());
        assert_eq!(json["depositPerGlass"], json!(2.0));
        assert_eq!(json["categories"].as_array().unwrap().len(), 1);
        assert_eq!(json["tables"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_export_then_import_into_empty_store() {
        let source = seeded();
        let doc = serde_json::to_value(source.export().unwrap()).unwrap();

        let target = service();
        let report = target.import(doc).unwrap();
        assert_eq!(report.categories, 1);
        assert_eq!(report.products, 1);
        assert_eq!(report.tables, Some(1));
        assert_eq!(target.list_products().unwrap(), source.list_products().unwrap());
        assert!(target.has_active_tables().unwrap());
    }

    #[test]
    fn test_missing_required_field_changes_nothing() {
        let svc = seeded();
        let before = svc.list_products().unwrap();
        let err = svc
            .import(json!({"version": "1.0", "categories": []}))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Import(ref m) if m.contains("products")));
        assert_eq!(svc.list_products().unwrap(), before);
    }

    #[test]
    fn test_dangling_product_rejected_before_writes() {
        let svc = seeded();
        let before = svc.list_categories().unwrap();
        let err = svc
            .import(json!({
                "version": 1,
                "categories": [],
                "products": [{"id": "p", "name": "Waise", "price": 1.0, "categoryId": "gone"}]
            }))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Import(_)));
        assert_eq!(svc.list_categories().unwrap(), before);
    }

    #[test]
    fn test_optional_sections_kept_when_absent() {
        let svc = seeded();
        svc.set_deposit_per_glass(Decimal::new(300, 2)).unwrap();

        let report = svc
            .import(json!({
                "version": "1.0",
                "categories": [{"id": "c", "name": "Essen", "type": "food"}],
                "products": [{"id": "p", "name": "Flammkuchen", "price": 9.5, "categoryId": "c"}]
            }))
            .unwrap();
        assert_eq!(report.tables, None);
        assert_eq!(report.deposit_per_glass, None);
        assert_eq!(svc.list_tables().unwrap().len(), 1);
        assert_eq!(svc.deposit_per_glass().unwrap(), Decimal::new(300, 2));
        assert_eq!(svc.list_products().unwrap()[0].name, "Flammkuchen");
    }

    #[test]
    fn test_unknown_printer_reference_cleared() {
        let svc = service();
        svc.import(json!({
            "version": "1.0",
            "categories": [{"id": "c", "name": "Essen", "type": "food", "printerId": "nope"}],
            "products": [],
            "depositPerGlass": 2.5
        }))
        .unwrap();
        assert_eq!(svc.get_category("c").unwrap().printer_id, None);
        assert_eq!(svc.deposit_per_glass().unwrap(), Decimal::new(25, 1));
    }

    #[test]
    fn test_tables_with_open_tabs_survive_import() {
        let svc = seeded();
        let table = svc.list_tables().unwrap().remove(0);
        svc.storage()
            .put(TABS, &table.id, &json!({"table_id": table.id}))
            .unwrap();

        let err = svc
            .import(json!({
                "version": "1.0",
                "categories": [],
                "products": [],
                "tables": []
            }))
            .unwrap_err();
        assert!(matches!(err, CatalogError::TableHasOpenTab(_)));
        assert_eq!(svc.list_products().unwrap().len(), 1);
    }
}
