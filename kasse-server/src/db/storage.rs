//! redb-based document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Every recorded order |
//! | `tabs` | `table_id` | `TableTab` | Open table tabs |
//! | `categories` | `category_id` | `Category` | Catalog |
//! | `products` | `product_id` | `Product` | Catalog |
//! | `dining_tables` | `table_id` | `DiningTable` | Catalog |
//! | `printers` | `printer_id` | `Printer` | Printer registry |
//! | `archive` | `receipt_id` | `ArchivedReceipt` | Printed receipt texts |
//! | `settings` | name | any JSON | Deposit value, archive switch |
//! | `counters` | name | `u64` | Daily ToGo numbers |
//!
//! redb admits one write transaction at a time. Every mutation that must be
//! atomic (order + tab, tab settlement, catalog cascades) runs inside a single
//! [`WriteTransaction`] obtained from [`Storage::begin_write`].

use chrono::{Datelike, NaiveDate};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table of JSON documents keyed by string id
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

pub const ORDERS: JsonTable = TableDefinition::new("orders");
pub const TABS: JsonTable = TableDefinition::new("tabs");
pub const CATEGORIES: JsonTable = TableDefinition::new("categories");
pub const PRODUCTS: JsonTable = TableDefinition::new("products");
pub const DINING_TABLES: JsonTable = TableDefinition::new("dining_tables");
pub const PRINTERS: JsonTable = TableDefinition::new("printers");
pub const ARCHIVE: JsonTable = TableDefinition::new("archive");
pub const SETTINGS: JsonTable = TableDefinition::new("settings");

const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ALL_JSON_TABLES: [JsonTable; 8] = [
    ORDERS,
    TABS,
    CATEGORIES,
    PRODUCTS,
    DINING_TABLES,
    PRINTERS,
    ARCHIVE,
    SETTINGS,
];

const TOGO_NUMBER_KEY: &str = "togo_number";
const TOGO_DATE_KEY: &str = "togo_date";

/// Highest ToGo number before the counter starts over at 1
pub const TOGO_NUMBER_MAX: u64 = 999;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Document store backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate`: once `commit()` returns the
    /// data survives a power cut, which matters on a festival site.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, demo mode)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            for table in ALL_JSON_TABLES {
                let _ = write_txn.open_table(table)?;
            }
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Read Operations ==========

    pub fn get<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let value = match table.get(key)? {
            Some(guard) => Some(serde_json::from_slice(guard.value())?),
            None => None,
        };
        Ok(value)
    }

    /// All documents of a table, in key order
    pub fn list<T: DeserializeOwned>(&self, table: JsonTable) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let mut out = Vec::with_capacity(table.len()? as usize);
        for entry in table.iter()? {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(value.value())?);
        }
        Ok(out)
    }

    pub fn count(&self, table: JsonTable) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        Ok(table.len()?)
    }

    // ========== Single-write Operations ==========

    pub fn put<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StorageResult<()> {
        let txn = self.begin_write()?;
        self.put_txn(&txn, table, key, value)?;
        txn.commit()?;
        Ok(())
    }

    /// Returns whether the key existed
    pub fn remove(&self, table: JsonTable, key: &str) -> StorageResult<bool> {
        let txn = self.begin_write()?;
        let existed = self.remove_txn(&txn, table, key)?;
        txn.commit()?;
        Ok(existed)
    }

    /// Remove every document of a table, returns how many were removed
    pub fn clear(&self, table: JsonTable) -> StorageResult<u64> {
        let txn = self.begin_write()?;
        let removed = self.clear_txn(&txn, table)?;
        txn.commit()?;
        Ok(removed)
    }

    // ========== Transactional Operations ==========

    pub fn get_txn<T: DeserializeOwned>(
        &self,
        txn: &WriteTransaction,
        table: JsonTable,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let table = txn.open_table(table)?;
        let value = match table.get(key)? {
            Some(guard) => Some(serde_json::from_slice(guard.value())?),
            None => None,
        };
        Ok(value)
    }

    pub fn list_txn<T: DeserializeOwned>(
        &self,
        txn: &WriteTransaction,
        table: JsonTable,
    ) -> StorageResult<Vec<T>> {
        let table = txn.open_table(table)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(value.value())?);
        }
        Ok(out)
    }

    pub fn put_txn<T: Serialize>(
        &self,
        txn: &WriteTransaction,
        table: JsonTable,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let mut table = txn.open_table(table)?;
        table.insert(key, bytes.as_slice())?;
        Ok(())
    }

    pub fn remove_txn(
        &self,
        txn: &WriteTransaction,
        table: JsonTable,
        key: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(table)?;
        let existed = table.remove(key)?.is_some();
        Ok(existed)
    }

    pub fn clear_txn(&self, txn: &WriteTransaction, table: JsonTable) -> StorageResult<u64> {
        let mut table = txn.open_table(table)?;
        let removed = table.len()?;
        table.retain(|_, _| false)?;
        Ok(removed)
    }

    // ========== Counters ==========

    /// Next daily ToGo number (within transaction)
    ///
    /// The first number of a day is 1. After [`TOGO_NUMBER_MAX`] the counter
    /// starts over at 1. The counter only advances when `txn` commits, so a
    /// rejected checkout never burns a number.
    pub fn next_togo_number(&self, txn: &WriteTransaction, today: NaiveDate) -> StorageResult<u32> {
        let today_key =
            today.year() as u64 * 10_000 + u64::from(today.month()) * 100 + u64::from(today.day());

        let mut table = txn.open_table(COUNTERS)?;
        let stored_date = table.get(TOGO_DATE_KEY)?.map(|g| g.value()).unwrap_or(0);

        let number = if stored_date != today_key {
            table.insert(TOGO_DATE_KEY, today_key)?;
            1
        } else {
            let current = table.get(TOGO_NUMBER_KEY)?.map(|g| g.value()).unwrap_or(0);
            if current >= TOGO_NUMBER_MAX {
                1
            } else {
                current + 1
            }
        };
        table.insert(TOGO_NUMBER_KEY, number)?;

        Ok(number as u32)
    }

    // ========== Settings ==========

    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        self.get(SETTINGS, key)
    }

    pub fn set_setting<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.put(SETTINGS, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        n: u32,
    }

    fn doc(name: &str, n: u32) -> Doc {
        Doc {
            name: name.to_string(),
            n,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[test]
    fn test_put_get_remove() {
        let storage = Storage::open_in_memory().unwrap();
        storage.put(PRODUCTS, "a", &doc("Pils", 1)).unwrap();

        let loaded: Option<Doc> = storage.get(PRODUCTS, "a").unwrap();
        assert_eq!(loaded, Some(doc("Pils", 1)));
        let missing: Option<Doc> = storage.get(PRODUCTS, "b").unwrap();
        assert!(missing.is_none());

        assert!(storage.remove(PRODUCTS, "a").unwrap());
        assert!(!storage.remove(PRODUCTS, "a").unwrap());
    }

    #[test]
    fn test_list_and_clear() {
        let storage = Storage::open_in_memory().unwrap();
        storage.put(ARCHIVE, "2", &doc("zwei", 2)).unwrap();
        storage.put(ARCHIVE, "1", &doc("eins", 1)).unwrap();

        let all: Vec<Doc> = storage.list(ARCHIVE).unwrap();
        assert_eq!(all, vec![doc("eins", 1), doc("zwei", 2)]);
        assert_eq!(storage.count(ARCHIVE).unwrap(), 2);

        assert_eq!(storage.clear(ARCHIVE).unwrap(), 2);
        assert_eq!(storage.count(ARCHIVE).unwrap(), 0);
    }

    #[test]
    fn test_uncommitted_transaction_is_discarded() {
        let storage = Storage::open_in_memory().unwrap();
        {
            let txn = storage.begin_write().unwrap();
            storage.put_txn(&txn, ORDERS, "o1", &doc("x", 1)).unwrap();
            txn.abort().unwrap();
        }
        let loaded: Option<Doc> = storage.get(ORDERS, "o1").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_togo_number_daily_reset() {
        let storage = Storage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_togo_number(&txn, day(1)).unwrap(), 1);
        assert_eq!(storage.next_togo_number(&txn, day(1)).unwrap(), 2);
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_togo_number(&txn, day(1)).unwrap(), 3);
        assert_eq!(storage.next_togo_number(&txn, day(2)).unwrap(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_togo_number_wraps() {
        let storage = Storage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut last = 0;
        for _ in 0..TOGO_NUMBER_MAX {
            last = storage.next_togo_number(&txn, day(3)).unwrap();
        }
        assert_eq!(last, 999);
        assert_eq!(storage.next_togo_number(&txn, day(3)).unwrap(), 1);
    }

    #[test]
    fn test_aborted_togo_number_is_reused() {
        let storage = Storage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_togo_number(&txn, day(4)).unwrap(), 1);
        txn.abort().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_togo_number(&txn, day(4)).unwrap(), 1);
    }

    #[test]
    fn test_open_on_disk_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database").join("kasse.redb");
        {
            let storage = Storage::open(&path).unwrap();
            storage.set_setting("deposit_per_glass", &2.0).unwrap();
        }
        let storage = Storage::open(&path).unwrap();
        let value: Option<f64> = storage.get_setting("deposit_per_glass").unwrap();
        assert_eq!(value, Some(2.0));
    }
}
