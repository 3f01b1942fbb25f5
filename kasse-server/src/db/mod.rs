//! Durable storage
//!
//! One redb file holds everything the venue must not lose across restarts:
//! orders, table tabs, the catalog, printers, archived receipts, settings
//! and counters. Values are JSON documents keyed by id.

pub mod storage;

pub use storage::{
    ARCHIVE, CATEGORIES, DINING_TABLES, JsonTable, ORDERS, PRINTERS, PRODUCTS, SETTINGS, Storage,
    StorageError, StorageResult, TABS,
};
