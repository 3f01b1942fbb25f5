//! Dining Table Model

use serde::{Deserialize, Serialize};

use super::default_true;

/// Dining table entity
///
/// While at least one table is active, service orders must name a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "sortOrder")]
    pub sort_order: i32,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

impl DiningTable {
    pub fn apply(&mut self, update: DiningTableUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
    }
}
