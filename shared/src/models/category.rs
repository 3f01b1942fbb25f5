//! Category Model

use serde::{Deserialize, Serialize};

/// Kind of goods in a category
///
/// Bar terminals only see drinks, food terminals only food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Drinks,
    Food,
}

/// Category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Color token used by terminals for the tile
    #[serde(default)]
    pub color: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Printer that receives kitchen jobs for this category (category routing)
    #[serde(default, alias = "printerId")]
    pub printer_id: Option<String>,
    #[serde(default, alias = "sortOrder")]
    pub sort_order: i32,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub printer_id: Option<String>,
    pub sort_order: Option<i32>,
}

/// Update category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
    /// `Some(None)` clears the printer assignment
    #[serde(default, with = "double_option")]
    pub printer_id: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

impl Category {
    pub fn apply(&mut self, update: CategoryUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(category_type) = update.category_type {
            self.category_type = category_type;
        }
        if let Some(printer_id) = update.printer_id {
            self.printer_id = printer_id;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
    }
}

/// Distinguishes "field absent" from "field set to null" in update payloads
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
