//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
///
/// Orders keep a denormalized copy, so later catalog edits never change
/// recorded orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Unit price, >= 0
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(alias = "categoryId")]
    pub category_id: String,
    #[serde(default, alias = "sortOrder")]
    pub sort_order: i32,
    /// A glass/bottle deposit is charged for each unit
    #[serde(default, alias = "hasDeposit")]
    pub has_deposit: bool,
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category_id: String,
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub has_deposit: bool,
    pub image_url: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub category_id: Option<String>,
    pub sort_order: Option<i32>,
    pub has_deposit: Option<bool>,
    #[serde(default, with = "super::category::double_option")]
    pub image_url: Option<Option<String>>,
}

impl Product {
    pub fn apply(&mut self, update: ProductUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(has_deposit) = update.has_deposit {
            self.has_deposit = has_deposit;
        }
        if let Some(image_url) = update.image_url {
            self.image_url = image_url;
        }
    }
}
