//! Umlaut migration for legacy catalog names
//!
//! Older catalogs spelled "Käse" as "Kaese" because the printers could not
//! print umlauts. Printing now transliterates on its own, so names can carry
//! proper German spelling again. Only the `name` field changes; ids and
//! references stay untouched.

use serde::Serialize;
use shared::models::{Category, Product};

use super::{CatalogResult, CatalogService};
use crate::db::{CATEGORIES, PRODUCTS, StorageError};

/// Words whose spelling the digraph rules alone would get wrong (mostly `ß`)
const KNOWN_WORDS: &[(&str, &str)] = &[
    ("Strasse", "Straße"),
    ("Grosse", "Große"),
    ("Suesse", "Süße"),
    ("Suess", "Süß"),
    ("Weisswein", "Weißwein"),
    ("Grillkaese", "Grillkäse"),
    ("Kaese", "Käse"),
    ("Gemuese", "Gemüse"),
    ("Groesse", "Größe"),
    ("Spaetburgunder", "Spätburgunder"),
    ("Getraenke", "Getränke"),
];

fn umlaut_for(first: char, second: char) -> Option<char> {
    Some(match (first, second) {
        ('A', 'e') => 'Ä',
        ('O', 'e') => 'Ö',
        ('U', 'e') => 'Ü',
        ('a', 'e') => 'ä',
        ('o', 'e') => 'ö',
        ('u', 'e') => 'ü',
        _ => return None,
    })
}

/// `ue` after `q`, `a` or `e` is a real vowel pair ("Quelle", "Bauer", "Feuer")
///
/// `prev` is the last character already written, so an umlaut produced one
/// step earlier does not count as `a` or `e`.
fn keeps_ue(prev: Option<char>) -> bool {
    matches!(
        prev.map(|c| c.to_ascii_lowercase()),
        Some('q') | Some('a') | Some('e')
    )
}

fn replace_digraphs(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let prev = out.chars().last();
        if let Some(&next) = chars.get(i + 1)
            && let Some(umlaut) = umlaut_for(chars[i], next)
            && !(chars[i].eq_ignore_ascii_case(&'u') && keeps_ue(prev))
        {
            out.push(umlaut);
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Turn ASCII workarounds back into German spelling
///
/// Known words go first, then the general `Ae Oe Ue ae oe ue` digraphs.
/// Running it twice changes nothing more.
pub fn restore_umlauts(text: &str) -> String {
    let mut result = text.to_string();
    for (ascii, german) in KNOWN_WORDS {
        result = result.replace(ascii, german);
        result = result.replace(&ascii.to_lowercase(), &german.to_lowercase());
    }
    replace_digraphs(&result)
}

/// One name the migration would change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationPreview {
    pub categories: Vec<Rename>,
    pub products: Vec<Rename>,
}

impl MigrationPreview {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.products.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub changed_categories: usize,
    pub changed_products: usize,
}

fn rename(id: &str, name: &str) -> Option<Rename> {
    let restored = restore_umlauts(name);
    (restored != name).then(|| Rename {
        id: id.to_string(),
        from: name.to_string(),
        to: restored,
    })
}

impl CatalogService {
    /// Names the migration would change, without writing anything
    pub fn preview_umlaut_migration(&self) -> CatalogResult<MigrationPreview> {
        let categories = self.list_categories()?;
        let products = self.list_products()?;
        Ok(MigrationPreview {
            categories: categories
                .iter()
                .filter_map(|c| rename(&c.id, &c.name))
                .collect(),
            products: products
                .iter()
                .filter_map(|p| rename(&p.id, &p.name))
                .collect(),
        })
    }

    /// Rewrite category and product names in one transaction
    pub fn apply_umlaut_migration(&self) -> CatalogResult<MigrationReport> {
        let storage = self.storage();
        let txn = storage.begin_write()?;
        let mut report = MigrationReport::default();

        let categories: Vec<Category> = storage.list_txn(&txn, CATEGORIES)?;
        for mut category in categories {
            let restored = restore_umlauts(&category.name);
            if restored != category.name {
                category.name = restored;
                storage.put_txn(&txn, CATEGORIES, &category.id, &category)?;
                report.changed_categories += 1;
            }
        }

        let products: Vec<Product> = storage.list_txn(&txn, PRODUCTS)?;
        for mut product in products {
            let restored = restore_umlauts(&product.name);
            if restored != product.name {
                product.name = restored;
                storage.put_txn(&txn, PRODUCTS, &product.id, &product)?;
                report.changed_products += 1;
            }
        }

        txn.commit().map_err(StorageError::from)?;
        tracing::info!(
            categories = report.changed_categories,
            products = report.changed_products,
            "Umlaut migration applied"
        );
        Ok(report)
    }
}
