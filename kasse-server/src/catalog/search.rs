//! Umlaut-tolerant product search
//!
//! Separate from the printer sanitizer: this folds text for comparison only
//! and never changes what is stored or printed.

use shared::models::Product;

/// Fold text so "Apfel", "Äpfel" and "Aepfel" compare equal
///
/// Lowercases, maps `ä ö ü` to `a o u` and `ß` to `ss`, then collapses the
/// ASCII digraphs `ae oe ue` to their base vowel.
pub fn normalize_for_search(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match c {
            'ä' => folded.push('a'),
            'ö' => folded.push('o'),
            'ü' => folded.push('u'),
            'ß' => folded.push_str("ss"),
            other => folded.push(other),
        }
    }
    folded
        .replace("ae", "a")
        .replace("oe", "o")
        .replace("ue", "u")
}

/// Substring match on normalized text; an empty query matches everything
pub fn fuzzy_includes(haystack: &str, query: &str) -> bool {
    let query = normalize_for_search(query.trim());
    query.is_empty() || normalize_for_search(haystack).contains(&query)
}

pub(crate) fn search_products(products: Vec<Product>, query: &str) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| fuzzy_includes(&p.name, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spellings_fold_together() {
        let a = normalize_for_search("Äpfel");
        assert_eq!(a, normalize_for_search("Apfel"));
        assert_eq!(a, normalize_for_search("Aepfel"));
        assert_eq!(a, "apfel");
    }

    #[test]
    fn test_sharp_s() {
        assert_eq!(
            normalize_for_search("Weißwein"),
            normalize_for_search("Weisswein")
        );
    }

    #[test]
    fn test_fuzzy_includes() {
        assert!(fuzzy_includes("Grillkäse im Brötchen", "kaese"));
        assert!(fuzzy_includes("Grillkaese", "KÄSE"));
        assert!(fuzzy_includes("Gemüsepfanne", "gemuse"));
        assert!(!fuzzy_includes("Bratwurst", "käse"));
        assert!(fuzzy_includes("Bratwurst", "  "));
    }

    #[test]
    fn test_search_products_keeps_order() {
        let product = |id: &str, name: &str| Product {
            id: id.into(),
            name: name.into(),
            price: rust_decimal::Decimal::ONE,
            category_id: "c".into(),
            sort_order: 0,
            has_deposit: false,
            image_url: None,
        };
        let found = search_products(
            vec![
                product("1", "Käsespätzle"),
                product("2", "Pommes"),
                product("3", "Grillkaese"),
            ],
            "Käse",
        );
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
