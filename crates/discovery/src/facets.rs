//! Category facets for browsing.

use crate::model::WorkerRecord;
use serde::Serialize;
use std::collections::HashMap;

/// One browsable category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFacet {
    /// Trimmed, lower-cased grouping key
    pub key: String,
    /// Display form: first letter upper-case, rest lower-case
    pub label: String,
    /// Workers in this category
    pub count: usize,
}

/// Deduplicate categories case-insensitively, in first-seen order.
///
/// Run this over the unfiltered worker set so facets stay put while the
/// viewer filters.
pub fn derive_categories(records: &[WorkerRecord]) -> Vec<CategoryFacet> {
    let mut facets: Vec<CategoryFacet> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = record.category.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }

        match index.get(&key) {
            Some(&i) => facets[i].count += 1,
            None => {
                index.insert(key.clone(), facets.len());
                facets.push(CategoryFacet {
                    label: display_label(record.category.trim()),
                    key,
                    count: 1,
                });
            }
        }
    }

    facets
}

fn display_label(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
