//! Per-category counters and post-count deltas.

use std::collections::{BTreeMap, HashMap};

use crate::models::post::CategoryCounts;
use crate::models::tag::Category;
use crate::services::parser;

/// Recount category totals from the final tag set. Tags without a row
/// yet count as general; creation happens in the same edit.
pub fn recount(tags: &[String], categories: &HashMap<String, Category>) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for name in tags {
        let category = categories.get(name).copied().unwrap_or(Category::General);
        *counts.get_mut(category) += 1;
    }
    counts
}

/// Signed per-category change between two counter snapshots. Zero
/// entries are omitted.
pub fn category_deltas(before: &CategoryCounts, after: &CategoryCounts) -> BTreeMap<Category, i64> {
    let mut deltas = BTreeMap::new();
    for category in Category::ALL {
        let delta = after.get(category) - before.get(category);
        if delta != 0 {
            deltas.insert(category, delta);
        }
    }
    deltas
}

/// Per-tag post_count adjustments from the set difference between the
/// previous and final tag lists.
pub fn post_count_deltas(before: &[String], after: &[String]) -> BTreeMap<String, i64> {
    let mut deltas = BTreeMap::new();
    for name in parser::minus(after, before) {
        deltas.insert(name, 1);
    }
    for name in parser::minus(before, after) {
        deltas.insert(name, -1);
    }
    deltas
}
