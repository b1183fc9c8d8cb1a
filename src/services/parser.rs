//! Tag string tokenization.
//!
//! A tag string is whitespace-delimited tokens. Scanning preserves
//! submission order and drops duplicates; the serialized form is always
//! lowercase, deduplicated, and sorted lexicographically.

use indexmap::IndexSet;

/// Split a tag string into an ordered, deduplicated token list.
pub fn scan(tag_string: &str) -> Vec<String> {
    let set: IndexSet<&str> = tag_string.split_whitespace().collect();
    set.into_iter().map(|t| t.to_string()).collect()
}

/// Serialize a token list: dedup, sort, space-join.
pub fn join_sorted(tags: &[String]) -> String {
    let set: IndexSet<&str> = tags.iter().map(|t| t.as_str()).collect();
    let mut names: Vec<&str> = set.into_iter().collect();
    names.sort_unstable();
    names.join(" ")
}

/// Order-preserving dedup.
pub fn dedup(tags: Vec<String>) -> Vec<String> {
    let set: IndexSet<String> = tags.into_iter().collect();
    set.into_iter().collect()
}

/// `a − b`, preserving order.
pub fn minus(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|t| !b.contains(t)).cloned().collect()
}

/// `a ∩ b`, in `a`'s order.
pub fn intersect(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|t| b.contains(t)).cloned().collect()
}
