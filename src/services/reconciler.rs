//! Concurrent-edit reconciliation.
//!
//! When an edit carries the tag string its author started from, the
//! submitted list is three-way merged against the current server state
//! instead of overwriting it. The merge is union-biased: everything the
//! author submitted survives, plus anything another editor added since
//! the author's snapshot. A tag drops out only when the author dropped
//! it, or when it vanished from both sides.

use crate::services::parser;

/// Outcome of a three-way merge.
#[derive(Debug, PartialEq, Eq)]
pub struct MergeResult {
    /// Reconciled tag list, sorted and deduplicated.
    pub tags: Vec<String>,
    /// Tags from the author's snapshot the author chose to drop.
    /// Feeds the "could not be removed" warning when one resurfaces.
    pub removed: Vec<String>,
}

/// Merge `submitted` into `current`, given the `base` list the author
/// was editing against: `submitted ∪ (current − base)`.
pub fn merge(base: &[String], current: &[String], submitted: &[String]) -> MergeResult {
    let mut tags: Vec<String> = submitted.to_vec();
    tags.extend(parser::minus(current, base));
    tags = parser::dedup(tags);
    tags.sort();

    let removed = parser::minus(base, submitted);

    MergeResult { tags, removed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_union_biased_merge() {
        // Author saw {a, b}; another edit made it {a, c}; author submits
        // {b, d}. The author's removal of a wins, the author's b wins
        // over the intervening removal, and both sides' additions stay.
        let result = merge(&tags(&["a", "b"]), &tags(&["a", "c"]), &tags(&["b", "d"]));
        assert_eq!(result.tags, tags(&["b", "c", "d"]));
        assert_eq!(result.removed, tags(&["a"]));
    }

    #[test]
    fn test_no_intervening_edit_behaves_like_overwrite() {
        let base = tags(&["a", "b"]);
        let result = merge(&base, &base, &tags(&["b", "c"]));
        assert_eq!(result.tags, tags(&["b", "c"]));
        assert_eq!(result.removed, tags(&["a"]));
    }

    #[test]
    fn test_intervening_addition_is_preserved() {
        let result = merge(&tags(&["a"]), &tags(&["a", "new"]), &tags(&["a"]));
        assert_eq!(result.tags, tags(&["a", "new"]));
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_tag_dropped_on_both_sides_stays_gone() {
        let result = merge(&tags(&["a", "b"]), &tags(&["b"]), &tags(&["b"]));
        assert_eq!(result.tags, tags(&["b"]));
        assert_eq!(result.removed, tags(&["a"]));
    }
}
