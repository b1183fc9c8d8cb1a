//! Metatag extraction.
//!
//! Tokens embedded in a tag string that are directives rather than
//! content tags. Each token is parsed exactly once into a typed variant;
//! later stages never re-match prefixes. Malformed or unrecognized
//! directives are consumed and silently ignored, by design: an edit never
//! fails because of a bad metatag.
//!
//! "Pre" metatags (rating / parent / field locks) act on the in-flight
//! post before normalization. `source:` and `newpool:` are case-sensitive
//! and must be captured before the lowercase pass. "Post" metatags
//! (pool / set / favorite / vote / child) become [`Directive`]s replayed
//! by the caller against the persisted post.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::edit::{Directive, PoolRef, SetRef};
use crate::models::post::Rating;
use crate::models::tag::Category;

/// `123:456` style tokens; never valid tags.
pub fn is_aspect_ratio(token: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+:\d+$").unwrap())
        .is_match(token)
}

/// Which per-post field a `locked:` metatag targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Notes,
    Rating,
    Status,
}

/// A metatag interpreted before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metatag {
    Rating(Rating),
    ParentNone,
    Parent(i64),
    /// `-parent:id` detaches only if the post currently has that parent
    RemoveParent(i64),
    Lock { kind: LockKind, engage: bool },
}

/// A metatag whose value must keep its original casing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseSensitiveMetatag {
    /// `source:none` clears, otherwise replaces
    Source(Option<String>),
    /// `newpool:Name` creates the pool if missing
    NewPool(String),
}

/// Capture case-sensitive metatags from a raw token list, before the
/// lowercase pass.
///
/// `source:` tokens are removed; `newpool:` tokens are captured but left
/// in place (they are also a pool-add directive). When several are
/// present only the last one is applied.
pub fn extract_casesensitive(tokens: Vec<String>) -> (Option<CaseSensitiveMetatag>, Vec<String>) {
    let mut captured: Vec<CaseSensitiveMetatag> = Vec::new();
    let mut rest: Vec<String> = Vec::with_capacity(tokens.len());

    for token in tokens {
        if let Some(raw) = strip_prefix_ci(&token, "source:") {
            if raw.eq_ignore_ascii_case("none") {
                captured.push(CaseSensitiveMetatag::Source(None));
            } else {
                let unquoted = raw.trim_matches('"');
                captured.push(CaseSensitiveMetatag::Source(Some(unquoted.to_string())));
            }
            continue;
        }
        if let Some(raw) = strip_prefix_ci(&token, "newpool:") {
            if !raw.is_empty() {
                captured.push(CaseSensitiveMetatag::NewPool(raw.to_string()));
            }
        }
        rest.push(token);
    }

    (captured.pop(), rest)
}

/// ASCII-case-insensitive prefix strip that leaves the value's casing
/// intact.
fn strip_prefix_ci<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    match token.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&token[prefix.len()..]),
        _ => None,
    }
}

/// Tokens split into their four disjoint partitions.
#[derive(Debug, Default)]
pub struct PartitionedTokens {
    /// Pre metatags, in submission order
    pub pre: Vec<Metatag>,
    /// `(name, category)` requests from `category:name` prefixes
    pub category_requests: Vec<(String, Category)>,
    /// Post-save directives
    pub post: Vec<Directive>,
    /// Remaining tokens: plain tags, negations, and prefix-stripped names
    pub tags: Vec<String>,
}

/// Partition lowercased tokens. Category-prefixed tokens are replaced by
/// their bare names in `tags`; negated (`-tag`) tokens stay in `tags` for
/// the negation stage.
pub fn partition(tokens: Vec<String>) -> PartitionedTokens {
    let mut out = PartitionedTokens::default();

    for token in tokens {
        if let Some(result) = parse_pre(&token) {
            if let Some(metatag) = result {
                out.pre.push(metatag);
            }
            continue;
        }
        if let Some(result) = parse_post(&token) {
            for directive in result {
                out.post.push(directive);
            }
            continue;
        }
        if let Some((prefix, name)) = token.split_once(':') {
            if let Some(category) = Category::from_prefix(prefix) {
                if !name.is_empty() {
                    out.category_requests.push((name.to_string(), category));
                    out.tags.push(name.to_string());
                }
                continue;
            }
        }
        out.tags.push(token);
    }

    out
}

/// `Some(None)` means the token is a pre metatag but malformed (consumed,
/// no effect). `None` means the token is not a pre metatag at all.
#[allow(clippy::option_option)]
fn parse_pre(token: &str) -> Option<Option<Metatag>> {
    if let Some(value) = token.strip_prefix("rating:") {
        let rating = value.chars().next().and_then(|c| match c {
            's' => Some(Rating::Safe),
            'q' => Some(Rating::Questionable),
            'e' => Some(Rating::Explicit),
            _ => None,
        });
        return Some(rating.map(Metatag::Rating));
    }

    if let Some(value) = token.strip_prefix("parent:") {
        if value == "none" || value == "0" {
            return Some(Some(Metatag::ParentNone));
        }
        return Some(value.parse::<i64>().ok().map(Metatag::Parent));
    }

    if let Some(value) = token.strip_prefix("-parent:") {
        return Some(value.parse::<i64>().ok().map(Metatag::RemoveParent));
    }

    for (prefix, engage) in [("locked:", true), ("-locked:", false)] {
        if let Some(value) = token.strip_prefix(prefix) {
            let kind = match value {
                "note" | "notes" => Some(LockKind::Notes),
                "rating" => Some(LockKind::Rating),
                "status" => Some(LockKind::Status),
                _ => None,
            };
            return Some(kind.map(|kind| Metatag::Lock { kind, engage }));
        }
    }

    None
}

fn pool_ref(value: &str) -> PoolRef {
    match value.parse::<i64>() {
        Ok(id) => PoolRef::Id(id),
        Err(_) => PoolRef::Name(value.to_string()),
    }
}

fn set_ref(value: &str) -> SetRef {
    match value.parse::<i64>() {
        Ok(id) => SetRef::Id(id),
        Err(_) => SetRef::Shortname(value.to_string()),
    }
}

/// `Some(vec![])` consumes a malformed post metatag with no effect.
fn parse_post(token: &str) -> Option<Vec<Directive>> {
    let (prefix, value) = token.split_once(':')?;

    let directives = match prefix {
        "pool" | "newpool" => {
            if value.is_empty() {
                vec![]
            } else {
                vec![Directive::AddToPool { pool: pool_ref(value) }]
            }
        }
        "-pool" => {
            if value.is_empty() {
                vec![]
            } else {
                vec![Directive::RemoveFromPool { pool: pool_ref(value) }]
            }
        }
        "set" => {
            if value.is_empty() {
                vec![]
            } else {
                vec![Directive::AddToSet { set: set_ref(value) }]
            }
        }
        "-set" => {
            if value.is_empty() {
                vec![]
            } else {
                vec![Directive::RemoveFromSet { set: set_ref(value) }]
            }
        }
        "fav" => vec![Directive::Favorite],
        "-fav" => vec![Directive::Unfavorite],
        "upvote" => vec![Directive::VoteUp],
        "downvote" => vec![Directive::VoteDown],
        "child" => {
            if value == "none" {
                vec![Directive::ClearChildren]
            } else if value.is_empty() {
                vec![]
            } else {
                vec![Directive::LinkChildren { expr: value.to_string() }]
            }
        }
        "-child" => {
            if value.is_empty() {
                vec![]
            } else {
                vec![Directive::UnlinkChildren { expr: value.to_string() }]
            }
        }
        _ => return None,
    };

    Some(directives)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aspect_ratio_detection() {
        assert!(is_aspect_ratio("16:9"));
        assert!(is_aspect_ratio("4:3"));
        assert!(!is_aspect_ratio("rating:e"));
        assert!(!is_aspect_ratio("16:9a"));
    }

    #[test]
    fn test_casesensitive_source_last_wins() {
        let (captured, rest) =
            extract_casesensitive(tokens(&["cat", "source:OLD", "Source:\"New URL\""]));
        assert_eq!(
            captured,
            Some(CaseSensitiveMetatag::Source(Some("New URL".to_string())))
        );
        assert_eq!(rest, tokens(&["cat"]));
    }

    #[test]
    fn test_casesensitive_source_none_clears() {
        let (captured, _) = extract_casesensitive(tokens(&["source:none"]));
        assert_eq!(captured, Some(CaseSensitiveMetatag::Source(None)));
    }

    #[test]
    fn test_newpool_is_captured_but_kept() {
        let (captured, rest) = extract_casesensitive(tokens(&["newpool:My_Pool", "cat"]));
        assert_eq!(
            captured,
            Some(CaseSensitiveMetatag::NewPool("My_Pool".to_string()))
        );
        // Token survives for the pool-add directive partition.
        assert_eq!(rest, tokens(&["newpool:My_Pool", "cat"]));
    }

    #[test]
    fn test_partition_pre_metatags() {
        let out = partition(tokens(&["rating:e", "parent:none", "-parent:12", "locked:rating"]));
        assert_eq!(
            out.pre,
            vec![
                Metatag::Rating(Rating::Explicit),
                Metatag::ParentNone,
                Metatag::RemoveParent(12),
                Metatag::Lock { kind: LockKind::Rating, engage: true },
            ]
        );
        assert!(out.tags.is_empty());
    }

    #[test]
    fn test_partition_malformed_metatags_are_consumed() {
        let out = partition(tokens(&["rating:x", "parent:abc", "locked:sideways"]));
        assert!(out.pre.is_empty());
        assert!(out.tags.is_empty());
    }

    #[test]
    fn test_partition_post_directives() {
        let out = partition(tokens(&["pool:12", "-set:best_of", "fav:me", "child:100,101"]));
        assert_eq!(
            out.post,
            vec![
                Directive::AddToPool { pool: PoolRef::Id(12) },
                Directive::RemoveFromSet { set: SetRef::Shortname("best_of".to_string()) },
                Directive::Favorite,
                Directive::LinkChildren { expr: "100,101".to_string() },
            ]
        );
    }

    #[test]
    fn test_partition_category_prefix() {
        let out = partition(tokens(&["artist:kenket", "char:renamon", "cat"]));
        assert_eq!(out.tags, tokens(&["kenket", "renamon", "cat"]));
        assert_eq!(
            out.category_requests,
            vec![
                ("kenket".to_string(), Category::Artist),
                ("renamon".to_string(), Category::Character),
            ]
        );
    }

    #[test]
    fn test_negations_stay_in_tag_stream() {
        let out = partition(tokens(&["-blue_sky", "red"]));
        assert_eq!(out.tags, tokens(&["-blue_sky", "red"]));
    }
}
