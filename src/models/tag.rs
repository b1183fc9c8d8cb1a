//! Tag data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag category. Fixed set; stored as its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    Artist,
    Character,
    Copyright,
    Species,
    Meta,
    Lore,
    Invalid,
    VoiceActor,
    Gender,
}

impl Category {
    /// All categories, in counter order.
    pub const ALL: [Category; 10] = [
        Category::General,
        Category::Artist,
        Category::Character,
        Category::Copyright,
        Category::Species,
        Category::Meta,
        Category::Lore,
        Category::Invalid,
        Category::VoiceActor,
        Category::Gender,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Artist => "artist",
            Category::Character => "character",
            Category::Copyright => "copyright",
            Category::Species => "species",
            Category::Meta => "meta",
            Category::Lore => "lore",
            Category::Invalid => "invalid",
            Category::VoiceActor => "voice_actor",
            Category::Gender => "gender",
        }
    }

    /// Parse a stored category name.
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Resolve a `prefix:` metatag head to a category. Accepts the full
    /// name plus the short aliases editors actually type.
    pub fn from_prefix(prefix: &str) -> Option<Category> {
        match prefix {
            "general" | "gen" => Some(Category::General),
            "artist" | "art" => Some(Category::Artist),
            "character" | "char" | "ch" | "oc" => Some(Category::Character),
            "copyright" | "copy" | "co" => Some(Category::Copyright),
            "species" | "spec" => Some(Category::Species),
            "meta" => Some(Category::Meta),
            "lore" | "lor" => Some(Category::Lore),
            "invalid" | "inv" => Some(Category::Invalid),
            "voice_actor" | "voiceactor" | "va" => Some(Category::VoiceActor),
            "gender" => Some(Category::Gender),
            _ => None,
        }
    }
}

/// A tag in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag ID
    pub tag_id: i64,
    /// Unique normalized name
    pub name: String,
    /// Category
    pub category: Category,
    /// Denormalized count of posts carrying this tag
    pub post_count: i64,
    /// Creation time (RFC 3339)
    pub created_at: String,
}

impl Tag {
    /// Creation time parsed back to a `DateTime`, if well-formed.
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Tag-name validity check. The full grammar validator lives with the
/// search layer; the registry only refuses names that would corrupt the
/// whitespace-delimited tag string or the metatag syntax.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 100
        && !name.starts_with('-')
        && !name.starts_with('~')
        && !name.contains(|c: char| c.is_whitespace() || c == '*' || c == ',' || c == '%')
        && name.chars().all(|c| !c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.name()), Some(category));
        }
    }

    #[test]
    fn test_category_prefix_aliases() {
        assert_eq!(Category::from_prefix("art"), Some(Category::Artist));
        assert_eq!(Category::from_prefix("char"), Some(Category::Character));
        assert_eq!(Category::from_prefix("va"), Some(Category::VoiceActor));
        assert_eq!(Category::from_prefix("rating"), None);
    }

    #[test]
    fn test_name_validity() {
        assert!(is_valid_name("red_fox"));
        assert!(is_valid_name("8-bit"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("-negated"));
        assert!(!is_valid_name("two words"));
        assert!(!is_valid_name("wild*card"));
    }
}
