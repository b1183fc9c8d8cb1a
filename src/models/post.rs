//! Post data model.
//!
//! The post is a plain data struct here; the engine transforms it and
//! hands it back. Row persistence belongs to the surrounding application.

use serde::{Deserialize, Serialize};

use super::tag::Category;

/// Content rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[serde(rename = "s")]
    Safe,
    #[serde(rename = "q")]
    Questionable,
    #[serde(rename = "e")]
    Explicit,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Safe => "s",
            Rating::Questionable => "q",
            Rating::Explicit => "e",
        }
    }

    pub fn from_str(s: &str) -> Option<Rating> {
        match s {
            "s" => Some(Rating::Safe),
            "q" => Some(Rating::Questionable),
            "e" => Some(Rating::Explicit),
            _ => None,
        }
    }
}

/// Immutable file metadata, input to the auto tagger only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    /// Width in pixels
    pub width: Option<i64>,
    /// Height in pixels
    pub height: Option<i64>,
    /// File size in bytes
    pub size_bytes: i64,
    /// Format flags
    pub is_webm: bool,
    pub is_gif: bool,
    pub is_png: bool,
}

impl MediaInfo {
    pub fn has_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}

/// Per-category tag counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub general: i64,
    pub artist: i64,
    pub character: i64,
    pub copyright: i64,
    pub species: i64,
    pub meta: i64,
    pub lore: i64,
    pub invalid: i64,
    pub voice_actor: i64,
    pub gender: i64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::General => self.general,
            Category::Artist => self.artist,
            Category::Character => self.character,
            Category::Copyright => self.copyright,
            Category::Species => self.species,
            Category::Meta => self.meta,
            Category::Lore => self.lore,
            Category::Invalid => self.invalid,
            Category::VoiceActor => self.voice_actor,
            Category::Gender => self.gender,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut i64 {
        match category {
            Category::General => &mut self.general,
            Category::Artist => &mut self.artist,
            Category::Character => &mut self.character,
            Category::Copyright => &mut self.copyright,
            Category::Species => &mut self.species,
            Category::Meta => &mut self.meta,
            Category::Lore => &mut self.lore,
            Category::Invalid => &mut self.invalid,
            Category::VoiceActor => &mut self.voice_actor,
            Category::Gender => &mut self.gender,
        }
    }

    pub fn total(&self) -> i64 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// A post as the engine sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post ID
    pub id: i64,
    /// Uploader ID
    pub uploader_id: i64,
    /// Resolved tag set, space-joined and sorted
    pub tag_string: String,
    /// Protected tag list; a mini diff string ("a -b" forces a present
    /// and b absent)
    pub locked_tags: Option<String>,
    /// Content rating
    pub rating: Rating,
    /// Parent post
    pub parent_id: Option<i64>,
    /// Newline-joined source URLs
    pub source: String,
    /// Description text
    pub description: String,
    /// Total tag count; equals `category_counts.total()` after every
    /// pipeline run
    pub tag_count: i64,
    /// Per-category tag counters
    pub category_counts: CategoryCounts,
    /// File metadata for the auto tagger
    pub media: MediaInfo,
    /// Field locks
    pub is_note_locked: bool,
    pub is_rating_locked: bool,
    pub is_status_locked: bool,
    /// Soft-deleted posts do not contribute to tag post counts
    pub is_deleted: bool,
}

impl Post {
    /// A blank post with the given ID and uploader, ready for its first
    /// edit.
    pub fn new(id: i64, uploader_id: i64) -> Self {
        Self {
            id,
            uploader_id,
            tag_string: String::new(),
            locked_tags: None,
            rating: Rating::Questionable,
            parent_id: None,
            source: String::new(),
            description: String::new(),
            tag_count: 0,
            category_counts: CategoryCounts::default(),
            media: MediaInfo::default(),
            is_note_locked: false,
            is_rating_locked: false,
            is_status_locked: false,
            is_deleted: false,
        }
    }

    /// Source URLs as individual lines.
    pub fn source_array(&self) -> Vec<String> {
        if self.source.is_empty() {
            return Vec::new();
        }
        self.source.split('\n').map(|s| s.to_string()).collect()
    }

    /// Whether the post currently carries the given tag.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tag_string.split_whitespace().any(|t| t == name)
    }
}
