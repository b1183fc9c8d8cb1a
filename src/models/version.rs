//! Edit-history data model.

use serde::{Deserialize, Serialize};

use super::post::Rating;

/// One recorded edit. Immutable once written, except that a rapid
/// follow-up automated edit by the same actor may fold its deltas into
/// the newest row instead of creating another.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVersion {
    /// Row ID
    pub version_id: i64,
    /// Post this version belongs to
    pub post_id: i64,
    /// Ordinal, monotonically increasing per post
    pub version: i64,
    /// Full tag string after the edit
    pub tags: String,
    /// Tags added/removed relative to the post's pre-edit state
    pub added_tags: Vec<String>,
    pub removed_tags: Vec<String>,
    /// Locked-tag string after the edit, and its token deltas
    pub locked_tags: Option<String>,
    pub added_locked_tags: Vec<String>,
    pub removed_locked_tags: Vec<String>,
    /// Attribute snapshot
    pub source: String,
    pub rating: Rating,
    pub parent_id: Option<i64>,
    pub description: String,
    /// Editor-supplied reason, if any
    pub reason: Option<String>,
    /// Actor
    pub updater_id: i64,
    /// First version ever recorded for the post
    pub is_first: bool,
    /// Recorded no rating/parent/description change; only basic versions
    /// are merge targets
    pub is_basic: bool,
    /// Creation time (RFC 3339); never touched by a merge
    pub created_at: String,
}

/// What the version manager did for one edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum VersionAction {
    /// A new row was written with this ordinal.
    Created { version: i64 },
    /// Deltas were folded into an existing row.
    Extended { version_id: i64 },
    /// Nothing watched changed; no row was written.
    NoOp,
}

/// Difference between a post's current state and a stored version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    /// Tags on the post but not in the version
    pub added_tags: Vec<String>,
    /// Tags in the version but not on the post
    pub removed_tags: Vec<String>,
    pub rating_changed: bool,
    pub source_changed: bool,
    pub parent_changed: bool,
    pub description_changed: bool,
}
