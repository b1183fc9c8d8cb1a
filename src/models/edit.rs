//! Edit request, context, and outcome types.
//!
//! The pipeline takes everything it needs as explicit inputs; there is no
//! ambient "current user" or "current time". `EditContext` carries both.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::Rating;
use super::tag::Category;
use super::version::VersionAction;

/// Actor privilege level. Controls which lock metatags are honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    Member,
    Janitor,
    Admin,
}

impl Privilege {
    pub fn is_janitor(self) -> bool {
        matches!(self, Privilege::Janitor | Privilege::Admin)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Privilege::Admin)
    }
}

/// Who is editing, and when.
#[derive(Debug, Clone)]
pub struct EditContext {
    /// Actor ID
    pub updater_id: i64,
    /// Automated/system edits bypass the tag-count cap and are eligible
    /// for version merging
    pub automated: bool,
    /// Privilege level for lock metatags
    pub privilege: Privilege,
    /// Edit timestamp
    pub now: DateTime<Utc>,
}

impl EditContext {
    pub fn member(updater_id: i64) -> Self {
        Self {
            updater_id,
            automated: false,
            privilege: Privilege::Member,
            now: Utc::now(),
        }
    }

    pub fn automated(updater_id: i64) -> Self {
        Self {
            automated: true,
            ..Self::member(updater_id)
        }
    }
}

/// One raw edit as submitted. Either a full replacement tag string, a
/// diff string ("tag -tag"), or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditRequest {
    /// Full replacement tag string
    pub tag_string: Option<String>,
    /// Diff against the current tags
    pub tag_string_diff: Option<String>,
    /// New locked-tags string; empty/whitespace clears the lock list
    pub locked_tags: Option<String>,
    /// The tag string the editor's client last saw. Triggers three-way
    /// reconciliation when another edit landed in between.
    pub old_tag_string: Option<String>,
    /// Full source replacement, newline-joined
    pub source: Option<String>,
    /// Source diff, one URL per line, "-" prefix removes
    pub source_diff: Option<String>,
    /// Attribute overrides
    pub rating: Option<Rating>,
    /// `Some(None)` detaches the parent
    pub parent_id: Option<Option<i64>>,
    pub description: Option<String>,
    /// Editor-supplied reason, recorded on the version
    pub edit_reason: Option<String>,
    /// Always record a fresh version, never merge
    pub force_new_version: bool,
}

/// Reference to a pool by ID or name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolRef {
    Id(i64),
    Name(String),
}

/// Reference to a set by ID or shortname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetRef {
    Id(i64),
    Shortname(String),
}

/// A post-save directive extracted from the tag string. These operate on
/// the persisted post, so the engine hands them back for the caller to
/// replay once the post row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Directive {
    AddToPool { pool: PoolRef },
    RemoveFromPool { pool: PoolRef },
    /// `newpool:` creates the pool if missing, then adds
    CreatePool { name: String },
    AddToSet { set: SetRef },
    RemoveFromSet { set: SetRef },
    Favorite,
    Unfavorite,
    VoteUp,
    VoteDown,
    /// `child:none`
    ClearChildren,
    /// Raw ID expression, interpreted by the caller (single IDs, lists,
    /// ranges)
    LinkChildren { expr: String },
    UnlinkChildren { expr: String },
}

/// Non-fatal notices accumulated across pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct Warnings(Vec<String>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Everything a successful edit produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    /// Final resolved tag string (sorted, space-joined)
    pub final_tag_string: String,
    /// Final locked-tags string
    pub final_locked_tags: Option<String>,
    /// Accumulated warnings, in stage order
    pub warnings: Vec<String>,
    /// Change in each per-category counter
    pub category_deltas: BTreeMap<Category, i64>,
    /// Change in each touched tag's post count
    pub post_count_deltas: BTreeMap<String, i64>,
    /// What the version manager recorded
    pub version_action: VersionAction,
    /// Pool/set/favorite/vote/child directives for the caller to replay
    pub directives: Vec<Directive>,
}
