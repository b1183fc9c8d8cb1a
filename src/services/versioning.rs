//! Edit-history version decisions.
//!
//! Every save either creates an immutable version row, folds its deltas
//! into the latest row (rapid automated edits by the same actor), or
//! records nothing. The decision is pure; the DAO applies it inside the
//! edit transaction.

use crate::models::edit::EditContext;
use crate::models::post::Post;
use crate::models::version::{PostVersion, VersionDiff};
use crate::services::parser;

/// What changed in this edit, relative to the pre-edit post.
#[derive(Debug, Default, Clone)]
pub struct ChangeSet {
    pub tags_changed: bool,
    pub source_changed: bool,
    pub locked_changed: bool,
    pub rating_changed: bool,
    pub parent_changed: bool,
    pub description_changed: bool,
    pub added_tags: Vec<String>,
    pub removed_tags: Vec<String>,
    pub added_locked: Vec<String>,
    pub removed_locked: Vec<String>,
}

impl ChangeSet {
    pub fn any_watched(&self) -> bool {
        self.tags_changed
            || self.source_changed
            || self.locked_changed
            || self.rating_changed
            || self.parent_changed
            || self.description_changed
    }

    /// Something changed, and all of it is mergeable (tags, source,
    /// locked tags). Rating, parent, and description always force a
    /// fresh version.
    pub fn only_mergeable(&self) -> bool {
        let mergeable = self.tags_changed || self.source_changed || self.locked_changed;
        mergeable && !self.rating_changed && !self.parent_changed && !self.description_changed
    }
}

/// The version action chosen for a save.
#[derive(Debug)]
pub enum VersionPlan {
    Create { version: i64, is_first: bool },
    /// Fold deltas into this existing row.
    Extend(PostVersion),
    Skip,
}

pub fn decide(
    latest: Option<&PostVersion>,
    changes: &ChangeSet,
    ctx: &EditContext,
    force_new: bool,
) -> VersionPlan {
    let latest = match latest {
        None => return VersionPlan::Create { version: 1, is_first: true },
        Some(latest) => latest,
    };

    if force_new {
        return VersionPlan::Create { version: latest.version + 1, is_first: false };
    }

    if ctx.automated
        && changes.only_mergeable()
        && latest.updater_id == ctx.updater_id
        && latest.is_basic
        && !latest.is_first
    {
        return VersionPlan::Extend(latest.clone());
    }

    if changes.any_watched() {
        return VersionPlan::Create { version: latest.version + 1, is_first: false };
    }

    VersionPlan::Skip
}

/// Materialize a new version row from the post-edit state.
pub fn build(
    post: &Post,
    changes: &ChangeSet,
    ctx: &EditContext,
    version: i64,
    is_first: bool,
    reason: Option<String>,
) -> PostVersion {
    PostVersion {
        version_id: 0,
        post_id: post.id,
        version,
        tags: post.tag_string.clone(),
        added_tags: changes.added_tags.clone(),
        removed_tags: changes.removed_tags.clone(),
        locked_tags: post.locked_tags.clone(),
        added_locked_tags: changes.added_locked.clone(),
        removed_locked_tags: changes.removed_locked.clone(),
        source: post.source.clone(),
        rating: post.rating,
        parent_id: post.parent_id,
        description: post.description.clone(),
        reason: reason.clone(),
        updater_id: ctx.updater_id,
        is_first,
        // Annotated edits (reverts) and edits touching unmergeable
        // attributes are not basic and must not absorb later automated
        // deltas.
        is_basic: reason.is_none()
            && !changes.rating_changed
            && !changes.parent_changed
            && !changes.description_changed,
        created_at: ctx.now.to_rfc3339(),
    }
}

/// Diff a post's live state against a stored version.
pub fn diff_against(post: &Post, version: &PostVersion) -> VersionDiff {
    let live = parser::scan(&post.tag_string);
    let stored = parser::scan(&version.tags);
    VersionDiff {
        added_tags: parser::minus(&live, &stored),
        removed_tags: parser::minus(&stored, &live),
        rating_changed: post.rating != version.rating,
        source_changed: post.source != version.source,
        parent_changed: post.parent_id != version.parent_id,
        description_changed: post.description != version.description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::edit::EditContext;

    fn latest(updater_id: i64, is_basic: bool, is_first: bool) -> PostVersion {
        PostVersion {
            version_id: 7,
            post_id: 1,
            version: 3,
            tags: "cat".to_string(),
            added_tags: vec!["cat".to_string()],
            removed_tags: vec![],
            locked_tags: None,
            added_locked_tags: vec![],
            removed_locked_tags: vec![],
            source: String::new(),
            rating: crate::models::post::Rating::Safe,
            parent_id: None,
            description: String::new(),
            reason: None,
            updater_id,
            is_first,
            is_basic,
            created_at: String::new(),
        }
    }

    fn tag_change() -> ChangeSet {
        ChangeSet {
            tags_changed: true,
            added_tags: vec!["dog".to_string()],
            ..ChangeSet::default()
        }
    }

    #[test]
    fn test_first_save_creates_version_one() {
        let ctx = EditContext::member(10);
        let plan = decide(None, &tag_change(), &ctx, false);
        assert!(matches!(plan, VersionPlan::Create { version: 1, is_first: true }));
    }

    #[test]
    fn test_automated_same_actor_extends() {
        let ctx = EditContext::automated(10);
        let plan = decide(Some(&latest(10, true, false)), &tag_change(), &ctx, false);
        assert!(matches!(plan, VersionPlan::Extend(_)));
    }

    #[test]
    fn test_manual_edit_never_extends() {
        let ctx = EditContext::member(10);
        let plan = decide(Some(&latest(10, true, false)), &tag_change(), &ctx, false);
        assert!(matches!(plan, VersionPlan::Create { version: 4, is_first: false }));
    }

    #[test]
    fn test_rating_change_forces_new_version() {
        let ctx = EditContext::automated(10);
        let mut changes = tag_change();
        changes.rating_changed = true;
        let plan = decide(Some(&latest(10, true, false)), &changes, &ctx, false);
        assert!(matches!(plan, VersionPlan::Create { .. }));
    }

    #[test]
    fn test_never_extends_other_actor_or_first_or_annotated() {
        let ctx = EditContext::automated(10);
        for prior in [latest(11, true, false), latest(10, true, true), latest(10, false, false)] {
            let plan = decide(Some(&prior), &tag_change(), &ctx, false);
            assert!(matches!(plan, VersionPlan::Create { .. }));
        }
    }

    #[test]
    fn test_no_change_is_a_noop() {
        let ctx = EditContext::member(10);
        let plan = decide(Some(&latest(10, true, false)), &ChangeSet::default(), &ctx, false);
        assert!(matches!(plan, VersionPlan::Skip));
    }
}
