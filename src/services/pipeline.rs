//! The tag-edit pipeline.
//!
//! `apply_edit` runs one edit end to end: diff application, concurrent
//! reconciliation, metatag extraction, negation, DNP guarding, aliasing,
//! lock enforcement, automatic tags, implication expansion, tag
//! registry resolution, counter aggregation, and version recording.
//! Stages are ordered so that each one sees a fully resolved view of the
//! stages before it; the lock removal set is re-applied at the end so
//! implications cannot resurrect a locked-out tag.
//!
//! All reads happen up front and the counter and version writes land in
//! one transaction, so a failed edit leaves the post, the post counts,
//! and the version history untouched. Tag rows are created lazily during
//! resolution and persist even when the edit then aborts; an unused row
//! is harmless and the next edit reuses it.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::db::{tag_dao, version_dao, Database};
use crate::models::edit::{Directive, EditContext, EditOutcome, EditRequest, Warnings};
use crate::models::post::Post;
use crate::models::tag::Category;
use crate::models::version::VersionAction;
use crate::services::autotag;
use crate::services::counters;
use crate::services::locked::LockDirective;
use crate::services::metatags::{self, CaseSensitiveMetatag, LockKind, Metatag};
use crate::services::parser;
use crate::services::reconciler;
use crate::services::relations::{self, TagRelations};
use crate::services::versioning::{self, ChangeSet, VersionPlan};
use crate::utils::{AppError, AppResult};

const DNP_TAGS: [&str; 2] = ["avoid_posting", "conditional_dnp"];
const EMPTY_SENTINEL: &str = "tagme";

/// Run one edit against a post. On success the post is updated in place
/// and the outcome describes everything that changed; on error nothing
/// is persisted.
pub fn apply_edit(
    db: &Database,
    tag_relations: &dyn TagRelations,
    config: &EngineConfig,
    post: &mut Post,
    edit: &EditRequest,
    ctx: &EditContext,
) -> AppResult<EditOutcome> {
    let mut warnings = Warnings::new();
    let mut working = post.clone();
    let before_tags = parser::scan(&post.tag_string);

    // Plain attribute overrides; metatags later win over these.
    if let Some(rating) = edit.rating {
        set_rating(&mut working, rating, ctx);
    }
    if let Some(parent_id) = edit.parent_id {
        working.parent_id = parent_id.filter(|&id| id != working.id);
    }
    if let Some(description) = &edit.description {
        working.description = description.clone();
    }
    if let Some(source) = &edit.source {
        working.source = source.clone();
    }
    if let Some(diff) = &edit.source_diff {
        apply_source_diff(&mut working, diff);
    }

    // Assemble the submitted token list.
    let mut removal_attempts: Vec<String> = Vec::new();
    let mut tokens = match &edit.tag_string {
        Some(replacement) => parser::scan(replacement),
        None => before_tags.clone(),
    };
    if let Some(diff) = &edit.tag_string_diff {
        apply_tag_diff(&mut tokens, diff, tag_relations, &mut removal_attempts);
    }

    // Reconcile against edits that landed since the author's snapshot.
    if let Some(old) = &edit.old_tag_string {
        let base = parser::scan(old);
        if base != before_tags {
            debug!(post_id = post.id, "reconciling concurrent edit");
            let merged = reconciler::merge(&base, &before_tags, &tokens);
            removal_attempts.extend(merged.removed);
            tokens = merged.tags;
        }
    }

    // source: and newpool: keep their casing; everything later is
    // lowercase.
    let (casesensitive, tokens) = metatags::extract_casesensitive(tokens);
    let mut directives: Vec<Directive> = Vec::new();
    match &casesensitive {
        Some(CaseSensitiveMetatag::Source(source)) => {
            working.source = source.clone().unwrap_or_default();
        }
        Some(CaseSensitiveMetatag::NewPool(name)) => {
            directives.push(Directive::CreatePool { name: name.clone() });
        }
        None => {}
    }
    let mut tokens: Vec<String> = tokens.into_iter().map(|t| t.to_lowercase()).collect();

    // 16:9 style tokens are never tags.
    let rejected: Vec<String> = tokens
        .iter()
        .filter(|t| metatags::is_aspect_ratio(t))
        .cloned()
        .collect();
    if !rejected.is_empty() {
        warnings.add(format!(
            "Ignored aspect-ratio token(s): {}",
            rejected.join(", ")
        ));
        tokens.retain(|t| !metatags::is_aspect_ratio(t));
    }

    let partitioned = metatags::partition(tokens);
    directives.extend(partitioned.post);
    for metatag in &partitioned.pre {
        apply_pre_metatag(&mut working, metatag, ctx);
    }

    // Negations.
    let mut tags: Vec<String> = Vec::new();
    let mut negated: Vec<String> = Vec::new();
    for token in partitioned.tags {
        match token.strip_prefix('-') {
            Some(name) if !name.is_empty() => {
                negated.push(relations::to_aliased(tag_relations, name));
            }
            Some(_) => {}
            None => tags.push(token),
        }
    }
    removal_attempts.extend(negated.iter().cloned());

    // Lock directive comes from the edit when given, else the post.
    let locked_source = match &edit.locked_tags {
        Some(s) if s.trim().is_empty() => None,
        Some(s) => Some(s.clone()),
        None => working.locked_tags.clone(),
    };
    let mut lock = match &locked_source {
        Some(s) => LockDirective::parse(db, tag_relations, s, &mut warnings)?,
        None => LockDirective::default(),
    };

    // DNP tags only enter through the lock list; clearing the lock
    // releases them even if the post already carried them.
    tags.retain(|name| !DNP_TAGS.contains(&name.as_str()) || lock.contains(name));

    let mut tags = relations::to_aliased_all(tag_relations, &tags);
    tags.retain(|name| !negated.contains(name));
    tags = lock.apply(tags, &mut warnings);

    if tags.is_empty() {
        tags.push(EMPTY_SENTINEL.to_string());
    }

    if config.enable_autotagging {
        tags = autotag::apply(tags, &working.media, &working.source_array(), config);
    }

    tags = relations::with_implied(tag_relations, &tags);

    // A DNP tag that survives is pinned, so a later edit cannot quietly
    // drop it.
    for dnp in DNP_TAGS {
        if tags.iter().any(|t| t == dnp) && !lock.add.iter().any(|t| t == dnp) {
            lock.add.push(dnp.to_string());
        }
    }

    // Implications must not resurrect locked-out tags.
    tags.retain(|name| !lock.remove.contains(name));
    tags = parser::dedup(tags);

    // Resolve against the registry; creation happens here.
    let mut requested: HashMap<String, Category> = HashMap::new();
    for (name, category) in &partitioned.category_requests {
        requested.insert(relations::to_aliased(tag_relations, name), *category);
    }
    let resolved = db.find_or_create_tags(&tags, &requested, &ctx.now.to_rfc3339())?;
    if !resolved.dropped.is_empty() {
        warnings.add(format!(
            "Ignored {} invalid tag name(s): {}",
            resolved.dropped.len(),
            resolved.dropped.join(", ")
        ));
        tags.retain(|name| !resolved.dropped.contains(name));
    }
    if !resolved.bad_category_changes.is_empty() {
        warnings.add(format!(
            "Ignored category change for existing tag(s): {}",
            resolved.bad_category_changes.join(", ")
        ));
    }

    if !ctx.automated && tags.len() > config.max_tags_per_post {
        return Err(AppError::TagCountExceeded {
            count: tags.len(),
            max: config.max_tags_per_post,
        });
    }

    working.tag_string = parser::join_sorted(&tags);
    working.locked_tags = lock.to_locked_string();

    let final_tags = parser::scan(&working.tag_string);
    let unremovable: Vec<String> = parser::intersect(&removal_attempts, &final_tags);
    if !unremovable.is_empty() {
        warnings.add(format!(
            "Could not remove {} tag(s): {}",
            unremovable.len(),
            unremovable.join(", ")
        ));
    }
    creation_warnings(&resolved, &before_tags, config, ctx, &mut warnings);

    // Counters.
    let categories: HashMap<String, Category> = resolved
        .tags
        .iter()
        .map(|t| (t.name.clone(), t.category))
        .collect();
    let new_counts = counters::recount(&final_tags, &categories);
    let category_deltas = counters::category_deltas(&post.category_counts, &new_counts);
    // Soft-deleted posts do not contribute to tag post counts.
    let post_count_deltas = if post.is_deleted {
        std::collections::BTreeMap::new()
    } else {
        counters::post_count_deltas(&before_tags, &final_tags)
    };
    working.category_counts = new_counts;
    working.tag_count = new_counts.total();

    // Version decision.
    let changes = change_set(post, &working, &before_tags, &final_tags);
    let latest = db.latest_version(post.id)?;
    let plan = versioning::decide(latest.as_ref(), &changes, ctx, edit.force_new_version);

    if matches!(plan, VersionPlan::Create { is_first: true, .. }) {
        first_upload_warnings(&new_counts, config, &mut warnings);
    }

    let version_action = db.transaction(|conn| {
        let incremented: Vec<String> = post_count_deltas
            .iter()
            .filter(|(_, &d)| d > 0)
            .map(|(name, _)| name.clone())
            .collect();
        let decremented: Vec<String> = post_count_deltas
            .iter()
            .filter(|(_, &d)| d < 0)
            .map(|(name, _)| name.clone())
            .collect();
        tag_dao::increment_post_counts(conn, &incremented)?;
        tag_dao::decrement_post_counts(conn, &decremented)?;

        match &plan {
            VersionPlan::Create { version, is_first } => {
                let row = versioning::build(
                    &working,
                    &changes,
                    ctx,
                    *version,
                    *is_first,
                    edit.edit_reason.clone(),
                );
                let version_id = version_dao::insert_version(conn, &row)?;
                debug!(post_id = post.id, version, version_id, "created version");
                Ok(VersionAction::Created { version: *version })
            }
            VersionPlan::Extend(existing) => {
                version_dao::merge_version(
                    conn,
                    existing,
                    &changes.added_tags,
                    &changes.removed_tags,
                    &changes.added_locked,
                    &changes.removed_locked,
                    &working.tag_string,
                    working.locked_tags.as_deref(),
                    &working.source,
                )?;
                Ok(VersionAction::Extended { version_id: existing.version_id })
            }
            VersionPlan::Skip => Ok(VersionAction::NoOp),
        }
    })?;

    if !warnings.is_empty() {
        warn!(post_id = post.id, count = warnings.len(), "edit produced warnings");
    }

    *post = working;
    Ok(EditOutcome {
        final_tag_string: post.tag_string.clone(),
        final_locked_tags: post.locked_tags.clone(),
        warnings: warnings.into_vec(),
        category_deltas,
        post_count_deltas,
        version_action,
        directives,
    })
}

fn set_rating(post: &mut Post, rating: crate::models::post::Rating, ctx: &EditContext) {
    if post.is_rating_locked && !ctx.privilege.is_janitor() {
        return;
    }
    post.rating = rating;
}

fn apply_pre_metatag(post: &mut Post, metatag: &Metatag, ctx: &EditContext) {
    match metatag {
        Metatag::Rating(rating) => set_rating(post, *rating, ctx),
        Metatag::ParentNone => post.parent_id = None,
        Metatag::Parent(id) => {
            if *id != post.id {
                post.parent_id = Some(*id);
            }
        }
        Metatag::RemoveParent(id) => {
            if post.parent_id == Some(*id) {
                post.parent_id = None;
            }
        }
        Metatag::Lock { kind, engage } => {
            let allowed = match kind {
                LockKind::Notes | LockKind::Rating => ctx.privilege.is_janitor(),
                LockKind::Status => ctx.privilege.is_admin(),
            };
            if !allowed {
                return;
            }
            match kind {
                LockKind::Notes => post.is_note_locked = *engage,
                LockKind::Rating => post.is_rating_locked = *engage,
                LockKind::Status => post.is_status_locked = *engage,
            }
        }
    }
}

/// "tag -tag" diff against the working token list. Removals are matched
/// through aliases and recorded for the unremovable warning.
fn apply_tag_diff(
    tokens: &mut Vec<String>,
    diff: &str,
    tag_relations: &dyn TagRelations,
    removal_attempts: &mut Vec<String>,
) {
    for token in parser::scan(diff) {
        match token.strip_prefix('-') {
            Some(name) if !name.is_empty() => {
                let target = relations::to_aliased(tag_relations, &name.to_lowercase());
                tokens.retain(|t| {
                    let lower = t.to_lowercase();
                    lower != target && relations::to_aliased(tag_relations, &lower) != target
                });
                removal_attempts.push(target);
            }
            Some(_) => {}
            None => {
                if !tokens.iter().any(|t| t.eq_ignore_ascii_case(&token)) {
                    tokens.push(token);
                }
            }
        }
    }
}

/// One URL per line; a "-" prefix removes. Order of survivors is kept.
fn apply_source_diff(post: &mut Post, diff: &str) {
    let mut sources = post.source_array();
    for line in diff.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(url) = line.strip_prefix('-') {
            sources.retain(|s| s != url);
        } else if !sources.iter().any(|s| s == line) {
            sources.push(line.to_string());
        }
    }
    post.source = sources.join("\n");
}

fn creation_warnings(
    resolved: &tag_dao::ResolvedTags,
    before_tags: &[String],
    config: &EngineConfig,
    ctx: &EditContext,
    warnings: &mut Warnings,
) {
    let created_general: Vec<&str> = resolved
        .tags
        .iter()
        .filter(|t| t.category == Category::General && resolved.created.contains(&t.name))
        .map(|t| t.name.as_str())
        .collect();
    if !created_general.is_empty() {
        warnings.add(format!(
            "Created {} new general tag(s): {}",
            created_general.len(),
            created_general.join(", ")
        ));
    }

    let invalid_added: Vec<&str> = resolved
        .tags
        .iter()
        .filter(|t| t.category == Category::Invalid && !before_tags.contains(&t.name))
        .map(|t| t.name.as_str())
        .collect();
    if !invalid_added.is_empty() {
        warnings.add(format!(
            "Added {} invalid tag(s): {}",
            invalid_added.len(),
            invalid_added.join(", ")
        ));
    }

    // An old zero-count tag coming back into use is usually a typo of a
    // live tag. Freshly created tags get a short grace window, and the
    // high-churn general/meta categories are exempt.
    let cutoff = ctx.now - chrono::Duration::seconds(config.repopulated_grace_secs);
    let repopulated: Vec<&str> = resolved
        .tags
        .iter()
        .filter(|t| {
            t.post_count == 0
                && t.category != Category::General
                && t.category != Category::Meta
                && !resolved.created.contains(&t.name)
                && !before_tags.contains(&t.name)
                && t.created_at_time().is_some_and(|at| at < cutoff)
        })
        .map(|t| t.name.as_str())
        .collect();
    if !repopulated.is_empty() {
        warnings.add(format!(
            "Repopulated {} old tag(s): {}",
            repopulated.len(),
            repopulated.join(", ")
        ));
    }
}

fn first_upload_warnings(
    counts: &crate::models::post::CategoryCounts,
    config: &EngineConfig,
    warnings: &mut Warnings,
) {
    if counts.artist == 0 {
        warnings.add("Post is missing an artist tag");
    }
    if (counts.general as usize) < config.min_general_tags {
        warnings.add(format!(
            "Post has only {} general tags; at least {} are recommended",
            counts.general, config.min_general_tags
        ));
    }
}

fn change_set(before: &Post, after: &Post, before_tags: &[String], after_tags: &[String]) -> ChangeSet {
    let locked_items = |s: &Option<String>| -> Vec<String> {
        s.as_deref().map(parser::scan).unwrap_or_default()
    };
    let locked_before = locked_items(&before.locked_tags);
    let locked_after = locked_items(&after.locked_tags);

    ChangeSet {
        tags_changed: before.tag_string != after.tag_string,
        source_changed: before.source != after.source,
        locked_changed: locked_before != locked_after,
        rating_changed: before.rating != after.rating,
        parent_changed: before.parent_id != after.parent_id,
        description_changed: before.description != after.description,
        added_tags: parser::minus(after_tags, before_tags),
        removed_tags: parser::minus(before_tags, after_tags),
        added_locked: parser::minus(&locked_after, &locked_before),
        removed_locked: parser::minus(&locked_before, &locked_after),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::{MediaInfo, Rating};
    use crate::services::relations::InMemoryTagRelations;

    fn setup() -> (Database, InMemoryTagRelations, EngineConfig) {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        (db, InMemoryTagRelations::new(), EngineConfig::default())
    }

    fn post() -> Post {
        let mut p = Post::new(1, 100);
        p.media = MediaInfo {
            width: Some(800),
            height: Some(600),
            size_bytes: 1024,
            is_webm: false,
            is_gif: false,
            is_png: false,
        };
        p
    }

    fn replace(tags: &str) -> EditRequest {
        EditRequest {
            tag_string: Some(tags.to_string()),
            ..EditRequest::default()
        }
    }

    #[test]
    fn test_basic_edit_sorts_and_dedups() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome =
            apply_edit(&db, &relations, &config, &mut p, &replace("Dog CAT dog"), &ctx).unwrap();
        assert_eq!(outcome.final_tag_string, "cat dog");
        assert_eq!(p.tag_count, 2);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        let first =
            apply_edit(&db, &relations, &config, &mut p, &replace("dog cat"), &ctx).unwrap();
        let second = apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace(&first.final_tag_string),
            &ctx,
        )
        .unwrap();
        assert_eq!(second.final_tag_string, first.final_tag_string);
        assert!(second.warnings.is_empty());
        assert!(matches!(second.version_action, VersionAction::NoOp));
    }

    #[test]
    fn test_empty_set_becomes_tagme() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome = apply_edit(&db, &relations, &config, &mut p, &replace(""), &ctx).unwrap();
        assert_eq!(outcome.final_tag_string, "tagme");
        assert_eq!(p.tag_count, 1);
    }

    #[test]
    fn test_diff_edit_scenario() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.tag_string = "blue dog".to_string();
        let ctx = EditContext::member(100);

        let edit = EditRequest {
            tag_string_diff: Some("red -blue cat".to_string()),
            ..EditRequest::default()
        };
        let outcome = apply_edit(&db, &relations, &config, &mut p, &edit, &ctx).unwrap();
        assert_eq!(outcome.final_tag_string, "cat dog red");
    }

    #[test]
    fn test_locked_tag_survives_removal() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.tag_string = "cat conditional_dnp".to_string();
        p.locked_tags = Some("conditional_dnp".to_string());
        let ctx = EditContext::member(100);

        let outcome = apply_edit(&db, &relations, &config, &mut p, &replace("cat"), &ctx).unwrap();
        assert!(outcome.final_tag_string.contains("conditional_dnp"));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.starts_with("Forcefully added")));
    }

    #[test]
    fn test_dnp_not_addable_without_lock() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome =
            apply_edit(&db, &relations, &config, &mut p, &replace("cat avoid_posting"), &ctx)
                .unwrap();
        assert_eq!(outcome.final_tag_string, "cat");
    }

    #[test]
    fn test_surviving_dnp_is_mirrored_into_lock() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.locked_tags = Some("avoid_posting".to_string());
        let ctx = EditContext::member(100);

        let outcome =
            apply_edit(&db, &relations, &config, &mut p, &replace("cat avoid_posting"), &ctx)
                .unwrap();
        assert!(outcome.final_tag_string.contains("avoid_posting"));
        assert_eq!(outcome.final_locked_tags, Some("avoid_posting".to_string()));
    }

    #[test]
    fn test_clearing_lock_releases_dnp() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.tag_string = "avoid_posting cat".to_string();
        p.locked_tags = Some("avoid_posting".to_string());
        let ctx = EditContext::member(100);

        let edit = EditRequest {
            tag_string: Some("avoid_posting cat".to_string()),
            locked_tags: Some(String::new()),
            ..EditRequest::default()
        };
        let outcome = apply_edit(&db, &relations, &config, &mut p, &edit, &ctx).unwrap();
        assert_eq!(outcome.final_tag_string, "cat");
        assert_eq!(outcome.final_locked_tags, None);
    }

    #[test]
    fn test_repopulated_warning_skips_general_and_meta() {
        let (db, relations, config) = setup();
        let mut requested = HashMap::new();
        requested.insert("old_species".to_string(), Category::Species);
        db.find_or_create_tags(
            &[
                "old_general".to_string(),
                "old_species".to_string(),
            ],
            &requested,
            "2020-01-01T00:00:00Z",
        )
        .unwrap();

        let mut p = post();
        let ctx = EditContext::member(100);
        let outcome = apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("old_general old_species"),
            &ctx,
        )
        .unwrap();

        let repopulated: Vec<&String> = outcome
            .warnings
            .iter()
            .filter(|w| w.starts_with("Repopulated"))
            .collect();
        assert_eq!(repopulated.len(), 1);
        assert!(repopulated[0].contains("old_species"));
        assert!(!repopulated[0].contains("old_general"));
    }

    #[test]
    fn test_deleted_post_does_not_bump_post_counts() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.is_deleted = true;
        let ctx = EditContext::member(100);

        let outcome = apply_edit(&db, &relations, &config, &mut p, &replace("cat"), &ctx).unwrap();
        assert!(outcome.post_count_deltas.is_empty());
        assert_eq!(db.get_tag_by_name("cat").unwrap().unwrap().post_count, 0);
        // category counters on the post itself still track its tags
        assert_eq!(p.tag_count, 1);
    }

    #[test]
    fn test_new_tag_warning_is_general_only() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome = apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("fresh_tag art:somebody"),
            &ctx,
        )
        .unwrap();

        let created: Vec<&String> = outcome
            .warnings
            .iter()
            .filter(|w| w.starts_with("Created"))
            .collect();
        assert_eq!(created.len(), 1);
        assert!(created[0].contains("fresh_tag"));
        assert!(!created[0].contains("somebody"));
    }

    #[test]
    fn test_counter_invariant() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome = apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("cat dog art:kenket rating:e"),
            &ctx,
        )
        .unwrap();
        let token_count = outcome.final_tag_string.split_whitespace().count() as i64;
        assert_eq!(p.tag_count, token_count);
        assert_eq!(p.category_counts.total(), token_count);
        assert_eq!(p.category_counts.artist, 1);
        assert_eq!(p.rating, Rating::Explicit);
    }

    #[test]
    fn test_post_counts_track_membership() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        apply_edit(&db, &relations, &config, &mut p, &replace("cat dog"), &ctx).unwrap();
        apply_edit(&db, &relations, &config, &mut p, &replace("cat bird"), &ctx).unwrap();

        assert_eq!(db.get_tag_by_name("cat").unwrap().unwrap().post_count, 1);
        assert_eq!(db.get_tag_by_name("dog").unwrap().unwrap().post_count, 0);
        assert_eq!(db.get_tag_by_name("bird").unwrap().unwrap().post_count, 1);
    }

    #[test]
    fn test_reconciliation_union_bias() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.tag_string = "a c".to_string();
        let ctx = EditContext::member(100);

        let edit = EditRequest {
            tag_string: Some("b d".to_string()),
            old_tag_string: Some("a b".to_string()),
            ..EditRequest::default()
        };
        let outcome = apply_edit(&db, &relations, &config, &mut p, &edit, &ctx).unwrap();
        assert_eq!(outcome.final_tag_string, "b c d");
    }

    #[test]
    fn test_automated_edits_merge_into_one_version() {
        let (db, relations, config) = setup();
        let mut p = post();
        let member = EditContext::member(100);
        apply_edit(&db, &relations, &config, &mut p, &replace("cat"), &member).unwrap();
        apply_edit(&db, &relations, &config, &mut p, &replace("cat dog"), &member).unwrap();

        let bot = EditContext::automated(5);
        let first =
            apply_edit(&db, &relations, &config, &mut p, &replace("cat dog fox"), &bot).unwrap();
        assert!(matches!(first.version_action, VersionAction::Created { version: 3 }));
        let second =
            apply_edit(&db, &relations, &config, &mut p, &replace("cat fox wolf"), &bot).unwrap();
        assert!(matches!(second.version_action, VersionAction::Extended { .. }));

        let versions = db.list_versions(1).unwrap();
        assert_eq!(versions.len(), 3);
        let merged = &versions[2];
        assert_eq!(merged.tags, "cat fox wolf");
        assert!(merged.added_tags.contains(&"fox".to_string()));
        assert!(merged.added_tags.contains(&"wolf".to_string()));
        assert!(merged.removed_tags.contains(&"dog".to_string()));
    }

    #[test]
    fn test_rating_change_always_creates_version() {
        let (db, relations, config) = setup();
        let mut p = post();
        let bot = EditContext::automated(5);
        apply_edit(&db, &relations, &config, &mut p, &replace("cat"), &bot).unwrap();
        apply_edit(&db, &relations, &config, &mut p, &replace("cat dog"), &bot).unwrap();

        let outcome =
            apply_edit(&db, &relations, &config, &mut p, &replace("cat dog rating:e"), &bot)
                .unwrap();
        assert!(matches!(outcome.version_action, VersionAction::Created { .. }));
    }

    #[test]
    fn test_autotagger_resolution() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.media.width = Some(4000);
        p.media.height = Some(3000);
        p.media.size_bytes = 5 * 1024 * 1024;
        p.media.is_png = true;
        let ctx = EditContext::member(100);

        let outcome = apply_edit(&db, &relations, &config, &mut p, &replace("cat"), &ctx).unwrap();
        let tags: Vec<&str> = outcome.final_tag_string.split_whitespace().collect();
        assert!(tags.contains(&"absurd_res"));
        assert!(!tags.contains(&"hi_res"));
        assert!(!tags.contains(&"thumbnail"));
        assert!(!tags.contains(&"huge_filesize"));
    }

    #[test]
    fn test_implications_expand_and_respect_locks() {
        let (db, mut relations, config) = setup();
        relations.add_implication("dog", "canine");
        relations.add_implication("canine", "mammal");
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome = apply_edit(&db, &relations, &config, &mut p, &replace("dog"), &ctx).unwrap();
        assert_eq!(outcome.final_tag_string, "canine dog mammal");

        p.locked_tags = Some("-mammal".to_string());
        let outcome = apply_edit(&db, &relations, &config, &mut p, &replace("cat"), &ctx).unwrap();
        // dog implies mammal transitively, so the lock removes dog too
        assert_eq!(outcome.final_tag_string, "cat");
    }

    #[test]
    fn test_aliases_are_resolved() {
        let (db, mut relations, config) = setup();
        relations.add_alias("doggo", "dog");
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome =
            apply_edit(&db, &relations, &config, &mut p, &replace("doggo cat"), &ctx).unwrap();
        assert_eq!(outcome.final_tag_string, "cat dog");
    }

    #[test]
    fn test_tag_count_cap_skipped_for_automated() {
        let (db, relations, mut config) = setup();
        config.max_tags_per_post = 2;
        let mut p = post();

        let err = apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("a b c"),
            &EditContext::member(100),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::TagCountExceeded { count: 3, max: 2 }));
        // the post itself is untouched
        assert_eq!(p.tag_string, "");
        assert!(db.list_versions(1).unwrap().is_empty());

        let outcome = apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("a b c"),
            &EditContext::automated(5),
        )
        .unwrap();
        assert_eq!(outcome.final_tag_string, "a b c");
    }

    #[test]
    fn test_rating_lock_blocks_members() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.rating = Rating::Safe;
        p.is_rating_locked = true;

        apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("cat rating:e"),
            &EditContext::member(100),
        )
        .unwrap();
        assert_eq!(p.rating, Rating::Safe);

        let mut janitor = EditContext::member(7);
        janitor.privilege = crate::models::edit::Privilege::Janitor;
        apply_edit(&db, &relations, &config, &mut p, &replace("cat rating:e"), &janitor).unwrap();
        assert_eq!(p.rating, Rating::Explicit);
    }

    #[test]
    fn test_lock_metatags_require_privilege() {
        let (db, relations, config) = setup();
        let mut p = post();

        apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("cat locked:rating"),
            &EditContext::member(100),
        )
        .unwrap();
        assert!(!p.is_rating_locked);

        let mut janitor = EditContext::member(7);
        janitor.privilege = crate::models::edit::Privilege::Janitor;
        apply_edit(&db, &relations, &config, &mut p, &replace("cat locked:rating"), &janitor)
            .unwrap();
        assert!(p.is_rating_locked);
    }

    #[test]
    fn test_directives_are_surfaced() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        let outcome = apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("cat pool:12 fav:me"),
            &ctx,
        )
        .unwrap();
        assert_eq!(outcome.directives.len(), 2);
        assert_eq!(outcome.final_tag_string, "cat");
    }

    #[test]
    fn test_source_metatag_keeps_case() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        apply_edit(
            &db,
            &relations,
            &config,
            &mut p,
            &replace("cat source:https://Example.com/Art.png"),
            &ctx,
        )
        .unwrap();
        assert_eq!(p.source, "https://Example.com/Art.png");
        assert!(!p.tag_string.contains("source"));
    }

    #[test]
    fn test_invalid_source_tagging() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.source = "not-a-url".to_string();
        let ctx = EditContext::member(100);

        let outcome = apply_edit(&db, &relations, &config, &mut p, &replace("cat"), &ctx).unwrap();
        assert!(outcome.final_tag_string.contains("invalid_source"));
    }

    #[test]
    fn test_parent_metatags() {
        let (db, relations, config) = setup();
        let mut p = post();
        let ctx = EditContext::member(100);

        apply_edit(&db, &relations, &config, &mut p, &replace("cat parent:42"), &ctx).unwrap();
        assert_eq!(p.parent_id, Some(42));

        apply_edit(&db, &relations, &config, &mut p, &replace("cat -parent:41"), &ctx).unwrap();
        assert_eq!(p.parent_id, Some(42));

        apply_edit(&db, &relations, &config, &mut p, &replace("cat -parent:42"), &ctx).unwrap();
        assert_eq!(p.parent_id, None);
    }

    #[test]
    fn test_unremovable_warning() {
        let (db, relations, config) = setup();
        let mut p = post();
        p.tag_string = "cat conditional_dnp".to_string();
        p.locked_tags = Some("conditional_dnp".to_string());
        let ctx = EditContext::member(100);

        let edit = EditRequest {
            tag_string_diff: Some("-conditional_dnp".to_string()),
            ..EditRequest::default()
        };
        let outcome = apply_edit(&db, &relations, &config, &mut p, &edit, &ctx).unwrap();
        assert!(outcome.final_tag_string.contains("conditional_dnp"));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.starts_with("Could not remove")));
    }
}
