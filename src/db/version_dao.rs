//! Post version history data access.

use rusqlite::{params, Connection, Row};

use crate::models::post::Rating;
use crate::models::version::PostVersion;
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

fn split_list(s: String) -> Vec<String> {
    s.split_whitespace().map(|t| t.to_string()).collect()
}

fn join_list(list: &[String]) -> String {
    list.join(" ")
}

/// Map a database row to a PostVersion.
fn row_to_version(row: &Row<'_>) -> rusqlite::Result<PostVersion> {
    let rating: String = row.get("rating")?;
    Ok(PostVersion {
        version_id: row.get("version_id")?,
        post_id: row.get("post_id")?,
        version: row.get("version")?,
        tags: row.get("tags")?,
        added_tags: split_list(row.get("added_tags")?),
        removed_tags: split_list(row.get("removed_tags")?),
        locked_tags: row.get("locked_tags")?,
        added_locked_tags: split_list(row.get("added_locked_tags")?),
        removed_locked_tags: split_list(row.get("removed_locked_tags")?),
        source: row.get("source")?,
        rating: Rating::from_str(&rating).unwrap_or(Rating::Questionable),
        parent_id: row.get("parent_id")?,
        description: row.get("description")?,
        reason: row.get("reason")?,
        updater_id: row.get("updater_id")?,
        is_first: row.get("is_first")?,
        is_basic: row.get("is_basic")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// The most recent version for a post, if any.
    pub fn latest_version(&self, post_id: i64) -> AppResult<Option<PostVersion>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM post_versions WHERE post_id = ?1 ORDER BY version DESC LIMIT 1",
            params![post_id],
            row_to_version,
        );

        match result {
            Ok(version) => Ok(Some(version)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Fetch a version by row ID.
    pub fn get_version(&self, version_id: i64) -> AppResult<Option<PostVersion>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM post_versions WHERE version_id = ?1",
            params![version_id],
            row_to_version,
        );

        match result {
            Ok(version) => Ok(Some(version)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// All versions for a post in ordinal order.
    pub fn list_versions(&self, post_id: i64) -> AppResult<Vec<PostVersion>> {
        let conn = self.connection()?;

        let mut stmt =
            conn.prepare("SELECT * FROM post_versions WHERE post_id = ?1 ORDER BY version ASC")?;
        let versions: Vec<PostVersion> = stmt
            .query_map(params![post_id], row_to_version)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(versions)
    }
}

/// Insert a new version row. The `version_id` on the input is ignored;
/// the assigned row ID is returned.
pub fn insert_version(conn: &Connection, version: &PostVersion) -> AppResult<i64> {
    conn.execute(
        r#"
        INSERT INTO post_versions (
            post_id, version, tags, added_tags, removed_tags,
            locked_tags, added_locked_tags, removed_locked_tags,
            source, rating, parent_id, description, reason,
            updater_id, is_first, is_basic, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
        params![
            version.post_id,
            version.version,
            version.tags,
            join_list(&version.added_tags),
            join_list(&version.removed_tags),
            version.locked_tags,
            join_list(&version.added_locked_tags),
            join_list(&version.removed_locked_tags),
            version.source,
            version.rating.as_str(),
            version.parent_id,
            version.description,
            version.reason,
            version.updater_id,
            version.is_first,
            version.is_basic,
            version.created_at,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Fold a follow-up edit's deltas into an existing version row.
///
/// Added/removed lists are unioned with cancellation: a tag added by one
/// edit and removed by the next vanishes from the delta entirely. The
/// row's ordinal and created_at are left untouched.
pub fn merge_version(
    conn: &Connection,
    existing: &PostVersion,
    added_tags: &[String],
    removed_tags: &[String],
    added_locked: &[String],
    removed_locked: &[String],
    tags: &str,
    locked_tags: Option<&str>,
    source: &str,
) -> AppResult<()> {
    let all_added = union(&existing.added_tags, added_tags);
    let all_removed = union(&existing.removed_tags, removed_tags);
    let merged_added = minus(&all_added, &all_removed);
    let merged_removed = minus(&all_removed, &all_added);

    let all_locked_added = union(&existing.added_locked_tags, added_locked);
    let all_locked_removed = union(&existing.removed_locked_tags, removed_locked);
    let merged_locked_added = minus(&all_locked_added, &all_locked_removed);
    let merged_locked_removed = minus(&all_locked_removed, &all_locked_added);

    conn.execute(
        r#"
        UPDATE post_versions SET
            tags = ?1, added_tags = ?2, removed_tags = ?3,
            locked_tags = ?4, added_locked_tags = ?5, removed_locked_tags = ?6,
            source = ?7
        WHERE version_id = ?8
        "#,
        params![
            tags,
            join_list(&merged_added),
            join_list(&merged_removed),
            locked_tags,
            join_list(&merged_locked_added),
            join_list(&merged_locked_removed),
            source,
            existing.version_id,
        ],
    )?;

    Ok(())
}

fn union(a: &[String], b: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b.iter()) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

fn minus(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|item| !b.contains(item)).cloned().collect()
}
