//! Tag registry data access.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};

use crate::models::tag::{is_valid_name, Category, Tag};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

/// Map a database row to a Tag.
fn row_to_tag(row: &Row<'_>) -> rusqlite::Result<Tag> {
    let category: String = row.get("category")?;
    Ok(Tag {
        tag_id: row.get("tag_id")?,
        name: row.get("name")?,
        category: Category::from_name(&category).unwrap_or(Category::Invalid),
        post_count: row.get("post_count")?,
        created_at: row.get("created_at")?,
    })
}

/// Result of resolving a name list against the registry.
#[derive(Debug, Default)]
pub struct ResolvedTags {
    /// Tags found or created, in input order
    pub tags: Vec<Tag>,
    /// Names of tags created by this call
    pub created: Vec<String>,
    /// Names dropped because creation failed validation
    pub dropped: Vec<String>,
    /// Existing tags whose category a prefix tried and failed to change
    pub bad_category_changes: Vec<String>,
}

impl Database {
    /// Look up a tag by name.
    pub fn get_tag_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM tags WHERE name = ?1",
            params![name],
            row_to_tag,
        );

        match result {
            Ok(tag) => Ok(Some(tag)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Category of an existing tag, if any.
    pub fn category_for(&self, name: &str) -> AppResult<Option<Category>> {
        Ok(self.get_tag_by_name(name)?.map(|t| t.category))
    }

    /// Categories for a name list. Unknown names are absent from the map.
    pub fn categories_for(&self, names: &[String]) -> AppResult<HashMap<String, Category>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT category FROM tags WHERE name = ?1")?;

        let mut map = HashMap::with_capacity(names.len());
        for name in names {
            let category: Option<String> = match stmt.query_row(params![name], |row| row.get(0)) {
                Ok(c) => Some(c),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(AppError::Database(e)),
            };
            if let Some(c) = category {
                map.insert(
                    name.clone(),
                    Category::from_name(&c).unwrap_or(Category::Invalid),
                );
            }
        }

        Ok(map)
    }

    /// Find or create every tag in the list, in order.
    ///
    /// `requested_categories` holds categories asked for via prefix syntax.
    /// A prefix on a brand-new name assigns the category at creation; a
    /// prefix on an existing tag with a different category is refused and
    /// reported. Names failing validation are dropped, not errors.
    pub fn find_or_create_tags(
        &self,
        names: &[String],
        requested_categories: &HashMap<String, Category>,
        now: &str,
    ) -> AppResult<ResolvedTags> {
        let conn = self.connection()?;
        let mut resolved = ResolvedTags::default();

        for name in names {
            let existing = match conn.query_row(
                "SELECT * FROM tags WHERE name = ?1",
                params![name],
                row_to_tag,
            ) {
                Ok(tag) => Some(tag),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(AppError::Database(e)),
            };

            if let Some(tag) = existing {
                if let Some(&wanted) = requested_categories.get(name) {
                    if wanted != tag.category {
                        resolved.bad_category_changes.push(name.clone());
                    }
                }
                resolved.tags.push(tag);
                continue;
            }

            if !is_valid_name(name) {
                resolved.dropped.push(name.clone());
                continue;
            }

            let category = requested_categories
                .get(name)
                .copied()
                .unwrap_or(Category::General);
            conn.execute(
                "INSERT INTO tags (name, category, post_count, created_at) VALUES (?1, ?2, 0, ?3)",
                params![name, category.name(), now],
            )?;
            let tag = conn.query_row(
                "SELECT * FROM tags WHERE tag_id = ?1",
                params![conn.last_insert_rowid()],
                row_to_tag,
            )?;
            resolved.created.push(tag.name.clone());
            resolved.tags.push(tag);
        }

        Ok(resolved)
    }
}

/// Increment post counts for the given tag names.
pub fn increment_post_counts(conn: &Connection, names: &[String]) -> AppResult<usize> {
    bump_post_counts(conn, names, 1)
}

/// Decrement post counts for the given tag names.
pub fn decrement_post_counts(conn: &Connection, names: &[String]) -> AppResult<usize> {
    bump_post_counts(conn, names, -1)
}

fn bump_post_counts(conn: &Connection, names: &[String], delta: i64) -> AppResult<usize> {
    if names.is_empty() {
        return Ok(0);
    }

    let mut stmt = conn.prepare("UPDATE tags SET post_count = post_count + ?1 WHERE name = ?2")?;
    let mut count = 0;
    for name in names {
        count += stmt.execute(params![delta, name])?;
    }
    Ok(count)
}
