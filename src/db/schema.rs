//! Database schema definitions.
//!
//! CREATE statements and migration scripts for the tag registry and the
//! post version history.

/// Schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initial schema SQL
pub const INIT_SCHEMA: &str = r#"
-- Tag registry
CREATE TABLE IF NOT EXISTS tags (
    tag_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL UNIQUE,
    category        TEXT NOT NULL DEFAULT 'general',
    post_count      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tags_category ON tags(category);

-- Post edit history
CREATE TABLE IF NOT EXISTS post_versions (
    version_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id             INTEGER NOT NULL,
    version             INTEGER NOT NULL,
    tags                TEXT NOT NULL,
    added_tags          TEXT NOT NULL DEFAULT '',
    removed_tags        TEXT NOT NULL DEFAULT '',
    locked_tags         TEXT,
    added_locked_tags   TEXT NOT NULL DEFAULT '',
    removed_locked_tags TEXT NOT NULL DEFAULT '',
    source              TEXT NOT NULL DEFAULT '',
    rating              TEXT NOT NULL,
    parent_id           INTEGER,
    description         TEXT NOT NULL DEFAULT '',
    reason              TEXT,
    updater_id          INTEGER NOT NULL,
    is_first            INTEGER NOT NULL DEFAULT 0,
    is_basic            INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL,
    UNIQUE(post_id, version)
);

CREATE INDEX IF NOT EXISTS idx_post_versions_post ON post_versions(post_id);
CREATE INDEX IF NOT EXISTS idx_post_versions_updater ON post_versions(updater_id);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);
"#;

/// A single migration step.
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// Migrations past the initial schema, applied in order.
pub const MIGRATIONS: &[Migration] = &[];
