//! Database connection management.
//!
//! SQLite connection handling and schema initialization for the tag
//! registry and version history.

use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::models::chrono_now;
use crate::utils::error::{AppError, AppResult};

use super::schema::{INIT_SCHEMA, MIGRATIONS, SCHEMA_VERSION};

/// Database connection manager.
#[derive(Clone)]
pub struct Database {
    /// Connection, wrapped for thread safety
    conn: Arc<Mutex<Connection>>,
    /// Database file path
    path: PathBuf,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open(path: PathBuf) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };

        db.configure()?;

        Ok(db)
    }

    /// Open an in-memory database (used by tests and embedding callers
    /// that own persistence elsewhere).
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(":memory:"),
        };

        db.configure()?;

        Ok(db)
    }

    /// Configure the connection.
    fn configure(&self) -> AppResult<()> {
        let conn = self.connection()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;

        Ok(())
    }

    /// Initialize the schema, applying pending migrations on an existing
    /// database.
    pub fn init(&self) -> AppResult<()> {
        let conn = self.connection()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !table_exists {
            tracing::info!("initializing schema");

            conn.execute_batch(INIT_SCHEMA)?;

            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![SCHEMA_VERSION, chrono_now()],
            )?;

            tracing::info!("schema initialized at version {}", SCHEMA_VERSION);
        } else {
            self.migrate_internal(&conn)?;
        }

        Ok(())
    }

    /// Apply pending migrations.
    fn migrate_internal(&self, conn: &Connection) -> AppResult<()> {
        let current_version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for migration in MIGRATIONS {
            if migration.version > current_version {
                tracing::info!(
                    "applying migration v{}: {}",
                    migration.version,
                    migration.description
                );

                conn.execute_batch(migration.sql)?;

                conn.execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, chrono_now()],
                )?;
            }
        }

        Ok(())
    }

    /// Borrow the connection for queries.
    pub fn connection(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            AppError::Database(rusqlite::Error::InvalidParameterName(e.to_string()))
        })
    }

    /// Run a closure inside a transaction. Rolls back on error.
    pub fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Database file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Store statistics.
    pub fn stats(&self) -> AppResult<DatabaseStats> {
        let conn = self.connection()?;

        let tag_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap_or(0);

        let version_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM post_versions", [], |row| row.get(0))
            .unwrap_or(0);

        Ok(DatabaseStats {
            tag_count,
            version_count,
        })
    }
}

/// Store statistics.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub tag_count: i64,
    pub version_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        db.init().expect("Failed to initialize database");

        let stats = db.stats().expect("Failed to get stats");
        assert_eq!(stats.tag_count, 0);
        assert_eq!(stats.version_count, 0);
    }

    #[test]
    fn test_schema_creation() {
        let db = Database::open_in_memory().expect("Failed to open database");
        db.init().expect("Failed to initialize");

        let conn = db.connection().expect("Failed to get connection");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"tags".to_string()));
        assert!(tables.contains(&"post_versions".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_open_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("tagwall.db");

        {
            let db = Database::open(path.clone()).expect("Failed to open database");
            db.init().expect("Failed to initialize");
            db.connection()
                .unwrap()
                .execute(
                    "INSERT INTO tags (name, created_at) VALUES ('kept', '2024-01-01T00:00:00Z')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(path).expect("Failed to reopen database");
        db.init().expect("Failed to re-init");
        assert_eq!(db.stats().unwrap().tag_count, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().expect("Failed to open database");
        db.init().expect("Failed to initialize");

        let result: AppResult<()> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO tags (name, created_at) VALUES ('doomed', '2024-01-01T00:00:00Z')",
                [],
            )?;
            Err(AppError::General("boom".to_string()))
        });
        assert!(result.is_err());

        let conn = db.connection().expect("Failed to get connection");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
