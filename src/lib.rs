//! TagWall Core Library
//!
//! This crate provides the tag-edit engine for TagWall, an imageboard
//! content-tagging system. It is designed to be frontend-agnostic: the
//! surrounding application owns posts, users, pools, and sets, and hands
//! edits to the engine, which resolves them into a final tag string,
//! per-category counters, warnings, and version history.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Data structures (Post, Tag, PostVersion, EditRequest)
//! - `db`: SQLite store for the tag registry and version history
//! - `services`: Pipeline stages (metatags, locks, auto tags, versioning)
//! - `config`: Tunable thresholds and limits
//! - `utils`: Error handling
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagwall_core::models::{EditContext, EditRequest, Post};
//! use tagwall_core::services::InMemoryTagRelations;
//! use tagwall_core::{EngineConfig, TagEngine};
//!
//! let engine = TagEngine::open_in_memory(
//!     Arc::new(InMemoryTagRelations::new()),
//!     EngineConfig::default(),
//! )
//! .unwrap();
//!
//! let mut post = Post::new(1, 100);
//! let edit = EditRequest {
//!     tag_string: Some("cat rating:s".to_string()),
//!     ..EditRequest::default()
//! };
//! let outcome = engine
//!     .apply_edit(&mut post, &edit, &EditContext::member(100))
//!     .unwrap();
//! assert_eq!(outcome.final_tag_string, "cat");
//! ```

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::EngineConfig;
pub use db::{Database, DatabaseStats};
pub use models::{
    Category, EditContext, EditOutcome, EditRequest, Post, PostVersion, Privilege, Rating, Tag,
    VersionAction, VersionDiff,
};
pub use services::{InMemoryTagRelations, TagRelations};
pub use utils::{AppError, AppResult};

use std::path::PathBuf;
use std::sync::Arc;

use crate::services::{pipeline, versioning};

/// TagWall engine context.
///
/// Holds the shared resources every edit needs: the tag store, the
/// alias/implication source, and the configured thresholds.
pub struct TagEngine {
    /// Tag registry and version history store
    pub db: Arc<Database>,
    /// Alias and implication source
    pub relations: Arc<dyn TagRelations>,
    /// Thresholds and limits
    pub config: EngineConfig,
}

impl TagEngine {
    /// Open (or create) the store at the given path.
    pub fn open(
        path: PathBuf,
        relations: Arc<dyn TagRelations>,
        config: EngineConfig,
    ) -> AppResult<Self> {
        let db = Database::open(path)?;
        db.init()?;
        Ok(Self {
            db: Arc::new(db),
            relations,
            config,
        })
    }

    /// Open a transient in-memory store.
    pub fn open_in_memory(
        relations: Arc<dyn TagRelations>,
        config: EngineConfig,
    ) -> AppResult<Self> {
        let db = Database::open_in_memory()?;
        db.init()?;
        Ok(Self {
            db: Arc::new(db),
            relations,
            config,
        })
    }

    /// Run one edit against a post. See [`services::pipeline::apply_edit`].
    pub fn apply_edit(
        &self,
        post: &mut Post,
        edit: &EditRequest,
        ctx: &EditContext,
    ) -> AppResult<EditOutcome> {
        pipeline::apply_edit(&self.db, self.relations.as_ref(), &self.config, post, edit, ctx)
    }

    /// Restore a post to a stored version by re-running the full edit
    /// path with that version's snapshot. This always records a new
    /// version; history is never rewritten.
    pub fn revert_to(
        &self,
        post: &mut Post,
        version_id: i64,
        ctx: &EditContext,
    ) -> AppResult<EditOutcome> {
        let version = self
            .db
            .get_version(version_id)?
            .filter(|v| v.post_id == post.id)
            .ok_or_else(|| {
                AppError::Revert(format!(
                    "version {} not found for post {}",
                    version_id, post.id
                ))
            })?;

        let edit = EditRequest {
            tag_string: Some(version.tags.clone()),
            locked_tags: Some(version.locked_tags.clone().unwrap_or_default()),
            source: Some(version.source.clone()),
            rating: Some(version.rating),
            parent_id: Some(version.parent_id),
            description: Some(version.description.clone()),
            edit_reason: Some(format!("Revert to version {}", version.version)),
            force_new_version: true,
            ..EditRequest::default()
        };
        self.apply_edit(post, &edit, ctx)
    }

    /// Diff a post's live state against a stored version.
    pub fn diff_against(&self, post: &Post, version_id: i64) -> AppResult<VersionDiff> {
        let version = self
            .db
            .get_version(version_id)?
            .filter(|v| v.post_id == post.id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "version {} not found for post {}",
                    version_id, post.id
                ))
            })?;
        Ok(versioning::diff_against(post, &version))
    }

    /// Full version history for a post, oldest first.
    pub fn history(&self, post_id: i64) -> AppResult<Vec<PostVersion>> {
        self.db.list_versions(post_id)
    }

    /// Get the database reference.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}
