//! TagWall error handling module.
//!
//! Defines the application error type shared by the store layer and the
//! edit pipeline. Anything a caller can recover from (forced lock changes,
//! dropped tags, new-tag notices) is a warning on the edit outcome, not an
//! error; `AppError` is reserved for failures that abort the edit.

use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The edit would leave the post with more tags than allowed.
    /// Aborts the whole edit; nothing is persisted.
    #[error("tag count {count} exceeds maximum of {max}")]
    TagCountExceeded { count: usize, max: usize },

    /// Invalid revert target
    #[error("revert error: {0}")]
    Revert(String),

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// General error
    #[error("{0}")]
    General(String),
}

/// Application result type alias.
pub type AppResult<T> = Result<T, AppError>;
