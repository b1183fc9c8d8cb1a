//! TagWall data models.

pub mod edit;
pub mod post;
pub mod tag;
pub mod version;

pub use edit::{
    Directive, EditContext, EditOutcome, EditRequest, PoolRef, Privilege, SetRef, Warnings,
};
pub use post::{CategoryCounts, MediaInfo, Post, Rating};
pub use tag::{Category, Tag};
pub use version::{PostVersion, VersionAction, VersionDiff};

/// Current time as an RFC 3339 string, the format all store timestamps use.
pub fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
