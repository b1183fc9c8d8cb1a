//! TagWall business logic services.

pub mod autotag;
pub mod counters;
pub mod locked;
pub mod metatags;
pub mod parser;
pub mod pipeline;
pub mod reconciler;
pub mod relations;
pub mod versioning;

pub use locked::LockDirective;
pub use metatags::{CaseSensitiveMetatag, Metatag, PartitionedTokens};
pub use pipeline::apply_edit;
pub use relations::{InMemoryTagRelations, TagRelations};
