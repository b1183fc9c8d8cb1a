//! TagWall store layer.
//!
//! The engine persists only the tag registry and the version history;
//! the post row itself belongs to the surrounding application.

pub mod connection;
pub mod schema;
pub mod tag_dao;
pub mod version_dao;

pub use connection::{Database, DatabaseStats};
