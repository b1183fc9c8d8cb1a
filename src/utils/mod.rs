//! TagWall utility module.

pub mod error;

pub use error::*;
