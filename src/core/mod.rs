//! Core infrastructure: error types and fundamental type aliases.

pub mod error;
pub mod types;

pub use error::{Result, SurrogateError};
pub use types::{FoldIndices, GroupId};
