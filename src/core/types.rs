//! Fundamental type aliases shared across the crate.

/// Identifier tying a data row to the underlying sampled configuration.
///
/// Rows sharing a group id belong to one configuration (e.g. repeated
/// per-epoch measurements) and are never separated by any dataset split.
pub type GroupId = i64;

/// Index pair produced by cross-validation generators: (train, validation).
pub type FoldIndices = (Vec<usize>, Vec<usize>);
