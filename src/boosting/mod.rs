//! Gradient boosting: the internal regression estimator backing the
//! surrogate pipeline.

pub mod gbt;
pub mod tree;

pub use gbt::GbtRegressor;
pub use tree::{GrowthParams, RegressionTree, TreeNode};
