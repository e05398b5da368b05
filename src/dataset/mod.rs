//! Dataset management: tabular frames, train/test splitting and
//! cross-validation split generation.

pub mod frame;
pub mod split;

pub use frame::{Column, ColumnData, Frame};
pub use split::{
    prepare_dataset_for_training, CrossValidator, SplitOptions, Strata, TrainTestSplit,
};
