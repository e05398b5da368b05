//! # GBT Surrogate
//!
//! A gradient-boosted-tree surrogate benchmark model for neural
//! architecture and hyperparameter search, in pure Rust.
//!
//! Instead of training candidate networks for real, a [`Surrogate`] is fit
//! once on tabular benchmark data (realized configurations plus an epoch
//! column as features, performance metrics as labels) and then answers
//! performance queries in microseconds. The crate provides:
//!
//! - a configuration-space schema ([`ConfigurationSpace`]) describing what
//!   each configuration looks like,
//! - dataset splitting with group and stratification constraints
//!   ([`dataset::split`]),
//! - a preprocessing + regression pipeline (one-hot encoding followed by
//!   one boosted regressor per output column),
//! - randomized hyperparameter search over a fixed candidate distribution
//!   ([`hyperopt`]),
//! - persistence of fitted surrogates to a directory of compressed
//!   payloads ([`io`]).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gbt_surrogate::{ConfigurationSpace, Domain, FitOptions, Surrogate};
//!
//! # fn main() -> gbt_surrogate::Result<()> {
//! let space = ConfigurationSpace::new()
//!     .add("activation", Domain::Categorical {
//!         choices: vec!["relu".into(), "hardswish".into(), "mish".into()],
//!     })
//!     .add("width", Domain::Integer { lower: 4, upper: 16 });
//!
//! let mut surrogate = Surrogate::new(space)?;
//!
//! // 10 sampled configurations, 100 epoch rows each, two metrics
//! let (features, labels, groups) =
//!     surrogate.random_dataset(10, 100, &["valid_acc", "latency"], 0)?;
//!
//! let options = FitOptions::new()
//!     .with_test_size(0.2)
//!     .with_random_state(42);
//! let report = surrogate.fit(&features, &labels, Some(&groups), &options)?;
//! println!("train r2 = {:.3}", report.train_r2);
//!
//! let predictions = surrogate.predict(&features)?;
//! surrogate.dump("surrogate_model/")?;
//! let restored = Surrogate::load("surrogate_model/")?;
//! assert_eq!(restored.predict(&features)?, predictions);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `core`: error types and fundamental type aliases
//! - `config`: configuration-space schema and booster hyperparameters
//! - `dataset`: tabular frames, train/test splitting, CV generators
//! - `boosting`: the internal gradient-boosted tree regressor
//! - `pipeline`: one-hot encoding + per-output regressors
//! - `hyperopt`: randomized hyperparameter search
//! - `metrics`: R² and mean-squared-error scoring
//! - `surrogate`: the top-level orchestrator
//! - `io`: persistence of saved surrogates

#![warn(missing_docs)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module
pub mod core;

// Configuration management module
pub mod config;

// Dataset management module
pub mod dataset;

// Gradient boosting module
pub mod boosting;

// Pipeline module
pub mod pipeline;

// Metrics module
pub mod metrics;

// Hyperparameter optimization module
pub mod hyperopt;

// Persistence module
pub mod io;

// Top-level orchestrator module
pub mod surrogate;

// Re-export core functionality for convenience
pub use crate::core::{
    error::{Result, SurrogateError},
    types::{FoldIndices, GroupId},
};

// Re-export configuration functionality
pub use config::{BoosterKind, BoosterParams, ConfigurationSpace, Domain, Hyperparameter, Objective, ParamValue};

// Re-export dataset functionality
pub use dataset::{
    frame::{Column, ColumnData, Frame},
    split::{prepare_dataset_for_training, CrossValidator, SplitOptions, Strata, TrainTestSplit},
};

// Re-export boosting functionality
pub use boosting::GbtRegressor;

// Re-export pipeline functionality
pub use pipeline::{OneHotEncoder, Pipeline};

// Re-export metrics functionality
pub use metrics::{mean_squared_error, r2_score};

// Re-export hyperparameter optimization functionality
pub use hyperopt::{randomized_search, SearchConfig, SearchOutcome, SearchSpace, TrialResult};

// Re-export persistence functionality
pub use io::{Format, HEADERS_FILENAME, MODEL_FILENAME, PARAMS_FILENAME};

// Re-export the orchestrator
pub use surrogate::{FitOptions, FitReport, FittedModel, Surrogate};
