//! Configuration management: the configuration-space schema describing
//! surrogate inputs and the booster hyperparameter set.

pub mod booster;
pub mod space;

pub use booster::{BoosterKind, BoosterParams, Objective};
pub use space::{ConfigurationSpace, Domain, Hyperparameter, ParamValue};
