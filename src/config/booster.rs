//! Booster hyperparameters shared by all per-output regressors.

use crate::core::error::{Result, SurrogateError};
use serde::{Deserialize, Serialize};

/// Training objective of the boosted regressors.
///
/// Only squared-error regression is supported; the variant exists so the
/// objective travels with persisted hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Objective {
    /// Least-squares regression
    #[default]
    SquaredError,
}

/// Booster family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoosterKind {
    /// Gradient-boosted decision trees
    #[default]
    GbTree,
}

/// One set of booster hyperparameters, shared across every output column of
/// a multi-output pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    /// Training objective
    pub objective: Objective,
    /// Booster family
    pub booster: BoosterKind,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum number of samples required in each child of a split
    pub min_child_weight: usize,
    /// Fraction of feature columns drawn for each tree
    pub colsample_bytree: f64,
    /// Fraction of the tree's columns re-drawn at each depth level
    pub colsample_bylevel: f64,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
}

impl Default for BoosterParams {
    /// The fixed default configuration, evaluated first during
    /// hyperparameter search.
    fn default() -> Self {
        BoosterParams {
            objective: Objective::SquaredError,
            booster: BoosterKind::GbTree,
            max_depth: 6,
            min_child_weight: 1,
            colsample_bytree: 1.0,
            colsample_bylevel: 1.0,
            learning_rate: 0.3,
        }
    }
}

impl BoosterParams {
    /// Validate the hyperparameter values.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth < 1 {
            return Err(SurrogateError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                "must be at least 1",
            ));
        }
        if self.min_child_weight < 1 {
            return Err(SurrogateError::invalid_parameter(
                "min_child_weight",
                self.min_child_weight.to_string(),
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.colsample_bytree) {
            return Err(SurrogateError::invalid_parameter(
                "colsample_bytree",
                self.colsample_bytree.to_string(),
                "must be in range [0.0, 1.0]",
            ));
        }
        if !(0.0..=1.0).contains(&self.colsample_bylevel) {
            return Err(SurrogateError::invalid_parameter(
                "colsample_bylevel",
                self.colsample_bylevel.to_string(),
                "must be in range [0.0, 1.0]",
            ));
        }
        if self.learning_rate <= 0.0 || self.learning_rate > 1.0 {
            return Err(SurrogateError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = BoosterParams::default();
        assert_eq!(params.objective, Objective::SquaredError);
        assert_eq!(params.booster, BoosterKind::GbTree);
        assert_eq!(params.max_depth, 6);
        assert_eq!(params.min_child_weight, 1);
        assert_eq!(params.colsample_bytree, 1.0);
        assert_eq!(params.colsample_bylevel, 1.0);
        assert_eq!(params.learning_rate, 0.3);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut params = BoosterParams::default();
        params.max_depth = 0;
        assert!(params.validate().is_err());

        let mut params = BoosterParams::default();
        params.learning_rate = 0.0;
        assert!(params.validate().is_err());

        let mut params = BoosterParams::default();
        params.colsample_bytree = 1.5;
        assert!(params.validate().is_err());
    }
}
