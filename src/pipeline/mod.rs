//! The preprocessing + regression pipeline.
//!
//! A [`Pipeline`] composes the one-hot encoder with one boosted regressor
//! per output column, all sharing a single booster hyperparameter set.
//! Building a pipeline has no side effects; it returns an unfit object that
//! [`Pipeline::fit`] turns into a predict-ready unit.

pub mod encoder;

pub use encoder::OneHotEncoder;

use crate::boosting::GbtRegressor;
use crate::config::{BoosterParams, ConfigurationSpace};
use crate::core::error::{Result, SurrogateError};
use crate::dataset::frame::Frame;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A fit/predict unit: categorical encoding followed by one independent
/// regressor per output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    encoder: OneHotEncoder,
    regressors: Vec<GbtRegressor>,
}

impl Pipeline {
    /// Compose an unfit pipeline for `num_outputs` regressands.
    ///
    /// Every regressor shares `params`; each gets a distinct seed derived
    /// from `seed` so column subsampling decorrelates across outputs while
    /// the whole pipeline stays deterministic.
    pub fn new(
        space: &ConfigurationSpace,
        params: &BoosterParams,
        n_estimators: usize,
        num_outputs: usize,
        seed: u64,
    ) -> Pipeline {
        let encoder = OneHotEncoder::from_space(space);
        let regressors = (0..num_outputs)
            .map(|k| GbtRegressor::new(params.clone(), n_estimators, seed.wrapping_add(k as u64)))
            .collect();
        Pipeline {
            encoder,
            regressors,
        }
    }

    /// Number of output columns this pipeline predicts.
    pub fn num_outputs(&self) -> usize {
        self.regressors.len()
    }

    /// The shared booster hyperparameters.
    pub fn params(&self) -> &BoosterParams {
        self.regressors
            .first()
            .map(|r| r.params())
            .expect("pipeline has at least one regressor")
    }

    /// Replace the shared hyperparameters on every regressor, discarding
    /// fitted state.
    pub fn set_params(&mut self, params: &BoosterParams) {
        for regressor in &mut self.regressors {
            regressor.set_params(params.clone());
        }
    }

    /// Whether every regressor has been fitted.
    pub fn is_fitted(&self) -> bool {
        !self.regressors.is_empty() && self.regressors.iter().all(|r| r.is_fitted())
    }

    /// Encode the features and fit every output regressor.
    ///
    /// Per-output fits run on the rayon thread pool.
    pub fn fit(&mut self, features: &Frame, labels: &Array2<f64>) -> Result<()> {
        if labels.ncols() != self.regressors.len() {
            return Err(SurrogateError::dimension_mismatch(
                format!("{} output columns", self.regressors.len()),
                format!("{} label columns", labels.ncols()),
            ));
        }
        if labels.nrows() != features.num_rows() {
            return Err(SurrogateError::dimension_mismatch(
                format!("{} feature rows", features.num_rows()),
                format!("{} label rows", labels.nrows()),
            ));
        }

        let encoded = self.encoder.encode(features)?;
        self.regressors
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(k, regressor)| {
                regressor.fit(encoded.view(), labels.column(k))
            })?;
        Ok(())
    }

    /// Encode the features and predict every output column.
    pub fn predict(&self, features: &Frame) -> Result<Array2<f64>> {
        let encoded = self.encoder.encode(features)?;
        let mut out = Array2::zeros((features.num_rows(), self.regressors.len()));
        for (k, regressor) in self.regressors.iter().enumerate() {
            let column = regressor.predict(encoded.view())?;
            out.column_mut(k).assign(&column);
        }
        Ok(out)
    }
}
