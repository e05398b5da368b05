//! Gradient-boosted regression for a single output column.
//!
//! Squared-error boosting: the model starts from the label mean and each
//! round fits a depth-limited regression tree to the current residuals,
//! adding its predictions scaled by the learning rate. Column subsampling
//! per tree and per level follows the booster hyperparameters. Fitting is
//! fully deterministic for a fixed seed.

use crate::boosting::tree::{GrowthParams, RegressionTree};
use crate::config::BoosterParams;
use crate::core::error::{Result, SurrogateError};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A gradient-boosted tree regressor for one regressand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbtRegressor {
    params: BoosterParams,
    n_estimators: usize,
    seed: u64,
    base_score: f64,
    trees: Vec<RegressionTree>,
}

impl GbtRegressor {
    /// Create an unfit regressor.
    pub fn new(params: BoosterParams, n_estimators: usize, seed: u64) -> Self {
        GbtRegressor {
            params,
            n_estimators,
            seed,
            base_score: 0.0,
            trees: Vec::new(),
        }
    }

    /// Whether `fit` has completed on this regressor.
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Number of boosted trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// The booster hyperparameters in use.
    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    /// Replace the booster hyperparameters, discarding any fitted state.
    pub fn set_params(&mut self, params: BoosterParams) {
        self.params = params;
        self.trees.clear();
        self.base_score = 0.0;
    }

    /// Fit the regressor to an encoded feature matrix and one target column.
    pub fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<()> {
        self.params.validate()?;
        let n = features.nrows();
        if n == 0 {
            return Err(SurrogateError::training("cannot fit on an empty dataset"));
        }
        if targets.len() != n {
            return Err(SurrogateError::dimension_mismatch(
                format!("{} feature rows", n),
                format!("{} targets", targets.len()),
            ));
        }

        let num_columns = features.ncols();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let growth = GrowthParams {
            max_depth: self.params.max_depth,
            min_child_weight: self.params.min_child_weight,
            colsample_bylevel: self.params.colsample_bylevel,
        };

        self.base_score = targets.sum() / n as f64;
        let mut predictions = vec![self.base_score; n];
        let rows: Vec<usize> = (0..n).collect();
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&predictions)
                .map(|(&y, &p)| y - p)
                .collect();

            let columns = tree_columns(num_columns, self.params.colsample_bytree, &mut rng);
            let tree =
                RegressionTree::fit(features, &residuals, &rows, &columns, growth, &mut rng);

            for (i, prediction) in predictions.iter_mut().enumerate() {
                *prediction += self.params.learning_rate * tree.predict_row(features.row(i));
            }
            trees.push(tree);
        }

        self.trees = trees;
        Ok(())
    }

    /// Predict every row of an encoded feature matrix.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(SurrogateError::prediction(
                "regressor has not been fitted",
            ));
        }
        let mut out = Array1::from_elem(features.nrows(), self.base_score);
        for tree in &self.trees {
            for (i, value) in out.iter_mut().enumerate() {
                *value += self.params.learning_rate * tree.predict_row(features.row(i));
            }
        }
        Ok(out)
    }
}

/// Draw the column subset used by one tree.
fn tree_columns(num_columns: usize, fraction: f64, rng: &mut StdRng) -> Vec<usize> {
    if fraction >= 1.0 || num_columns <= 1 {
        return (0..num_columns).collect();
    }
    let count = ((num_columns as f64) * fraction).ceil().max(1.0) as usize;
    let mut pool: Vec<usize> = (0..num_columns).collect();
    pool.shuffle(rng);
    pool.truncate(count);
    pool.sort_unstable();
    pool
}
