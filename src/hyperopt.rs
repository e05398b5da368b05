//! Randomized hyperparameter search over the booster parameter space.
//!
//! Candidates are drawn independently from a fixed search distribution and
//! scored by mean cross-validated R² (uniform-averaged over outputs). The
//! best candidate is refit on the full training set; ties keep the earlier
//! trial.

use crate::config::{BoosterParams, ConfigurationSpace};
use crate::core::error::{Result, SurrogateError};
use crate::core::types::GroupId;
use crate::dataset::frame::Frame;
use crate::dataset::split::CrossValidator;
use crate::metrics::r2_score;
use crate::pipeline::Pipeline;
use log::{debug, info};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// The fixed search distribution for booster hyperparameters.
///
/// Integer ranges are half-open `[lower, upper)`; `learning_rate` is drawn
/// log-uniformly, the column-subsampling fractions uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Tree depth range
    pub max_depth: (usize, usize),
    /// Minimum child weight range
    pub min_child_weight: (usize, usize),
    /// Per-tree column subsampling range
    pub colsample_bytree: (f64, f64),
    /// Per-level column subsampling range
    pub colsample_bylevel: (f64, f64),
    /// Learning-rate range, sampled on a log scale
    pub learning_rate: (f64, f64),
}

impl Default for SearchSpace {
    fn default() -> Self {
        SearchSpace {
            max_depth: (1, 15),
            min_child_weight: (1, 10),
            colsample_bytree: (0.0, 1.0),
            colsample_bylevel: (0.0, 1.0),
            learning_rate: (0.001, 0.5),
        }
    }
}

impl SearchSpace {
    /// Draw one hyperparameter candidate.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BoosterParams {
        let (lr_lo, lr_hi) = (self.learning_rate.0.ln(), self.learning_rate.1.ln());
        BoosterParams {
            max_depth: rng.gen_range(self.max_depth.0..self.max_depth.1),
            min_child_weight: rng.gen_range(self.min_child_weight.0..self.min_child_weight.1),
            colsample_bytree: rng.gen::<f64>()
                * (self.colsample_bytree.1 - self.colsample_bytree.0)
                + self.colsample_bytree.0,
            colsample_bylevel: rng.gen::<f64>()
                * (self.colsample_bylevel.1 - self.colsample_bylevel.0)
                + self.colsample_bylevel.0,
            learning_rate: (rng.gen::<f64>() * (lr_hi - lr_lo) + lr_lo).exp(),
            ..BoosterParams::default()
        }
    }

    /// Whether a parameter set lies within this distribution's bounds.
    pub fn contains(&self, params: &BoosterParams) -> bool {
        (self.max_depth.0..self.max_depth.1).contains(&params.max_depth)
            && (self.min_child_weight.0..self.min_child_weight.1)
                .contains(&params.min_child_weight)
            && (self.colsample_bytree.0..self.colsample_bytree.1)
                .contains(&params.colsample_bytree)
            && (self.colsample_bylevel.0..self.colsample_bylevel.1)
                .contains(&params.colsample_bylevel)
            && (self.learning_rate.0..self.learning_rate.1).contains(&params.learning_rate)
    }
}

/// Configuration for one randomized search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of candidate draws
    pub n_iter: usize,
    /// Seed for candidate sampling and pipeline fitting
    pub random_state: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            n_iter: 10,
            random_state: None,
        }
    }
}

/// Result of a single candidate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial number, in draw order
    pub trial_id: usize,
    /// Candidate hyperparameters
    pub params: BoosterParams,
    /// R² per cross-validation fold
    pub fold_scores: Vec<f64>,
    /// Mean of the fold scores
    pub mean_score: f64,
}

/// Outcome of a randomized search: every trial plus the winning candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// All trials, in draw order
    pub trials: Vec<TrialResult>,
    /// Index of the best trial
    pub best_index: usize,
    /// Best mean cross-validated R²
    pub best_score: f64,
    /// Hyperparameters of the best trial
    pub best_params: BoosterParams,
}

/// Run a randomized hyperparameter search and refit the best candidate.
///
/// Each candidate is evaluated by fitting a fresh pipeline on every
/// cross-validation fold of the training data and averaging the validation
/// R². The returned pipeline is refit on the full training set with the
/// winning hyperparameters.
#[allow(clippy::too_many_arguments)]
pub fn randomized_search(
    space: &ConfigurationSpace,
    search_space: &SearchSpace,
    n_estimators: usize,
    features: &Frame,
    labels: &Array2<f64>,
    groups: Option<&[GroupId]>,
    cv: &CrossValidator,
    config: &SearchConfig,
) -> Result<(Pipeline, SearchOutcome)> {
    if config.n_iter == 0 {
        return Err(SurrogateError::invalid_parameter(
            "n_iter",
            "0",
            "must be at least 1",
        ));
    }

    let seed = config.random_state.unwrap_or(0);
    let mut rng = match config.random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let folds = cv.split(features.num_rows(), groups)?;
    let num_outputs = labels.ncols();
    info!(
        "Randomized search: {} candidates over {} folds.",
        config.n_iter,
        folds.len()
    );

    let mut trials = Vec::with_capacity(config.n_iter);
    for trial_id in 0..config.n_iter {
        let params = search_space.sample(&mut rng);
        let mut fold_scores = Vec::with_capacity(folds.len());
        for (train_idx, val_idx) in &folds {
            let mut candidate =
                Pipeline::new(space, &params, n_estimators, num_outputs, seed);
            candidate.fit(
                &features.take_rows(train_idx),
                &labels.select(Axis(0), train_idx),
            )?;
            let predictions = candidate.predict(&features.take_rows(val_idx))?;
            let truth = labels.select(Axis(0), val_idx);
            fold_scores.push(r2_score(&truth.view(), &predictions.view())?);
        }
        let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
        debug!("Trial {}: mean validation r2 = {:.4}", trial_id, mean_score);
        trials.push(TrialResult {
            trial_id,
            params,
            fold_scores,
            mean_score,
        });
    }

    let mut best_index = 0;
    for (idx, trial) in trials.iter().enumerate().skip(1) {
        if trial.mean_score > trials[best_index].mean_score {
            best_index = idx;
        }
    }
    let best = &trials[best_index];
    info!(
        "Best trial {} with mean validation r2 = {:.4}; refitting on the full training set.",
        best.trial_id, best.mean_score
    );

    let mut refit = Pipeline::new(space, &best.params, n_estimators, num_outputs, seed);
    refit.fit(features, labels)?;

    let outcome = SearchOutcome {
        best_index,
        best_score: best.mean_score,
        best_params: best.params.clone(),
        trials,
    };
    Ok((refit, outcome))
}
