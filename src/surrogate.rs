//! The top-level surrogate orchestrator.
//!
//! A [`Surrogate`] owns the configuration space, the booster
//! hyperparameters, the authoritative feature/label column order and the
//! fitted pipeline (plus search outcome when hyperparameter optimization
//! ran). Its lifecycle is one-way: `untrained → trained`; refitting simply
//! overwrites the previously fitted state.

use crate::config::{BoosterParams, ConfigurationSpace, ParamValue};
use crate::core::error::{Result, SurrogateError};
use crate::core::types::GroupId;
use crate::dataset::frame::Frame;
use crate::dataset::split::{prepare_dataset_for_training, SplitOptions, Strata};
use crate::hyperopt::{randomized_search, SearchConfig, SearchOutcome, SearchSpace};
use crate::io::{self, Format, HEADERS_FILENAME, MODEL_FILENAME, PARAMS_FILENAME};
use crate::metrics::{mean_squared_error, r2_score};
use crate::pipeline::Pipeline;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling [`Surrogate::fit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Run randomized hyperparameter search instead of fitting the current
    /// hyperparameters directly
    pub perform_hpo: bool,
    /// Test fraction in `[0.0, 1.0)`; `0.0` skips the test split
    pub test_size: f64,
    /// Seed for splitting, candidate sampling and tree fitting
    pub random_state: Option<u64>,
    /// Number of search candidates drawn when `perform_hpo` is set
    pub hpo_iters: usize,
    /// Number of cross-validation folds
    pub num_cv_splits: usize,
    /// Consider strata when drawing the test split
    pub stratify: bool,
    /// Strata source; defaults to the first label column
    pub strata: Option<Strata>,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            perform_hpo: true,
            test_size: 0.0,
            random_state: None,
            hpo_iters: 10,
            num_cv_splits: 5,
            stratify: true,
            strata: None,
        }
    }
}

impl FitOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable hyperparameter search.
    pub fn with_perform_hpo(mut self, perform_hpo: bool) -> Self {
        self.perform_hpo = perform_hpo;
        self
    }

    /// Set the test fraction.
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set the RNG seed.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set the number of search candidates.
    pub fn with_hpo_iters(mut self, hpo_iters: usize) -> Self {
        self.hpo_iters = hpo_iters;
        self
    }

    /// Set the number of cross-validation folds.
    pub fn with_num_cv_splits(mut self, num_cv_splits: usize) -> Self {
        self.num_cv_splits = num_cv_splits;
        self
    }

    /// Enable or disable stratification.
    pub fn with_stratify(mut self, stratify: bool) -> Self {
        self.stratify = stratify;
        self
    }

    /// Set the strata source.
    pub fn with_strata(mut self, strata: Strata) -> Self {
        self.strata = Some(strata);
        self
    }

    /// Load fit options from a `.json` or `.toml` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let options = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| SurrogateError::config(format!("failed to parse TOML options: {}", e)))?,
            _ => {
                return Err(SurrogateError::config(
                    "unsupported fit options file format, use .json or .toml",
                ))
            }
        };
        Ok(options)
    }

    fn split_options(&self) -> SplitOptions {
        let mut options = SplitOptions::new()
            .with_test_size(self.test_size)
            .with_num_cv_splits(self.num_cv_splits)
            .with_stratify(self.stratify);
        if let Some(strata) = &self.strata {
            options = options.with_strata(strata.clone());
        }
        if let Some(seed) = self.random_state {
            options = options.with_random_state(seed);
        }
        options
    }
}

/// Training (and optional test) metrics returned by [`Surrogate::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// R² on the training split
    pub train_r2: f64,
    /// Mean squared error on the training split
    pub train_mse: f64,
    /// R² on the held-out test split, when one was requested
    pub test_r2: Option<f64>,
    /// Mean squared error on the held-out test split, when one was requested
    pub test_mse: Option<f64>,
}

/// The fitted model: the predict-ready pipeline plus the search outcome
/// when hyperparameter optimization produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    /// The (re)fit pipeline used for prediction
    pub pipeline: Pipeline,
    /// Trial-by-trial search results, absent for plain fits
    pub search: Option<SearchOutcome>,
}

/// Persisted parameter payload (everything except the fitted model and the
/// label-column index, which live in their own payload files).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SurrogateParams {
    estimators_per_output: usize,
    hyperparams: Option<BoosterParams>,
    config_space: ConfigurationSpace,
    feature_columns: Option<Vec<String>>,
    label_columns: Option<Vec<String>>,
    trained: bool,
    format: Format,
    created_at: chrono::DateTime<chrono::Utc>,
    version: String,
}

/// A gradient-boosted-tree surrogate for configuration performance metrics.
#[derive(Debug, Clone)]
pub struct Surrogate {
    config_space: ConfigurationSpace,
    estimators_per_output: usize,
    hyperparams: Option<BoosterParams>,
    feature_columns: Option<Vec<String>>,
    label_columns: Option<Vec<String>>,
    trained: bool,
    model: Option<FittedModel>,
}

impl Surrogate {
    /// Default number of boosted trees per output column.
    pub const DEFAULT_ESTIMATORS_PER_OUTPUT: usize = 500;

    /// Create an untrained surrogate over the given configuration space.
    pub fn new(config_space: ConfigurationSpace) -> Result<Self> {
        config_space.validate()?;
        Ok(Surrogate {
            config_space,
            estimators_per_output: Self::DEFAULT_ESTIMATORS_PER_OUTPUT,
            hyperparams: None,
            feature_columns: None,
            label_columns: None,
            trained: false,
            model: None,
        })
    }

    /// Set the number of boosted trees per output column (builder style).
    pub fn with_estimators_per_output(mut self, estimators_per_output: usize) -> Self {
        self.estimators_per_output = estimators_per_output;
        self
    }

    /// The configuration space this surrogate was built for.
    pub fn config_space(&self) -> &ConfigurationSpace {
        &self.config_space
    }

    /// Number of boosted trees per output column.
    pub fn estimators_per_output(&self) -> usize {
        self.estimators_per_output
    }

    /// The current booster hyperparameters, if any have been installed.
    pub fn hyperparams(&self) -> Option<&BoosterParams> {
        self.hyperparams.as_ref()
    }

    /// The authoritative feature column order, fixed by the first fit.
    pub fn feature_columns(&self) -> Option<&[String]> {
        self.feature_columns.as_deref()
    }

    /// The authoritative label column order, fixed by the first fit.
    pub fn label_columns(&self) -> Option<&[String]> {
        self.label_columns.as_deref()
    }

    /// Whether a fit has completed. Callers must check this before
    /// predicting.
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// The search outcome of the last fit, when hyperparameter optimization
    /// ran.
    pub fn search_outcome(&self) -> Option<&SearchOutcome> {
        self.model.as_ref().and_then(|m| m.search.as_ref())
    }

    /// Install and return a hyperparameter set.
    ///
    /// The first call (no prior hyperparameters) installs the fixed default
    /// configuration, so simple search loops evaluate the defaults first.
    /// Every subsequent call draws each hyperparameter independently from
    /// the search distribution.
    pub fn set_random_hyperparams<R: Rng + ?Sized>(&mut self, rng: &mut R) -> BoosterParams {
        let params = match self.hyperparams {
            None => BoosterParams::default(),
            Some(_) => SearchSpace::default().sample(rng),
        };
        self.hyperparams = Some(params.clone());
        params
    }

    /// Pre-process the dataset, fit the model and return the training
    /// (and optional test) error.
    ///
    /// The first fit fixes the feature and label column order; later calls
    /// reorder their inputs to match. With `perform_hpo` the pipeline is
    /// wrapped in a randomized search over the fixed candidate distribution
    /// using the splitter's cross-validation generator, and the best
    /// candidate is refit; otherwise the plain pipeline is fit directly.
    pub fn fit(
        &mut self,
        features: &Frame,
        labels: &Frame,
        groups: Option<&[GroupId]>,
        options: &FitOptions,
    ) -> Result<FitReport> {
        // The stored column order is authoritative; inputs never redefine it
        let features = match &self.feature_columns {
            None => {
                self.feature_columns = Some(features.names());
                features.clone()
            }
            Some(columns) => features.select(columns)?,
        };
        let labels = match &self.label_columns {
            None => {
                self.label_columns = Some(labels.names());
                labels.clone()
            }
            Some(columns) => labels.select(columns)?,
        };

        if labels.num_columns() == 0 {
            return Err(SurrogateError::dataset("label table has no columns"));
        }

        if self.hyperparams.is_none() {
            debug!("No hyperparameters installed; using the defaults.");
            self.hyperparams = Some(BoosterParams::default());
        }

        let split =
            prepare_dataset_for_training(&features, &labels, groups, &options.split_options())?;
        let ytrain = split.train_labels.to_array()?;
        let num_outputs = ytrain.ncols();
        info!(
            "Fitting surrogate on {} training rows with {} output column(s).",
            split.train_features.num_rows(),
            num_outputs
        );

        let model = if options.perform_hpo {
            let config = SearchConfig {
                n_iter: options.hpo_iters,
                random_state: options.random_state,
            };
            let (pipeline, outcome) = randomized_search(
                &self.config_space,
                &SearchSpace::default(),
                self.estimators_per_output,
                &split.train_features,
                &ytrain,
                split.train_groups.as_deref(),
                &split.cv,
                &config,
            )?;
            FittedModel {
                pipeline,
                search: Some(outcome),
            }
        } else {
            let params = self.hyperparams.as_ref().expect("hyperparams installed");
            let mut pipeline = Pipeline::new(
                &self.config_space,
                params,
                self.estimators_per_output,
                num_outputs,
                options.random_state.unwrap_or(0),
            );
            pipeline.fit(&split.train_features, &ytrain)?;
            FittedModel {
                pipeline,
                search: None,
            }
        };

        self.model = Some(model);
        self.trained = true;

        let train_predictions = self.predict(&split.train_features)?.to_array()?;
        let mut report = FitReport {
            train_r2: r2_score(&ytrain.view(), &train_predictions.view())?,
            train_mse: mean_squared_error(&ytrain.view(), &train_predictions.view())?,
            test_r2: None,
            test_mse: None,
        };

        if let (Some(test_features), Some(test_labels)) =
            (&split.test_features, &split.test_labels)
        {
            let ytest = test_labels.to_array()?;
            let test_predictions = self.predict(test_features)?.to_array()?;
            report.test_r2 = Some(r2_score(&ytest.view(), &test_predictions.view())?);
            report.test_mse = Some(mean_squared_error(&ytest.view(), &test_predictions.view())?);
        }

        Ok(report)
    }

    /// Predict performance metrics for the given feature rows.
    ///
    /// Input columns are reordered and filtered to the stored feature
    /// order; the returned frame carries the stored label column order.
    pub fn predict(&self, features: &Frame) -> Result<Frame> {
        let model = self.model.as_ref().ok_or_else(|| {
            SurrogateError::training(
                "surrogate has not been fitted; check is_trained() before predicting",
            )
        })?;
        let feature_columns = self
            .feature_columns
            .as_ref()
            .expect("trained surrogate has feature columns");
        let label_columns = self
            .label_columns
            .as_ref()
            .expect("trained surrogate has label columns");

        let selected = features.select(feature_columns)?;
        let predictions = model.pipeline.predict(&selected)?;
        Frame::from_array(label_columns, &predictions)
    }

    /// Generate a random dataset of arbitrary size from the stored
    /// configuration space: features (sampled configurations, each repeated
    /// once per epoch), uniform-random labels and per-configuration groups.
    ///
    /// A debugging tool, also convenient for smoke tests.
    pub fn random_dataset(
        &self,
        nconfigs: usize,
        samples_per_config: usize,
        label_names: &[&str],
        seed: u64,
    ) -> Result<(Frame, Frame, Vec<GroupId>)> {
        if nconfigs == 0 || samples_per_config == 0 || label_names.is_empty() {
            return Err(SurrogateError::config(
                "random dataset requires at least one configuration, sample and label",
            ));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let configs: Vec<Vec<ParamValue>> = (0..nconfigs)
            .map(|_| self.config_space.sample_configuration(&mut rng))
            .collect();
        let n = nconfigs * samples_per_config;

        let mut features = Frame::new();
        for (j, param) in self.config_space.hyperparameters().iter().enumerate() {
            match &configs[0][j] {
                ParamValue::Str(_) => {
                    let mut values = Vec::with_capacity(n);
                    for config in &configs {
                        let value = match &config[j] {
                            ParamValue::Str(s) => s.clone(),
                            ParamValue::Float(v) => v.to_string(),
                        };
                        values.extend(std::iter::repeat(value).take(samples_per_config));
                    }
                    features.push_str(param.name.clone(), values)?;
                }
                ParamValue::Float(_) => {
                    let mut values = Vec::with_capacity(n);
                    for config in &configs {
                        let value = match config[j] {
                            ParamValue::Float(v) => v,
                            ParamValue::Str(_) => unreachable!("domain sampling is type-stable"),
                        };
                        values.extend(std::iter::repeat(value).take(samples_per_config));
                    }
                    features.push_float(param.name.clone(), values)?;
                }
            }
        }
        let epochs: Vec<f64> = (0..n)
            .map(|i| ((i % samples_per_config) + 1) as f64)
            .collect();
        features.push_float("epoch", epochs)?;

        let mut labels = Frame::new();
        for name in label_names {
            labels.push_float(*name, (0..n).map(|_| rng.gen::<f64>()).collect())?;
        }

        let groups: Vec<GroupId> = (0..n)
            .map(|i| (i / samples_per_config + 1) as GroupId)
            .collect();
        Ok((features, labels, groups))
    }

    /// Save this surrogate to a directory using the default (bincode)
    /// payload format.
    pub fn dump<P: AsRef<Path>>(&self, outdir: P) -> Result<()> {
        self.dump_with_format(outdir, Format::default())
    }

    /// Save this surrogate to a directory.
    ///
    /// Writes the parameter payload always, and the label-column index and
    /// fitted model payloads only when trained.
    pub fn dump_with_format<P: AsRef<Path>>(&self, outdir: P, format: Format) -> Result<()> {
        let outdir = outdir.as_ref();
        let params = SurrogateParams {
            estimators_per_output: self.estimators_per_output,
            hyperparams: self.hyperparams.clone(),
            config_space: self.config_space.clone(),
            feature_columns: self.feature_columns.clone(),
            label_columns: self.label_columns.clone(),
            trained: self.trained,
            format,
            created_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        io::save_payload(outdir.join(PARAMS_FILENAME), &params, format)?;

        if self.trained {
            let headers = self
                .label_columns
                .as_ref()
                .ok_or_else(|| {
                    SurrogateError::serialization("trained surrogate is missing label columns")
                })?;
            let model = self.model.as_ref().ok_or_else(|| {
                SurrogateError::serialization("trained surrogate is missing its fitted model")
            })?;
            io::save_payload(outdir.join(HEADERS_FILENAME), headers, format)?;
            io::save_payload(outdir.join(MODEL_FILENAME), model, format)?;
        }
        info!("Surrogate saved to {}.", outdir.display());
        Ok(())
    }

    /// Load a previously saved surrogate from a directory.
    ///
    /// Restores the parameter payload first; for trained surrogates the
    /// label-column index and fitted model payloads are restored as well.
    /// Missing or corrupt payload files surface as storage errors.
    pub fn load<P: AsRef<Path>>(outdir: P) -> Result<Surrogate> {
        let outdir = outdir.as_ref();
        let params: SurrogateParams = io::load_payload(outdir.join(PARAMS_FILENAME))?;

        let mut surrogate = Surrogate {
            config_space: params.config_space,
            estimators_per_output: params.estimators_per_output,
            hyperparams: params.hyperparams,
            feature_columns: params.feature_columns,
            label_columns: params.label_columns,
            trained: params.trained,
            model: None,
        };

        if surrogate.trained {
            let headers: Vec<String> = io::load_payload(outdir.join(HEADERS_FILENAME))?;
            let model: FittedModel = io::load_payload(outdir.join(MODEL_FILENAME))?;
            surrogate.label_columns = Some(headers);
            surrogate.model = Some(model);
        }
        info!("Surrogate loaded from {}.", outdir.display());
        Ok(surrogate)
    }
}
