//! Train/test splitting and cross-validation split generation.
//!
//! [`prepare_dataset_for_training`] ascertains how a full dataset (features,
//! labels and an optional group labeling) is partitioned into training and
//! test sets, and which cross-validation generator should produce the
//! train/validation folds used during model training.
//!
//! Whenever groups are supplied, rows sharing a group id are treated as one
//! unit: no group ever appears on both sides of the train/test split or of
//! any train/validation fold.

use crate::core::error::{Result, SurrogateError};
use crate::core::types::{FoldIndices, GroupId};
use crate::dataset::frame::Frame;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of the strata used for stratified splitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Strata {
    /// Use the named label column
    Column(String),
    /// Use an explicit per-row value sequence
    Values(Vec<f64>),
}

/// Options controlling [`prepare_dataset_for_training`].
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Fraction of the data held out as a test set, in `[0.0, 1.0)`.
    /// `0.0` (default) generates no test split.
    pub test_size: f64,
    /// Number of cross-validation folds the returned generator produces.
    /// Must be at least 2.
    pub num_cv_splits: usize,
    /// Consider the strata distribution when drawing the test split
    pub stratify: bool,
    /// Strata source; defaults to the first label column when `stratify`
    /// is set and no source is given
    pub strata: Option<Strata>,
    /// Seed for the split RNG; `None` draws from entropy
    pub random_state: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            test_size: 0.0,
            num_cv_splits: 5,
            stratify: true,
            strata: None,
            random_state: None,
        }
    }
}

impl SplitOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the test fraction.
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
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

    /// Set the RNG seed.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }
}

/// Cross-validation split generator returned by the splitter.
///
/// Folds are generated lazily from a sample count (and groups, when the
/// grouped variant is used), so the generator itself is cheap to store and
/// persist alongside search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrossValidator {
    /// Plain K-fold over row indices, contiguous and unshuffled
    KFold {
        /// Number of folds
        n_splits: usize,
    },
    /// K-fold over groups: each fold's validation set is a union of whole
    /// groups, with fold sizes balanced greedily
    GroupKFold {
        /// Number of folds
        n_splits: usize,
    },
}

impl CrossValidator {
    /// Number of folds this generator produces.
    pub fn num_splits(&self) -> usize {
        match self {
            CrossValidator::KFold { n_splits } | CrossValidator::GroupKFold { n_splits } => {
                *n_splits
            }
        }
    }

    /// Generate `(train, validation)` index pairs for `n_samples` rows.
    ///
    /// The grouped variant requires `groups`; the plain variant ignores it.
    pub fn split(
        &self,
        n_samples: usize,
        groups: Option<&[GroupId]>,
    ) -> Result<Vec<FoldIndices>> {
        match self {
            CrossValidator::KFold { n_splits } => k_fold(n_samples, *n_splits),
            CrossValidator::GroupKFold { n_splits } => {
                let groups = groups.ok_or_else(|| {
                    SurrogateError::config("grouped cross-validation requires group labels")
                })?;
                if groups.len() != n_samples {
                    return Err(SurrogateError::dimension_mismatch(
                        format!("{} rows", n_samples),
                        format!("{} group labels", groups.len()),
                    ));
                }
                group_k_fold(groups, *n_splits)
            }
        }
    }
}

/// Result of [`prepare_dataset_for_training`].
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Training features
    pub train_features: Frame,
    /// Test features; `None` when no test split was requested
    pub test_features: Option<Frame>,
    /// Training labels
    pub train_labels: Frame,
    /// Test labels; `None` when no test split was requested
    pub test_labels: Option<Frame>,
    /// Group labels of the training rows, when groups were supplied
    pub train_groups: Option<Vec<GroupId>>,
    /// Generator for train/validation folds over the training rows
    pub cv: CrossValidator,
}

/// Split a dataset into train and test partitions and pick the matching
/// cross-validation generator.
///
/// With `test_size == 0` all data becomes the training set and no test
/// split is drawn. Otherwise a single held-out split is produced by the
/// strategy selected from the available inputs: stratified-and-grouped,
/// grouped-only, stratified-only, or a plain random shuffle split. Strata
/// default to the first label column unless `options.strata` names a label
/// column or carries an explicit value sequence.
pub fn prepare_dataset_for_training(
    features: &Frame,
    labels: &Frame,
    groups: Option<&[GroupId]>,
    options: &SplitOptions,
) -> Result<TrainTestSplit> {
    info!("Generating training and test splits, and the validation split generator.");

    let test_size = options.test_size;
    if !(0.0..1.0).contains(&test_size) {
        return Err(SurrogateError::invalid_parameter(
            "test_size",
            test_size.to_string(),
            "must be in the range [0, 1)",
        ));
    }
    if options.num_cv_splits < 2 {
        return Err(SurrogateError::invalid_parameter(
            "num_cv_splits",
            options.num_cv_splits.to_string(),
            "must be at least 2",
        ));
    }

    let n = features.num_rows();
    if labels.num_rows() != n {
        return Err(SurrogateError::dimension_mismatch(
            format!("{} feature rows", n),
            format!("{} label rows", labels.num_rows()),
        ));
    }
    if let Some(groups) = groups {
        if groups.len() != n {
            return Err(SurrogateError::dimension_mismatch(
                format!("{} feature rows", n),
                format!("{} group labels", groups.len()),
            ));
        }
    }

    let cv = match groups {
        None => CrossValidator::KFold {
            n_splits: options.num_cv_splits,
        },
        Some(_) => CrossValidator::GroupKFold {
            n_splits: options.num_cv_splits,
        },
    };

    if test_size == 0.0 {
        debug!("No test split will be generated.");
        return Ok(TrainTestSplit {
            train_features: features.clone(),
            test_features: None,
            train_labels: labels.clone(),
            test_labels: None,
            train_groups: groups.map(|g| g.to_vec()),
            cv,
        });
    }

    let strata = resolve_strata(labels, options)?;
    let mut rng = match options.random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (train_idx, test_idx) = match (groups, strata.as_deref()) {
        (None, None) => {
            debug!("No data groups were given; drawing a plain shuffle split.");
            shuffle_split(n, test_size, &mut rng)?
        }
        (None, Some(strata)) => {
            debug!("No data groups were given; drawing a stratified shuffle split.");
            stratified_shuffle_split(strata, test_size, &mut rng)?
        }
        (Some(groups), None) => {
            debug!("Generating test split in accordance with the given data groups.");
            group_shuffle_split(groups, test_size, &mut rng)?
        }
        (Some(groups), Some(strata)) => {
            debug!("Generating a stratified test split in accordance with the given data groups.");
            stratified_group_split(strata, groups, test_size, &mut rng)?
        }
    };

    let split = TrainTestSplit {
        train_features: features.take_rows(&train_idx),
        test_features: Some(features.take_rows(&test_idx)),
        train_labels: labels.take_rows(&train_idx),
        test_labels: Some(labels.take_rows(&test_idx)),
        train_groups: groups.map(|g| train_idx.iter().map(|&i| g[i]).collect()),
        cv,
    };
    info!("Dataset splits successfully generated.");
    Ok(split)
}

/// Resolve the per-row strata keys, or `None` when stratification is off.
///
/// Continuous strata values are discretized to integer keys by rounding.
fn resolve_strata(labels: &Frame, options: &SplitOptions) -> Result<Option<Vec<i64>>> {
    if !options.stratify {
        return Ok(None);
    }
    let values: Vec<f64> = match &options.strata {
        None => {
            let first = labels.columns().first().ok_or_else(|| {
                SurrogateError::dataset("label table has no columns to stratify on")
            })?;
            labels.float_column(&first.name)?.to_vec()
        }
        Some(Strata::Column(name)) => labels.float_column(name)?.to_vec(),
        Some(Strata::Values(values)) => {
            if values.len() != labels.num_rows() {
                return Err(SurrogateError::dimension_mismatch(
                    format!("{} label rows", labels.num_rows()),
                    format!("{} strata values", values.len()),
                ));
            }
            values.clone()
        }
    };
    Ok(Some(values.iter().map(|v| v.round() as i64).collect()))
}

fn check_nonempty_sides(train: &[usize], test: &[usize], test_size: f64) -> Result<()> {
    if train.is_empty() || test.is_empty() {
        return Err(SurrogateError::invalid_parameter(
            "test_size",
            test_size.to_string(),
            "split would leave an empty train or test partition",
        ));
    }
    Ok(())
}

/// Plain random shuffle split: shuffle row indices and hold out
/// `ceil(test_size * n)` of them.
fn shuffle_split(n: usize, test_size: f64, rng: &mut StdRng) -> Result<FoldIndices> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let n_test = ((n as f64) * test_size).ceil() as usize;
    let test: Vec<usize> = indices[..n_test].to_vec();
    let train: Vec<usize> = indices[n_test..].to_vec();
    check_nonempty_sides(&train, &test, test_size)?;
    Ok((train, test))
}

/// Stratified shuffle split: hold out approximately `test_size` of each
/// stratum's rows.
fn stratified_shuffle_split(
    strata: &[i64],
    test_size: f64,
    rng: &mut StdRng,
) -> Result<FoldIndices> {
    let mut by_stratum: HashMap<i64, Vec<usize>> = HashMap::new();
    for (idx, &key) in strata.iter().enumerate() {
        by_stratum.entry(key).or_default().push(idx);
    }
    // Deterministic iteration order for a given seed
    let mut keys: Vec<i64> = by_stratum.keys().copied().collect();
    keys.sort_unstable();

    let mut train = Vec::new();
    let mut test = Vec::new();
    for key in keys {
        let members = by_stratum.get_mut(&key).expect("stratum key");
        members.shuffle(rng);
        let n_test = ((members.len() as f64) * test_size).round() as usize;
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }
    check_nonempty_sides(&train, &test, test_size)?;
    Ok((train, test))
}

/// Unique group ids in first-appearance order.
fn unique_groups(groups: &[GroupId]) -> Vec<GroupId> {
    let mut seen = std::collections::HashSet::new();
    let mut order = Vec::new();
    for &g in groups {
        if seen.insert(g) {
            order.push(g);
        }
    }
    order
}

fn rows_of_groups(groups: &[GroupId], selected: &std::collections::HashSet<GroupId>) -> FoldIndices {
    let mut in_rows = Vec::new();
    let mut out_rows = Vec::new();
    for (idx, g) in groups.iter().enumerate() {
        if selected.contains(g) {
            in_rows.push(idx);
        } else {
            out_rows.push(idx);
        }
    }
    (out_rows, in_rows)
}

/// Grouped shuffle split: hold out `ceil(test_size * n_groups)` whole groups.
fn group_shuffle_split(
    groups: &[GroupId],
    test_size: f64,
    rng: &mut StdRng,
) -> Result<FoldIndices> {
    let mut ids = unique_groups(groups);
    ids.shuffle(rng);
    let n_test = ((ids.len() as f64) * test_size).ceil() as usize;
    let selected: std::collections::HashSet<GroupId> = ids[..n_test].iter().copied().collect();
    let (train, test) = rows_of_groups(groups, &selected);
    check_nonempty_sides(&train, &test, test_size)?;
    Ok((train, test))
}

/// Stratified grouped split: assign each group the majority stratum of its
/// rows, then hold out approximately `test_size` of the groups within each
/// stratum. Whole groups always stay on one side.
fn stratified_group_split(
    strata: &[i64],
    groups: &[GroupId],
    test_size: f64,
    rng: &mut StdRng,
) -> Result<FoldIndices> {
    let mut votes: HashMap<GroupId, HashMap<i64, usize>> = HashMap::new();
    for (idx, &g) in groups.iter().enumerate() {
        *votes.entry(g).or_default().entry(strata[idx]).or_insert(0) += 1;
    }
    let mut by_stratum: HashMap<i64, Vec<GroupId>> = HashMap::new();
    for g in unique_groups(groups) {
        let counts = votes.get(&g).expect("group votes");
        let majority = counts
            .iter()
            .max_by_key(|(key, count)| (**count, -**key))
            .map(|(key, _)| *key)
            .expect("non-empty group");
        by_stratum.entry(majority).or_default().push(g);
    }

    let mut keys: Vec<i64> = by_stratum.keys().copied().collect();
    keys.sort_unstable();

    let mut selected = std::collections::HashSet::new();
    for key in keys {
        let ids = by_stratum.get_mut(&key).expect("stratum key");
        ids.shuffle(rng);
        let n_test = ((ids.len() as f64) * test_size).round() as usize;
        selected.extend(ids[..n_test].iter().copied());
    }
    let (train, test) = rows_of_groups(groups, &selected);
    check_nonempty_sides(&train, &test, test_size)?;
    Ok((train, test))
}

/// Contiguous, unshuffled K-fold over row indices.
fn k_fold(n_samples: usize, n_splits: usize) -> Result<Vec<FoldIndices>> {
    if n_samples < n_splits {
        return Err(SurrogateError::training(format!(
            "cannot split {} samples into {} folds",
            n_samples, n_splits
        )));
    }
    let base = n_samples / n_splits;
    let remainder = n_samples % n_splits;

    let mut folds = Vec::with_capacity(n_splits);
    let mut start = 0;
    for fold in 0..n_splits {
        let size = if fold < remainder { base + 1 } else { base };
        let end = start + size;
        let val: Vec<usize> = (start..end).collect();
        let mut train = Vec::with_capacity(n_samples - size);
        train.extend(0..start);
        train.extend(end..n_samples);
        folds.push((train, val));
        start = end;
    }
    Ok(folds)
}

/// Grouped K-fold: groups are assigned to folds largest-first, each going to
/// the currently smallest fold, so fold sizes stay balanced and no group is
/// ever split across a fold boundary.
fn group_k_fold(groups: &[GroupId], n_splits: usize) -> Result<Vec<FoldIndices>> {
    let ids = unique_groups(groups);
    if ids.len() < n_splits {
        return Err(SurrogateError::training(format!(
            "cannot split {} groups into {} folds",
            ids.len(),
            n_splits
        )));
    }

    let mut sizes: HashMap<GroupId, usize> = HashMap::new();
    for &g in groups {
        *sizes.entry(g).or_insert(0) += 1;
    }
    let mut ordered = ids;
    ordered.sort_by_key(|g| (std::cmp::Reverse(sizes[g]), *g));

    let mut fold_of: HashMap<GroupId, usize> = HashMap::new();
    let mut fold_sizes = vec![0usize; n_splits];
    for g in ordered {
        let fold = fold_sizes
            .iter()
            .enumerate()
            .min_by_key(|(_, size)| **size)
            .map(|(idx, _)| idx)
            .expect("at least one fold");
        fold_sizes[fold] += sizes[&g];
        fold_of.insert(g, fold);
    }

    let mut folds: Vec<FoldIndices> = vec![(Vec::new(), Vec::new()); n_splits];
    for (idx, g) in groups.iter().enumerate() {
        let fold = fold_of[g];
        for (other, entry) in folds.iter_mut().enumerate() {
            if other == fold {
                entry.1.push(idx);
            } else {
                entry.0.push(idx);
            }
        }
    }
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn toy_dataset(nconfigs: usize, rows_per_config: usize) -> (Frame, Frame, Vec<GroupId>) {
        let n = nconfigs * rows_per_config;
        let mut features = Frame::new();
        features
            .push_float("width", (0..n).map(|i| (i % 7) as f64).collect())
            .unwrap();
        features
            .push_float(
                "epoch",
                (0..n).map(|i| ((i % rows_per_config) + 1) as f64).collect(),
            )
            .unwrap();

        let mut labels = Frame::new();
        labels
            .push_float("valid_acc", (0..n).map(|i| (i as f64) / (n as f64)).collect())
            .unwrap();
        labels
            .push_float("latency", (0..n).map(|i| (i as f64).sqrt()).collect())
            .unwrap();

        let groups: Vec<GroupId> = (0..n).map(|i| (i / rows_per_config + 1) as GroupId).collect();
        (features, labels, groups)
    }

    #[test]
    fn test_invalid_test_size_is_rejected() {
        let (features, labels, _) = toy_dataset(4, 5);
        let options = SplitOptions::new().with_test_size(1.5);
        let err = prepare_dataset_for_training(&features, &labels, None, &options).unwrap_err();
        assert_eq!(err.category(), "invalid_parameter");

        let options = SplitOptions::new().with_test_size(-0.1);
        assert!(prepare_dataset_for_training(&features, &labels, None, &options).is_err());
    }

    #[test]
    fn test_zero_test_size_returns_everything_as_train() {
        let (features, labels, groups) = toy_dataset(4, 5);
        let options = SplitOptions::new();
        let split =
            prepare_dataset_for_training(&features, &labels, Some(&groups), &options).unwrap();
        assert!(split.test_features.is_none());
        assert!(split.test_labels.is_none());
        assert_eq!(split.train_features.num_rows(), 20);
        assert_eq!(split.train_groups.as_deref(), Some(&groups[..]));
        assert_eq!(split.cv, CrossValidator::GroupKFold { n_splits: 5 });
    }

    #[test]
    fn test_plain_kfold_without_groups() {
        let (features, labels, _) = toy_dataset(4, 5);
        let options = SplitOptions::new();
        let split = prepare_dataset_for_training(&features, &labels, None, &options).unwrap();
        assert_eq!(split.cv, CrossValidator::KFold { n_splits: 5 });
        assert!(split.train_groups.is_none());
    }

    #[test]
    fn test_split_partitions_rows_exactly() {
        let (features, labels, _) = toy_dataset(10, 10);
        for &test_size in &[0.1, 0.25, 0.5] {
            let options = SplitOptions::new()
                .with_test_size(test_size)
                .with_stratify(false)
                .with_random_state(3);
            let split = prepare_dataset_for_training(&features, &labels, None, &options).unwrap();
            let train = split.train_features.num_rows();
            let test = split.test_features.as_ref().unwrap().num_rows();
            assert_eq!(train + test, 100);
            assert_eq!(test, ((100.0 * test_size).ceil()) as usize);
        }
    }

    #[test]
    fn test_grouped_split_keeps_groups_whole() {
        let (features, labels, groups) = toy_dataset(10, 100);
        let options = SplitOptions::new()
            .with_test_size(0.2)
            .with_stratify(false)
            .with_random_state(42);
        let split =
            prepare_dataset_for_training(&features, &labels, Some(&groups), &options).unwrap();

        let train_groups: HashSet<GroupId> =
            split.train_groups.as_ref().unwrap().iter().copied().collect();
        assert_eq!(split.test_features.as_ref().unwrap().num_rows(), 200);
        assert_eq!(split.train_features.num_rows(), 800);
        assert_eq!(train_groups.len(), 8);

        // Recover the test-side groups from the row counts: every held-out
        // group contributes all 100 of its rows.
        let all: HashSet<GroupId> = groups.iter().copied().collect();
        let test_groups: HashSet<GroupId> = all.difference(&train_groups).copied().collect();
        assert_eq!(test_groups.len(), 2);
    }

    #[test]
    fn test_stratified_split_tracks_strata_fractions() {
        let n = 100;
        let mut features = Frame::new();
        features
            .push_float("width", (0..n).map(|i| i as f64).collect())
            .unwrap();
        let mut labels = Frame::new();
        // Two strata after rounding: 0.0 (60 rows) and 1.0 (40 rows)
        labels
            .push_float(
                "valid_acc",
                (0..n).map(|i| if i < 60 { 0.1 } else { 0.9 }).collect(),
            )
            .unwrap();

        let options = SplitOptions::new().with_test_size(0.25).with_random_state(8);
        let split = prepare_dataset_for_training(&features, &labels, None, &options).unwrap();
        let test_labels = split.test_labels.unwrap();
        let held = test_labels.float_column("valid_acc").unwrap();
        let low = held.iter().filter(|&&v| v < 0.5).count();
        let high = held.len() - low;
        assert_eq!(low, 15);
        assert_eq!(high, 10);
    }

    #[test]
    fn test_stratified_group_split_keeps_groups_whole() {
        let (features, labels, groups) = toy_dataset(8, 10);
        let options = SplitOptions::new().with_test_size(0.25).with_random_state(17);
        let split =
            prepare_dataset_for_training(&features, &labels, Some(&groups), &options).unwrap();

        let train_groups: HashSet<GroupId> =
            split.train_groups.as_ref().unwrap().iter().copied().collect();
        let test_rows = split.test_features.as_ref().unwrap().num_rows();
        assert_eq!(test_rows % 10, 0);
        assert_eq!(train_groups.len() + test_rows / 10, 8);
    }

    #[test]
    fn test_kfold_partitions_and_covers() {
        let cv = CrossValidator::KFold { n_splits: 4 };
        let folds = cv.split(10, None).unwrap();
        assert_eq!(folds.len(), 4);
        let mut seen = Vec::new();
        for (train, val) in &folds {
            assert_eq!(train.len() + val.len(), 10);
            seen.extend_from_slice(val);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_group_kfold_never_splits_a_group() {
        let groups: Vec<GroupId> = (0..30).map(|i| (i / 3) as GroupId).collect();
        let cv = CrossValidator::GroupKFold { n_splits: 5 };
        let folds = cv.split(30, Some(&groups)).unwrap();
        assert_eq!(folds.len(), 5);
        for (train, val) in &folds {
            let train_groups: HashSet<GroupId> = train.iter().map(|&i| groups[i]).collect();
            let val_groups: HashSet<GroupId> = val.iter().map(|&i| groups[i]).collect();
            assert!(train_groups.is_disjoint(&val_groups));
            assert_eq!(train.len() + val.len(), 30);
        }
    }

    #[test]
    fn test_group_kfold_requires_enough_groups() {
        let groups: Vec<GroupId> = vec![1, 1, 2, 2];
        let cv = CrossValidator::GroupKFold { n_splits: 3 };
        assert!(cv.split(4, Some(&groups)).is_err());
    }

    #[test]
    fn test_too_few_cv_splits_is_rejected() {
        let (features, labels, _) = toy_dataset(4, 5);
        let options = SplitOptions::new().with_num_cv_splits(1);
        assert!(prepare_dataset_for_training(&features, &labels, None, &options).is_err());
    }

    #[test]
    fn test_split_is_reproducible_for_fixed_seed() {
        let (features, labels, groups) = toy_dataset(10, 10);
        let options = SplitOptions::new().with_test_size(0.3).with_random_state(5);
        let a = prepare_dataset_for_training(&features, &labels, Some(&groups), &options).unwrap();
        let b = prepare_dataset_for_training(&features, &labels, Some(&groups), &options).unwrap();
        assert_eq!(a.train_features, b.train_features);
        assert_eq!(a.test_features, b.test_features);
        assert_eq!(a.train_groups, b.train_groups);
    }
}
