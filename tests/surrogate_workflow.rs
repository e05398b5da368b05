//! End-to-end surrogate workflow tests: fitting, hyperparameter search,
//! prediction determinism and hyperparameter sampling.

use gbt_surrogate::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn make_space() -> ConfigurationSpace {
    ConfigurationSpace::new()
        .add(
            "activation",
            Domain::Categorical {
                choices: vec!["relu".into(), "hardswish".into(), "mish".into()],
            },
        )
        .add(
            "trivial_augment",
            Domain::Categorical {
                choices: vec!["off".into(), "on".into()],
            },
        )
        .add("width", Domain::Integer { lower: 4, upper: 16 })
        .add(
            "learning_rate_init",
            Domain::Float {
                lower: 1e-4,
                upper: 1e-1,
                log: true,
            },
        )
}

fn make_surrogate(estimators: usize) -> Surrogate {
    Surrogate::new(make_space())
        .unwrap()
        .with_estimators_per_output(estimators)
}

#[test]
fn test_plain_fit_and_predict() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut surrogate = make_surrogate(20);
    let (features, labels, groups) = surrogate
        .random_dataset(8, 12, &["valid_acc", "latency"], 0)
        .unwrap();

    let options = FitOptions::new()
        .with_perform_hpo(false)
        .with_test_size(0.25)
        .with_stratify(false)
        .with_random_state(42);
    let report = surrogate
        .fit(&features, &labels, Some(&groups), &options)
        .unwrap();

    assert!(surrogate.is_trained());
    assert!(surrogate.search_outcome().is_none());
    assert!(report.train_mse >= 0.0);
    assert!(report.test_mse.unwrap() >= 0.0);
    assert!(report.train_r2 <= 1.0);

    let predictions = surrogate.predict(&features).unwrap();
    assert_eq!(predictions.num_rows(), features.num_rows());
    assert_eq!(predictions.names(), vec!["valid_acc", "latency"]);
}

#[test]
fn test_predictions_are_deterministic_after_fit() {
    let mut surrogate = make_surrogate(15);
    let (features, labels, _) = surrogate
        .random_dataset(6, 10, &["valid_acc"], 3)
        .unwrap();

    surrogate
        .fit(
            &features,
            &labels,
            None,
            &FitOptions::new().with_perform_hpo(false).with_random_state(7),
        )
        .unwrap();

    // Predicting the training rows twice reproduces the same table exactly
    let first = surrogate.predict(&features).unwrap();
    let second = surrogate.predict(&features).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_identical_fits_produce_identical_models() {
    let run = || {
        let mut surrogate = make_surrogate(15);
        let (features, labels, groups) = surrogate
            .random_dataset(6, 10, &["valid_acc"], 9)
            .unwrap();
        surrogate
            .fit(
                &features,
                &labels,
                Some(&groups),
                &FitOptions::new().with_perform_hpo(false).with_random_state(4),
            )
            .unwrap();
        surrogate.predict(&features).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_hpo_fit_records_search_outcome() {
    let mut surrogate = make_surrogate(8);
    let (features, labels, groups) = surrogate
        .random_dataset(8, 6, &["valid_acc"], 13)
        .unwrap();

    let options = FitOptions::new()
        .with_hpo_iters(3)
        .with_num_cv_splits(2)
        .with_stratify(false)
        .with_random_state(21);
    surrogate
        .fit(&features, &labels, Some(&groups), &options)
        .unwrap();

    let outcome = surrogate.search_outcome().expect("search outcome stored");
    assert_eq!(outcome.trials.len(), 3);
    assert!(SearchSpace::default().contains(&outcome.best_params));
    assert_eq!(
        outcome.best_score,
        outcome.trials[outcome.best_index].mean_score
    );
    for trial in &outcome.trials {
        assert_eq!(trial.fold_scores.len(), 2);
        assert!(trial.mean_score <= outcome.best_score + 1e-12);
    }
}

#[test]
fn test_refit_reuses_the_stored_column_order() {
    let mut surrogate = make_surrogate(10);
    let (features, labels, _) = surrogate
        .random_dataset(5, 8, &["valid_acc"], 17)
        .unwrap();
    let options = FitOptions::new()
        .with_perform_hpo(false)
        .with_random_state(1);
    surrogate.fit(&features, &labels, None, &options).unwrap();
    let stored = surrogate.feature_columns().unwrap().to_vec();

    // Refitting with permuted input columns must not redefine the order
    let permuted_names: Vec<String> = stored.iter().rev().cloned().collect();
    let permuted = features.select(&permuted_names).unwrap();
    surrogate.fit(&permuted, &labels, None, &options).unwrap();
    assert_eq!(surrogate.feature_columns().unwrap(), &stored[..]);

    // A frame missing a stored column is rejected outright
    let narrow = features.select(&stored[1..]).unwrap();
    assert!(surrogate.fit(&narrow, &labels, None, &options).is_err());
}

#[test]
fn test_set_random_hyperparams_contract() {
    let mut surrogate = make_surrogate(10);
    let mut rng = StdRng::seed_from_u64(31);

    // First call on a fresh instance: the documented fixed defaults
    let first = surrogate.set_random_hyperparams(&mut rng);
    assert_eq!(first, BoosterParams::default());

    // Subsequent calls: independent draws inside the declared bounds
    let space = SearchSpace::default();
    for _ in 0..25 {
        let params = surrogate.set_random_hyperparams(&mut rng);
        assert!(space.contains(&params));
        assert!((1..15).contains(&params.max_depth));
        assert!((1..10).contains(&params.min_child_weight));
        assert!((0.0..1.0).contains(&params.colsample_bytree));
        assert!((0.0..1.0).contains(&params.colsample_bylevel));
        assert!((0.001..0.5).contains(&params.learning_rate));
    }
}

#[test]
fn test_invalid_test_size_surfaces_through_fit() {
    let mut surrogate = make_surrogate(10);
    let (features, labels, _) = surrogate.random_dataset(4, 5, &["valid_acc"], 1).unwrap();
    let err = surrogate
        .fit(
            &features,
            &labels,
            None,
            &FitOptions::new().with_test_size(1.5),
        )
        .unwrap_err();
    assert_eq!(err.category(), "invalid_parameter");
    assert!(!surrogate.is_trained());
}

#[test]
fn test_predict_reorders_and_filters_columns() {
    let mut surrogate = make_surrogate(10);
    let (features, labels, _) = surrogate
        .random_dataset(5, 8, &["valid_acc"], 23)
        .unwrap();
    surrogate
        .fit(
            &features,
            &labels,
            None,
            &FitOptions::new().with_perform_hpo(false).with_random_state(2),
        )
        .unwrap();
    let expected = surrogate.predict(&features).unwrap();

    // Extra columns are dropped, order differences are reconciled
    let mut shuffled = features
        .select(&["epoch", "learning_rate_init", "width", "trivial_augment", "activation"])
        .unwrap();
    shuffled
        .push_float("extraneous", vec![0.0; features.num_rows()])
        .unwrap();
    assert_eq!(surrogate.predict(&shuffled).unwrap(), expected);

    // A missing feature column is an error
    let narrow = features.select(&["width", "epoch"]).unwrap();
    assert!(surrogate.predict(&narrow).is_err());
}
