//! Integration test: k-NN sweep end-to-end

use cardio_predict::prelude::*;
use ndarray::Array1;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// 20 rows: three numeric columns in [-2, 2), two random letter columns
fn sample_data(seed: u64) -> (DataFrame, Array1<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let numeric = |rng: &mut ChaCha8Rng| -> Vec<f64> { (0..20).map(|_| rng.gen_range(-2.0..2.0)).collect() };
    let n1 = numeric(&mut rng);
    let n2 = numeric(&mut rng);
    let n3 = numeric(&mut rng);
    let letters = |rng: &mut ChaCha8Rng| -> Vec<String> {
        (0..20)
            .map(|_| char::from(b'A' + rng.gen_range(0..26u8)).to_string())
            .collect()
    };
    let c1 = letters(&mut rng);
    let c2 = letters(&mut rng);

    // Balanced enough that no training fold is single-class
    let labels: Array1<i64> = (0..20).map(|i| if i % 3 == 0 { 1 } else { 0 }).collect();

    let df = df!(
        "Numerical_1" => n1,
        "Numerical_2" => n2,
        "Numerical_3" => n3,
        "Categorical_1" => c1,
        "Categorical_2" => c2,
    )
    .unwrap();
    (df, labels)
}

fn numeric_only(df: &DataFrame) -> DataFrame {
    df.select(["Numerical_1", "Numerical_2", "Numerical_3"]).unwrap()
}

fn grid() -> ParamGrid {
    ParamGrid::range(1, 10, 2)
}

#[test]
fn test_numeric_scenario_row_count() {
    let (df, y) = sample_data(42);
    let x = numeric_only(&df);

    let table = evaluate(&x, &y, &grid(), None, &[], &RebalanceMode::ALL, 20, 123).unwrap();

    assert_eq!(table.len(), 10);
    for k in [1, 3, 5, 7, 9] {
        assert_eq!(table.iter().filter(|r| r.n_neighbors == k).count(), 2);
    }
    for row in table.iter() {
        assert_eq!(row.folds.len(), 20);
        assert!(row.folds.iter().all(|f| f.validation_rows == 1 && f.train_rows == 19));
    }
}

#[test]
fn test_scores_are_bounded_and_spread_non_negative() {
    let (df, y) = sample_data(7);
    let preprocessor = ColumnTransformer::new();
    let config = SweepConfig::new()
        .with_grid(grid())
        .with_scoring(["accuracy", "recall", "f1_score"]);

    let table = KnnSweep::new(config)
        .with_features(&df)
        .with_labels(&y)
        .with_preprocessor(&preprocessor)
        .evaluate()
        .unwrap();

    for row in table.iter() {
        for summary in &row.scores {
            assert!((0.0..=1.0).contains(&summary.cv.mean_score), "{} out of range", summary.label);
            assert!((0.0..=1.0).contains(&summary.train.mean_score), "{} out of range", summary.label);
            assert!(summary.cv.std_score >= 0.0);
            assert!(summary.train.std_score >= 0.0);
        }
    }
}

#[test]
fn test_default_columns() {
    let (df, y) = sample_data(1);
    let preprocessor = ColumnTransformer::new();
    let table = evaluate(&df, &y, &grid(), Some(&preprocessor), &[], &RebalanceMode::ALL, 20, 123).unwrap();

    let frame = table.to_dataframe().unwrap();
    let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "n_neighbors",
            "rebalance",
            "mean_cv_score",
            "std_cv_score",
            "mean_train_score",
            "std_train_score"
        ]
    );
    assert_eq!(frame.height(), 10);
}

#[test]
fn test_candidates_match_grid() {
    let (df, y) = sample_data(3);
    let x = numeric_only(&df);
    let grid = ParamGrid::new([9, 1, 5]);
    let table = evaluate(&x, &y, &grid, None, &[], &[RebalanceMode::None], 10, 123).unwrap();

    let candidates: Vec<usize> = table.iter().map(|r| r.n_neighbors).collect();
    assert_eq!(candidates, vec![9, 1, 5]);
}

#[test]
fn test_oversampling_keeps_held_out_folds() {
    let (df, y) = sample_data(11);
    let x = numeric_only(&df);
    let table = evaluate(&x, &y, &ParamGrid::new([3]), None, &[], &RebalanceMode::ALL, 5, 123).unwrap();

    let plain = &table.rows[0];
    let oversampled = &table.rows[1];
    assert_eq!(plain.rebalance, RebalanceMode::None);
    assert_eq!(oversampled.rebalance, RebalanceMode::MinorityOversample);

    for (p, o) in plain.folds.iter().zip(oversampled.folds.iter()) {
        assert_eq!(p.fold_idx, o.fold_idx);
        assert_eq!(p.validation_rows, o.validation_rows);
        assert_eq!(p.fit_rows, p.train_rows);
        // The minority class is grown to the majority count
        assert!(o.fit_rows > o.train_rows);
    }
}

#[test]
fn test_identical_inputs_are_reproducible() {
    let (df, y) = sample_data(5);
    let preprocessor = ColumnTransformer::new();
    let config = SweepConfig::new()
        .with_grid(grid())
        .with_shuffle(true)
        .with_n_folds(4)
        .with_seed(99)
        .with_scoring(["accuracy", "recall"]);

    let run = || {
        KnnSweep::new(config.clone())
            .with_features(&df)
            .with_labels(&y)
            .with_preprocessor(&preprocessor)
            .evaluate()
            .unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(first, second);
    for (a, b) in first.iter().zip(second.iter()) {
        for (sa, sb) in a.scores.iter().zip(b.scores.iter()) {
            assert_eq!(sa.cv.mean_score.to_bits(), sb.cv.mean_score.to_bits());
            assert_eq!(sa.train.std_score.to_bits(), sb.train.std_score.to_bits());
        }
    }
}

#[test]
fn test_error_kinds() {
    let (df, y) = sample_data(2);
    let x = numeric_only(&df);

    let missing_labels = KnnSweep::new(SweepConfig::new().with_grid(grid()))
        .with_features(&x)
        .evaluate()
        .unwrap_err();
    assert!(missing_labels.is_argument_error());

    let empty_grid = evaluate(&x, &y, &ParamGrid::default(), None, &[], &RebalanceMode::ALL, 20, 123).unwrap_err();
    assert!(empty_grid.is_argument_error());

    let unknown_metric = evaluate(&x, &y, &grid(), None, &["balanced_accuracy"], &RebalanceMode::ALL, 20, 123)
        .unwrap_err();
    assert!(unknown_metric.is_configuration_error());

    let needs_proba = evaluate(&x, &y, &grid(), None, &["roc_auc"], &RebalanceMode::ALL, 20, 123).unwrap_err();
    assert!(needs_proba.is_configuration_error());

    let no_modes = evaluate(&x, &y, &grid(), None, &[], &[], 20, 123).unwrap_err();
    assert!(no_modes.is_argument_error());

    let categorical_without_preprocessor =
        evaluate(&df, &y, &grid(), None, &[], &RebalanceMode::ALL, 20, 123).unwrap_err();
    assert!(categorical_without_preprocessor.is_argument_error());
}

#[test]
fn test_probability_metrics_when_enabled() {
    let (df, y) = sample_data(8);
    let x = numeric_only(&df);
    let config = SweepConfig::new()
        .with_n_neighbors([3, 5])
        .with_n_folds(4)
        .with_probability_estimates(true)
        .with_scoring(["roc_auc", "log_loss"]);

    let table = KnnSweep::new(config).with_features(&x).with_labels(&y).evaluate().unwrap();

    assert_eq!(
        table.metric_labels(),
        vec!["roc_auc".to_string(), "log_loss".to_string()]
    );
    for row in table.iter() {
        let auc = row.mean_cv("roc_auc").unwrap();
        assert!((0.0..=1.0).contains(&auc));
        assert!(row.mean_cv("log_loss").unwrap() >= 0.0);
    }
}

#[test]
fn test_best_row_selection() {
    let (df, y) = sample_data(4);
    let x = numeric_only(&df);
    let table = evaluate(&x, &y, &grid(), None, &[], &RebalanceMode::ALL, 5, 123).unwrap();

    let best = table.best_row("score", None).unwrap();
    let best_score = best.mean_cv("score").unwrap();
    assert!(table.iter().all(|r| r.mean_cv("score").unwrap() <= best_score));

    let best_oversampled = table.best_row("score", Some(RebalanceMode::MinorityOversample)).unwrap();
    assert_eq!(best_oversampled.rebalance, RebalanceMode::MinorityOversample);
}
