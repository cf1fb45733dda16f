//! Integration test: model selection and held-out evaluation

use cardio_predict::prelude::*;
use ndarray::Array1;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Disease risk grows with age and cholesterol; smokers are more likely sick
fn patients(n: usize, seed: u64) -> (DataFrame, Array1<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut age = Vec::with_capacity(n);
    let mut chol = Vec::with_capacity(n);
    let mut smoker = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);

    for _ in 0..n {
        let a: f64 = rng.gen_range(30.0..80.0);
        let c: f64 = rng.gen_range(150.0..320.0);
        let s = rng.gen_bool(0.4);
        let risk = (a - 55.0) / 10.0 + (c - 235.0) / 40.0 + if s { 1.0 } else { -0.5 };
        let noise: f64 = rng.gen_range(-0.5..0.5);

        age.push(if rng.gen_bool(0.05) { None } else { Some(a) });
        chol.push(c);
        smoker.push(if s { "yes" } else { "no" });
        labels.push(if risk + noise > 1.0 { 1 } else { 0 });
    }

    let df = df!(
        "age" => age,
        "chol" => chol,
        "smoker" => smoker,
    )
    .unwrap();
    (df, Array1::from_vec(labels))
}

#[test]
fn test_fit_best_knn_and_evaluate_on_test() {
    let (train_x, train_y) = patients(120, 1);
    let (test_x, test_y) = patients(40, 2);
    let preprocessor = ColumnTransformer::new();
    let config = SweepConfig::new()
        .with_grid(ParamGrid::range(5, 50, 5))
        .with_n_folds(5);

    let best = fit_best_knn(&train_x, &train_y, &preprocessor, config).unwrap();

    assert!(best.table.iter().all(|r| r.rebalance == RebalanceMode::MinorityOversample));
    assert_eq!(best.table.len(), 9);
    assert_eq!(best.n_neighbors % 5, 0);
    assert_eq!(
        best.table.best_row("score", None).unwrap().n_neighbors,
        best.n_neighbors
    );
    assert!((0.0..=1.0).contains(&best.recall_cv_median));
    assert!(best.pipeline.has_sampler());

    let result = evaluate_on_test(&best.pipeline, &test_x, &test_y).unwrap();
    assert_eq!(result.confusion_matrix.total(), 40);
    assert!(result.accuracy > 0.5, "accuracy {} should beat chance", result.accuracy);
    assert!(result.report.to_string().contains("f1-score"));
}

#[test]
fn test_logistic_regression_evaluation() {
    let (train_x, train_y) = patients(100, 3);
    let (test_x, test_y) = patients(40, 4);

    let result = evaluate_logistic_regression(
        &train_x,
        &train_y,
        &test_x,
        &test_y,
        &["age", "chol"],
        &["smoker"],
    )
    .unwrap();

    assert_eq!(result.grid_results.len(), 10);
    assert_eq!(result.grid_results[0].rank_test_score, 1);
    assert!(result
        .grid_results
        .windows(2)
        .all(|w| w[0].rank_test_score <= w[1].rank_test_score));
    assert!(result.grid_results.iter().any(|r| r.param_c == result.best_c));
    assert_eq!(result.test.confusion_matrix.total(), 40);
    assert_eq!(result.pipeline.preprocessor().feature_names(), vec!["age", "chol", "smoker_yes"]);

    let frame = result.grid_results_dataframe().unwrap();
    assert_eq!(frame.shape(), (10, 6));
}

#[test]
fn test_logistic_search_custom_grid() {
    let (train_x, train_y) = patients(60, 5);
    let search = LogisticSearch::default().with_c_values([0.1, 1.0]).with_n_folds(3);

    let result = search
        .evaluate(&train_x, &train_y, &train_x, &train_y, &["age", "chol"], &["smoker"])
        .unwrap();

    assert_eq!(result.grid_results.len(), 2);
    assert!(result.best_c == 0.1 || result.best_c == 1.0);
    for row in &result.grid_results {
        assert!((0.0..=1.0).contains(&row.mean_test_score));
        assert!(row.std_train_score >= 0.0);
    }
}
