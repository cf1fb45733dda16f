//! Model selection and held-out evaluation
//!
//! Turns a sweep into a fitted model and scores fitted pipelines on a test
//! set. [`evaluate_logistic_regression`] runs the class-weighted logistic
//! regression baseline end to end.

mod logistic;

pub use logistic::{
    evaluate_logistic_regression, LogisticEvaluation, LogisticGridRow, LogisticSearch,
};

use crate::error::{CardioError, Result};
use crate::preprocessing::Preprocessor;
use crate::sweep::{KnnSweep, RebalanceMode, ResultTable, SweepConfig};
use crate::training::{
    take_rows, Classifier, ClassifierPipeline, ClassificationReport, ConfusionMatrix,
    CrossValidator, CVStrategy, KNNClassifier, Metric,
};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Scores of a fitted pipeline on a held-out set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvaluation {
    pub accuracy: f64,
    pub recall: f64,
    pub confusion_matrix: ConfusionMatrix,
    /// Per-class report with zero division scored as 1
    pub report: ClassificationReport,
}

/// Score a fitted pipeline on test rows
pub fn evaluate_on_test(
    pipeline: &ClassifierPipeline,
    x_test: &DataFrame,
    y_test: &Array1<i64>,
) -> Result<TestEvaluation> {
    if x_test.height() != y_test.len() {
        return Err(CardioError::argument(format!(
            "label count ({}) does not match test rows ({})",
            y_test.len(),
            x_test.height()
        )));
    }
    let y_pred = pipeline.predict(x_test)?;

    Ok(TestEvaluation {
        accuracy: Metric::Accuracy.score(y_test, &y_pred, None)?,
        recall: Metric::Recall.score(y_test, &y_pred, None)?,
        confusion_matrix: ConfusionMatrix::from_predictions(y_test, &y_pred),
        report: ClassificationReport::from_predictions(y_test, &y_pred, 1.0),
    })
}

/// Outcome of [`fit_best_knn`]
#[derive(Debug)]
pub struct BestKnn {
    pub n_neighbors: usize,
    /// Mean held-out score of the selection metric
    pub mean_cv_score: f64,
    /// Median held-out recall of the chosen pipeline over 5 folds
    pub recall_cv_median: f64,
    /// Full sweep the choice was made from
    pub table: ResultTable,
    /// Oversampling pipeline fitted on all training rows
    pub pipeline: ClassifierPipeline,
}

/// Sweep with minority oversampling, pick the best neighbor count by the
/// first scoring metric and fit the final pipeline on all rows
pub fn fit_best_knn(
    features: &DataFrame,
    labels: &Array1<i64>,
    preprocessor: &dyn Preprocessor,
    config: SweepConfig,
) -> Result<BestKnn> {
    let config = config.with_rebalance_modes([RebalanceMode::MinorityOversample]);
    let seed = config.seed;
    let knn_config = config.knn.clone();

    let table = KnnSweep::new(config)
        .with_features(features)
        .with_labels(labels)
        .with_preprocessor(preprocessor)
        .evaluate()?;

    let label = table
        .metric_labels()
        .into_iter()
        .next()
        .ok_or_else(|| CardioError::ComputationError("sweep produced no metrics".to_string()))?;
    let best = table.best_row(&label, Some(RebalanceMode::MinorityOversample))?;
    let n_neighbors = best.n_neighbors;
    let mean_cv_score = best.summary(&label).map_or(f64::NAN, |s| s.cv.mean_score);

    let build = || {
        let knn = KNNClassifier::new(knn_config.clone().with_n_neighbors(n_neighbors));
        let pipeline = ClassifierPipeline::new(preprocessor.boxed_clone(), Classifier::Knn(knn));
        match RebalanceMode::MinorityOversample.sampler(seed) {
            Some(sampler) => pipeline.with_sampler(sampler),
            None => pipeline,
        }
    };

    let splits = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false })
        .split(features.height(), None)?;
    let mut recalls = Vec::with_capacity(splits.len());
    for split in &splits {
        let train_y: Array1<i64> = split.train_indices.iter().map(|&i| labels[i]).collect();
        let test_y: Array1<i64> = split.test_indices.iter().map(|&i| labels[i]).collect();
        let mut pipeline = build();
        pipeline.fit(&take_rows(features, &split.train_indices)?, &train_y)?;
        recalls.push(pipeline.score(&take_rows(features, &split.test_indices)?, &test_y, Metric::Recall)?);
    }
    let recall_cv_median = median(&mut recalls);

    let mut pipeline = build();
    pipeline.fit(features, labels)?;

    info!(
        n_neighbors,
        mean_cv_score,
        recall_cv_median,
        "Selected k-NN model"
    );

    Ok(BestKnn {
        n_neighbors,
        mean_cv_score,
        recall_cv_median,
        table,
        pipeline,
    })
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
