//! Class-weighted logistic regression baseline

use crate::error::{CardioError, Result};
use crate::evaluation::{evaluate_on_test, TestEvaluation};
use crate::preprocessing::{ColumnTransformer, ImputeStrategy, PreprocessingConfig, ScalerType};
use crate::training::{
    take_rows, CVResults, CVSplit, CVStrategy, Classifier, ClassifierPipeline, CrossValidator,
    LogisticConfig, LogisticRegression, Metric,
};
use ndarray::Array1;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Grid search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticSearch {
    /// Candidate inverse regularization strengths
    pub c_values: Vec<f64>,
    /// Stratified folds per candidate
    pub n_folds: usize,
    /// Model settings shared by every candidate; `c` is set per candidate
    pub model: LogisticConfig,
}

impl Default for LogisticSearch {
    fn default() -> Self {
        Self {
            c_values: (-4..6).map(|e| 10f64.powi(e)).collect(),
            n_folds: 5,
            model: LogisticConfig::default()
                .with_class_weight(0, 1.0)
                .with_class_weight(1, 6.0),
        }
    }
}

impl LogisticSearch {
    pub fn with_c_values(mut self, c_values: impl IntoIterator<Item = f64>) -> Self {
        self.c_values = c_values.into_iter().collect();
        self
    }

    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_model(mut self, model: LogisticConfig) -> Self {
        self.model = model;
        self
    }
}

/// Cross-validated accuracy of one C
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticGridRow {
    /// 1 is best; equal means share the smallest rank
    pub rank_test_score: usize,
    pub param_c: f64,
    pub mean_train_score: f64,
    pub std_train_score: f64,
    pub mean_test_score: f64,
    pub std_test_score: f64,
}

/// Grid search results, refit model and its test scores
#[derive(Debug)]
pub struct LogisticEvaluation {
    /// Sorted by rank, grid order within a rank
    pub grid_results: Vec<LogisticGridRow>,
    pub best_c: f64,
    /// Pipeline refit on all training rows with `best_c`
    pub pipeline: ClassifierPipeline,
    pub test: TestEvaluation,
}

impl LogisticEvaluation {
    /// Grid results as a frame with the same columns as [`LogisticGridRow`]
    pub fn grid_results_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.grid_results;
        let column = |name: &str, f: fn(&LogisticGridRow) -> f64| {
            Column::new(name.into(), rows.iter().map(f).collect::<Vec<f64>>())
        };
        let ranks: Vec<u64> = rows.iter().map(|r| r.rank_test_score as u64).collect();

        Ok(DataFrame::new(vec![
            Column::new("rank_test_score".into(), ranks),
            column("param_c", |r| r.param_c),
            column("mean_train_score", |r| r.mean_train_score),
            column("std_train_score", |r| r.std_train_score),
            column("mean_test_score", |r| r.mean_test_score),
            column("std_test_score", |r| r.std_test_score),
        ])?)
    }
}

fn preprocessing_config(numeric_features: &[&str], categorical_features: &[&str]) -> PreprocessingConfig {
    PreprocessingConfig::new()
        .with_numeric_columns(numeric_features.iter().copied())
        .with_categorical_columns(categorical_features.iter().copied())
        .with_numeric_impute(ImputeStrategy::Median)
        .with_scaler(ScalerType::Standard)
        .with_drop_if_binary(true)
}

fn build_pipeline(preprocessing: &PreprocessingConfig, model: &LogisticConfig, c: f64) -> ClassifierPipeline {
    ClassifierPipeline::new(
        Box::new(ColumnTransformer::with_config(preprocessing.clone())),
        Classifier::Logistic(LogisticRegression::new(model.clone().with_c(c))),
    )
}

fn score_candidate(
    x_train: &DataFrame,
    y_train: &Array1<i64>,
    splits: &[CVSplit],
    preprocessing: &PreprocessingConfig,
    model: &LogisticConfig,
    c: f64,
) -> Result<(CVResults, CVResults)> {
    let mut train_scores = Vec::with_capacity(splits.len());
    let mut test_scores = Vec::with_capacity(splits.len());

    for split in splits {
        let fold_x = take_rows(x_train, &split.train_indices)?;
        let fold_y: Array1<i64> = split.train_indices.iter().map(|&i| y_train[i]).collect();
        let held_x = take_rows(x_train, &split.test_indices)?;
        let held_y: Array1<i64> = split.test_indices.iter().map(|&i| y_train[i]).collect();

        let mut pipeline = build_pipeline(preprocessing, model, c);
        pipeline.fit(&fold_x, &fold_y)?;
        train_scores.push(pipeline.score(&fold_x, &fold_y, Metric::Accuracy)?);
        test_scores.push(pipeline.score(&held_x, &held_y, Metric::Accuracy)?);
    }

    Ok((CVResults::from_scores(train_scores), CVResults::from_scores(test_scores)))
}

/// Rank by descending score; ties share the smallest rank
fn min_ranks(scores: &[f64]) -> Vec<usize> {
    scores
        .iter()
        .map(|&s| 1 + scores.iter().filter(|&&other| other > s).count())
        .collect()
}

/// Grid-search C for a class-weighted logistic regression and score the
/// refit model on the test set
pub fn evaluate_logistic_regression(
    x_train: &DataFrame,
    y_train: &Array1<i64>,
    x_test: &DataFrame,
    y_test: &Array1<i64>,
    numeric_features: &[&str],
    categorical_features: &[&str],
) -> Result<LogisticEvaluation> {
    LogisticSearch::default().evaluate(
        x_train,
        y_train,
        x_test,
        y_test,
        numeric_features,
        categorical_features,
    )
}

impl LogisticSearch {
    /// Run the search with these settings
    pub fn evaluate(
        &self,
        x_train: &DataFrame,
        y_train: &Array1<i64>,
        x_test: &DataFrame,
        y_test: &Array1<i64>,
        numeric_features: &[&str],
        categorical_features: &[&str],
    ) -> Result<LogisticEvaluation> {
        if self.c_values.is_empty() {
            return Err(CardioError::argument("at least one C value is required"));
        }
        if x_train.height() != y_train.len() {
            return Err(CardioError::argument(format!(
                "label count ({}) does not match training rows ({})",
                y_train.len(),
                x_train.height()
            )));
        }

        let preprocessing = preprocessing_config(numeric_features, categorical_features);
        let splits = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: self.n_folds,
            shuffle: false,
        })
        .split(x_train.height(), Some(y_train))?;

        let scored: Vec<(CVResults, CVResults)> = self
            .c_values
            .par_iter()
            .map(|&c| score_candidate(x_train, y_train, &splits, &preprocessing, &self.model, c))
            .collect::<Result<Vec<_>>>()?;

        let mean_test: Vec<f64> = scored.iter().map(|(_, test)| test.mean_score).collect();
        let ranks = min_ranks(&mean_test);

        let mut grid_results: Vec<LogisticGridRow> = self
            .c_values
            .iter()
            .zip(scored.iter())
            .zip(ranks.iter())
            .map(|((&c, (train, test)), &rank)| LogisticGridRow {
                rank_test_score: rank,
                param_c: c,
                mean_train_score: train.mean_score,
                std_train_score: train.std_score,
                mean_test_score: test.mean_score,
                std_test_score: test.std_score,
            })
            .collect();
        for row in &grid_results {
            debug!(c = row.param_c, mean_test = row.mean_test_score, rank = row.rank_test_score, "Scored C");
        }

        // Best is the first candidate in grid order with rank 1
        let best_c = grid_results
            .iter()
            .find(|r| r.rank_test_score == 1)
            .map(|r| r.param_c)
            .ok_or_else(|| CardioError::ComputationError("no candidate ranked first".to_string()))?;
        grid_results.sort_by_key(|r| r.rank_test_score);

        let mut pipeline = build_pipeline(&preprocessing, &self.model, best_c);
        pipeline.fit(x_train, y_train)?;
        let test = evaluate_on_test(&pipeline, x_test, y_test)?;

        info!(best_c, test_accuracy = test.accuracy, test_recall = test.recall, "Logistic regression evaluated");

        Ok(LogisticEvaluation {
            grid_results,
            best_c,
            pipeline,
            test,
        })
    }
}
