//! k-NN hyperparameter sweep

use crate::error::{CardioError, Result};
use crate::preprocessing::{IdentityPreprocessor, Preprocessor};
use crate::sweep::config::{ParamGrid, RebalanceMode, SweepConfig};
use crate::sweep::table::{FoldSummary, MetricSummary, ResultTable, SweepRow};
use crate::synthetic::class_counts;
use crate::training::{
    take_rows, CVResults, CVSplit, CVStrategy, Classifier, ClassifierPipeline, CrossValidator,
    KNNClassifier, Metric,
};
use ndarray::Array1;
use polars::prelude::*;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scores of one fold, metric order matching the sweep's scoring
struct FoldScores {
    summary: FoldSummary,
    train: Vec<f64>,
    validation: Vec<f64>,
}

/// Cross-validates a k-NN classifier over a grid of neighbor counts
///
/// ```no_run
/// use cardio_predict::prelude::*;
/// # fn run(features: &polars::prelude::DataFrame, labels: &ndarray::Array1<i64>) -> cardio_predict::Result<()> {
/// let config = SweepConfig::new().with_n_neighbors([1, 3, 5]).with_n_folds(5);
/// let preprocessor = ColumnTransformer::new();
/// let table = KnnSweep::new(config)
///     .with_features(features)
///     .with_labels(labels)
///     .with_preprocessor(&preprocessor)
///     .evaluate()?;
/// println!("{}", table.to_dataframe()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KnnSweep<'a> {
    config: SweepConfig,
    features: Option<&'a DataFrame>,
    labels: Option<&'a Array1<i64>>,
    preprocessor: Option<&'a dyn Preprocessor>,
}

impl<'a> KnnSweep<'a> {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            features: None,
            labels: None,
            preprocessor: None,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn with_features(mut self, features: &'a DataFrame) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_labels(mut self, labels: &'a Array1<i64>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Template preprocessor; every fold fits its own unfitted copy
    pub fn with_preprocessor(mut self, preprocessor: &'a dyn Preprocessor) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    /// Run the sweep
    pub fn evaluate(&self) -> Result<ResultTable> {
        let start = Instant::now();
        let (features, labels, metrics, splits) = self.validate()?;
        let modes = self.config.modes();

        info!(
            rows = features.height(),
            candidates = self.config.grid.len(),
            modes = modes.len(),
            folds = splits.len(),
            "Starting k-NN sweep"
        );

        let metric_list: Vec<Metric> = metrics.iter().map(|(_, m)| *m).collect();
        let mut rows = Vec::with_capacity(self.config.grid.len() * modes.len());

        for &k in &self.config.grid.n_neighbors {
            for &mode in &modes {
                let folds: Vec<FoldScores> = splits
                    .par_iter()
                    .map(|split| self.evaluate_fold(features, labels, split, k, mode, &metric_list))
                    .collect::<Result<Vec<_>>>()?;

                let row = Self::summarize(k, mode, &metrics, folds);
                if let Some(first) = row.scores.first() {
                    debug!(
                        n_neighbors = k,
                        rebalance = %mode,
                        metric = %first.label,
                        mean_cv = first.cv.mean_score,
                        mean_train = first.train.mean_score,
                        "Evaluated candidate"
                    );
                }
                rows.push(row);
            }
        }

        info!(
            rows = rows.len(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Finished k-NN sweep"
        );
        Ok(ResultTable::new(rows))
    }

    /// Single validation step; everything after it only fails on internal errors
    fn validate(&self) -> Result<(&'a DataFrame, &'a Array1<i64>, Vec<(String, Metric)>, Vec<CVSplit>)> {
        let features = self
            .features
            .ok_or_else(|| CardioError::argument("training features are required"))?;
        let labels = self
            .labels
            .ok_or_else(|| CardioError::argument("training labels are required"))?;

        if features.height() == 0 || features.width() == 0 {
            return Err(CardioError::argument("training features must not be empty"));
        }
        if labels.len() != features.height() {
            return Err(CardioError::argument(format!(
                "label count ({}) does not match feature rows ({})",
                labels.len(),
                features.height()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&v| v != 0 && v != 1) {
            return Err(CardioError::argument(format!(
                "labels must be binary 0/1, found {}",
                bad
            )));
        }

        let metrics = self.config.validate()?;

        if self.config.n_folds > features.height() {
            return Err(CardioError::argument(format!(
                "fold count ({}) exceeds the number of rows ({})",
                self.config.n_folds,
                features.height()
            )));
        }
        if self.preprocessor.is_none() {
            IdentityPreprocessor::validate(features)?;
        }

        let splits = CrossValidator::new(CVStrategy::KFold {
            n_splits: self.config.n_folds,
            shuffle: self.config.shuffle,
        })
        .with_random_state(self.config.seed)
        .split(features.height(), None)?;

        let smallest_train = splits.iter().map(|s| s.train_indices.len()).min().unwrap_or(0);
        if let Some(&k) = self.config.grid.n_neighbors.iter().find(|&&k| k > smallest_train) {
            return Err(CardioError::argument(format!(
                "n_neighbors candidate {} exceeds the smallest training fold ({} rows)",
                k, smallest_train
            )));
        }

        Ok((features, labels, metrics, splits))
    }

    fn evaluate_fold(
        &self,
        features: &DataFrame,
        labels: &Array1<i64>,
        split: &CVSplit,
        k: usize,
        mode: RebalanceMode,
        metrics: &[Metric],
    ) -> Result<FoldScores> {
        let train_x = take_rows(features, &split.train_indices)?;
        let train_y: Array1<i64> = split.train_indices.iter().map(|&i| labels[i]).collect();
        let val_x = take_rows(features, &split.test_indices)?;
        let val_y: Array1<i64> = split.test_indices.iter().map(|&i| labels[i]).collect();

        if class_counts(&train_y).len() < 2 {
            warn!(
                fold = split.fold_idx,
                n_neighbors = k,
                "Training fold holds a single class"
            );
        }

        let preprocessor = match self.preprocessor {
            Some(template) => template.boxed_clone(),
            None => Box::new(IdentityPreprocessor::new()),
        };
        let knn = KNNClassifier::new(self.config.knn.clone().with_n_neighbors(k));
        let mut pipeline = ClassifierPipeline::new(preprocessor, Classifier::Knn(knn));
        if let Some(sampler) = mode.sampler(self.config.seed) {
            pipeline = pipeline.with_sampler(sampler);
        }

        pipeline.fit(&train_x, &train_y)?;
        let train = pipeline.score_many(&train_x, &train_y, metrics)?;
        let validation = pipeline.score_many(&val_x, &val_y, metrics)?;

        Ok(FoldScores {
            summary: FoldSummary {
                fold_idx: split.fold_idx,
                train_rows: split.train_indices.len(),
                fit_rows: pipeline.fit_rows(),
                validation_rows: split.test_indices.len(),
            },
            train,
            validation,
        })
    }

    fn summarize(k: usize, mode: RebalanceMode, metrics: &[(String, Metric)], folds: Vec<FoldScores>) -> SweepRow {
        let scores = metrics
            .iter()
            .enumerate()
            .map(|(idx, (label, metric))| MetricSummary {
                label: label.clone(),
                metric: *metric,
                cv: CVResults::from_scores(folds.iter().map(|f| f.validation[idx]).collect()),
                train: CVResults::from_scores(folds.iter().map(|f| f.train[idx]).collect()),
            })
            .collect();

        SweepRow {
            n_neighbors: k,
            rebalance: mode,
            scores,
            folds: folds.into_iter().map(|f| f.summary).collect(),
        }
    }
}

/// Run a sweep from its individual arguments
///
/// `preprocessor: None` passes numeric features through unchanged.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    features: &DataFrame,
    labels: &Array1<i64>,
    grid: &ParamGrid,
    preprocessor: Option<&dyn Preprocessor>,
    scoring: &[&str],
    rebalance_modes: &[RebalanceMode],
    fold_count: usize,
    seed: u64,
) -> Result<ResultTable> {
    let config = SweepConfig::new()
        .with_grid(grid.clone())
        .with_scoring(scoring.iter().copied())
        .with_rebalance_modes(rebalance_modes.iter().copied())
        .with_n_folds(fold_count)
        .with_seed(seed);

    let mut sweep = KnnSweep::new(config).with_features(features).with_labels(labels);
    if let Some(preprocessor) = preprocessor {
        sweep = sweep.with_preprocessor(preprocessor);
    }
    sweep.evaluate()
}
