//! Sweep result table

use crate::error::{CardioError, Result};
use crate::sweep::config::RebalanceMode;
use crate::training::{CVResults, Metric};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Train/validation statistics of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Column label, e.g. `score` or `recall`
    pub label: String,
    pub metric: Metric,
    /// Held-out fold scores
    pub cv: CVResults,
    /// Training fold scores, on the rows before resampling
    pub train: CVResults,
}

/// Row counts of one fold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldSummary {
    pub fold_idx: usize,
    /// Training rows before resampling
    pub train_rows: usize,
    /// Rows the classifier was fitted on
    pub fit_rows: usize,
    /// Held-out rows
    pub validation_rows: usize,
}

/// One (candidate, rebalancing mode) result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub n_neighbors: usize,
    pub rebalance: RebalanceMode,
    pub scores: Vec<MetricSummary>,
    pub folds: Vec<FoldSummary>,
}

impl SweepRow {
    pub fn summary(&self, label: &str) -> Option<&MetricSummary> {
        self.scores.iter().find(|s| s.label == label)
    }

    /// Mean held-out score of a metric label
    pub fn mean_cv(&self, label: &str) -> Option<f64> {
        self.summary(label).map(|s| s.cv.mean_score)
    }

    /// Mean training score of a metric label
    pub fn mean_train(&self, label: &str) -> Option<f64> {
        self.summary(label).map(|s| s.train.mean_score)
    }
}

/// Cross-validated statistics for every evaluated configuration
///
/// Rows follow grid order with the rebalancing modes nested per candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub rows: Vec<SweepRow>,
}

impl ResultTable {
    pub fn new(rows: Vec<SweepRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SweepRow> {
        self.rows.iter()
    }

    /// Metric labels, in column order
    pub fn metric_labels(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.scores.iter().map(|s| s.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Column names of [`ResultTable::to_dataframe`]
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec!["n_neighbors".to_string(), "rebalance".to_string()];
        for label in self.metric_labels() {
            names.push(format!("mean_cv_{}", label));
            names.push(format!("std_cv_{}", label));
            names.push(format!("mean_train_{}", label));
            names.push(format!("std_train_{}", label));
        }
        names
    }

    /// Flatten into a polars frame, one row per configuration
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let n_neighbors: Vec<u64> = self.rows.iter().map(|r| r.n_neighbors as u64).collect();
        let rebalance: Vec<&str> = self.rows.iter().map(|r| r.rebalance.label()).collect();

        let mut columns = vec![
            Column::new("n_neighbors".into(), n_neighbors),
            Column::new("rebalance".into(), rebalance),
        ];

        for (idx, label) in self.metric_labels().iter().enumerate() {
            let stat = |f: fn(&MetricSummary) -> f64| -> Vec<f64> {
                self.rows.iter().map(|r| f(&r.scores[idx])).collect()
            };
            columns.push(Column::new(format!("mean_cv_{}", label).into(), stat(|s| s.cv.mean_score)));
            columns.push(Column::new(format!("std_cv_{}", label).into(), stat(|s| s.cv.std_score)));
            columns.push(Column::new(format!("mean_train_{}", label).into(), stat(|s| s.train.mean_score)));
            columns.push(Column::new(format!("std_train_{}", label).into(), stat(|s| s.train.std_score)));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Row with the best mean held-out score for `label`, optionally
    /// restricted to one rebalancing mode. Ties go to the earliest row.
    pub fn best_row(&self, label: &str, mode: Option<RebalanceMode>) -> Result<&SweepRow> {
        let mut best: Option<(&SweepRow, f64)> = None;

        for row in self.rows.iter().filter(|r| mode.map_or(true, |m| r.rebalance == m)) {
            let summary = row.summary(label).ok_or_else(|| {
                CardioError::configuration(format!("no metric labelled '{}' in the result table", label))
            })?;
            let score = summary.cv.mean_score;
            let better = match best {
                None => true,
                Some((_, current)) if summary.metric.greater_is_better() => score > current,
                Some((_, current)) => score < current,
            };
            if better {
                best = Some((row, score));
            }
        }

        best.map(|(row, _)| row).ok_or_else(|| {
            CardioError::argument(match mode {
                Some(m) => format!("no rows evaluated with rebalancing mode '{}'", m),
                None => "result table is empty".to_string(),
            })
        })
    }
}
