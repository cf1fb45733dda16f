//! Classification metrics
//!
//! Binary metrics use 1 as the positive label. Precision, recall and F1
//! fall back to 0 when their denominator is empty; the classification
//! report makes that value configurable.

use crate::error::{CardioError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Positive class for binary metrics
pub const POSITIVE_LABEL: i64 = 1;

/// Scoring metric for a binary classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    F1,
    /// Area under the ROC curve, needs probability scores
    RocAuc,
    /// Binary cross-entropy, needs probability scores
    LogLoss,
}

impl Metric {
    /// Whether the metric is computed from probability scores rather than labels
    pub fn requires_probabilities(&self) -> bool {
        matches!(self, Metric::RocAuc | Metric::LogLoss)
    }

    /// Whether every value of the metric lies in [0, 1]
    pub fn is_bounded(&self) -> bool {
        !matches!(self, Metric::LogLoss)
    }

    /// Whether a larger value means a better model
    pub fn greater_is_better(&self) -> bool {
        !matches!(self, Metric::LogLoss)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1 => "f1",
            Metric::RocAuc => "roc_auc",
            Metric::LogLoss => "log_loss",
        }
    }

    /// Score predictions. `proba` holds the positive-class probability per row
    /// and must be present for probability metrics.
    pub fn score(&self, y_true: &Array1<i64>, y_pred: &Array1<i64>, proba: Option<&Array1<f64>>) -> Result<f64> {
        if y_true.len() != y_pred.len() {
            return Err(CardioError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(CardioError::ComputationError("cannot score an empty fold".to_string()));
        }

        let counts = ConfusionMatrix::from_predictions(y_true, y_pred);
        match self {
            Metric::Accuracy => Ok(accuracy(y_true, y_pred)),
            Metric::Precision => Ok(safe_ratio(counts.tp, counts.tp + counts.fp, 0.0)),
            Metric::Recall => Ok(safe_ratio(counts.tp, counts.tp + counts.fn_, 0.0)),
            Metric::F1 => Ok(f1(counts.tp, counts.fp, counts.fn_, 0.0)),
            Metric::RocAuc | Metric::LogLoss => {
                let proba = proba.ok_or_else(|| {
                    CardioError::configuration(format!("metric '{}' requires probability scores", self.name()))
                })?;
                if proba.len() != y_true.len() {
                    return Err(CardioError::ShapeError {
                        expected: format!("{} probabilities", y_true.len()),
                        actual: format!("{} probabilities", proba.len()),
                    });
                }
                Ok(if *self == Metric::RocAuc {
                    roc_auc(y_true, proba)
                } else {
                    log_loss(y_true, proba)
                })
            }
        }
    }
}

impl FromStr for Metric {
    type Err = CardioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accuracy" | "score" => Ok(Metric::Accuracy),
            "precision" => Ok(Metric::Precision),
            "recall" => Ok(Metric::Recall),
            "f1" | "f1_score" => Ok(Metric::F1),
            "roc_auc" => Ok(Metric::RocAuc),
            "log_loss" => Ok(Metric::LogLoss),
            other => Err(CardioError::configuration(format!("unsupported scoring metric '{}'", other))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn safe_ratio(num: usize, den: usize, zero_division: f64) -> f64 {
    if den == 0 {
        zero_division
    } else {
        num as f64 / den as f64
    }
}

fn f1(tp: usize, fp: usize, fn_: usize, zero_division: f64) -> f64 {
    let den = 2 * tp + fp + fn_;
    safe_ratio(2 * tp, den, zero_division)
}

/// Fraction of matching labels
pub fn accuracy(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> f64 {
    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len().max(1) as f64
}

/// Rank-based AUC (Mann-Whitney U) with averaged ranks for ties.
/// A fold holding a single class has no defined AUC and scores 0.5.
pub fn roc_auc(y_true: &Array1<i64>, proba: &Array1<f64>) -> f64 {
    let n_pos = y_true.iter().filter(|&&y| y == POSITIVE_LABEL).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..proba.len()).collect();
    order.sort_by(|&a, &b| proba[a].total_cmp(&proba[b]));

    let mut ranks = vec![0.0; order.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && proba[order[j + 1]] == proba[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&y, _)| y == POSITIVE_LABEL)
        .map(|(_, &r)| r)
        .sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    u / (n_pos * n_neg) as f64
}

/// Mean binary cross-entropy with probabilities clipped to [1e-15, 1 - 1e-15]
pub fn log_loss(y_true: &Array1<i64>, proba: &Array1<f64>) -> f64 {
    const EPS: f64 = 1e-15;
    let total: f64 = y_true
        .iter()
        .zip(proba.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if y == POSITIVE_LABEL {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / y_true.len().max(1) as f64
}

/// Binary confusion matrix; rows are true labels, columns predicted labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == POSITIVE_LABEL, p == POSITIVE_LABEL) {
                (true, true) => cm.tp += 1,
                (false, true) => cm.fp += 1,
                (false, false) => cm.tn += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        cm
    }

    /// `[[tn, fp], [fn, tp]]`
    pub fn as_array(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }
}

/// Per-class precision/recall/F1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: i64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged metrics over the classes of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Classification report for a binary classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Build a report over the classes {0, 1}; `zero_division` replaces
    /// undefined precision/recall/F1 values.
    pub fn from_predictions(y_true: &Array1<i64>, y_pred: &Array1<i64>, zero_division: f64) -> Self {
        let cm = ConfusionMatrix::from_predictions(y_true, y_pred);

        // Class 0 is scored with the roles of the two labels swapped
        let negative = ClassMetrics {
            label: 0,
            precision: safe_ratio(cm.tn, cm.tn + cm.fn_, zero_division),
            recall: safe_ratio(cm.tn, cm.tn + cm.fp, zero_division),
            f1_score: f1(cm.tn, cm.fn_, cm.fp, zero_division),
            support: cm.tn + cm.fp,
        };
        let positive = ClassMetrics {
            label: POSITIVE_LABEL,
            precision: safe_ratio(cm.tp, cm.tp + cm.fp, zero_division),
            recall: safe_ratio(cm.tp, cm.tp + cm.fn_, zero_division),
            f1_score: f1(cm.tp, cm.fp, cm.fn_, zero_division),
            support: cm.tp + cm.fn_,
        };
        let classes = vec![negative, positive];

        let total_support: usize = classes.iter().map(|c| c.support).sum();
        let n = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n,
            support: total_support,
        };
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if total_support == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total_support as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1_score: weighted(|c| c.f1_score),
            support: total_support,
        };

        Self {
            accuracy: accuracy(y_true, y_pred),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1_score, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support
            )?;
        }
        Ok(())
    }
}
