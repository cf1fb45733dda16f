//! K-Nearest Neighbors classifier
//!
//! Brute-force neighbor search with a bounded max-heap per query row and
//! rayon-parallel prediction. Vote ties go to the smallest class label so
//! predictions are independent of scheduling.

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{CardioError, Result};

/// Distance metric for KNN
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum DistanceMetric {
    /// Euclidean distance (L2)
    #[default]
    Euclidean,
    /// Manhattan distance (L1)
    Manhattan,
    /// Minkowski distance with parameter p
    Minkowski(f64),
    /// Cosine similarity (converted to distance)
    Cosine,
}

/// Weighting scheme for neighbors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum WeightScheme {
    /// All neighbors have equal weight
    #[default]
    Uniform,
    /// Closer neighbors have more weight (inverse distance)
    Distance,
}

/// KNN configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNNConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
    /// Distance metric
    pub metric: DistanceMetric,
    /// Weighting scheme
    pub weights: WeightScheme,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            metric: DistanceMetric::Euclidean,
            weights: WeightScheme::Uniform,
        }
    }
}

impl KNNConfig {
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_weights(mut self, weights: WeightScheme) -> Self {
        self.weights = weights;
        self
    }
}

/// K-Nearest Neighbors Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<i64>>,
    classes: Vec<i64>,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
            classes: Vec::new(),
        }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig {
            n_neighbors: k,
            ..Default::default()
        })
    }

    pub fn n_neighbors(&self) -> usize {
        self.config.n_neighbors
    }

    /// Sorted class labels seen during fit
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Fit the classifier (stores training data)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(CardioError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.config.n_neighbors == 0 {
            return Err(CardioError::argument("n_neighbors must be at least 1"));
        }
        if self.config.n_neighbors > x.nrows() {
            return Err(CardioError::argument(format!(
                "n_neighbors ({}) must be <= number of fitted samples ({})",
                self.config.n_neighbors,
                x.nrows()
            )));
        }

        let mut classes: Vec<i64> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        self.x_train = Some(x.to_owned());
        self.y_train = Some(y.to_owned());
        self.classes = classes;

        Ok(())
    }

    fn fitted(&self) -> Result<(&Array2<f64>, &Array1<i64>)> {
        match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(CardioError::ModelNotFitted),
        }
    }

    fn check_width(x_train: &Array2<f64>, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != x_train.ncols() {
            return Err(CardioError::ShapeError {
                expected: format!("{} features", x_train.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Predict class labels (parallelized over test samples)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let (x_train, y_train) = self.fitted()?;
        Self::check_width(x_train, x)?;
        let k = self.config.n_neighbors;
        let metric = self.config.metric;
        let weights = self.config.weights;
        let classes = &self.classes;

        let predictions: Vec<i64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k, metric);
                let votes = class_weights(&neighbors, classes, weights);
                argmax_class(&votes, classes)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Predict class probabilities, one column per entry of `classes()`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (x_train, y_train) = self.fitted()?;
        Self::check_width(x_train, x)?;
        let n_classes = self.classes.len();
        let k = self.config.n_neighbors;
        let metric = self.config.metric;
        let weights = self.config.weights;
        let classes = &self.classes;

        let probs: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k, metric);
                let mut votes = class_weights(&neighbors, classes, weights);
                let total: f64 = votes.iter().sum();
                if total > 0.0 {
                    votes.iter_mut().for_each(|v| *v /= total);
                }
                votes
            })
            .collect();

        let flat: Vec<f64> = probs.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    /// Probability of `label` for every row; zero when `label` was never seen in fit
    pub fn positive_proba(&self, x: &Array2<f64>, label: i64) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(match self.classes.iter().position(|&c| c == label) {
            Some(col) => proba.column(col).to_owned(),
            None => Array1::zeros(x.nrows()),
        })
    }
}

/// Max-heap entry for partial sort (keeps k smallest distances).
/// Ordered by distance, then training row, so the latest row of a tie sits on top.
#[derive(PartialEq)]
struct DistLabel {
    dist: f64,
    row: usize,
    label: i64,
}

impl Eq for DistLabel {}
impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.row.cmp(&other.row))
    }
}

/// Find k nearest neighbors using a max-heap: O(n log k)
///
/// Among equidistant candidates the earlier training row is kept.
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<i64>,
    k: usize,
    metric: DistanceMetric,
) -> Vec<(f64, i64)> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (row, (sample, &label)) in x_train.rows().into_iter().zip(y_train.iter()).enumerate() {
        let dist = compute_distance(point, sample, metric);
        if heap.len() < k {
            heap.push(DistLabel { dist, row, label });
        } else if let Some(top) = heap.peek() {
            // Rows arrive in order, so a tie never displaces an earlier row
            if dist < top.dist {
                heap.pop();
                heap.push(DistLabel { dist, row, label });
            }
        }
    }

    heap.into_sorted_vec().into_iter().map(|dl| (dl.dist, dl.label)).collect()
}

/// Compute distance between two points using the specified metric
fn compute_distance(a: ArrayView1<f64>, b: ArrayView1<f64>, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b.iter())
            .map(|(ai, bi)| {
                let d = ai - bi;
                d * d
            })
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).abs()).sum(),
        DistanceMetric::Minkowski(p) => a
            .iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).abs().powf(p))
            .sum::<f64>()
            .powf(1.0 / p),
        DistanceMetric::Cosine => {
            let mut dot = 0.0;
            let mut norm_a = 0.0;
            let mut norm_b = 0.0;
            for (ai, bi) in a.iter().zip(b.iter()) {
                dot += ai * bi;
                norm_a += ai * ai;
                norm_b += bi * bi;
            }
            let denom = norm_a.sqrt() * norm_b.sqrt();
            if denom > 0.0 {
                1.0 - (dot / denom)
            } else {
                1.0
            }
        }
    }
}

/// Accumulated vote weight per class, in `classes` order
fn class_weights(neighbors: &[(f64, i64)], classes: &[i64], weights: WeightScheme) -> Vec<f64> {
    let mut votes = vec![0.0; classes.len()];
    for &(dist, label) in neighbors {
        let weight = match weights {
            WeightScheme::Uniform => 1.0,
            WeightScheme::Distance => 1.0 / (dist + 1e-10),
        };
        if let Ok(idx) = classes.binary_search(&label) {
            votes[idx] += weight;
        }
    }
    votes
}

fn argmax_class(votes: &[f64], classes: &[i64]) -> i64 {
    let mut best = 0;
    for (i, &v) in votes.iter().enumerate().skip(1) {
        if v > votes[best] {
            best = i;
        }
    }
    classes.get(best).copied().unwrap_or(0)
}
