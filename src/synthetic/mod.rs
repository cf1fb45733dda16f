//! Class rebalancing by resampling
//!
//! Samplers decide which rows of a training fold to keep or duplicate.
//! They work on labels only and return row indices, so the same selection
//! can be applied to a raw feature table before any preprocessing.

mod random_sampling;

pub use random_sampling::RandomOverSampler;

use crate::error::{CardioError, Result};
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;

/// Result of resampling a numeric design matrix
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Rows taken from the input, in output order
    pub indices: Vec<usize>,
}

/// Trait for samplers
pub trait Sampler: Send + Sync + std::fmt::Debug {
    /// Fit the sampler on the label distribution
    fn fit(&mut self, y: &Array1<i64>) -> Result<()>;

    /// Row indices making up the resampled set
    fn sample_indices(&self, y: &Array1<i64>) -> Result<Vec<usize>>;

    /// Fit and draw indices in one step
    fn fit_sample_indices(&mut self, y: &Array1<i64>) -> Result<Vec<usize>> {
        self.fit(y)?;
        self.sample_indices(y)
    }

    /// Resample a numeric matrix and its labels
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        if x.nrows() != y.len() {
            return Err(CardioError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        let indices = self.sample_indices(y)?;
        Ok(ResampleResult {
            x: x.select(Axis(0), &indices),
            y: indices.iter().map(|&i| y[i]).collect(),
            indices,
        })
    }

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(y)?;
        self.resample(x, y)
    }
}

/// Get class distribution, ordered by class label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class, ordered by class label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_class_counts_ordered() {
        let y = array![1, 0, 1, 1, 0];
        let counts: Vec<(i64, usize)> = class_counts(&y).into_iter().collect();
        assert_eq!(counts, vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_class_indices() {
        let y = array![1, 0, 1];
        let indices = class_indices(&y);
        assert_eq!(indices[&0], vec![1]);
        assert_eq!(indices[&1], vec![0, 2]);
    }
}
