//! Cross-validation splitters

use crate::error::{CardioError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-validation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold (maintains class distribution)
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 5, shuffle: false }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
///
/// Shuffling is driven by `random_state` only; an unset state behaves as
/// seed 0 so splits are always reproducible.
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn strategy(&self) -> &CVStrategy {
        &self.strategy
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize, y: Option<&Array1<i64>>) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => {
                self.k_fold_split(n_samples, *n_splits, *shuffle)
            }
            CVStrategy::StratifiedKFold { n_splits, shuffle } => {
                let y = y.ok_or_else(|| {
                    CardioError::argument("StratifiedKFold requires target array")
                })?;
                if y.len() != n_samples {
                    return Err(CardioError::argument(format!(
                        "target length ({}) does not match n_samples ({})",
                        y.len(),
                        n_samples
                    )));
                }
                self.stratified_k_fold_split(y, *n_splits, *shuffle)
            }
        }
    }

    fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0))
    }

    fn check_n_splits(n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 {
            return Err(CardioError::argument("n_splits must be at least 2"));
        }
        if n_samples < n_splits {
            return Err(CardioError::argument(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }
        Ok(())
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        Self::check_n_splits(n_samples, n_splits)?;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        // The first n_samples % n_splits folds get one extra sample
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }

    fn stratified_k_fold_split(
        &self,
        y: &Array1<i64>,
        n_splits: usize,
        shuffle: bool,
    ) -> Result<Vec<CVSplit>> {
        Self::check_n_splits(y.len(), n_splits)?;

        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &class) in y.iter().enumerate() {
            class_indices.entry(class).or_default().push(idx);
        }

        if shuffle {
            let mut rng = self.rng();
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // Deal each class round-robin, continuing where the previous class stopped
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        let mut next = 0;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[next % n_splits].push(idx);
                next += 1;
            }
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();

                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Population standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: f64::NAN,
                std_score: f64::NAN,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}
