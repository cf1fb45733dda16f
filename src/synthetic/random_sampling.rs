//! Random oversampling

use crate::error::{CardioError, Result};
use crate::synthetic::{class_counts, class_indices, Sampler};
use ndarray::Array1;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Random oversampler (duplicates minority samples)
///
/// Every class below the majority count is grown to the majority count by
/// drawing its own rows with replacement. Original rows come first,
/// duplicates are appended class by class in label order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOverSampler {
    /// Random seed
    seed: u64,
    /// Target counts
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl RandomOverSampler {
    /// Create new random oversampler
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            target_counts: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Sampler for RandomOverSampler {
    fn fit(&mut self, y: &Array1<i64>) -> Result<()> {
        let counts = class_counts(y);
        let max_count = counts.values().copied().max().ok_or_else(|| {
            CardioError::argument("cannot oversample an empty label vector")
        })?;

        let targets = counts.keys().map(|&class| (class, max_count)).collect();

        self.target_counts = Some(targets);
        Ok(())
    }

    fn sample_indices(&self, y: &Array1<i64>) -> Result<Vec<usize>> {
        let targets = self.target_counts.as_ref().ok_or(CardioError::ModelNotFitted)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices = class_indices(y);
        let mut selected: Vec<usize> = (0..y.len()).collect();

        for (class, &target_count) in targets {
            let Some(class_idx) = indices.get(class) else {
                continue;
            };
            let n_to_add = target_count.saturating_sub(class_idx.len());
            for _ in 0..n_to_add {
                selected.push(class_idx[rng.gen_range(0..class_idx.len())]);
            }
        }

        Ok(selected)
    }
}
