//! Sweep configuration

use crate::error::{CardioError, Result};
use crate::synthetic::{RandomOverSampler, Sampler};
use crate::training::{KNNConfig, Metric};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Label used for the single default metric
pub const DEFAULT_SCORE_LABEL: &str = "score";

/// Candidate hyperparameter values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamGrid {
    /// Candidate neighbor counts, in evaluation order
    pub n_neighbors: Vec<usize>,
}

impl ParamGrid {
    pub fn new(n_neighbors: impl IntoIterator<Item = usize>) -> Self {
        Self {
            n_neighbors: n_neighbors.into_iter().collect(),
        }
    }

    /// `start, start + step, ...` below `end`
    pub fn range(start: usize, end: usize, step: usize) -> Self {
        Self::new((start..end).step_by(step.max(1)))
    }

    pub fn len(&self) -> usize {
        self.n_neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_neighbors.is_empty()
    }
}

/// How a training fold is rebalanced before fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceMode {
    /// Fit on the training fold as is
    None,
    /// Randomly duplicate minority rows up to the majority count
    MinorityOversample,
}

impl RebalanceMode {
    /// Every mode, in the order rows are emitted
    pub const ALL: [RebalanceMode; 2] = [RebalanceMode::None, RebalanceMode::MinorityOversample];

    pub fn label(&self) -> &'static str {
        match self {
            RebalanceMode::None => "none",
            RebalanceMode::MinorityOversample => "minority_oversample",
        }
    }

    /// Sampler applied to training folds under this mode
    pub fn sampler(&self, seed: u64) -> Option<Box<dyn Sampler>> {
        match self {
            RebalanceMode::None => None,
            RebalanceMode::MinorityOversample => Some(Box::new(RandomOverSampler::new(seed))),
        }
    }
}

impl fmt::Display for RebalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration of a k-NN hyperparameter sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Candidate neighbor counts
    pub grid: ParamGrid,
    /// Metric names; empty means accuracy labelled `score`
    pub scoring: Vec<String>,
    /// Rebalancing modes to evaluate
    pub rebalance_modes: Vec<RebalanceMode>,
    /// Number of cross-validation folds
    pub n_folds: usize,
    /// Shuffle rows before assigning folds
    pub shuffle: bool,
    /// Seed for fold shuffling and resampling
    pub seed: u64,
    /// Whether the classifier supplies probability scores
    pub probability_estimates: bool,
    /// Distance and weighting; `n_neighbors` is set per candidate
    pub knn: KNNConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            grid: ParamGrid::default(),
            scoring: Vec::new(),
            rebalance_modes: RebalanceMode::ALL.to_vec(),
            n_folds: 20,
            shuffle: false,
            seed: 123,
            probability_estimates: false,
            knn: KNNConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_n_neighbors(mut self, n_neighbors: impl IntoIterator<Item = usize>) -> Self {
        self.grid = ParamGrid::new(n_neighbors);
        self
    }

    pub fn with_scoring<S: Into<String>>(mut self, scoring: impl IntoIterator<Item = S>) -> Self {
        self.scoring = scoring.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rebalance_modes(mut self, modes: impl IntoIterator<Item = RebalanceMode>) -> Self {
        self.rebalance_modes = modes.into_iter().collect();
        self
    }

    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_probability_estimates(mut self, enabled: bool) -> Self {
        self.probability_estimates = enabled;
        self
    }

    pub fn with_knn(mut self, knn: KNNConfig) -> Self {
        self.knn = knn;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Resolve scoring names into (column label, metric) pairs
    pub fn metrics(&self) -> Result<Vec<(String, Metric)>> {
        if self.scoring.is_empty() {
            return Ok(vec![(DEFAULT_SCORE_LABEL.to_string(), Metric::Accuracy)]);
        }

        let mut resolved: Vec<(String, Metric)> = Vec::with_capacity(self.scoring.len());
        for name in &self.scoring {
            let metric: Metric = name.parse()?;
            if resolved.iter().any(|(_, m)| *m == metric) {
                return Err(CardioError::configuration(format!(
                    "scoring metric '{}' is listed more than once",
                    name
                )));
            }
            if metric.requires_probabilities() && !self.probability_estimates {
                return Err(CardioError::configuration(format!(
                    "scoring metric '{}' needs probability estimates, which are disabled",
                    name
                )));
            }
            resolved.push((name.trim().to_ascii_lowercase(), metric));
        }
        Ok(resolved)
    }

    /// Requested modes in emission order, without repeats
    pub fn modes(&self) -> Vec<RebalanceMode> {
        RebalanceMode::ALL
            .into_iter()
            .filter(|mode| self.rebalance_modes.contains(mode))
            .collect()
    }

    /// Checks that do not depend on the data
    pub fn validate(&self) -> Result<Vec<(String, Metric)>> {
        if self.grid.is_empty() {
            return Err(CardioError::argument("parameter grid is required and must not be empty"));
        }
        if let Some(pos) = self.grid.n_neighbors.iter().position(|&k| k == 0) {
            return Err(CardioError::argument(format!(
                "n_neighbors candidates must be positive, found 0 at position {}",
                pos
            )));
        }
        if self.rebalance_modes.is_empty() {
            return Err(CardioError::argument("at least one rebalancing mode is required"));
        }
        if self.n_folds < 2 {
            return Err(CardioError::argument(format!(
                "fold count must be at least 2, got {}",
                self.n_folds
            )));
        }
        self.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SweepConfig::default();
        assert_eq!(config.n_folds, 20);
        assert_eq!(config.seed, 123);
        assert!(!config.shuffle);
        assert_eq!(config.modes(), RebalanceMode::ALL.to_vec());
        assert_eq!(
            config.metrics().unwrap(),
            vec![("score".to_string(), Metric::Accuracy)]
        );
    }

    #[test]
    fn test_param_grid_range() {
        assert_eq!(ParamGrid::range(5, 50, 5).n_neighbors, vec![5, 10, 15, 20, 25, 30, 35, 40, 45]);
        assert_eq!(ParamGrid::range(1, 10, 2).len(), 5);
    }

    #[test]
    fn test_modes_are_canonically_ordered() {
        let config = SweepConfig::new().with_rebalance_modes([
            RebalanceMode::MinorityOversample,
            RebalanceMode::None,
            RebalanceMode::MinorityOversample,
        ]);
        assert_eq!(config.modes(), vec![RebalanceMode::None, RebalanceMode::MinorityOversample]);
    }

    #[test]
    fn test_scoring_labels() {
        let config = SweepConfig::new().with_scoring(["accuracy", "Recall", "f1_score"]);
        let labels: Vec<String> = config.metrics().unwrap().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["accuracy", "recall", "f1_score"]);
    }

    #[test]
    fn test_scoring_errors() {
        let unknown = SweepConfig::new().with_scoring(["balanced_accuracy"]);
        assert!(unknown.metrics().unwrap_err().is_configuration_error());

        let duplicated = SweepConfig::new().with_scoring(["f1", "f1_score"]);
        assert!(duplicated.metrics().unwrap_err().is_configuration_error());

        let needs_proba = SweepConfig::new().with_scoring(["roc_auc"]);
        assert!(needs_proba.metrics().unwrap_err().is_configuration_error());
        assert!(needs_proba.with_probability_estimates(true).metrics().is_ok());
    }

    #[test]
    fn test_validate_arguments() {
        assert!(SweepConfig::new().validate().unwrap_err().is_argument_error());

        let zero = SweepConfig::new().with_n_neighbors([1, 0]);
        assert!(zero.validate().unwrap_err().is_argument_error());

        let no_modes = SweepConfig::new().with_n_neighbors([1]).with_rebalance_modes([]);
        assert!(no_modes.validate().unwrap_err().is_argument_error());

        let one_fold = SweepConfig::new().with_n_neighbors([1]).with_n_folds(1);
        assert!(one_fold.validate().unwrap_err().is_argument_error());
    }

    #[test]
    fn test_json_defaults_and_save_load() {
        let config = SweepConfig::from_json(r#"{"grid": {"n_neighbors": [1, 3]}, "rebalance_modes": ["minority_oversample"]}"#)
            .unwrap();
        assert_eq!(config.grid.n_neighbors, vec![1, 3]);
        assert_eq!(config.rebalance_modes, vec![RebalanceMode::MinorityOversample]);
        assert_eq!(config.n_folds, 20);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        config.save(&path).unwrap();
        assert_eq!(SweepConfig::load(&path).unwrap(), config);
    }
}
