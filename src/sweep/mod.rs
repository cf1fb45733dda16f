//! Hyperparameter sweep for k-nearest-neighbors
//!
//! For every candidate neighbor count and every requested rebalancing mode
//! the sweep runs k-fold cross-validation of
//! `(sampler) -> preprocessor -> KNNClassifier` and records the mean and
//! population standard deviation of each metric on the training and
//! held-out folds.
//!
//! Folds are computed once per sweep, so every configuration sees the same
//! held-out rows. Oversampling only touches the training side of a fold.

mod config;
mod evaluator;
mod table;

pub use config::{ParamGrid, RebalanceMode, SweepConfig, DEFAULT_SCORE_LABEL};
pub use evaluator::{evaluate, KnnSweep};
pub use table::{FoldSummary, MetricSummary, ResultTable, SweepRow};
