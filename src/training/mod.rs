//! Model training module
//!
//! Provides the models and evaluation plumbing used by the sweep:
//! - K-Nearest Neighbors classification
//! - L2-regularised logistic regression
//! - K-fold and stratified k-fold splitting
//! - Binary classification metrics and reports
//! - Fitted (sampler) -> preprocessor -> classifier pipelines

pub mod cross_validation;
pub mod knn;
pub mod linear_models;
pub mod metrics;
pub mod pipeline;

pub use cross_validation::{CrossValidator, CVStrategy, CVSplit, CVResults};
pub use knn::{KNNClassifier, KNNConfig, DistanceMetric, WeightScheme};
pub use linear_models::{LogisticConfig, LogisticRegression};
pub use metrics::{
    ClassificationReport, ClassMetrics, AverageMetrics, ConfusionMatrix, Metric, POSITIVE_LABEL,
};
pub use pipeline::{take_rows, Classifier, ClassifierPipeline};
