//! cardio-predict - Cross-validated model evaluation for cardiovascular disease prediction
//!
//! This crate provides:
//! - A k-nearest-neighbors hyperparameter sweep with optional minority
//!   oversampling of the training folds
//! - Column preprocessing for mixed numeric/categorical clinical tables
//! - Model selection and held-out evaluation
//! - A class-weighted logistic regression baseline
//!
//! # Modules
//!
//! ## Core
//! - [`sweep`] - k-NN hyperparameter sweep and result table
//! - [`evaluation`] - Model selection and test-set evaluation
//!
//! ## Building blocks
//! - [`preprocessing`] - Imputation, scaling, encoding
//! - [`training`] - Classifiers, cross-validation, metrics, pipelines
//! - [`synthetic`] - Class rebalancing by resampling

// Core error handling
pub mod error;

// Building blocks
pub mod preprocessing;
pub mod training;
pub mod synthetic;

// Core
pub mod sweep;
pub mod evaluation;

pub use error::{CardioError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{CardioError, Result};

    // Preprocessing
    pub use crate::preprocessing::{
        ColumnTransformer, IdentityPreprocessor, ImputeStrategy, PreprocessingConfig, Preprocessor,
        ScalerType, EncoderType,
    };

    // Training
    pub use crate::training::{
        Classifier, ClassifierPipeline, ClassificationReport, ConfusionMatrix, CrossValidator,
        CVStrategy, DistanceMetric, KNNClassifier, KNNConfig, LogisticConfig, LogisticRegression,
        Metric, WeightScheme,
    };

    // Resampling
    pub use crate::synthetic::{RandomOverSampler, Sampler};

    // Sweep
    pub use crate::sweep::{evaluate, KnnSweep, ParamGrid, RebalanceMode, ResultTable, SweepConfig, SweepRow};

    // Evaluation
    pub use crate::evaluation::{
        evaluate_logistic_regression, evaluate_on_test, fit_best_knn, BestKnn, LogisticEvaluation,
        LogisticSearch, TestEvaluation,
    };
}
