//! Fitted classifier pipelines
//!
//! A pipeline chains an optional [`Sampler`], a [`Preprocessor`] and a
//! [`Classifier`]. The sampler only runs while fitting; prediction and
//! scoring go straight through preprocessing to the classifier.

use crate::error::{CardioError, Result};
use crate::preprocessing::Preprocessor;
use crate::synthetic::Sampler;
use crate::training::knn::KNNClassifier;
use crate::training::linear_models::LogisticRegression;
use crate::training::metrics::{Metric, POSITIVE_LABEL};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use tracing::debug;

/// Select rows of a frame by position, in the given order (repeats allowed)
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        PlSmallStr::from("idx"),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

/// Classifier at the end of a pipeline
#[derive(Debug, Clone)]
pub enum Classifier {
    Knn(KNNClassifier),
    Logistic(LogisticRegression),
}

impl Classifier {
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::Knn(_) => "knn",
            Classifier::Logistic(_) => "logistic_regression",
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        match self {
            Classifier::Knn(model) => model.fit(x, y),
            Classifier::Logistic(model) => model.fit(x, y).map(|_| ()),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        match self {
            Classifier::Knn(model) => model.predict(x),
            Classifier::Logistic(model) => model.predict(x),
        }
    }

    /// Probability of the positive class per row
    pub fn positive_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::Knn(model) => model.positive_proba(x, POSITIVE_LABEL),
            Classifier::Logistic(model) => model.predict_proba(x),
        }
    }
}

/// (sampler) -> preprocessor -> classifier
#[derive(Debug)]
pub struct ClassifierPipeline {
    sampler: Option<Box<dyn Sampler>>,
    preprocessor: Box<dyn Preprocessor>,
    classifier: Classifier,
    fit_rows: usize,
    is_fitted: bool,
}

impl ClassifierPipeline {
    /// Create a pipeline; the preprocessor is used as given, fitted or not
    pub fn new(preprocessor: Box<dyn Preprocessor>, classifier: Classifier) -> Self {
        Self {
            sampler: None,
            preprocessor,
            classifier,
            fit_rows: 0,
            is_fitted: false,
        }
    }

    /// Resample the training rows before preprocessing
    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn preprocessor(&self) -> &dyn Preprocessor {
        self.preprocessor.as_ref()
    }

    pub fn has_sampler(&self) -> bool {
        self.sampler.is_some()
    }

    /// Rows the classifier was fitted on, after resampling
    pub fn fit_rows(&self) -> usize {
        self.fit_rows
    }

    /// Fit sampler, preprocessor and classifier on a training set
    pub fn fit(&mut self, df: &DataFrame, y: &Array1<i64>) -> Result<&mut Self> {
        if df.height() != y.len() {
            return Err(CardioError::argument(format!(
                "label count ({}) does not match feature rows ({})",
                y.len(),
                df.height()
            )));
        }
        self.is_fitted = false;

        let x = match self.sampler.as_mut() {
            Some(sampler) => {
                let indices = sampler.fit_sample_indices(y)?;
                let resampled = take_rows(df, &indices)?;
                let y_resampled: Array1<i64> = indices.iter().map(|&i| y[i]).collect();
                debug!(
                    rows = df.height(),
                    resampled_rows = indices.len(),
                    "Resampled training rows"
                );
                let x = self.preprocessor.fit_transform(&resampled)?;
                self.classifier.fit(&x, &y_resampled)?;
                x
            }
            None => {
                let x = self.preprocessor.fit_transform(df)?;
                self.classifier.fit(&x, y)?;
                x
            }
        };

        debug!(classifier = self.classifier.name(), rows = x.nrows(), "Fitted pipeline");
        self.fit_rows = x.nrows();
        self.is_fitted = true;
        Ok(self)
    }

    fn features(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(CardioError::ModelNotFitted);
        }
        self.preprocessor.transform(df)
    }

    /// Predict labels for new rows
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<i64>> {
        let x = self.features(df)?;
        self.classifier.predict(&x)
    }

    /// Positive-class probability for new rows
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.features(df)?;
        self.classifier.positive_proba(&x)
    }

    /// Score new rows with a single metric
    pub fn score(&self, df: &DataFrame, y: &Array1<i64>, metric: Metric) -> Result<f64> {
        Ok(self.score_many(df, y, &[metric])?[0])
    }

    /// Score new rows with several metrics, transforming the rows once
    pub fn score_many(&self, df: &DataFrame, y: &Array1<i64>, metrics: &[Metric]) -> Result<Vec<f64>> {
        if df.height() != y.len() {
            return Err(CardioError::argument(format!(
                "label count ({}) does not match feature rows ({})",
                y.len(),
                df.height()
            )));
        }
        let x = self.features(df)?;
        let y_pred = self.classifier.predict(&x)?;
        let proba = if metrics.iter().any(|m| m.requires_probabilities()) {
            Some(self.classifier.positive_proba(&x)?)
        } else {
            None
        };

        metrics
            .iter()
            .map(|metric| metric.score(y, &y_pred, proba.as_ref()))
            .collect()
    }
}
