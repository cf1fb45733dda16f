//! Linear models

use crate::error::{CardioError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logistic regression configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularization strength (L2)
    pub c: f64,
    /// Per-class sample weights; classes not listed weigh 1
    pub class_weight: BTreeMap<i64, f64>,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            class_weight: BTreeMap::new(),
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
        }
    }
}

impl LogisticConfig {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_class_weight(mut self, class: i64, weight: f64) -> Self {
        self.class_weight.insert(class, weight);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }
}

/// Logistic regression for binary classification (labels 0/1)
///
/// Minimises `C * sum_i w_i * logloss_i + 0.5 * ||coef||^2` by full-batch
/// gradient descent, with the objective scaled by `1 / (C * n)` so the
/// learning rate does not depend on the sample count. The intercept is not
/// penalised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticConfig,
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Iterations run by the last fit
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticConfig::default())
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            coefficients: None,
            intercept: None,
            n_iter: 0,
        }
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit the model using gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(CardioError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(CardioError::argument("cannot fit logistic regression on zero samples"));
        }
        if let Some(bad) = y.iter().find(|&&v| v != 0 && v != 1) {
            return Err(CardioError::argument(format!(
                "logistic regression expects labels 0/1, found {}",
                bad
            )));
        }
        if !(self.config.c > 0.0) {
            return Err(CardioError::configuration(format!(
                "C must be positive, got {}",
                self.config.c
            )));
        }

        let targets = y.mapv(|v| v as f64);
        let sample_weights = y.mapv(|v| self.config.class_weight.get(&v).copied().unwrap_or(1.0));

        let mut weights: Array1<f64> = Array1::zeros(n_features);
        let mut bias = 0.0;

        let lr = self.config.learning_rate;
        let alpha = 1.0 / (self.config.c * n_samples as f64);
        let mut n_iter = 0;

        for _ in 0..self.config.max_iter {
            n_iter += 1;

            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = (&predictions - &targets) * &sample_weights;
            let data_grad = x.t().dot(&errors) / n_samples as f64;
            let db = errors.mean().unwrap_or(0.0);

            let dw = &data_grad + &(alpha * &weights);
            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.config.tol {
                break;
            }

            // Proximal step on the L2 term keeps tiny C stable
            weights = (weights - lr * data_grad) / (1.0 + lr * alpha);
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.n_iter = n_iter;

        Ok(self)
    }

    /// Probability of the positive class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(CardioError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(CardioError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let intercept = self.intercept.unwrap_or(0.0);

        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1 } else { 0 }))
    }
}
