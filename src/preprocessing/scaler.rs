//! Feature scaling implementations

use super::numeric_values;
use crate::error::{CardioError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// No scaling
    None,
}

/// Parameters for a fitted scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,    // mean or min
    scale: f64,     // population std or range
}

/// Feature scaler
///
/// Statistics ignore nulls; a zero spread scales by 1 so constant columns
/// map to zero instead of NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: BTreeMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let values: Vec<f64> = numeric_values(df, col_name)?.into_iter().flatten().collect();
            let params = self.compute_params(&values);
            self.params.insert(col_name.to_string(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data.
    /// Builds all replacement columns first, then applies them in a single pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CardioError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| Self::scale_series(df, col_name, params))
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted (center, scale) of a column
    pub fn params(&self, column: &str) -> Option<(f64, f64)> {
        self.params.get(column).map(|p| (p.center, p.scale))
    }

    fn compute_params(&self, values: &[f64]) -> ScalerParams {
        if values.is_empty() {
            return ScalerParams { center: 0.0, scale: 1.0 };
        }
        let n = values.len() as f64;

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = values.iter().sum::<f64>() / n;
                let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
            ScalerType::None => ScalerParams {
                center: 0.0,
                scale: 1.0,
            },
        }
    }

    fn scale_series(df: &DataFrame, col_name: &str, params: &ScalerParams) -> Result<Series> {
        let scaled: Float64Chunked = numeric_values(df, col_name)?
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale))
            .collect();

        Ok(scaled.with_name(PlSmallStr::from(col_name)).into_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler_uses_population_std() {
        let df = df!("x" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["x"]).unwrap();

        let (center, scale) = scaler.params("x").unwrap();
        assert!((center - 3.0).abs() < 1e-12);
        assert!((scale - 2.0f64.sqrt()).abs() < 1e-12);

        let values: Vec<f64> = numeric_values(&result, "x").unwrap().into_iter().flatten().collect();
        let mean: f64 = values.iter().sum::<f64>() / 5.0;
        assert!(mean.abs() < 1e-10);
    }

    #[test]
    fn test_minmax_scaler() {
        let df = df!("x" => &[0i64, 5, 10]).unwrap();
        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&df, &["x"]).unwrap();

        let values: Vec<f64> = numeric_values(&result, "x").unwrap().into_iter().flatten().collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let df = df!("x" => &[7.0, 7.0, 7.0]).unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["x"]).unwrap();

        let values: Vec<f64> = numeric_values(&result, "x").unwrap().into_iter().flatten().collect();
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_transform_uses_fitted_statistics() {
        let train = df!("x" => &[0.0, 10.0]).unwrap();
        let test = df!("x" => &[20.0]).unwrap();
        let mut scaler = Scaler::new(ScalerType::MinMax);
        scaler.fit(&train, &["x"]).unwrap();

        let result = scaler.transform(&test).unwrap();
        assert_eq!(numeric_values(&result, "x").unwrap(), vec![Some(2.0)]);
    }

    #[test]
    fn test_transform_before_fit() {
        let df = df!("x" => &[1.0]).unwrap();
        let scaler = Scaler::new(ScalerType::Standard);
        assert!(matches!(scaler.transform(&df), Err(CardioError::ModelNotFitted)));
    }
}
