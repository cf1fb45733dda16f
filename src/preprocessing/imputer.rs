//! Missing value imputation strategies

use super::{numeric_values, string_values, ColumnType};
use crate::error::{CardioError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value
    MostFrequent,
    /// Replace with a constant value
    Constant(f64),
    /// Replace with a constant string (categorical)
    ConstantString(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values
///
/// Fill values are learned per column at fit time. Columns with no observed
/// values fall back to `0.0` (numeric) or the empty string (categorical).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| CardioError::FeatureNotFound(col_name.to_string()))?;

            let fill_value = match ColumnType::of(column.dtype()) {
                ColumnType::Numeric => self.numeric_fill_value(df, col_name)?,
                _ => self.string_fill_value(df, col_name)?,
            };
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values in the fitted columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CardioError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .fill_values
            .iter()
            .map(|(col_name, fill_value)| Self::fill_series(df, col_name, fill_value))
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for filled in replacements {
            result.with_column(filled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned fill value of a numeric column
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        match self.fill_values.get(column) {
            Some(ImputeValue::Numeric(v)) => Some(*v),
            _ => None,
        }
    }

    /// Learned fill value of a categorical column
    pub fn string_fill(&self, column: &str) -> Option<&str> {
        match self.fill_values.get(column) {
            Some(ImputeValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    fn numeric_fill_value(&self, df: &DataFrame, col_name: &str) -> Result<ImputeValue> {
        let mut observed: Vec<f64> = numeric_values(df, col_name)?.into_iter().flatten().collect();
        if observed.is_empty() {
            return Ok(ImputeValue::Numeric(match &self.strategy {
                ImputeStrategy::Constant(v) => *v,
                _ => 0.0,
            }));
        }

        let value = match &self.strategy {
            ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
            ImputeStrategy::Median => {
                observed.sort_by(|a, b| a.total_cmp(b));
                let mid = observed.len() / 2;
                if observed.len() % 2 == 0 {
                    (observed[mid - 1] + observed[mid]) / 2.0
                } else {
                    observed[mid]
                }
            }
            ImputeStrategy::MostFrequent => {
                observed.sort_by(|a, b| a.total_cmp(b));
                most_frequent_sorted(&observed)
            }
            ImputeStrategy::Constant(v) => *v,
            ImputeStrategy::ConstantString(_) => {
                return Err(CardioError::configuration(format!(
                    "constant string imputation cannot fill numeric column '{}'",
                    col_name
                )));
            }
        };
        Ok(ImputeValue::Numeric(value))
    }

    fn string_fill_value(&self, df: &DataFrame, col_name: &str) -> Result<ImputeValue> {
        match &self.strategy {
            ImputeStrategy::MostFrequent => {
                // BTreeMap iteration plus strict comparison keeps the smallest value on ties
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                for val in string_values(df, col_name)?.into_iter().flatten() {
                    *counts.entry(val).or_insert(0) += 1;
                }
                let mut mode: Option<(String, usize)> = None;
                for (val, count) in counts {
                    if mode.as_ref().map_or(true, |(_, best)| count > *best) {
                        mode = Some((val, count));
                    }
                }
                Ok(ImputeValue::String(mode.map(|(v, _)| v).unwrap_or_default()))
            }
            ImputeStrategy::ConstantString(val) => Ok(ImputeValue::String(val.clone())),
            other => Err(CardioError::configuration(format!(
                "{:?} imputation cannot fill categorical column '{}'",
                other, col_name
            ))),
        }
    }

    fn fill_series(df: &DataFrame, col_name: &str, fill_value: &ImputeValue) -> Result<Series> {
        let name = PlSmallStr::from(col_name);
        match fill_value {
            ImputeValue::Numeric(fill) => {
                let filled: Float64Chunked = numeric_values(df, col_name)?
                    .into_iter()
                    .map(|v| Some(v.unwrap_or(*fill)))
                    .collect();
                Ok(filled.with_name(name).into_series())
            }
            ImputeValue::String(fill) => {
                let filled: StringChunked = string_values(df, col_name)?
                    .into_iter()
                    .map(|v| Some(v.unwrap_or_else(|| fill.clone())))
                    .collect();
                Ok(filled.with_name(name).into_series())
            }
        }
    }
}

/// Mode of a sorted slice; the smallest value wins ties
fn most_frequent_sorted(sorted: &[f64]) -> f64 {
    let mut best = sorted[0];
    let mut best_count = 0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best_count {
            best = sorted[i];
            best_count = j - i;
        }
        i = j;
    }
    best
}
