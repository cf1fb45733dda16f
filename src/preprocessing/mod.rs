//! Data preprocessing module
//!
//! Turns a raw feature table into the numeric design matrix a classifier
//! consumes:
//! - Missing value imputation (mean, median, most frequent, constant)
//! - Feature scaling (StandardScaler, MinMaxScaler)
//! - One-hot encoding of categorical columns
//!
//! The [`Preprocessor`] trait is the contract the cross-validation code
//! relies on. Each training fold fits its own [`Preprocessor::boxed_clone`] copy,
//! so nothing learned on one fold leaks into another.

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::PreprocessingConfig;
pub use encoder::{Encoder, EncoderType};
pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::{ColumnTransformer, IdentityPreprocessor};
pub use scaler::{Scaler, ScalerType};

use crate::error::{CardioError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column data type for preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    Unknown,
}

impl ColumnType {
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
            DataType::Float32 | DataType::Float64 | DataType::Boolean => ColumnType::Numeric,
            DataType::String | DataType::Categorical(_, _) => ColumnType::Categorical,
            _ => ColumnType::Unknown,
        }
    }
}

/// Fit/transform contract mapping a raw feature table to a numeric matrix
pub trait Preprocessor: Send + Sync + std::fmt::Debug {
    /// Learn the transformation from a training table, replacing any earlier fit
    fn fit(&mut self, df: &DataFrame) -> Result<()>;

    /// Apply the fitted transformation
    fn transform(&self, df: &DataFrame) -> Result<Array2<f64>>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Names of the output columns, in matrix order
    fn feature_names(&self) -> Vec<String>;

    /// An unfitted copy with the same configuration
    fn boxed_clone(&self) -> Box<dyn Preprocessor>;
}

/// Read a column as f64 values, keeping nulls
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| CardioError::FeatureNotFound(name.to_string()))?;
    let casted = column.cast(&DataType::Float64)?;
    let values = casted.f64()?.into_iter().collect();
    Ok(values)
}

/// Read a column as strings, keeping nulls
pub(crate) fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| CardioError::FeatureNotFound(name.to_string()))?;
    let casted = column.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Assemble column vectors into a row-major matrix
pub(crate) fn columns_to_array2(n_rows: usize, columns: &[Vec<f64>]) -> Array2<f64> {
    Array2::from_shape_fn((n_rows, columns.len()), |(i, j)| columns[j][i])
}
