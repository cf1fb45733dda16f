//! Preprocessing configuration

use serde::{Deserialize, Serialize};
use super::{ScalerType, EncoderType, ImputeStrategy};

/// Configuration for the column transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Strategy for handling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for handling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Type of scaler to use for numeric features
    pub scaler_type: ScalerType,

    /// Type of encoder to use for categorical features
    pub encoder_type: EncoderType,

    /// Drop the first indicator of categorical columns with exactly two categories
    pub drop_if_binary: bool,

    /// Numeric columns; detected from dtypes when unset
    pub numeric_columns: Option<Vec<String>>,

    /// Categorical columns; detected from dtypes when unset
    pub categorical_columns: Option<Vec<String>>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numeric_impute_strategy: ImputeStrategy::Mean,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            scaler_type: ScalerType::Standard,
            encoder_type: EncoderType::OneHot,
            drop_if_binary: false,
            numeric_columns: None,
            categorical_columns: None,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set categorical impute strategy
    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    /// Builder method to set scaler type
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Builder method to set encoder type
    pub fn with_encoder(mut self, encoder_type: EncoderType) -> Self {
        self.encoder_type = encoder_type;
        self
    }

    pub fn with_drop_if_binary(mut self, drop_if_binary: bool) -> Self {
        self.drop_if_binary = drop_if_binary;
        self
    }

    /// Pin the numeric columns instead of detecting them
    pub fn with_numeric_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.numeric_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Pin the categorical columns instead of detecting them
    pub fn with_categorical_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.categorical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}
