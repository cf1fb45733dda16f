//! Column transformer and the identity preprocessor

use crate::error::{CardioError, Result};
use super::{
    columns_to_array2, numeric_values,
    config::PreprocessingConfig,
    encoder::Encoder,
    imputer::Imputer,
    scaler::Scaler,
    ColumnType, Preprocessor,
};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Imputes, scales and encodes a mixed numeric/categorical table
///
/// Output columns are the numeric columns in configuration order followed by
/// the categorical encodings. Columns that are neither listed nor detected
/// are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    config: PreprocessingConfig,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Option<Imputer>,
    categorical_imputer: Option<Imputer>,
    scaler: Option<Scaler>,
    encoder: Option<Encoder>,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl Default for ColumnTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnTransformer {
    /// Create a new transformer with default configuration
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    /// Create a new transformer with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self {
            config,
            numeric_columns: Vec::new(),
            categorical_columns: Vec::new(),
            numeric_imputer: None,
            categorical_imputer: None,
            scaler: None,
            encoder: None,
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    fn detect_column_types(&mut self, df: &DataFrame) -> Result<()> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            match ColumnType::of(col.dtype()) {
                ColumnType::Numeric => numeric.push(name),
                ColumnType::Categorical => categorical.push(name),
                ColumnType::Unknown => {
                    warn!(column = %name, dtype = ?col.dtype(), "Skipping column with unsupported dtype");
                }
            }
        }

        self.numeric_columns = match &self.config.numeric_columns {
            Some(listed) => Self::check_listed(df, listed)?,
            None => numeric,
        };
        self.categorical_columns = match &self.config.categorical_columns {
            Some(listed) => Self::check_listed(df, listed)?,
            None => categorical,
        };

        if self.numeric_columns.is_empty() && self.categorical_columns.is_empty() {
            return Err(CardioError::argument("no usable feature columns to preprocess"));
        }
        Ok(())
    }

    fn check_listed(df: &DataFrame, listed: &[String]) -> Result<Vec<String>> {
        for name in listed {
            if df.column(name).is_err() {
                return Err(CardioError::FeatureNotFound(name.clone()));
            }
        }
        Ok(listed.to_vec())
    }

    fn impute_and_scale(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        if let Some(ref imputer) = self.numeric_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref imputer) = self.categorical_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref scaler) = self.scaler {
            result = scaler.transform(&result)?;
        }
        Ok(result)
    }
}

impl Preprocessor for ColumnTransformer {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.is_fitted = false;
        self.numeric_imputer = None;
        self.categorical_imputer = None;
        self.scaler = None;
        self.encoder = None;

        self.detect_column_types(df)?;

        let numeric: Vec<&str> = self.numeric_columns.iter().map(|s| s.as_str()).collect();
        let categorical: Vec<&str> = self.categorical_columns.iter().map(|s| s.as_str()).collect();

        if !numeric.is_empty() {
            let mut imputer = Imputer::new(self.config.numeric_impute_strategy.clone());
            let imputed = imputer.fit_transform(df, &numeric)?;

            // Scaler statistics come from the imputed values
            let mut scaler = Scaler::new(self.config.scaler_type.clone());
            scaler.fit(&imputed, &numeric)?;

            self.numeric_imputer = Some(imputer);
            self.scaler = Some(scaler);
        }

        if !categorical.is_empty() {
            let mut imputer = Imputer::new(self.config.categorical_impute_strategy.clone());
            let imputed = imputer.fit_transform(df, &categorical)?;

            let mut encoder = Encoder::new(self.config.encoder_type.clone())
                .with_drop_if_binary(self.config.drop_if_binary);
            encoder.fit(&imputed, &categorical)?;

            self.categorical_imputer = Some(imputer);
            self.encoder = Some(encoder);
        }

        let mut feature_names = self.numeric_columns.clone();
        if let Some(ref encoder) = self.encoder {
            for name in &self.categorical_columns {
                feature_names.extend(encoder.output_names(name));
            }
        }
        self.feature_names = feature_names;
        self.is_fitted = true;

        debug!(
            rows = df.height(),
            numeric = self.numeric_columns.len(),
            categorical = self.categorical_columns.len(),
            features = self.feature_names.len(),
            "Fitted column transformer"
        );
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(CardioError::ModelNotFitted);
        }

        let mut result = self.impute_and_scale(df)?;
        if let Some(ref encoder) = self.encoder {
            result = encoder.transform(&result)?;
        }

        let columns = self
            .feature_names
            .iter()
            .map(|name| {
                Ok(numeric_values(&result, name)?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect())
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        Ok(columns_to_array2(df.height(), &columns))
    }

    fn feature_names(&self) -> Vec<String> {
        self.feature_names.clone()
    }

    fn boxed_clone(&self) -> Box<dyn Preprocessor> {
        Box::new(ColumnTransformer::with_config(self.config.clone()))
    }
}

/// Passes an all-numeric, null-free table through as f64
///
/// Used when no preprocessing is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityPreprocessor {
    columns: Vec<String>,
    is_fitted: bool,
}

impl IdentityPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that every column is numeric and has no nulls
    pub fn validate(df: &DataFrame) -> Result<()> {
        for col in df.get_columns() {
            if ColumnType::of(col.dtype()) != ColumnType::Numeric {
                return Err(CardioError::argument(format!(
                    "column '{}' has non-numeric dtype {} and no preprocessor was supplied",
                    col.name(),
                    col.dtype()
                )));
            }
            if col.null_count() > 0 {
                return Err(CardioError::argument(format!(
                    "column '{}' contains {} null values and no preprocessor was supplied",
                    col.name(),
                    col.null_count()
                )));
            }
        }
        Ok(())
    }
}

impl Preprocessor for IdentityPreprocessor {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        Self::validate(df)?;
        self.columns = df.get_column_names().into_iter().map(|n| n.to_string()).collect();
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(CardioError::ModelNotFitted);
        }
        Self::validate(df)?;

        let columns = self
            .columns
            .iter()
            .map(|name| Ok(numeric_values(df, name)?.into_iter().flatten().collect()))
            .collect::<Result<Vec<Vec<f64>>>>()?;

        Ok(columns_to_array2(df.height(), &columns))
    }

    fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn boxed_clone(&self) -> Box<dyn Preprocessor> {
        Box::new(IdentityPreprocessor::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{ImputeStrategy, ScalerType};

    fn mixed() -> DataFrame {
        df!(
            "age" => &[Some(40.0), Some(50.0), None, Some(60.0)],
            "chol" => &[200i64, 220, 240, 260],
            "sex" => &[Some("M"), Some("F"), Some("M"), None],
            "cp" => &["a", "b", "c", "a"],
        )
        .unwrap()
    }

    #[test]
    fn test_column_transformer_detects_types() {
        let mut transformer = ColumnTransformer::new();
        let x = transformer.fit_transform(&mixed()).unwrap();

        assert_eq!(transformer.numeric_columns(), &["age".to_string(), "chol".to_string()]);
        assert_eq!(transformer.categorical_columns(), &["sex".to_string(), "cp".to_string()]);
        assert_eq!(
            transformer.feature_names(),
            vec!["age", "chol", "sex_F", "sex_M", "cp_a", "cp_b", "cp_c"]
        );
        assert_eq!(x.dim(), (4, 7));
        assert!(x.iter().all(|v| v.is_finite()));

        // Imputed mean lands on zero after standard scaling
        assert!(x[[2, 0]].abs() < 1e-12);
        // Missing sex takes the most frequent value
        assert_eq!(x[[3, 3]], 1.0);
    }

    #[test]
    fn test_explicit_columns_drop_the_rest() {
        let config = PreprocessingConfig::new()
            .with_numeric_columns(["chol"])
            .with_categorical_columns(["sex"])
            .with_numeric_impute(ImputeStrategy::Median)
            .with_scaler(ScalerType::None)
            .with_drop_if_binary(true);
        let mut transformer = ColumnTransformer::with_config(config);
        let x = transformer.fit_transform(&mixed()).unwrap();

        assert_eq!(transformer.feature_names(), vec!["chol", "sex_M"]);
        assert_eq!(x.column(0).to_vec(), vec![200.0, 220.0, 240.0, 260.0]);
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let mut transformer = ColumnTransformer::new();
        transformer.fit(&mixed()).unwrap();

        let probe = df!(
            "age" => &[Some(50.0)],
            "chol" => &[230i64],
            "sex" => &[Some("X")],
            "cp" => &["b"],
        )
        .unwrap();
        let x = transformer.transform(&probe).unwrap();

        assert!(x[[0, 0]].abs() < 1e-12);
        assert!(x[[0, 1]].abs() < 1e-12);
        // Unknown category ignored
        assert_eq!(x[[0, 2]], 0.0);
        assert_eq!(x[[0, 3]], 0.0);
        assert_eq!(x[[0, 5]], 1.0);
    }

    #[test]
    fn test_boxed_clone_is_unfitted() {
        let mut transformer = ColumnTransformer::new();
        transformer.fit(&mixed()).unwrap();

        let copy = transformer.boxed_clone();
        assert!(copy.feature_names().is_empty());
        assert!(matches!(copy.transform(&mixed()), Err(CardioError::ModelNotFitted)));
    }

    #[test]
    fn test_missing_listed_column() {
        let config = PreprocessingConfig::new().with_numeric_columns(["thalach"]);
        let mut transformer = ColumnTransformer::with_config(config);
        assert!(matches!(
            transformer.fit(&mixed()),
            Err(CardioError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_identity_preprocessor() {
        let df = df!("a" => &[1i64, 2, 3], "b" => &[0.5, 1.5, 2.5]).unwrap();
        let mut identity = IdentityPreprocessor::new();
        let x = identity.fit_transform(&df).unwrap();

        assert_eq!(x.dim(), (3, 2));
        assert_eq!(x[[2, 0]], 3.0);
        assert_eq!(identity.feature_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_identity_rejects_strings_and_nulls() {
        let strings = df!("sex" => &["M", "F"]).unwrap();
        assert!(IdentityPreprocessor::validate(&strings).unwrap_err().is_argument_error());

        let nulls = df!("age" => &[Some(1.0), None]).unwrap();
        assert!(IdentityPreprocessor::new().fit(&nulls).unwrap_err().is_argument_error());
    }
}
