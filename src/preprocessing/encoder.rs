//! Categorical encoding implementations

use super::string_values;
use crate::error::{CardioError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Type of encoder to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncoderType {
    /// One-hot encoding
    OneHot,
    /// Label encoding (ordinal)
    Label,
}

/// Categorical encoder
///
/// Categories are learned in sorted order. Values never seen at fit time
/// (and nulls) encode as all-zero indicators, or `-1` under label encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    drop_if_binary: bool,
    // Fitted column name -> sorted categories, in fit order
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(encoder_type: EncoderType) -> Self {
        Self {
            encoder_type,
            drop_if_binary: false,
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// Emit a single indicator for columns with exactly two categories
    pub fn with_drop_if_binary(mut self, drop_if_binary: bool) -> Self {
        self.drop_if_binary = drop_if_binary;
        self
    }

    /// Fit the encoder to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.categories.clear();
        for col_name in columns {
            let mut seen: Vec<String> = string_values(df, col_name)?.into_iter().flatten().collect();
            seen.sort();
            seen.dedup();
            self.categories.push((col_name.to_string(), seen));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Categories learned for a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cats)| cats.as_slice())
    }

    /// Output column names produced for a fitted source column
    pub fn output_names(&self, column: &str) -> Vec<String> {
        let Some(cats) = self.categories(column) else {
            return Vec::new();
        };
        match self.encoder_type {
            EncoderType::Label => vec![column.to_string()],
            EncoderType::OneHot => self
                .kept_categories(cats)
                .iter()
                .map(|cat| format!("{}_{}", column, cat))
                .collect(),
        }
    }

    /// Transform the data, replacing each fitted column with its encoding
    /// at the same position
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CardioError::ModelNotFitted);
        }
        for (col_name, _) in &self.categories {
            if df.column(col_name).is_err() {
                return Err(CardioError::FeatureNotFound(col_name.clone()));
            }
        }

        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let name = column.name().as_str();
            match self.categories.iter().find(|(fitted, _)| fitted == name) {
                Some((_, cats)) => columns.extend(self.encode_column(df, name, cats)?),
                None => columns.push(column.clone()),
            }
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn kept_categories<'a>(&self, cats: &'a [String]) -> &'a [String] {
        if self.drop_if_binary && cats.len() == 2 {
            &cats[1..]
        } else {
            cats
        }
    }

    fn encode_column(&self, df: &DataFrame, col_name: &str, cats: &[String]) -> Result<Vec<Column>> {
        let values = string_values(df, col_name)?;

        match self.encoder_type {
            EncoderType::Label => {
                let codes: Vec<f64> = values
                    .iter()
                    .map(|v| {
                        v.as_ref()
                            .and_then(|v| cats.binary_search(v).ok())
                            .map_or(-1.0, |idx| idx as f64)
                    })
                    .collect();
                Ok(vec![Column::new(PlSmallStr::from(col_name), codes)])
            }
            EncoderType::OneHot => Ok(self
                .kept_categories(cats)
                .iter()
                .map(|cat| {
                    let indicator: Vec<f64> = values
                        .iter()
                        .map(|v| if v.as_deref() == Some(cat.as_str()) { 1.0 } else { 0.0 })
                        .collect();
                    Column::new(format!("{}_{}", col_name, cat).into(), indicator)
                })
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::numeric_values;

    fn frame() -> DataFrame {
        df!(
            "age" => &[40.0, 50.0, 60.0],
            "cp" => &["typical", "asymptomatic", "atypical"],
            "sex" => &["M", "F", "M"],
        )
        .unwrap()
    }

    #[test]
    fn test_onehot_sorted_categories() {
        let df = frame();
        let mut encoder = Encoder::new(EncoderType::OneHot);
        let result = encoder.fit_transform(&df, &["cp"]).unwrap();

        assert_eq!(
            encoder.output_names("cp"),
            vec!["cp_asymptomatic", "cp_atypical", "cp_typical"]
        );
        let names: Vec<&str> = result.get_column_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["age", "cp_asymptomatic", "cp_atypical", "cp_typical", "sex"]);
        assert_eq!(
            numeric_values(&result, "cp_typical").unwrap(),
            vec![Some(1.0), Some(0.0), Some(0.0)]
        );
    }

    #[test]
    fn test_drop_if_binary() {
        let df = frame();
        let mut encoder = Encoder::new(EncoderType::OneHot).with_drop_if_binary(true);
        let result = encoder.fit_transform(&df, &["cp", "sex"]).unwrap();

        assert_eq!(encoder.output_names("sex"), vec!["sex_M"]);
        assert_eq!(encoder.output_names("cp").len(), 3);
        assert_eq!(result.width(), 5);
    }

    #[test]
    fn test_unknown_category_is_all_zero() {
        let mut encoder = Encoder::new(EncoderType::OneHot);
        encoder.fit(&frame(), &["sex"]).unwrap();

        let unseen = df!("sex" => &["X"]).unwrap();
        let result = encoder.transform(&unseen).unwrap();
        assert_eq!(numeric_values(&result, "sex_F").unwrap(), vec![Some(0.0)]);
        assert_eq!(numeric_values(&result, "sex_M").unwrap(), vec![Some(0.0)]);
    }

    #[test]
    fn test_label_encoding() {
        let mut encoder = Encoder::new(EncoderType::Label);
        encoder.fit(&frame(), &["cp"]).unwrap();

        let probe = df!("cp" => &["typical", "unknown"]).unwrap();
        let result = encoder.transform(&probe).unwrap();
        assert_eq!(numeric_values(&result, "cp").unwrap(), vec![Some(2.0), Some(-1.0)]);
    }

    #[test]
    fn test_missing_fitted_column() {
        let mut encoder = Encoder::new(EncoderType::OneHot);
        encoder.fit(&frame(), &["cp"]).unwrap();
        let other = df!("age" => &[1.0]).unwrap();
        assert!(matches!(encoder.transform(&other), Err(CardioError::FeatureNotFound(_))));
    }
}
