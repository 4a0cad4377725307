//! One-hot encoding for categorical features.
//!
//! Expands each categorical column into one numeric indicator column per
//! category observed during fitting.

use crate::error::{PipelineError, Result};
use crate::preprocessing::encoding::HandleUnknown;
use crate::preprocessing::traits::{
    check_fitted_columns, ensure_rows, FittedTransformer, Transformer,
};
use crate::table::{Column, ColumnKind, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for OneHotEncoder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneHotEncoderConfig {
    /// How to handle unknown categories during transform.
    pub handle_unknown: HandleUnknown,
}

/// One-hot encoder for categorical features.
///
/// Each input column must be categorical and free of missing values. The
/// encoder learns the distinct values of each column in the order they are
/// first seen, and `transform` emits one `<column>_<value>` indicator column
/// per learned value.
///
/// # Example
/// ```
/// use machinelearne_pipeline::preprocessing::{FittedTransformer, OneHotEncoder, Transformer};
/// use machinelearne_pipeline::table::{Column, Table};
///
/// let train = Table::new().with_column("suburb", Column::categorical([Some("A"), Some("B")]))?;
/// let test = Table::new().with_column("suburb", Column::categorical([Some("C")]))?;
///
/// let fitted = OneHotEncoder::new().fit(&train)?;
/// let encoded = fitted.transform(&test)?;
///
/// assert_eq!(encoded.column_names(), &["suburb_A", "suburb_B"]);
/// assert_eq!(encoded.column("suburb_A"), Some(&Column::from_f64([0.0])));
/// assert_eq!(encoded.column("suburb_B"), Some(&Column::from_f64([0.0])));
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    config: OneHotEncoderConfig,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: OneHotEncoderConfig) -> Self {
        Self { config }
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.config.handle_unknown = strategy;
        self
    }

    pub fn config(&self) -> &OneHotEncoderConfig {
        &self.config
    }
}

fn categorical_values<'a>(name: &str, column: &'a Column) -> Result<&'a [Option<String>]> {
    match column {
        Column::Categorical(values) => Ok(values),
        Column::Numeric(_) => Err(PipelineError::ColumnType {
            column: name.to_string(),
            expected: ColumnKind::Categorical,
            found: ColumnKind::Numeric,
        }),
    }
}

impl Transformer for OneHotEncoder {
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        ensure_rows(data, "OneHotEncoder")?;

        let mut categories = Vec::with_capacity(data.n_columns());
        for (name, column) in data.iter() {
            let values = categorical_values(name, column)?;
            let mut vocabulary: Vec<String> = Vec::new();
            for (row, value) in values.iter().enumerate() {
                let value = value.as_ref().ok_or_else(|| PipelineError::MissingValues {
                    column: name.to_string(),
                    row,
                })?;
                if !vocabulary.contains(value) {
                    vocabulary.push(value.clone());
                }
            }
            categories.push(vocabulary);
        }

        // Indicator names are `{column}_{category}` and must stay unique.
        let mut produced_by: HashMap<String, &str> = HashMap::new();
        for ((name, _), vocabulary) in data.iter().zip(&categories) {
            for category in vocabulary {
                let indicator = format!("{name}_{category}");
                if let Some(other) = produced_by.insert(indicator.clone(), name) {
                    return Err(PipelineError::Configuration(format!(
                        "indicator column '{indicator}' is produced by both '{other}' and '{name}'"
                    )));
                }
            }
        }

        let index = categories
            .iter()
            .map(|vocabulary| {
                vocabulary
                    .iter()
                    .enumerate()
                    .map(|(i, value)| (value.clone(), i))
                    .collect()
            })
            .collect();

        Ok(FittedOneHotEncoder {
            feature_names: data.column_names().to_vec(),
            categories,
            index,
            handle_unknown: self.config.handle_unknown,
        })
    }
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    feature_names: Vec<String>,
    /// Categories for each input column, in first-observed order.
    categories: Vec<Vec<String>>,
    index: Vec<HashMap<String, usize>>,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    /// Get the categories learned for each feature.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Get the number of categories per input feature.
    pub fn n_values(&self) -> Vec<usize> {
        self.categories.iter().map(Vec::len).collect()
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    fn transform(&self, data: &Table) -> Result<Table> {
        let kinds = vec![ColumnKind::Categorical; self.feature_names.len()];
        check_fitted_columns(&self.feature_names, &kinds, data)?;

        let n_rows = data.n_rows();
        let mut out = Table::empty(n_rows);
        for ((name, vocabulary), index) in self
            .feature_names
            .iter()
            .zip(&self.categories)
            .zip(&self.index)
        {
            let values = categorical_values(name, data.require_column(name)?)?;
            let mut indicators = vec![vec![0.0; n_rows]; vocabulary.len()];

            for (row, value) in values.iter().enumerate() {
                let value = value.as_ref().ok_or_else(|| PipelineError::MissingValues {
                    column: name.clone(),
                    row,
                })?;
                match index.get(value) {
                    Some(&slot) => indicators[slot][row] = 1.0,
                    None => match self.handle_unknown {
                        HandleUnknown::Ignore => {}
                        HandleUnknown::Error => {
                            return Err(PipelineError::UnknownCategory {
                                column: name.clone(),
                                value: value.clone(),
                            })
                        }
                    },
                }
            }

            for (category, column) in vocabulary.iter().zip(indicators) {
                out.push_column(format!("{name}_{category}"), Column::from_f64(column))?;
            }
        }
        Ok(out)
    }

    fn feature_names_in(&self) -> &[String] {
        &self.feature_names
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.feature_names
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, vocabulary)| {
                vocabulary
                    .iter()
                    .map(move |category| format!("{name}_{category}"))
            })
            .collect()
    }
}
