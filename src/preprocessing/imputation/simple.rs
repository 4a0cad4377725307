//! Simple Imputer.
//!
//! Imputation transformer for completing missing values.
//! Supports mean, median, most_frequent, and constant strategies.
//!
//! Numeric `None` and `NaN` entries, and categorical `None` entries, are
//! treated as missing.
//!
//! # Example
//! ```
//! use machinelearne_pipeline::preprocessing::{
//!     FittedTransformer, ImputeStrategy, SimpleImputer, Transformer,
//! };
//! use machinelearne_pipeline::table::{Column, Table, Value};
//!
//! let data = Table::new()
//!     .with_column("suburb", Column::categorical([Some("A"), None, Some("A"), Some("B")]))?;
//!
//! let fitted = SimpleImputer::new(ImputeStrategy::MostFrequent).fit(&data)?;
//! assert_eq!(fitted.statistics(), &[Value::from("A")]);
//! # Ok::<(), machinelearne_pipeline::PipelineError>(())
//! ```

use crate::error::{PipelineError, Result};
use crate::preprocessing::traits::{
    check_fitted_columns, ensure_rows, FittedTransformer, Transformer,
};
use crate::table::{Column, ColumnKind, Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Replace missing values with the mean of each column. Numeric only.
    #[default]
    Mean,
    /// Replace missing values with the median of each column. Numeric only.
    Median,
    /// Replace missing values with the most frequent value of each column.
    /// Ties resolve to the smallest value.
    MostFrequent,
    /// Replace missing values with a constant of the column's kind.
    Constant(Value),
}

impl ImputeStrategy {
    fn name(&self) -> &'static str {
        match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Median => "median",
            ImputeStrategy::MostFrequent => "most_frequent",
            ImputeStrategy::Constant(_) => "constant",
        }
    }
}

/// What to do with a column that has no non-missing values at fit time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fail with [`PipelineError::DegenerateColumn`].
    #[default]
    Error,
    /// Use the given value as the column's statistic.
    Fill(Value),
}

/// Configuration for SimpleImputer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleImputerConfig {
    /// Statistic used to fill missing entries.
    pub strategy: ImputeStrategy,
    /// Fallback for all-missing columns.
    pub on_degenerate: DegeneratePolicy,
}

/// SimpleImputer transformer (unfitted).
///
/// Imputation transformer for completing missing values.
#[derive(Clone, Debug, Default)]
pub struct SimpleImputer {
    config: SimpleImputerConfig,
}

impl SimpleImputer {
    /// Create a new SimpleImputer with the specified strategy.
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            config: SimpleImputerConfig {
                strategy,
                ..SimpleImputerConfig::default()
            },
        }
    }

    /// Create a SimpleImputer from a full configuration.
    pub fn from_config(config: SimpleImputerConfig) -> Self {
        Self { config }
    }

    /// Set the policy for columns with no non-missing values.
    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.config.on_degenerate = policy;
        self
    }

    pub fn config(&self) -> &SimpleImputerConfig {
        &self.config
    }
}

fn numeric_values(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .collect()
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    }
}

/// Most frequent value; ties go to the smallest value.
fn numeric_mode(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mut best = values[0];
    let mut best_count = 0;
    let mut i = 0;
    while i < values.len() {
        let mut j = i;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        if j - i > best_count {
            best_count = j - i;
            best = values[i];
        }
        i = j;
    }
    best
}

fn label_mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

/// Compute the fill value for a single column, ignoring missing entries.
///
/// Returns `Ok(None)` when the column has no usable values.
fn compute_statistic(
    name: &str,
    column: &Column,
    strategy: &ImputeStrategy,
) -> Result<Option<Value>> {
    let type_error = |expected: ColumnKind| PipelineError::ColumnType {
        column: name.to_string(),
        expected,
        found: column.kind(),
    };

    match (strategy, column) {
        (ImputeStrategy::Constant(value), _) => {
            if value.kind() != column.kind() {
                return Err(type_error(value.kind()));
            }
            Ok(Some(value.clone()))
        }
        (ImputeStrategy::Mean, Column::Numeric(values)) => {
            let values = numeric_values(values);
            if values.is_empty() {
                return Ok(None);
            }
            Ok(Some(Value::Number(
                values.iter().sum::<f64>() / values.len() as f64,
            )))
        }
        (ImputeStrategy::Median, Column::Numeric(values)) => {
            let values = numeric_values(values);
            if values.is_empty() {
                return Ok(None);
            }
            Ok(Some(Value::Number(median(values))))
        }
        (ImputeStrategy::MostFrequent, Column::Numeric(values)) => {
            let values = numeric_values(values);
            if values.is_empty() {
                return Ok(None);
            }
            Ok(Some(Value::Number(numeric_mode(values))))
        }
        (ImputeStrategy::MostFrequent, Column::Categorical(values)) => {
            Ok(label_mode(values).map(Value::Label))
        }
        (ImputeStrategy::Mean | ImputeStrategy::Median, Column::Categorical(_)) => {
            Err(type_error(ColumnKind::Numeric))
        }
    }
}

impl Transformer for SimpleImputer {
    type Fitted = FittedSimpleImputer;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        ensure_rows(data, "SimpleImputer")?;

        let mut statistics = Vec::with_capacity(data.n_columns());
        for (name, column) in data.iter() {
            let statistic = match compute_statistic(name, column, &self.config.strategy)? {
                Some(value) => value,
                None => match &self.config.on_degenerate {
                    DegeneratePolicy::Error => {
                        return Err(PipelineError::DegenerateColumn {
                            column: name.to_string(),
                            strategy: self.config.strategy.name().to_string(),
                        })
                    }
                    DegeneratePolicy::Fill(value) if value.kind() == column.kind() => {
                        value.clone()
                    }
                    DegeneratePolicy::Fill(value) => {
                        return Err(PipelineError::ColumnType {
                            column: name.to_string(),
                            expected: value.kind(),
                            found: column.kind(),
                        })
                    }
                },
            };
            statistics.push(statistic);
        }

        let schema = data.schema();
        Ok(FittedSimpleImputer {
            strategy: self.config.strategy.clone(),
            statistics,
            feature_names: schema.fields().iter().map(|f| f.name.clone()).collect(),
            feature_kinds: schema.fields().iter().map(|f| f.kind).collect(),
        })
    }
}

/// Fitted SimpleImputer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedSimpleImputer {
    strategy: ImputeStrategy,
    statistics: Vec<Value>,
    feature_names: Vec<String>,
    feature_kinds: Vec<ColumnKind>,
}

impl FittedSimpleImputer {
    /// Get the imputation statistics (fill values) for each feature, in fit order.
    pub fn statistics(&self) -> &[Value] {
        &self.statistics
    }

    /// The fill value learned for one column.
    pub fn statistic(&self, column: &str) -> Option<&Value> {
        self.feature_names
            .iter()
            .position(|n| n == column)
            .map(|i| &self.statistics[i])
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }
}

impl FittedTransformer for FittedSimpleImputer {
    fn transform(&self, data: &Table) -> Result<Table> {
        check_fitted_columns(&self.feature_names, &self.feature_kinds, data)?;

        let mut out = Table::empty(data.n_rows());
        for (name, statistic) in self.feature_names.iter().zip(&self.statistics) {
            let filled = match (data.require_column(name)?, statistic) {
                (Column::Numeric(values), Value::Number(fill)) => Column::Numeric(
                    values
                        .iter()
                        .map(|v| match v {
                            Some(x) if !x.is_nan() => Some(*x),
                            _ => Some(*fill),
                        })
                        .collect(),
                ),
                (Column::Categorical(values), Value::Label(fill)) => Column::Categorical(
                    values
                        .iter()
                        .map(|v| Some(v.clone().unwrap_or_else(|| fill.clone())))
                        .collect(),
                ),
                (column, statistic) => {
                    return Err(PipelineError::ColumnType {
                        column: name.clone(),
                        expected: statistic.kind(),
                        found: column.kind(),
                    })
                }
            };
            out.push_column(name.clone(), filled)?;
        }
        Ok(out)
    }

    fn feature_names_in(&self) -> &[String] {
        &self.feature_names
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.feature_names.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms(values: &[Option<f64>]) -> Table {
        Table::new()
            .with_column("rooms", Column::numeric(values.iter().copied()))
            .unwrap()
    }

    fn create_test_data_with_missing() -> Table {
        // rooms: [1, 3, 5], landsize: [None, 4, 6]
        Table::new()
            .with_column("rooms", Column::from_f64([1.0, 3.0, 5.0]))
            .unwrap()
            .with_column("landsize", Column::numeric([None, Some(4.0), Some(6.0)]))
            .unwrap()
    }

    #[test]
    fn test_simple_imputer_mean() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        assert_eq!(
            fitted.statistics(),
            &[Value::Number(3.0), Value::Number(5.0)]
        );

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(
            imputed.column("landsize"),
            Some(&Column::from_f64([5.0, 4.0, 6.0]))
        );
        assert_eq!(
            imputed.column("rooms"),
            Some(&Column::from_f64([1.0, 3.0, 5.0]))
        );
    }

    #[test]
    fn test_simple_imputer_median_even_count() {
        // Fit on rows 0-1 of [3, 2, None]; row 2 gets the learned 2.5.
        let full = rooms(&[Some(3.0), Some(2.0), None]);
        let train = full.take_rows(&[0, 1]).unwrap();
        let held_out = full.take_rows(&[2]).unwrap();

        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&train).unwrap();
        assert_eq!(fitted.statistic("rooms"), Some(&Value::Number(2.5)));

        let imputed = fitted.transform(&held_out).unwrap();
        assert_eq!(imputed.column("rooms"), Some(&Column::from_f64([2.5])));
    }

    #[test]
    fn test_simple_imputer_median_ignores_nan() {
        let data = rooms(&[Some(1.0), Some(f64::NAN), Some(7.0), Some(4.0)]);
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();
        assert_eq!(fitted.statistic("rooms"), Some(&Value::Number(4.0)));

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed.column("rooms").unwrap().n_missing(), 0);
    }

    #[test]
    fn test_simple_imputer_most_frequent_numeric_tie_takes_smallest() {
        let data = rooms(&[Some(4.0), Some(2.0), Some(4.0), Some(2.0), None]);
        let fitted = SimpleImputer::new(ImputeStrategy::MostFrequent)
            .fit(&data)
            .unwrap();
        assert_eq!(fitted.statistic("rooms"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_simple_imputer_most_frequent_categorical() {
        let data = Table::new()
            .with_column(
                "method",
                Column::categorical([Some("S"), Some("PI"), None, Some("S"), Some("PI")]),
            )
            .unwrap();
        let fitted = SimpleImputer::new(ImputeStrategy::MostFrequent)
            .fit(&data)
            .unwrap();
        // Tie between "PI" and "S" resolves lexicographically.
        assert_eq!(fitted.statistic("method"), Some(&Value::from("PI")));

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(
            imputed.column("method"),
            Some(&Column::categorical([
                Some("S"),
                Some("PI"),
                Some("PI"),
                Some("S"),
                Some("PI")
            ]))
        );
    }

    #[test]
    fn test_simple_imputer_constant() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Constant(Value::Number(-1.0)))
            .fit(&data)
            .unwrap();

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(
            imputed.column("landsize"),
            Some(&Column::from_f64([-1.0, 4.0, 6.0]))
        );
    }

    #[test]
    fn test_simple_imputer_constant_kind_mismatch() {
        let data = create_test_data_with_missing();
        let result = SimpleImputer::new(ImputeStrategy::Constant(Value::from("n/a"))).fit(&data);
        assert!(matches!(result, Err(PipelineError::ColumnType { .. })));
    }

    #[test]
    fn test_simple_imputer_median_rejects_categorical() {
        let data = Table::new()
            .with_column("suburb", Column::categorical([Some("A")]))
            .unwrap();
        let result = SimpleImputer::new(ImputeStrategy::Median).fit(&data);
        assert!(matches!(
            result,
            Err(PipelineError::ColumnType { column, expected: ColumnKind::Numeric, .. })
                if column == "suburb"
        ));
    }

    #[test]
    fn test_simple_imputer_degenerate_column_errors() {
        let data = rooms(&[None, None]);
        let result = SimpleImputer::new(ImputeStrategy::Median).fit(&data);
        assert!(matches!(
            result,
            Err(PipelineError::DegenerateColumn { column, strategy })
                if column == "rooms" && strategy == "median"
        ));
    }

    #[test]
    fn test_simple_imputer_degenerate_column_fill() {
        let data = rooms(&[None, None]);
        let fitted = SimpleImputer::new(ImputeStrategy::Median)
            .with_degenerate_policy(DegeneratePolicy::Fill(Value::Number(0.0)))
            .fit(&data)
            .unwrap();
        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed.column("rooms"), Some(&Column::from_f64([0.0, 0.0])));
    }

    #[test]
    fn test_simple_imputer_transform_uses_only_fit_statistics() {
        let train = rooms(&[Some(1.0), Some(3.0)]);
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&train).unwrap();

        let test_a = rooms(&[None, Some(100.0)]);
        let test_b = rooms(&[None, Some(-100.0), Some(50.0)]);
        let a = fitted.transform(&test_a).unwrap();
        let b = fitted.transform(&test_b).unwrap();

        assert!(matches!(a.column("rooms"), Some(Column::Numeric(v)) if v[0] == Some(2.0)));
        assert!(matches!(b.column("rooms"), Some(Column::Numeric(v)) if v[0] == Some(2.0)));
    }

    #[test]
    fn test_simple_imputer_unknown_column_at_transform() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        let wrong = rooms(&[Some(1.0)]);
        let result = fitted.transform(&wrong);
        assert!(matches!(
            result,
            Err(PipelineError::UnknownColumn { column }) if column == "landsize"
        ));
    }

    #[test]
    fn test_simple_imputer_empty_data() {
        let data = Table::empty(0);
        let result = SimpleImputer::new(ImputeStrategy::Mean).fit(&data);
        assert!(matches!(result, Err(PipelineError::EmptyData(_))));
    }

    #[test]
    fn test_simple_imputer_n_features_in() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();
        assert_eq!(fitted.n_features_in(), 2);
        assert_eq!(fitted.feature_names_out(), vec!["rooms", "landsize"]);
    }

    #[test]
    fn test_simple_imputer_config_from_json() {
        let config: SimpleImputerConfig =
            serde_json::from_str(r#"{"strategy": "median"}"#).unwrap();
        assert_eq!(config.strategy, ImputeStrategy::Median);
        assert_eq!(config.on_degenerate, DegeneratePolicy::Error);

        let config: SimpleImputerConfig =
            serde_json::from_str(r#"{"strategy": {"constant": "missing"}}"#).unwrap();
        assert_eq!(config.strategy, ImputeStrategy::Constant(Value::from("missing")));
    }
}
