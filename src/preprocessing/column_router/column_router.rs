//! ColumnRouter implementation.
//!
//! Applies different transformers to named, disjoint column groups and
//! concatenates the results in group declaration order.

use crate::error::{PipelineError, Result};
use crate::preprocessing::step::{FittedTransformerStep, TransformerStep};
use crate::preprocessing::traits::{ensure_rows, FittedTransformer, Transformer};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What happens to input columns that no group names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remainder {
    /// Leave them out of the output.
    #[default]
    Drop,
    /// Append them unchanged after all group outputs, in input order.
    Passthrough,
}

/// A named set of columns handled by one transformer.
#[derive(Clone, Debug)]
pub struct ColumnGroup {
    name: String,
    transformer: TransformerStep,
    columns: Vec<String>,
}

impl ColumnGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transformer(&self) -> &TransformerStep {
        &self.transformer
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// ColumnRouter applies different transformers to different columns.
///
/// Groups are declared up front and checked for disjointness as they are
/// added, so a misconfigured router never reaches `fit`.
///
/// # Example
/// ```
/// use machinelearne_pipeline::preprocessing::{
///     ColumnRouter, FittedTransformer, ImputeStrategy, OneHotEncoder, SimpleImputer, Transformer,
/// };
/// use machinelearne_pipeline::table::{Column, Table};
///
/// let data = Table::new()
///     .with_column("suburb", Column::categorical([Some("A"), Some("B")]))?
///     .with_column("rooms", Column::numeric([Some(3.0), None]))?;
///
/// let router = ColumnRouter::new()
///     .add_group("num", SimpleImputer::new(ImputeStrategy::Median), &["rooms"])?
///     .add_group("cat", OneHotEncoder::new(), &["suburb"])?;
///
/// let out = router.fit(&data)?.transform(&data)?;
/// assert_eq!(out.column_names(), &["rooms", "suburb_A", "suburb_B"]);
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct ColumnRouter {
    groups: Vec<ColumnGroup>,
    remainder: Remainder,
}

impl ColumnRouter {
    /// Create a new router with no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how unrouted columns are treated.
    pub fn with_remainder(mut self, remainder: Remainder) -> Self {
        self.remainder = remainder;
        self
    }

    /// Add a group.
    ///
    /// # Errors
    /// [`PipelineError::Configuration`] if `columns` is empty, repeats a
    /// column, shares a column with an earlier group, if `name` is already
    /// taken, or if `transformer` contains an estimator.
    pub fn add_group<S: AsRef<str>>(
        mut self,
        name: impl Into<String>,
        transformer: impl Into<TransformerStep>,
        columns: &[S],
    ) -> Result<Self> {
        let name = name.into();
        let transformer = transformer.into();

        if columns.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "column group '{name}' has no columns"
            )));
        }
        if self.groups.iter().any(|g| g.name == name) {
            return Err(PipelineError::Configuration(format!(
                "duplicate column group name '{name}'"
            )));
        }
        if transformer.has_estimator() {
            return Err(PipelineError::Configuration(format!(
                "column group '{name}' contains an estimator"
            )));
        }

        let mut seen = HashSet::new();
        for column in columns {
            let column = column.as_ref();
            if !seen.insert(column) {
                return Err(PipelineError::Configuration(format!(
                    "column '{column}' is listed twice in group '{name}'"
                )));
            }
            if let Some(other) = self
                .groups
                .iter()
                .find(|g| g.columns.iter().any(|c| c == column))
            {
                return Err(PipelineError::Configuration(format!(
                    "column '{column}' is assigned to both '{}' and '{name}'",
                    other.name
                )));
            }
        }

        self.groups.push(ColumnGroup {
            name,
            transformer,
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        });
        Ok(self)
    }

    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    pub fn remainder(&self) -> Remainder {
        self.remainder
    }

    /// Get the number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Transformer for ColumnRouter {
    type Fitted = FittedColumnRouter;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        if self.groups.is_empty() {
            return Err(PipelineError::Configuration(
                "cannot fit a ColumnRouter with no column groups".to_string(),
            ));
        }
        ensure_rows(data, "ColumnRouter")?;

        let mut fitted_groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let subset = data
                .select(&group.columns)
                .map_err(|e| e.in_step(&group.name))?;
            let fitted = group
                .transformer
                .fit(&subset)
                .map_err(|e| e.in_step(&group.name))?;
            log::debug!(
                "fitted column group '{}' ({}) on {} columns -> {} columns",
                group.name,
                fitted.step_name(),
                group.columns.len(),
                fitted.n_features_out()
            );
            fitted_groups.push(FittedColumnGroup {
                name: group.name.clone(),
                columns: group.columns.clone(),
                fitted,
            });
        }

        let routed: HashSet<&str> = self
            .groups
            .iter()
            .flat_map(|g| g.columns.iter().map(String::as_str))
            .collect();
        let passthrough: Vec<String> = match self.remainder {
            Remainder::Drop => Vec::new(),
            Remainder::Passthrough => data
                .column_names()
                .iter()
                .filter(|name| !routed.contains(name.as_str()))
                .cloned()
                .collect(),
        };

        let mut output_names: HashSet<String> = HashSet::new();
        for name in fitted_groups
            .iter()
            .flat_map(|g| g.fitted.feature_names_out())
            .chain(passthrough.iter().cloned())
        {
            if !output_names.insert(name.clone()) {
                return Err(PipelineError::Configuration(format!(
                    "ColumnRouter produces output column '{name}' more than once"
                )));
            }
        }

        Ok(FittedColumnRouter {
            groups: fitted_groups,
            passthrough,
            feature_names: data.column_names().to_vec(),
        })
    }
}

#[derive(Clone, Debug)]
struct FittedColumnGroup {
    name: String,
    columns: Vec<String>,
    fitted: FittedTransformerStep,
}

/// Fitted ColumnRouter ready for inference.
#[derive(Clone, Debug)]
pub struct FittedColumnRouter {
    groups: Vec<FittedColumnGroup>,
    passthrough: Vec<String>,
    feature_names: Vec<String>,
}

impl FittedColumnRouter {
    /// Group names with the columns each one consumes, in output order.
    pub fn group_columns(&self) -> Vec<(&str, &[String])> {
        self.groups
            .iter()
            .map(|g| (g.name.as_str(), g.columns.as_slice()))
            .collect()
    }

    /// The fitted transformer of a group.
    pub fn group(&self, name: &str) -> Option<&FittedTransformerStep> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| &g.fitted)
    }

    /// Columns appended unchanged after the group outputs.
    pub fn passthrough_columns(&self) -> &[String] {
        &self.passthrough
    }
}

impl FittedTransformer for FittedColumnRouter {
    fn transform(&self, data: &Table) -> Result<Table> {
        let mut outputs = Vec::with_capacity(self.groups.len() + 1);
        for group in &self.groups {
            let subset = data
                .select(&group.columns)
                .map_err(|e| e.in_step(&group.name))?;
            let transformed = group
                .fitted
                .transform(&subset)
                .map_err(|e| e.in_step(&group.name))?;
            outputs.push(transformed);
        }
        if !self.passthrough.is_empty() {
            let remainder = data
                .select(&self.passthrough)
                .map_err(|e| e.in_step("remainder"))?;
            outputs.push(remainder);
        }
        Table::hconcat(outputs)
    }

    fn feature_names_in(&self) -> &[String] {
        &self.feature_names
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.fitted.feature_names_out())
            .chain(self.passthrough.iter().cloned())
            .collect()
    }
}
