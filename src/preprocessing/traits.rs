//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and can learn from data.
//! - [`FittedTransformer`]: After fitting; holds the learned state and transforms new data.
//!
//! Splitting the two means a transformer cannot be applied before it has been
//! fitted: the only way to obtain a [`FittedTransformer`] is through
//! [`Transformer::fit`]. Fitting never mutates the configuration, so fitting the
//! same configuration twice yields two independent fitted values.

use crate::error::{PipelineError, Result};
use crate::table::{ColumnKind, Table};

/// Trait for unfitted transformers with hyperparameters.
///
/// A transformer learns parameters from training data and can then transform
/// new data using those learned parameters. This trait represents the
/// configurable, unfitted state.
///
/// # Example
/// ```
/// use machinelearne_pipeline::preprocessing::{
///     FittedTransformer, ImputeStrategy, SimpleImputer, Transformer,
/// };
/// use machinelearne_pipeline::table::{Column, Table};
///
/// let train = Table::new().with_column("rooms", Column::numeric([Some(3.0), Some(2.0)]))?;
/// let test = Table::new().with_column("rooms", Column::numeric([None]))?;
///
/// let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&train)?;
/// let imputed = fitted.transform(&test)?;
/// assert_eq!(imputed.column("rooms"), Some(&Column::from_f64([2.5])));
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
pub trait Transformer: Clone {
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer;

    /// Fit the transformer to the training data.
    ///
    /// Learns parameters (e.g., per-column medians for an imputer) from every
    /// column of `data`.
    ///
    /// # Errors
    /// Returns [`PipelineError`] if:
    /// - Data is empty
    /// - A column has the wrong kind for this transformer
    /// - A column has no usable values
    fn fit(&self, data: &Table) -> Result<Self::Fitted>;

    /// Fit the transformer and transform the same data in one step.
    fn fit_transform(&self, data: &Table) -> Result<Table> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// A fitted transformer owns its learned state exclusively. `transform` takes
/// `&self`, so the state can never be altered by the data it is applied to.
pub trait FittedTransformer: Clone {
    /// Transform data using learned parameters.
    ///
    /// # Errors
    /// Returns [`PipelineError`] if:
    /// - A column seen during fit is absent
    /// - A column changed kind since fit
    /// - A value cannot be handled (e.g., an unknown category)
    fn transform(&self, data: &Table) -> Result<Table>;

    /// Column names seen during fit, in fit order.
    fn feature_names_in(&self) -> &[String];

    /// Column names this transformer produces.
    fn feature_names_out(&self) -> Vec<String>;

    /// Returns the number of features seen during fit.
    fn n_features_in(&self) -> usize {
        self.feature_names_in().len()
    }

    /// Returns the number of features produced by `transform`.
    fn n_features_out(&self) -> usize {
        self.feature_names_out().len()
    }
}

/// Check that `data` has exactly the columns and kinds recorded at fit time.
pub(crate) fn check_fitted_columns(
    names: &[String],
    kinds: &[ColumnKind],
    data: &Table,
) -> Result<()> {
    for (name, &kind) in names.iter().zip(kinds) {
        let column = data.require_column(name)?;
        if column.kind() != kind {
            return Err(PipelineError::ColumnType {
                column: name.clone(),
                expected: kind,
                found: column.kind(),
            });
        }
    }
    if data.n_columns() != names.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} columns {:?}", names.len(), names),
            got: format!("{} columns {:?}", data.n_columns(), data.column_names()),
        });
    }
    Ok(())
}

/// Fail with [`PipelineError::EmptyData`] if `data` has no rows.
pub(crate) fn ensure_rows(data: &Table, unit: &str) -> Result<()> {
    if data.n_rows() == 0 {
        return Err(PipelineError::EmptyData(format!(
            "cannot fit {unit} on a table with no rows"
        )));
    }
    Ok(())
}
