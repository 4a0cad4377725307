//! Estimators: units that learn a predictive model from a numeric feature
//! matrix and labels.
//!
//! [`Estimator`] and [`FittedEstimator`] are object safe, so a
//! [`Pipeline`](crate::pipeline::Pipeline) can hold any regressor behind an
//! `Arc<dyn Estimator>`. Both require `Send + Sync` so fitted pipelines can be
//! evaluated on worker threads.

pub mod forest;
pub mod tree;

pub use forest::{FittedRandomForestRegressor, RandomForestConfig, RandomForestRegressor};
pub use tree::{DecisionTreeConfig, DecisionTreeRegressor, FittedDecisionTreeRegressor, MaxFeatures};

use crate::error::{PipelineError, Result};
use ndarray::ArrayView2;
use std::fmt::Debug;

/// An unfitted estimator with hyperparameters.
pub trait Estimator: Debug + Send + Sync {
    /// Short type name used in logs.
    fn name(&self) -> &'static str;

    /// Learn a model from `features` (one row per sample) and `labels`.
    ///
    /// # Errors
    /// - [`PipelineError::EmptyData`] if there are no rows
    /// - [`PipelineError::ShapeMismatch`] if `labels.len()` differs from the row count
    /// - [`PipelineError::NonFinite`] for an infinite or NaN feature or label
    /// - [`PipelineError::Configuration`] for invalid hyperparameters
    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
    ) -> Result<Box<dyn FittedEstimator>>;
}

/// A fitted estimator ready for inference.
pub trait FittedEstimator: Debug + Send + Sync {
    /// Predict one label per row.
    ///
    /// # Errors
    /// [`PipelineError::ShapeMismatch`] if the column count differs from fit.
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>>;

    /// Number of feature columns seen during fit.
    fn n_features_in(&self) -> usize;
}

pub(crate) fn check_fit_input(
    features: &ArrayView2<'_, f64>,
    labels: &[f64],
    unit: &str,
) -> Result<()> {
    if features.nrows() == 0 {
        return Err(PipelineError::EmptyData(format!(
            "cannot fit {unit} on zero rows"
        )));
    }
    if labels.len() != features.nrows() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} labels", features.nrows()),
            got: format!("{} labels", labels.len()),
        });
    }
    for (j, column) in features.columns().into_iter().enumerate() {
        if let Some(row) = column.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::NonFinite {
                column: format!("feature {j}"),
                row,
            });
        }
    }
    if let Some(row) = labels.iter().position(|v| !v.is_finite()) {
        return Err(PipelineError::NonFinite {
            column: "label".to_string(),
            row,
        });
    }
    Ok(())
}

pub(crate) fn check_n_features(features: &ArrayView2<'_, f64>, expected: usize) -> Result<()> {
    if features.ncols() != expected {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{expected} features"),
            got: format!("{} features", features.ncols()),
        });
    }
    Ok(())
}
