//! Pipeline for chaining transformers and a final estimator.
//!
//! A pipeline owns its fitted state in a single slot. `fit` builds a complete
//! [`FittedPipeline`] from scratch and swaps it in only when every step
//! succeeded, so a refit never mixes statistics from two fits and a failed
//! refit leaves the previous state untouched.

use crate::error::{PipelineError, Result};
use crate::model::{Estimator, FittedEstimator};
use crate::preprocessing::step::{FittedTransformerStep, TransformerStep};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::table::Table;
use std::sync::Arc;

/// A step in an unfitted pipeline.
#[derive(Clone, Debug)]
pub enum PipelineStep {
    Transformer(TransformerStep),
    /// Only allowed as the last step.
    Estimator(Arc<dyn Estimator>),
}

/// Pipeline of named steps (unfitted configuration plus fitted-state slot).
///
/// # Example
/// ```
/// use machinelearne_pipeline::model::RandomForestRegressor;
/// use machinelearne_pipeline::pipeline::Pipeline;
/// use machinelearne_pipeline::preprocessing::{ImputeStrategy, SimpleImputer};
/// use machinelearne_pipeline::table::{Column, Table};
///
/// let rooms = Column::numeric([Some(1.0), None, Some(3.0), Some(4.0)]);
/// let x = Table::new().with_column("rooms", rooms)?;
/// let y = [100.0, 150.0, 300.0, 400.0];
///
/// let mut pipeline = Pipeline::new()
///     .add_transformer("impute", SimpleImputer::new(ImputeStrategy::Median))?
///     .add_estimator("model", RandomForestRegressor::new().with_n_estimators(10))?;
///
/// pipeline.fit(&x, &y)?;
/// let predictions = pipeline.predict(&x)?;
/// assert_eq!(predictions.len(), 4);
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    steps: Vec<(String, PipelineStep)>,
    fitted: Option<FittedPipeline>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer step.
    ///
    /// # Errors
    /// [`PipelineError::Configuration`] if `name` is taken, an estimator was
    /// already added, or `step` is a pipeline that ends in an estimator.
    pub fn add_transformer(
        self,
        name: impl Into<String>,
        step: impl Into<TransformerStep>,
    ) -> Result<Self> {
        let step = step.into();
        let name = name.into();
        if step.has_estimator() {
            return Err(PipelineError::Configuration(format!(
                "step '{name}' contains an estimator and cannot be used as a transformer"
            )));
        }
        self.push(name, PipelineStep::Transformer(step))
    }

    /// Append the final estimator step.
    pub fn add_estimator<E: Estimator + 'static>(
        self,
        name: impl Into<String>,
        estimator: E,
    ) -> Result<Self> {
        self.add_shared_estimator(name, Arc::new(estimator))
    }

    /// Append the final estimator step from a shared handle.
    pub fn add_shared_estimator(
        self,
        name: impl Into<String>,
        estimator: Arc<dyn Estimator>,
    ) -> Result<Self> {
        self.push(name.into(), PipelineStep::Estimator(estimator))
    }

    fn push(mut self, name: String, step: PipelineStep) -> Result<Self> {
        if self.steps.iter().any(|(n, _)| *n == name) {
            return Err(PipelineError::Configuration(format!(
                "duplicate step name '{name}'"
            )));
        }
        if let Some((last, PipelineStep::Estimator(_))) = self.steps.last() {
            return Err(PipelineError::Configuration(format!(
                "cannot add step '{name}' after estimator '{last}'"
            )));
        }
        self.steps.push((name, step));
        Ok(self)
    }

    pub fn steps(&self) -> &[(String, PipelineStep)] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Get the number of steps in the pipeline.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the last step is an estimator.
    pub fn has_estimator(&self) -> bool {
        matches!(self.steps.last(), Some((_, PipelineStep::Estimator(_))))
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// The state of the last successful fit.
    pub fn fitted(&self) -> Option<&FittedPipeline> {
        self.fitted.as_ref()
    }

    /// Fit every step on `x` (and the estimator on `y`), replacing any prior state.
    ///
    /// # Errors
    /// - [`PipelineError::Configuration`] for an empty pipeline
    /// - [`PipelineError::ShapeMismatch`] if `y.len() != x.n_rows()`
    /// - any step failure, wrapped in [`PipelineError::Step`]
    pub fn fit(&mut self, x: &Table, y: &[f64]) -> Result<()> {
        let fitted = self.fit_state(x, Some(y))?;
        self.fitted = Some(fitted);
        Ok(())
    }

    /// Fit a transformer-only pipeline and return the transformed `x`.
    pub fn fit_transform(&mut self, x: &Table) -> Result<Table> {
        let fitted = self.fit_state(x, None)?;
        let out = fitted.transform(x)?;
        self.fitted = Some(fitted);
        Ok(out)
    }

    /// Run `x` through every fitted transformer step.
    pub fn transform(&self, x: &Table) -> Result<Table> {
        self.require_fitted("transform")?.transform(x)
    }

    /// Transform `x` and predict with the fitted estimator.
    pub fn predict(&self, x: &Table) -> Result<Vec<f64>> {
        if !self.has_estimator() {
            return Err(PipelineError::Configuration(
                "predict requires a pipeline that ends in an estimator".to_string(),
            ));
        }
        self.require_fitted("predict")?.predict(x)
    }

    fn require_fitted(&self, operation: &'static str) -> Result<&FittedPipeline> {
        self.fitted.as_ref().ok_or_else(|| PipelineError::NotFitted {
            unit: "Pipeline".to_string(),
            operation,
        })
    }

    /// Fit all steps without touching the state slot.
    ///
    /// This is the entry point for pipelines nested inside other pipelines
    /// or router groups, which own their fitted copy in the parent's state.
    pub(crate) fn fit_state(&self, x: &Table, y: Option<&[f64]>) -> Result<FittedPipeline> {
        if self.steps.is_empty() {
            return Err(PipelineError::Configuration(
                "cannot fit an empty pipeline".to_string(),
            ));
        }
        if let Some(y) = y {
            if y.len() != x.n_rows() {
                return Err(PipelineError::ShapeMismatch {
                    expected: format!("{} labels", x.n_rows()),
                    got: format!("{} labels", y.len()),
                });
            }
        }

        let mut transformers = Vec::with_capacity(self.steps.len());
        let mut estimator: Option<(String, Arc<dyn FittedEstimator>)> = None;
        let mut current: Option<Table> = None;

        for (name, step) in &self.steps {
            let input = current.as_ref().unwrap_or(x);
            match step {
                PipelineStep::Transformer(t) => {
                    let fitted = t.fit(input).map_err(|e| e.in_step(name))?;
                    let output = fitted.transform(input).map_err(|e| e.in_step(name))?;
                    log::debug!(
                        "fitted step '{}' ({}): {} -> {} columns",
                        name,
                        fitted.step_name(),
                        input.n_columns(),
                        output.n_columns()
                    );
                    transformers.push((name.clone(), fitted));
                    current = Some(output);
                }
                PipelineStep::Estimator(e) => {
                    let Some(y) = y else {
                        return Err(PipelineError::Configuration(format!(
                            "estimator step '{name}' needs labels; use fit instead of fit_transform"
                        )));
                    };
                    let matrix = input.to_matrix().map_err(|err| err.in_step(name))?;
                    let fitted = e.fit(matrix.view(), y).map_err(|err| err.in_step(name))?;
                    log::debug!(
                        "fitted step '{}' ({}) on {} rows x {} features",
                        name,
                        e.name(),
                        matrix.nrows(),
                        matrix.ncols()
                    );
                    estimator = Some((name.clone(), Arc::from(fitted)));
                }
            }
        }

        let feature_names_out = match &current {
            Some(table) => table.column_names().to_vec(),
            None => x.column_names().to_vec(),
        };
        Ok(FittedPipeline {
            transformers,
            estimator,
            feature_names_in: x.column_names().to_vec(),
            feature_names_out,
        })
    }
}

/// Fitted state of a [`Pipeline`].
#[derive(Clone, Debug)]
pub struct FittedPipeline {
    transformers: Vec<(String, FittedTransformerStep)>,
    estimator: Option<(String, Arc<dyn FittedEstimator>)>,
    feature_names_in: Vec<String>,
    feature_names_out: Vec<String>,
}

impl FittedPipeline {
    /// Names of all fitted steps, estimator last.
    pub fn step_names(&self) -> Vec<&str> {
        self.transformers
            .iter()
            .map(|(n, _)| n.as_str())
            .chain(self.estimator.as_ref().map(|(n, _)| n.as_str()))
            .collect()
    }

    /// A fitted transformer step by name.
    pub fn step(&self, name: &str) -> Option<&FittedTransformerStep> {
        self.transformers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn estimator(&self) -> Option<&dyn FittedEstimator> {
        self.estimator.as_ref().map(|(_, e)| e.as_ref())
    }

    pub fn has_estimator(&self) -> bool {
        self.estimator.is_some()
    }

    /// Transform `x` and predict with the fitted estimator.
    pub fn predict(&self, x: &Table) -> Result<Vec<f64>> {
        let Some((name, estimator)) = &self.estimator else {
            return Err(PipelineError::Configuration(
                "predict requires a pipeline that ends in an estimator".to_string(),
            ));
        };
        let features = self.transform(x)?;
        let matrix = features.to_matrix().map_err(|e| e.in_step(name))?;
        estimator.predict(matrix.view()).map_err(|e| e.in_step(name))
    }
}

impl FittedTransformer for FittedPipeline {
    fn transform(&self, data: &Table) -> Result<Table> {
        let mut current: Option<Table> = None;
        for (name, step) in &self.transformers {
            let input = current.as_ref().unwrap_or(data);
            current = Some(step.transform(input).map_err(|e| e.in_step(name))?);
        }
        Ok(current.unwrap_or_else(|| data.clone()))
    }

    fn feature_names_in(&self) -> &[String] {
        &self.feature_names_in
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.feature_names_out.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecisionTreeRegressor, RandomForestRegressor};
    use crate::preprocessing::{ColumnRouter, ImputeStrategy, OneHotEncoder, SimpleImputer};
    use crate::table::{Column, Value};

    fn housing() -> (Table, Vec<f64>) {
        let x = Table::new()
            .with_column("rooms", Column::numeric([Some(3.0), Some(2.0), None, Some(4.0)]))
            .unwrap()
            .with_column(
                "suburb",
                Column::categorical([Some("A"), Some("B"), Some("B"), Some("B")]),
            )
            .unwrap();
        (x, vec![100.0, 150.0, 120.0, 200.0])
    }

    fn preprocessor() -> ColumnRouter {
        ColumnRouter::new()
            .add_group("num", SimpleImputer::new(ImputeStrategy::Median), &["rooms"])
            .unwrap()
            .add_group("cat", OneHotEncoder::new(), &["suburb"])
            .unwrap()
    }

    fn full_pipeline() -> Pipeline {
        Pipeline::new()
            .add_transformer("preprocessor", preprocessor())
            .unwrap()
            .add_estimator("model", DecisionTreeRegressor::new())
            .unwrap()
    }

    fn median_of(pipeline: &Pipeline) -> Value {
        let Some(FittedTransformerStep::SimpleImputer(imputer)) =
            pipeline.fitted().and_then(|f| f.step("impute"))
        else {
            panic!("expected a fitted imputer step");
        };
        imputer.statistics()[0].clone()
    }

    #[test]
    fn test_pipeline_fit_predict() {
        let (x, y) = housing();
        let mut pipeline = full_pipeline();
        pipeline.fit(&x, &y).unwrap();

        assert!(pipeline.is_fitted());
        assert_eq!(pipeline.fitted().unwrap().step_names(), vec!["preprocessor", "model"]);
        // A fully grown tree reproduces distinct training rows.
        assert_eq!(pipeline.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_pipeline_transform_output_names() {
        let (x, y) = housing();
        let mut pipeline = full_pipeline();
        pipeline.fit(&x, &y).unwrap();

        let out = pipeline.transform(&x).unwrap();
        assert_eq!(out.column_names(), &["rooms", "suburb_A", "suburb_B"]);
        assert_eq!(
            pipeline.fitted().unwrap().feature_names_out(),
            vec!["rooms", "suburb_A", "suburb_B"]
        );
    }

    #[test]
    fn test_pipeline_not_fitted() {
        let (x, _) = housing();
        let pipeline = full_pipeline();
        assert!(matches!(
            pipeline.predict(&x),
            Err(PipelineError::NotFitted { operation: "predict", .. })
        ));
        assert!(matches!(
            pipeline.transform(&x),
            Err(PipelineError::NotFitted { operation: "transform", .. })
        ));
    }

    #[test]
    fn test_pipeline_predict_without_estimator() {
        let (x, _) = housing();
        let mut pipeline = Pipeline::new()
            .add_transformer("preprocessor", preprocessor())
            .unwrap();
        pipeline.fit_transform(&x).unwrap();
        assert!(matches!(
            pipeline.predict(&x),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_pipeline_duplicate_step_name() {
        let result = Pipeline::new()
            .add_transformer("step", SimpleImputer::default())
            .unwrap()
            .add_transformer("step", OneHotEncoder::new());
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_pipeline_step_after_estimator() {
        let result = Pipeline::new()
            .add_estimator("model", RandomForestRegressor::new())
            .unwrap()
            .add_transformer("late", SimpleImputer::default());
        assert!(matches!(
            result,
            Err(PipelineError::Configuration(msg)) if msg.contains("after estimator 'model'")
        ));
    }

    #[test]
    fn test_pipeline_nested_estimator_rejected() {
        let inner = Pipeline::new()
            .add_estimator("model", RandomForestRegressor::new())
            .unwrap();
        let result = Pipeline::new().add_transformer("inner", inner);
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_pipeline_empty() {
        let (x, y) = housing();
        let result = Pipeline::new().fit(&x, &y);
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_pipeline_label_length_mismatch() {
        let (x, _) = housing();
        let result = full_pipeline().fit(&x, &[1.0, 2.0]);
        assert!(matches!(result, Err(PipelineError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_pipeline_fit_transform_with_estimator() {
        let (x, _) = housing();
        let result = full_pipeline().fit_transform(&x);
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_pipeline_refit_replaces_state() {
        let mut pipeline = Pipeline::new()
            .add_transformer("impute", SimpleImputer::new(ImputeStrategy::Median))
            .unwrap();

        let first = Table::new()
            .with_column("rooms", Column::numeric([Some(1.0), Some(3.0)]))
            .unwrap();
        let second = Table::new()
            .with_column("rooms", Column::numeric([Some(10.0), Some(20.0), None]))
            .unwrap();

        pipeline.fit_transform(&first).unwrap();
        assert_eq!(median_of(&pipeline), Value::Number(2.0));

        pipeline.fit_transform(&second).unwrap();
        assert_eq!(median_of(&pipeline), Value::Number(15.0));
    }

    #[test]
    fn test_pipeline_failed_refit_keeps_previous_state() {
        let mut pipeline = Pipeline::new()
            .add_transformer("impute", SimpleImputer::new(ImputeStrategy::Median))
            .unwrap();
        let good = Table::new()
            .with_column("rooms", Column::numeric([Some(1.0), Some(3.0)]))
            .unwrap();
        let degenerate = Table::new()
            .with_column("rooms", Column::numeric([None, None]))
            .unwrap();

        pipeline.fit_transform(&good).unwrap();
        let err = pipeline.fit_transform(&degenerate).unwrap_err();
        assert_eq!(err.step_path(), vec!["impute"]);
        assert!(matches!(err.root_cause(), PipelineError::DegenerateColumn { .. }));
        assert_eq!(median_of(&pipeline), Value::Number(2.0));
    }

    #[test]
    fn test_pipeline_errors_name_nested_steps() {
        let (x, y) = housing();
        // Unknown column inside a router inside a pipeline.
        let router = ColumnRouter::new()
            .add_group("num", SimpleImputer::default(), &["landsize"])
            .unwrap();
        let mut pipeline = Pipeline::new()
            .add_transformer("preprocessor", router)
            .unwrap()
            .add_estimator("model", DecisionTreeRegressor::new())
            .unwrap();

        let err = pipeline.fit(&x, &y).unwrap_err();
        assert_eq!(err.step_path(), vec!["preprocessor", "num"]);
        assert!(err.to_string().contains("landsize"));
        assert!(!pipeline.is_fitted());
    }

    #[test]
    fn test_pipeline_estimator_needs_numeric_features() {
        let (x, y) = housing();
        let mut pipeline = Pipeline::new()
            .add_transformer("impute", SimpleImputer::new(ImputeStrategy::MostFrequent))
            .unwrap()
            .add_estimator("model", DecisionTreeRegressor::new())
            .unwrap();

        let err = pipeline.fit(&x, &y).unwrap_err();
        assert_eq!(err.step_path(), vec!["model"]);
        assert!(matches!(err.root_cause(), PipelineError::ColumnType { .. }));
    }

    #[test]
    fn test_pipeline_introspection() {
        let pipeline = full_pipeline();
        assert_eq!(pipeline.len(), 2);
        assert!(!pipeline.is_empty());
        assert!(pipeline.has_estimator());
        assert_eq!(pipeline.step_names(), vec!["preprocessor", "model"]);
        assert!(matches!(pipeline.steps()[1].1, PipelineStep::Estimator(_)));
    }

    #[test]
    fn test_pipeline_clone_is_independent() {
        let (x, y) = housing();
        let mut fitted = full_pipeline();
        fitted.fit(&x, &y).unwrap();

        let template = full_pipeline();
        let copy = template.clone();
        assert!(!copy.is_fitted());
        assert!(fitted.is_fitted());
    }
}
