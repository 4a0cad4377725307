//! K-fold cross-validation of pipelines.
//!
//! Every fold gets a fresh pipeline from the caller's factory, fitted only on
//! that fold's training rows. No fitted state is shared between folds, and the
//! input table is only borrowed.

use crate::error::{PipelineError, Result};
use crate::metrics::ScoreSummary;
use crate::model_selection::kfold::{Fold, KFold};
use crate::pipeline::Pipeline;
use crate::table::Table;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Runs a pipeline factory over k folds and scores each held-out fold.
///
/// # Example
/// ```
/// use machinelearne_pipeline::metrics::mean_absolute_error;
/// use machinelearne_pipeline::model::DecisionTreeRegressor;
/// use machinelearne_pipeline::model_selection::{CrossValidator, KFold};
/// use machinelearne_pipeline::pipeline::Pipeline;
/// use machinelearne_pipeline::preprocessing::{ImputeStrategy, SimpleImputer};
/// use machinelearne_pipeline::table::{Column, Table};
///
/// let x = Table::new().with_column(
///     "rooms",
///     Column::numeric([Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)]),
/// )?;
/// let y = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
///
/// let factory = || {
///     Pipeline::new()
///         .add_transformer("impute", SimpleImputer::new(ImputeStrategy::Median))?
///         .add_estimator("model", DecisionTreeRegressor::new())
/// };
/// let scores = CrossValidator::new(KFold::new(3)).evaluate(factory, &x, &y, mean_absolute_error)?;
/// assert_eq!(scores.len(), 3);
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CrossValidator {
    kfold: KFold,
    deadline: Option<Duration>,
    parallel: bool,
}

impl CrossValidator {
    pub fn new(kfold: KFold) -> Self {
        Self {
            kfold,
            deadline: None,
            parallel: false,
        }
    }

    /// Abort with [`PipelineError::TimedOut`] if a fold would start after
    /// `deadline` has elapsed since `evaluate` began.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Evaluate folds on the rayon pool. Has no effect without the `parallel` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn kfold(&self) -> &KFold {
        &self.kfold
    }

    /// Score each fold with `metric(predictions, held_out_labels)`.
    ///
    /// Scores are returned in fold order. The first failing fold aborts the
    /// whole evaluation and its error is wrapped in [`PipelineError::Fold`].
    ///
    /// # Errors
    /// - [`PipelineError::ShapeMismatch`] if `y.len() != x.n_rows()`
    /// - [`PipelineError::InsufficientData`] if there are fewer rows than folds
    /// - [`PipelineError::Configuration`] if the factory returns a fitted pipeline
    /// - [`PipelineError::TimedOut`] if the deadline passes
    pub fn evaluate<F, M>(&self, factory: F, x: &Table, y: &[f64], metric: M) -> Result<Vec<f64>>
    where
        F: Fn() -> Result<Pipeline> + Sync,
        M: Fn(&[f64], &[f64]) -> f64 + Sync,
    {
        if y.len() != x.n_rows() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} labels", x.n_rows()),
                got: format!("{} labels", y.len()),
            });
        }
        let folds = self.kfold.split(x.n_rows())?;
        let run = FoldRun {
            factory: &factory,
            metric: &metric,
            x,
            y,
            started: Instant::now(),
            deadline: self.deadline,
            completed: AtomicUsize::new(0),
            total: folds.len(),
        };

        let results = self.run_folds(&run, &folds);
        let scores = results.into_iter().collect::<Result<Vec<f64>>>()?;

        if let Some(summary) = ScoreSummary::from_scores(&scores) {
            log::info!("cross-validation over {} folds: {}", folds.len(), summary);
        }
        Ok(scores)
    }

    #[cfg(feature = "parallel")]
    fn run_folds<F, M>(&self, run: &FoldRun<'_, F, M>, folds: &[Fold]) -> Vec<Result<f64>>
    where
        F: Fn() -> Result<Pipeline> + Sync,
        M: Fn(&[f64], &[f64]) -> f64 + Sync,
    {
        if self.parallel {
            folds.par_iter().map(|fold| run.evaluate(fold)).collect()
        } else {
            run_sequential(run, folds)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_folds<F, M>(&self, run: &FoldRun<'_, F, M>, folds: &[Fold]) -> Vec<Result<f64>>
    where
        F: Fn() -> Result<Pipeline> + Sync,
        M: Fn(&[f64], &[f64]) -> f64 + Sync,
    {
        run_sequential(run, folds)
    }
}

/// Stops at the first failure so later folds are never fitted.
fn run_sequential<F, M>(run: &FoldRun<'_, F, M>, folds: &[Fold]) -> Vec<Result<f64>>
where
    F: Fn() -> Result<Pipeline> + Sync,
    M: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    let mut results = Vec::with_capacity(folds.len());
    for fold in folds {
        let result = run.evaluate(fold);
        let failed = result.is_err();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}

struct FoldRun<'a, F, M> {
    factory: &'a F,
    metric: &'a M,
    x: &'a Table,
    y: &'a [f64],
    started: Instant,
    deadline: Option<Duration>,
    completed: AtomicUsize,
    total: usize,
}

impl<F, M> FoldRun<'_, F, M>
where
    F: Fn() -> Result<Pipeline> + Sync,
    M: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    fn evaluate(&self, fold: &Fold) -> Result<f64> {
        if let Some(deadline) = self.deadline {
            if self.started.elapsed() >= deadline {
                let completed = self.completed.load(Ordering::SeqCst);
                log::warn!(
                    "cross-validation deadline of {:?} exceeded before fold {} \
                     ({} of {} folds done)",
                    deadline,
                    fold.index,
                    completed,
                    self.total
                );
                return Err(PipelineError::TimedOut {
                    completed,
                    total: self.total,
                });
            }
        }

        let score = self.score_fold(fold).map_err(|e| e.in_fold(fold.index))?;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(score)
    }

    fn score_fold(&self, fold: &Fold) -> Result<f64> {
        let mut pipeline = (self.factory)()?;
        if pipeline.is_fitted() {
            return Err(PipelineError::Configuration(
                "pipeline factory returned an already fitted pipeline".to_string(),
            ));
        }

        let x_train = self.x.take_rows(&fold.train)?;
        let y_train: Vec<f64> = fold.train.iter().map(|&i| self.y[i]).collect();
        pipeline.fit(&x_train, &y_train)?;

        let x_test = self.x.take_rows(&fold.test)?;
        let y_test: Vec<f64> = fold.test.iter().map(|&i| self.y[i]).collect();
        let predictions = pipeline.predict(&x_test)?;
        let score = (self.metric)(&predictions, &y_test);

        log::debug!(
            "fold {}: trained on {} rows, scored {} rows: {:.4}",
            fold.index,
            fold.train.len(),
            fold.test.len(),
            score
        );
        Ok(score)
    }
}

/// Contiguous k-fold cross-validation.
///
/// Shorthand for `CrossValidator::new(KFold::new(k)).evaluate(..)`.
pub fn cross_val_score<F, M>(
    factory: F,
    x: &Table,
    y: &[f64],
    k: usize,
    metric: M,
) -> Result<Vec<f64>>
where
    F: Fn() -> Result<Pipeline> + Sync,
    M: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    CrossValidator::new(KFold::new(k)).evaluate(factory, x, y, metric)
}
