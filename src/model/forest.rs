//! Random forest regressor.
//!
//! Each tree trains on a bootstrap resample of the rows (optional) with its own
//! ChaCha8 stream. Tree seeds are drawn up front from a stream seeded with the
//! forest seed, so tree `i` is identical whether trees train sequentially or
//! on the rayon pool, and predictions are summed in tree order.

use crate::error::{PipelineError, Result};
use crate::model::tree::{
    DecisionTreeConfig, DecisionTreeRegressor, FittedDecisionTreeRegressor, MaxFeatures,
};
use crate::model::{check_fit_input, check_n_features, Estimator, FittedEstimator};
use ndarray::ArrayView2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Configuration for RandomForestRegressor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Per-tree growth parameters.
    pub tree: DecisionTreeConfig,
    /// Train each tree on a bootstrap resample instead of all rows.
    pub bootstrap: bool,
    pub seed: u64,
    /// Train trees on the rayon pool. Has no effect without the `parallel` feature.
    pub parallel: bool,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: DecisionTreeConfig::default(),
            bootstrap: true,
            seed: 0,
            parallel: true,
        }
    }
}

/// Random forest regressor (unfitted).
///
/// # Example
/// ```
/// use machinelearne_pipeline::model::{FittedEstimator, RandomForestRegressor};
/// use ndarray::array;
///
/// let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
/// let y = [10.0, 20.0, 30.0, 40.0];
///
/// let forest = RandomForestRegressor::new().with_n_estimators(10).with_seed(42);
/// let a = forest.fit(x.view(), &y)?.predict(x.view())?;
/// let b = forest.fit(x.view(), &y)?.predict(x.view())?;
/// assert_eq!(a, b);
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct RandomForestRegressor {
    config: RandomForestConfig,
}

impl RandomForestRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: RandomForestConfig) -> Self {
        Self { config }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.config.n_estimators = n_estimators;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.tree.max_depth = Some(max_depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.config.tree.min_samples_leaf = n;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.config.tree.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.bootstrap = bootstrap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    /// Fit the forest.
    ///
    /// # Errors
    /// - [`PipelineError::EmptyData`] / [`PipelineError::ShapeMismatch`] for bad input
    /// - [`PipelineError::Configuration`] for zero trees or invalid tree parameters
    pub fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
    ) -> Result<FittedRandomForestRegressor> {
        check_fit_input(&features, labels, "RandomForestRegressor")?;
        if self.config.n_estimators == 0 {
            return Err(PipelineError::Configuration(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        self.config.tree.validate()?;
        self.config.tree.max_features.resolve(features.ncols())?;

        let mut seeder = ChaCha8Rng::seed_from_u64(self.config.seed);
        let seeds: Vec<u64> = (0..self.config.n_estimators)
            .map(|_| seeder.random())
            .collect();

        let trees = self.train_trees(features, labels, &seeds)?;
        log::info!(
            "fitted RandomForestRegressor: {} trees on {} rows x {} features (seed {})",
            trees.len(),
            features.nrows(),
            features.ncols(),
            self.config.seed
        );

        Ok(FittedRandomForestRegressor {
            trees,
            n_features: features.ncols(),
        })
    }

    #[cfg(feature = "parallel")]
    fn train_trees(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
        seeds: &[u64],
    ) -> Result<Vec<FittedDecisionTreeRegressor>> {
        if self.config.parallel {
            seeds
                .par_iter()
                .map(|&seed| self.train_tree(features, labels, seed))
                .collect()
        } else {
            self.train_trees_sequential(features, labels, seeds)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn train_trees(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
        seeds: &[u64],
    ) -> Result<Vec<FittedDecisionTreeRegressor>> {
        self.train_trees_sequential(features, labels, seeds)
    }

    fn train_trees_sequential(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
        seeds: &[u64],
    ) -> Result<Vec<FittedDecisionTreeRegressor>> {
        seeds
            .iter()
            .map(|&seed| self.train_tree(features, labels, seed))
            .collect()
    }

    fn train_tree(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
        seed: u64,
    ) -> Result<FittedDecisionTreeRegressor> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = features.nrows();
        let rows: Vec<usize> = if self.config.bootstrap {
            (0..n).map(|_| rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        DecisionTreeRegressor::from_config(self.config.tree.clone())
            .fit_rows(features, labels, rows, &mut rng)
    }
}

impl Estimator for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "RandomForestRegressor"
    }

    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
    ) -> Result<Box<dyn FittedEstimator>> {
        let fitted = RandomForestRegressor::fit(self, features, labels)?;
        Ok(Box::new(fitted))
    }
}

/// Fitted RandomForestRegressor ready for inference.
#[derive(Clone, Debug)]
pub struct FittedRandomForestRegressor {
    trees: Vec<FittedDecisionTreeRegressor>,
    n_features: usize,
}

impl FittedRandomForestRegressor {
    pub fn trees(&self) -> &[FittedDecisionTreeRegressor] {
        &self.trees
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl FittedEstimator for FittedRandomForestRegressor {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        check_n_features(&features, self.n_features)?;
        let n_trees = self.trees.len() as f64;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                let sum: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
                sum / n_trees
            })
            .collect())
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}
