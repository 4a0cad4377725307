//! CART regression tree with the squared-error criterion.
//!
//! Nodes live in a flat arena indexed by `usize`; a split sends rows with
//! `x[feature] <= threshold` to the left child. Trees grow from an explicit
//! work stack, so deep trees do not recurse.

use crate::error::{PipelineError, Result};
use crate::model::{check_fit_input, check_n_features, Estimator, FittedEstimator};
use ndarray::{ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Number of features considered at each split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature.
    #[default]
    All,
    /// `floor(sqrt(n_features))`, at least one.
    Sqrt,
    /// A fraction in `(0, 1]` of the features, at least one.
    Fraction(f64),
    /// An exact count in `1..=n_features`.
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a feature count for a matrix with `n_features` columns.
    pub fn resolve(&self, n_features: usize) -> Result<usize> {
        let count = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
            MaxFeatures::Fraction(f) => {
                if !(f > 0.0 && f <= 1.0) {
                    return Err(PipelineError::Configuration(format!(
                        "max_features fraction must be in (0, 1], got {f}"
                    )));
                }
                ((f * n_features as f64) as usize).max(1)
            }
            MaxFeatures::Count(c) => {
                if c == 0 || c > n_features {
                    return Err(PipelineError::Configuration(format!(
                        "max_features count must be in 1..={n_features}, got {c}"
                    )));
                }
                c
            }
        };
        Ok(count.min(n_features))
    }
}

/// Configuration for DecisionTreeRegressor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeConfig {
    /// Maximum depth; `None` grows until leaves are pure or too small.
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may split.
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split.
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

impl DecisionTreeConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(PipelineError::Configuration(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(PipelineError::Configuration(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decision tree regressor (unfitted).
///
/// # Example
/// ```
/// use machinelearne_pipeline::model::{DecisionTreeRegressor, FittedEstimator};
/// use ndarray::array;
///
/// let x = array![[1.0], [2.0], [10.0], [11.0]];
/// let y = [5.0, 5.0, 20.0, 20.0];
///
/// let tree = DecisionTreeRegressor::new().with_max_depth(1).fit(x.view(), &y)?;
/// assert_eq!(tree.predict(array![[0.0], [12.0]].view())?, vec![5.0, 20.0]);
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct DecisionTreeRegressor {
    config: DecisionTreeConfig,
    seed: u64,
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: DecisionTreeConfig) -> Self {
        Self { config, seed: 0 }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = Some(max_depth);
        self
    }

    pub fn with_min_samples_split(mut self, n: usize) -> Self {
        self.config.min_samples_split = n;
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.config.min_samples_leaf = n;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.config.max_features = max_features;
        self
    }

    /// Seed for feature subsampling. Irrelevant with [`MaxFeatures::All`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    /// Fit the tree on every row of `features`.
    pub fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
    ) -> Result<FittedDecisionTreeRegressor> {
        check_fit_input(&features, labels, "DecisionTreeRegressor")?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let rows = (0..features.nrows()).collect();
        self.fit_rows(features, labels, rows, &mut rng)
    }

    /// Fit on a multiset of row indices, drawing feature subsets from `rng`.
    pub(crate) fn fit_rows(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
        rows: Vec<usize>,
        rng: &mut ChaCha8Rng,
    ) -> Result<FittedDecisionTreeRegressor> {
        self.config.validate()?;
        let n_candidates = self.config.max_features.resolve(features.ncols())?;

        let mut builder = TreeBuilder {
            x: features.view(),
            y: labels,
            config: &self.config,
            n_candidates,
            nodes: Vec::new(),
        };
        builder.grow(rows, rng);

        Ok(FittedDecisionTreeRegressor {
            nodes: builder.nodes,
            n_features: features.ncols(),
        })
    }
}

impl Estimator for DecisionTreeRegressor {
    fn name(&self) -> &'static str {
        "DecisionTreeRegressor"
    }

    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[f64],
    ) -> Result<Box<dyn FittedEstimator>> {
        let fitted = DecisionTreeRegressor::fit(self, features, labels)?;
        Ok(Box::new(fitted))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [f64],
    config: &'a DecisionTreeConfig,
    n_candidates: usize,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, rows: Vec<usize>, rng: &mut ChaCha8Rng) {
        self.nodes.push(Node::Leaf { value: 0.0 });
        let mut stack = vec![(0usize, rows, 0usize)];

        while let Some((id, rows, depth)) = stack.pop() {
            let value = rows.iter().map(|&r| self.y[r]).sum::<f64>() / rows.len() as f64;
            let Some(split) = self.best_split(&rows, depth, rng) else {
                self.nodes[id] = Node::Leaf { value };
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&r| self.x[[r, split.feature]] <= split.threshold);
            if left_rows.is_empty() || right_rows.is_empty() {
                self.nodes[id] = Node::Leaf { value };
                continue;
            }

            let left = self.nodes.len();
            let right = left + 1;
            self.nodes.push(Node::Leaf { value: 0.0 });
            self.nodes.push(Node::Leaf { value: 0.0 });
            self.nodes[id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push((right, right_rows, depth + 1));
            stack.push((left, left_rows, depth + 1));
        }
    }

    fn best_split(
        &self,
        rows: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n = rows.len();
        let min_leaf = self.config.min_samples_leaf;
        if n < self.config.min_samples_split || n < 2 * min_leaf {
            return None;
        }
        if self.config.max_depth.is_some_and(|d| depth >= d) {
            return None;
        }
        let first = self.y[rows[0]];
        if rows.iter().all(|&r| self.y[r] == first) {
            return None;
        }

        let n_features = self.x.ncols();
        let candidates: Vec<usize> = if self.n_candidates >= n_features {
            (0..n_features).collect()
        } else {
            rand::seq::index::sample(rng, n_features, self.n_candidates).into_vec()
        };

        let total: f64 = rows.iter().map(|&r| self.y[r]).sum();
        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in candidates {
            pairs.clear();
            pairs.extend(rows.iter().map(|&r| (self.x[[r, feature]], self.y[r])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for i in 0..n - 1 {
                left_sum += pairs[i].1;
                let n_left = i + 1;
                let n_right = n - n_left;
                if pairs[i].0 == pairs[i + 1].0 || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right_sum = total - left_sum;
                // Maximising this is equivalent to minimising the children's SSE.
                let score =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if best.as_ref().map_or(true, |b| score > b.score) {
                    let (lo, hi) = (pairs[i].0, pairs[i + 1].0);
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }
        best
    }
}

/// Fitted DecisionTreeRegressor ready for inference.
#[derive(Clone, Debug)]
pub struct FittedDecisionTreeRegressor {
    nodes: Vec<Node>,
    n_features: usize,
}

impl FittedDecisionTreeRegressor {
    /// Predict a single row. The row length is not checked.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf; a single-leaf tree has depth 0.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes[id] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        max_depth
    }
}

impl FittedEstimator for FittedDecisionTreeRegressor {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        check_n_features(&features, self.n_features)?;
        Ok(features.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn step_data() -> (Array2<f64>, Vec<f64>) {
        // y depends on feature 1 only.
        let x = array![
            [0.0, 1.0],
            [5.0, 2.0],
            [1.0, 3.0],
            [4.0, 7.0],
            [2.0, 8.0],
            [3.0, 9.0],
        ];
        (x, vec![1.0, 1.0, 1.0, 10.0, 10.0, 10.0])
    }

    #[test]
    fn test_tree_fits_step_function() {
        let (x, y) = step_data();
        let tree = DecisionTreeRegressor::new().fit(x.view(), &y).unwrap();

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(x.view()).unwrap(), y);
        // Threshold is the midpoint between 3 and 7.
        assert_eq!(tree.predict(array![[0.0, 4.9], [0.0, 5.1]].view()).unwrap(), vec![1.0, 10.0]);
    }

    #[test]
    fn test_tree_max_depth_zero_is_mean() {
        let (x, y) = step_data();
        let tree = DecisionTreeRegressor::new()
            .with_max_depth(0)
            .fit(x.view(), &y)
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(array![[0.0, 0.0]].view()).unwrap(), vec![5.5]);
    }

    #[test]
    fn test_tree_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 0.0, 0.0, 100.0];
        let tree = DecisionTreeRegressor::new()
            .with_min_samples_leaf(2)
            .fit(x.view(), &y)
            .unwrap();
        // The best unconstrained split isolates row 3; with two rows per leaf
        // the split must fall between 2 and 3.
        assert_eq!(
            tree.predict(array![[1.0], [4.0]].view()).unwrap(),
            vec![0.0, 50.0]
        );
    }

    #[test]
    fn test_tree_constant_labels_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let tree = DecisionTreeRegressor::new()
            .fit(x.view(), &[4.0, 4.0, 4.0])
            .unwrap();
        assert_eq!(tree.n_leaves(), 1);
    }

    #[test]
    fn test_tree_constant_feature_cannot_split() {
        let x = array![[1.0], [1.0], [1.0]];
        let tree = DecisionTreeRegressor::new()
            .fit(x.view(), &[1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(x.view()).unwrap(), vec![2.0; 3]);
    }

    #[test]
    fn test_tree_empty_data() {
        let x = Array2::<f64>::zeros((0, 2));
        let result = DecisionTreeRegressor::new().fit(x.view(), &[]);
        assert!(matches!(result, Err(PipelineError::EmptyData(_))));
    }

    #[test]
    fn test_tree_label_length_mismatch() {
        let (x, _) = step_data();
        let result = DecisionTreeRegressor::new().fit(x.view(), &[1.0]);
        assert!(matches!(result, Err(PipelineError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_tree_predict_feature_mismatch() {
        let (x, y) = step_data();
        let tree = DecisionTreeRegressor::new().fit(x.view(), &y).unwrap();
        let result = tree.predict(array![[1.0]].view());
        assert!(matches!(result, Err(PipelineError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_tree_invalid_config() {
        let (x, y) = step_data();
        let result = DecisionTreeRegressor::new()
            .with_min_samples_split(1)
            .fit(x.view(), &y);
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_tree_rejects_infinite_feature() {
        let x = array![[f64::NEG_INFINITY], [1.0], [2.0]];
        let result = DecisionTreeRegressor::new().fit(x.view(), &[1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(PipelineError::NonFinite { row: 0, .. })
        ));
    }

    #[test]
    fn test_tree_rejects_nan_label() {
        let x = array![[0.0], [1.0]];
        let result = DecisionTreeRegressor::new().fit(x.view(), &[1.0, f64::NAN]);
        assert!(matches!(
            result,
            Err(PipelineError::NonFinite { row: 1, .. })
        ));
    }

    #[test]
    fn test_tree_huge_range_still_splits() {
        // The midpoint of the extremes overflows to infinity; the threshold
        // falls back to the lower value and both children stay non-empty.
        let x = array![[-f64::MAX], [f64::MAX]];
        let tree = DecisionTreeRegressor::new().fit(x.view(), &[1.0, 2.0]).unwrap();
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(x.view()).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::All.resolve(9).unwrap(), 9);
        assert_eq!(MaxFeatures::Sqrt.resolve(9).unwrap(), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(9).unwrap(), 4);
        assert_eq!(MaxFeatures::Fraction(0.01).resolve(9).unwrap(), 1);
        assert_eq!(MaxFeatures::Count(2).resolve(9).unwrap(), 2);
        assert!(MaxFeatures::Count(10).resolve(9).is_err());
        assert!(MaxFeatures::Fraction(0.0).resolve(9).is_err());
        assert!(MaxFeatures::Fraction(f64::NAN).resolve(9).is_err());
    }

    #[test]
    fn test_tree_feature_subsampling_is_seeded() {
        let (x, y) = step_data();
        let tree = |seed| {
            DecisionTreeRegressor::new()
                .with_max_features(MaxFeatures::Count(1))
                .with_seed(seed)
                .fit(x.view(), &y)
                .unwrap()
        };
        let probe = array![[2.5, 5.0], [4.5, 1.0]];
        assert_eq!(
            tree(7).predict(probe.view()).unwrap(),
            tree(7).predict(probe.view()).unwrap()
        );
    }

    #[test]
    fn test_tree_as_boxed_estimator() {
        let (x, y) = step_data();
        let estimator: Box<dyn Estimator> = Box::new(DecisionTreeRegressor::new());
        assert_eq!(estimator.name(), "DecisionTreeRegressor");
        let fitted = estimator.fit(x.view(), &y).unwrap();
        assert_eq!(fitted.n_features_in(), 2);
        assert_eq!(fitted.predict(x.view()).unwrap(), y);
    }
}
