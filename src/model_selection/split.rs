//! Single seeded train/validation split.

use crate::error::{PipelineError, Result};
use crate::table::Table;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for TrainTestSplit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainTestSplitConfig {
    /// Fraction of rows held out, in `(0, 1)`.
    pub test_size: f64,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for TrainTestSplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.25,
            shuffle: true,
            seed: 0,
        }
    }
}

/// Rows of a table and its labels split into train and validation parts.
#[derive(Clone, Debug)]
pub struct TrainTestData {
    pub x_train: Table,
    pub x_test: Table,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}

/// Train/validation splitter.
///
/// The validation part holds `ceil(test_size * n_rows)` rows. Index lists are
/// returned in ascending order, so both parts keep the input's row order.
#[derive(Clone, Debug, Default)]
pub struct TrainTestSplit {
    config: TrainTestSplitConfig,
}

impl TrainTestSplit {
    pub fn new(test_size: f64) -> Self {
        Self {
            config: TrainTestSplitConfig {
                test_size,
                ..TrainTestSplitConfig::default()
            },
        }
    }

    pub fn from_config(config: TrainTestSplitConfig) -> Self {
        Self { config }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.config.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn config(&self) -> &TrainTestSplitConfig {
        &self.config
    }

    /// Split `0..n_rows` into `(train, test)` indices.
    ///
    /// # Errors
    /// - [`PipelineError::Configuration`] if `test_size` is outside `(0, 1)`
    /// - [`PipelineError::InsufficientData`] if either side would be empty
    pub fn split_indices(&self, n_rows: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        let test_size = self.config.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "test_size must be in (0, 1), got {test_size}"
            )));
        }
        let n_test = (test_size * n_rows as f64).ceil() as usize;
        if n_test == 0 || n_test >= n_rows {
            return Err(PipelineError::InsufficientData {
                required: 2,
                got: n_rows,
            });
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        if self.config.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
            order.shuffle(&mut rng);
        }
        let mut test = order[..n_test].to_vec();
        let mut train = order[n_test..].to_vec();
        test.sort_unstable();
        train.sort_unstable();
        Ok((train, test))
    }

    /// Split a feature table and its labels.
    pub fn split(&self, x: &Table, y: &[f64]) -> Result<TrainTestData> {
        if y.len() != x.n_rows() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} labels", x.n_rows()),
                got: format!("{} labels", y.len()),
            });
        }
        let (train, test) = self.split_indices(x.n_rows())?;
        Ok(TrainTestData {
            x_train: x.take_rows(&train)?,
            x_test: x.take_rows(&test)?,
            y_train: train.iter().map(|&i| y[i]).collect(),
            y_test: test.iter().map(|&i| y[i]).collect(),
        })
    }
}
