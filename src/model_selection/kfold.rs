//! K-fold partitioning of row indices.

use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for KFold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KFoldConfig {
    /// Number of folds, at least 2.
    pub n_splits: usize,
    /// Shuffle rows before cutting folds; otherwise folds are contiguous.
    pub shuffle: bool,
    /// Seed for the shuffle.
    pub seed: u64,
}

impl Default for KFoldConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle: false,
            seed: 0,
        }
    }
}

/// One train/held-out partition. Both index lists are ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// K-fold splitter.
///
/// The first `n_rows % n_splits` folds hold one row more than the rest. Every
/// row appears in exactly one held-out set.
///
/// # Example
/// ```
/// use machinelearne_pipeline::model_selection::KFold;
///
/// let folds = KFold::new(3).split(7)?;
/// assert_eq!(folds[0].test, vec![0, 1, 2]);
/// assert_eq!(folds[1].test, vec![3, 4]);
/// assert_eq!(folds[2].train, vec![0, 1, 2, 3, 4]);
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct KFold {
    config: KFoldConfig,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            config: KFoldConfig {
                n_splits,
                ..KFoldConfig::default()
            },
        }
    }

    pub fn from_config(config: KFoldConfig) -> Self {
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

    pub fn config(&self) -> &KFoldConfig {
        &self.config
    }

    pub fn n_splits(&self) -> usize {
        self.config.n_splits
    }

    /// Partition `0..n_rows` into folds.
    ///
    /// # Errors
    /// - [`PipelineError::Configuration`] if `n_splits < 2`
    /// - [`PipelineError::InsufficientData`] if `n_splits > n_rows`
    pub fn split(&self, n_rows: usize) -> Result<Vec<Fold>> {
        let k = self.config.n_splits;
        if k < 2 {
            return Err(PipelineError::Configuration(format!(
                "n_splits must be at least 2, got {k}"
            )));
        }
        if k > n_rows {
            return Err(PipelineError::InsufficientData {
                required: k,
                got: n_rows,
            });
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        if self.config.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
            order.shuffle(&mut rng);
        }

        let base = n_rows / k;
        let extra = n_rows % k;
        let mut folds = Vec::with_capacity(k);
        let mut start = 0;
        for index in 0..k {
            let size = base + usize::from(index < extra);
            let end = start + size;

            let mut test = order[start..end].to_vec();
            test.sort_unstable();
            let mut train: Vec<usize> = order[..start]
                .iter()
                .chain(&order[end..])
                .copied()
                .collect();
            train.sort_unstable();

            folds.push(Fold { index, train, test });
            start = end;
        }
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kfold_contiguous_sizes() {
        let folds = KFold::new(3).split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(folds[1].test, vec![4, 5, 6]);
        assert_eq!(folds[1].train, vec![0, 1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn test_kfold_coverage() {
        for shuffle in [false, true] {
            let folds = KFold::new(4).with_shuffle(shuffle).with_seed(9).split(11).unwrap();
            let mut held_out: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
            held_out.sort_unstable();
            assert_eq!(held_out, (0..11).collect::<Vec<_>>());

            for fold in &folds {
                assert_eq!(fold.train.len() + fold.test.len(), 11);
                assert!(fold.test.iter().all(|i| !fold.train.contains(i)));
                assert!(fold.test.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_kfold_shuffle_is_seeded() {
        let a = KFold::new(3).with_shuffle(true).with_seed(1).split(30).unwrap();
        let b = KFold::new(3).with_shuffle(true).with_seed(1).split(30).unwrap();
        let c = KFold::new(3).with_shuffle(true).with_seed(2).split(30).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a[0].test, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_kfold_too_many_splits() {
        let result = KFold::new(5).split(4);
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientData { required: 5, got: 4 })
        ));
    }

    #[test]
    fn test_kfold_single_split() {
        assert!(matches!(
            KFold::new(1).split(10),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_kfold_leave_one_out() {
        let folds = KFold::new(3).split(3).unwrap();
        assert_eq!(folds[2].test, vec![2]);
        assert_eq!(folds[2].train, vec![0, 1]);
    }
}
