//! Model evaluation: fold construction, hold-out splits and cross-validation.
//!
//! All randomness is seeded through the splitter configuration.

pub mod cross_validation;
pub mod kfold;
pub mod split;

pub use cross_validation::{cross_val_score, CrossValidator};
pub use kfold::{Fold, KFold, KFoldConfig};
pub use split::{TrainTestData, TrainTestSplit, TrainTestSplitConfig};
