//! Experiment configuration loaded from JSON.
//!
//! Every section has defaults, so a file only needs the keys it changes:
//!
//! ```json
//! {
//!   "forest": { "n_estimators": 50, "seed": 1 },
//!   "cross_validation": { "n_splits": 3, "shuffle": true }
//! }
//! ```

use crate::error::Result;
use crate::model::RandomForestConfig;
use crate::model_selection::{KFoldConfig, TrainTestSplitConfig};
use crate::preprocessing::{ImputeStrategy, OneHotEncoderConfig, SimpleImputerConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for one preprocess-fit-evaluate run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Imputation for numeric columns.
    pub numeric_imputer: SimpleImputerConfig,
    /// Imputation for categorical columns before encoding.
    pub categorical_imputer: SimpleImputerConfig,
    pub encoder: OneHotEncoderConfig,
    /// Categorical columns with this many distinct values or more are not encoded.
    pub max_categories: usize,
    pub forest: RandomForestConfig,
    pub split: TrainTestSplitConfig,
    pub cross_validation: KFoldConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            numeric_imputer: SimpleImputerConfig {
                strategy: ImputeStrategy::Median,
                ..SimpleImputerConfig::default()
            },
            categorical_imputer: SimpleImputerConfig {
                strategy: ImputeStrategy::MostFrequent,
                ..SimpleImputerConfig::default()
            },
            encoder: OneHotEncoderConfig::default(),
            max_categories: 10,
            forest: RandomForestConfig::default(),
            split: TrainTestSplitConfig::default(),
            cross_validation: KFoldConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
