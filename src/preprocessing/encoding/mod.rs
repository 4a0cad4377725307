//! Categorical feature encoding transformers.
//!
//! ## OneHotEncoder
//! Expands each categorical column into binary indicator columns.
//!
//! ```text
//! suburb: ["A", "B", "A"]  ->  suburb_A: [1, 0, 1], suburb_B: [0, 1, 0]
//! ```
//!
//! Categories seen only at transform time are governed by [`HandleUnknown`].

mod one_hot;

pub use one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderConfig};

/// Strategy for handling unknown categories during transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Raise [`PipelineError::UnknownCategory`](crate::PipelineError::UnknownCategory).
    Error,
    /// Encode the row as all zeros for that column's indicators.
    #[default]
    Ignore,
}
