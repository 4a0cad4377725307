//! Data preprocessing transformers for tabular pipelines.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! Fitting consumes a borrowed [`Table`](crate::table::Table) and returns a new
//! fitted value; transforming borrows both and returns a new owned table.
//!
//! # Available Transformers
//!
//! ## Imputation
//! - [`SimpleImputer`]: Fill missing values with mean, median, most_frequent, or constant
//!
//! ## Encoding
//! - [`OneHotEncoder`]: Expand categorical columns into indicator columns
//!
//! ## Composition
//! - [`ColumnRouter`]: Apply different transformers to disjoint column groups
//! - [`TransformerStep`]: Any of the above, or a transformer-only
//!   [`Pipeline`](crate::pipeline::Pipeline)
//!
//! # Example
//!
//! ```
//! use machinelearne_pipeline::preprocessing::{
//!     ColumnRouter, FittedTransformer, ImputeStrategy, OneHotEncoder, SimpleImputer, Transformer,
//! };
//! use machinelearne_pipeline::table::{Column, Table};
//!
//! let train = Table::new()
//!     .with_column("rooms", Column::numeric([Some(3.0), Some(2.0)]))?
//!     .with_column("suburb", Column::categorical([Some("A"), Some("B")]))?;
//!
//! let router = ColumnRouter::new()
//!     .add_group("num", SimpleImputer::new(ImputeStrategy::Median), &["rooms"])?
//!     .add_group("cat", OneHotEncoder::new(), &["suburb"])?;
//!
//! let fitted = router.fit(&train)?;
//! assert_eq!(fitted.feature_names_out(), vec!["rooms", "suburb_A", "suburb_B"]);
//! # Ok::<(), machinelearne_pipeline::PipelineError>(())
//! ```

pub mod column_router;
pub mod encoding;
pub mod imputation;
pub mod step;
pub mod traits;

// Re-export main types
pub use column_router::{ColumnGroup, ColumnRouter, FittedColumnRouter, Remainder};
pub use encoding::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderConfig};
pub use imputation::{
    DegeneratePolicy, FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerConfig,
};
pub use step::{FittedTransformerStep, TransformerStep};
pub use traits::{FittedTransformer, Transformer};
