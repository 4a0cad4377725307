//! Imputation transformers for handling missing values.
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`SimpleImputer`] | Impute with mean, median, most_frequent, or constant |
//!
//! # Example
//!
//! ```
//! use machinelearne_pipeline::preprocessing::imputation::{ImputeStrategy, SimpleImputer};
//! use machinelearne_pipeline::preprocessing::{FittedTransformer, Transformer};
//! use machinelearne_pipeline::table::{Column, Table};
//!
//! let data = Table::new().with_column("landsize", Column::numeric([Some(120.0), None]))?;
//! let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data)?;
//! let imputed = fitted.transform(&data)?;
//! assert_eq!(imputed.column("landsize").unwrap().n_missing(), 0);
//! # Ok::<(), machinelearne_pipeline::PipelineError>(())
//! ```

pub mod simple;

pub use simple::{
    DegeneratePolicy, FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerConfig,
};
