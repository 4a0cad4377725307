//! Composable preprocessing and estimator pipelines for tabular regression.
//!
//! The crate is organised leaf-first:
//!
//! - [`table`]: typed, column-oriented [`Table`](table::Table) with explicit
//!   numeric/categorical kinds and a schema-driven CSV loader.
//! - [`preprocessing`]: [`SimpleImputer`](preprocessing::SimpleImputer),
//!   [`OneHotEncoder`](preprocessing::OneHotEncoder) and the
//!   [`ColumnRouter`](preprocessing::ColumnRouter) that applies them to
//!   disjoint column groups.
//! - [`pipeline`]: named chains of transformers ending in an optional
//!   estimator. Pipelines nest.
//! - [`model`]: the [`Estimator`](model::Estimator) interface with a CART
//!   [`DecisionTreeRegressor`](model::DecisionTreeRegressor) and a seeded
//!   [`RandomForestRegressor`](model::RandomForestRegressor).
//! - [`model_selection`]: k-fold splitting, hold-out splits and the
//!   leakage-free [`CrossValidator`](model_selection::CrossValidator).
//! - [`metrics`] and [`config`].
//!
//! # Example
//!
//! ```
//! use machinelearne_pipeline::metrics::mean_absolute_error;
//! use machinelearne_pipeline::model::RandomForestRegressor;
//! use machinelearne_pipeline::model_selection::cross_val_score;
//! use machinelearne_pipeline::pipeline::Pipeline;
//! use machinelearne_pipeline::preprocessing::{
//!     ColumnRouter, ImputeStrategy, OneHotEncoder, SimpleImputer,
//! };
//! use machinelearne_pipeline::table::{Column, Table};
//!
//! let rooms = [Some(3.0), Some(2.0), None, Some(4.0), Some(3.0), Some(1.0)];
//! let suburb = ["A", "B", "A", "B", "A", "B"].map(Some);
//! let x = Table::new()
//!     .with_column("rooms", Column::numeric(rooms))?
//!     .with_column("suburb", Column::categorical(suburb))?;
//! let y = [100.0, 150.0, 120.0, 210.0, 110.0, 90.0];
//!
//! let make_pipeline = || {
//!     let preprocessor = ColumnRouter::new()
//!         .add_group("num", SimpleImputer::new(ImputeStrategy::Median), &["rooms"])?
//!         .add_group("cat", OneHotEncoder::new(), &["suburb"])?;
//!     Pipeline::new()
//!         .add_transformer("preprocessor", preprocessor)?
//!         .add_estimator("model", RandomForestRegressor::new().with_n_estimators(20).with_seed(0))
//! };
//!
//! let scores = cross_val_score(make_pipeline, &x, &y, 3, mean_absolute_error)?;
//! assert_eq!(scores.len(), 3);
//! # Ok::<(), machinelearne_pipeline::PipelineError>(())
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod model_selection;
pub mod pipeline;
pub mod preprocessing;
pub mod table;

pub use error::{PipelineError, Result};
