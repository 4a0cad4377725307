//! Pipelines: ordered, named chains of transformer steps with an optional
//! final estimator.
//!
//! A [`Pipeline`] can be nested as a step of another pipeline or as the
//! transformer of a router group, as long as it has no estimator.

#[allow(clippy::module_inception)]
mod pipeline;

pub use pipeline::{FittedPipeline, Pipeline, PipelineStep};
