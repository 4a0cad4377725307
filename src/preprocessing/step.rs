//! Enum dispatch over every transformer that can sit in a pipeline or a
//! router group.
//!
//! Pipelines nest through [`TransformerStep::Pipeline`], so a group can run
//! several transformers in sequence (e.g. impute then encode).

use crate::error::Result;
use crate::pipeline::{FittedPipeline, Pipeline};
use crate::preprocessing::column_router::{ColumnRouter, FittedColumnRouter};
use crate::preprocessing::encoding::{FittedOneHotEncoder, OneHotEncoder};
use crate::preprocessing::imputation::{FittedSimpleImputer, SimpleImputer};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::table::Table;

/// Enum of unfitted transformers usable as a pipeline step or router group.
#[derive(Clone, Debug)]
pub enum TransformerStep {
    SimpleImputer(SimpleImputer),
    OneHotEncoder(OneHotEncoder),
    ColumnRouter(ColumnRouter),
    /// A transformer-only pipeline.
    Pipeline(Pipeline),
}

/// Enum of fitted transformers.
#[derive(Clone, Debug)]
pub enum FittedTransformerStep {
    SimpleImputer(FittedSimpleImputer),
    OneHotEncoder(FittedOneHotEncoder),
    ColumnRouter(FittedColumnRouter),
    Pipeline(FittedPipeline),
}

impl TransformerStep {
    /// Get the step type name.
    pub fn step_name(&self) -> &'static str {
        match self {
            TransformerStep::SimpleImputer(_) => "SimpleImputer",
            TransformerStep::OneHotEncoder(_) => "OneHotEncoder",
            TransformerStep::ColumnRouter(_) => "ColumnRouter",
            TransformerStep::Pipeline(_) => "Pipeline",
        }
    }

    /// Whether this step (or anything nested in it) ends in an estimator.
    pub(crate) fn has_estimator(&self) -> bool {
        match self {
            TransformerStep::Pipeline(p) => p.has_estimator(),
            TransformerStep::ColumnRouter(r) => {
                r.groups().iter().any(|g| g.transformer().has_estimator())
            }
            TransformerStep::SimpleImputer(_) | TransformerStep::OneHotEncoder(_) => false,
        }
    }
}

impl Transformer for TransformerStep {
    type Fitted = FittedTransformerStep;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        match self {
            TransformerStep::SimpleImputer(t) => {
                t.fit(data).map(FittedTransformerStep::SimpleImputer)
            }
            TransformerStep::OneHotEncoder(t) => {
                t.fit(data).map(FittedTransformerStep::OneHotEncoder)
            }
            TransformerStep::ColumnRouter(t) => {
                t.fit(data).map(FittedTransformerStep::ColumnRouter)
            }
            TransformerStep::Pipeline(p) => {
                p.fit_state(data, None).map(FittedTransformerStep::Pipeline)
            }
        }
    }
}

impl FittedTransformerStep {
    pub fn step_name(&self) -> &'static str {
        match self {
            FittedTransformerStep::SimpleImputer(_) => "SimpleImputer",
            FittedTransformerStep::OneHotEncoder(_) => "OneHotEncoder",
            FittedTransformerStep::ColumnRouter(_) => "ColumnRouter",
            FittedTransformerStep::Pipeline(_) => "Pipeline",
        }
    }
}

impl FittedTransformer for FittedTransformerStep {
    fn transform(&self, data: &Table) -> Result<Table> {
        match self {
            FittedTransformerStep::SimpleImputer(t) => t.transform(data),
            FittedTransformerStep::OneHotEncoder(t) => t.transform(data),
            FittedTransformerStep::ColumnRouter(t) => t.transform(data),
            FittedTransformerStep::Pipeline(t) => t.transform(data),
        }
    }

    fn feature_names_in(&self) -> &[String] {
        match self {
            FittedTransformerStep::SimpleImputer(t) => t.feature_names_in(),
            FittedTransformerStep::OneHotEncoder(t) => t.feature_names_in(),
            FittedTransformerStep::ColumnRouter(t) => t.feature_names_in(),
            FittedTransformerStep::Pipeline(t) => t.feature_names_in(),
        }
    }

    fn feature_names_out(&self) -> Vec<String> {
        match self {
            FittedTransformerStep::SimpleImputer(t) => t.feature_names_out(),
            FittedTransformerStep::OneHotEncoder(t) => t.feature_names_out(),
            FittedTransformerStep::ColumnRouter(t) => t.feature_names_out(),
            FittedTransformerStep::Pipeline(t) => t.feature_names_out(),
        }
    }
}

impl From<SimpleImputer> for TransformerStep {
    fn from(t: SimpleImputer) -> Self {
        TransformerStep::SimpleImputer(t)
    }
}

impl From<OneHotEncoder> for TransformerStep {
    fn from(t: OneHotEncoder) -> Self {
        TransformerStep::OneHotEncoder(t)
    }
}

impl From<ColumnRouter> for TransformerStep {
    fn from(t: ColumnRouter) -> Self {
        TransformerStep::ColumnRouter(t)
    }
}

impl From<Pipeline> for TransformerStep {
    fn from(p: Pipeline) -> Self {
        TransformerStep::Pipeline(p)
    }
}
