//! Error types for pipeline, estimator and cross-validation operations.
//!
//! Every failure surfaces through [`PipelineError`]. Pipelines and routers wrap
//! the failures of their children in [`PipelineError::Step`], and the
//! cross-validator wraps per-fold failures in [`PipelineError::Fold`], so the
//! rendered message always names the step, group or fold that triggered it.
//! Use [`PipelineError::root_cause`] to match on the underlying variant.

use crate::table::ColumnKind;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for preprocessing, estimation and evaluation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An operation that needs learned state was called before `fit`.
    #[error("{unit} is not fitted; call fit before {operation}")]
    NotFitted {
        unit: String,
        operation: &'static str,
    },

    /// A configured column is absent from the table.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    /// A categorical value was not observed during fit.
    #[error("unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// A column has no usable values to learn a statistic from.
    #[error("column '{column}' has no non-missing values to compute the {strategy} statistic")]
    DegenerateColumn { column: String, strategy: String },

    /// Not enough rows for the requested split.
    #[error("insufficient data: {required} rows required, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// Invalid configuration (overlapping groups, duplicate names, bad parameters).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A column has a different semantic type than the operation requires.
    #[error("column '{column}' is {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    /// A missing value was found where none is allowed.
    #[error("column '{column}' contains missing values at row {row}")]
    MissingValues { column: String, row: usize },

    /// An infinite or NaN value reached an estimator.
    #[error("column '{column}' contains a non-finite value at row {row}")]
    NonFinite { column: String, row: usize },

    /// Row, label or feature counts disagree.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Empty data provided where non-empty was required.
    #[error("empty data: {0}")]
    EmptyData(String),

    /// A cell could not be parsed as its declared kind.
    #[error("line {line}: cannot parse '{value}' as a number in column '{column}'")]
    Parse {
        line: u64,
        column: String,
        value: String,
    },

    /// Cross-validation ran out of its time budget.
    #[error("cross-validation deadline exceeded after {completed} of {total} folds")]
    TimedOut { completed: usize, total: usize },

    /// A named pipeline step or router group failed.
    #[error("step '{step}': {source}")]
    Step {
        step: String,
        #[source]
        source: Box<PipelineError>,
    },

    /// A cross-validation fold failed.
    #[error("fold {fold}: {source}")]
    Fold {
        fold: usize,
        #[source]
        source: Box<PipelineError>,
    },

    /// I/O error while reading a table or configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wrap this error with the name of the step that raised it.
    pub fn in_step(self, step: impl Into<String>) -> Self {
        PipelineError::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// Wrap this error with the index of the fold that raised it.
    pub fn in_fold(self, fold: usize) -> Self {
        PipelineError::Fold {
            fold,
            source: Box::new(self),
        }
    }

    /// The innermost error, with step and fold context stripped.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Step { source, .. } | PipelineError::Fold { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Step names from the outermost wrapper inwards.
    pub fn step_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        loop {
            match current {
                PipelineError::Step { step, source } => {
                    path.push(step.as_str());
                    current = source;
                }
                PipelineError::Fold { source, .. } => current = source,
                _ => return path,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_column() {
        let err = PipelineError::UnknownColumn {
            column: "rooms".to_string(),
        };
        assert_eq!(err.to_string(), "unknown column 'rooms'");
    }

    #[test]
    fn test_error_display_column_type() {
        let err = PipelineError::ColumnType {
            column: "suburb".to_string(),
            expected: ColumnKind::Numeric,
            found: ColumnKind::Categorical,
        };
        assert_eq!(err.to_string(), "column 'suburb' is categorical, expected numeric");
    }

    #[test]
    fn test_error_context_names_step_and_fold() {
        let err = PipelineError::DegenerateColumn {
            column: "rooms".to_string(),
            strategy: "median".to_string(),
        }
        .in_step("num")
        .in_step("preprocessor")
        .in_fold(3);

        let msg = err.to_string();
        assert!(msg.starts_with("fold 3: step 'preprocessor': step 'num':"), "{msg}");
        assert!(msg.contains("rooms"));
        assert_eq!(err.step_path(), vec!["preprocessor", "num"]);
        assert!(matches!(
            err.root_cause(),
            PipelineError::DegenerateColumn { column, .. } if column == "rooms"
        ));
    }

    #[test]
    fn test_error_source_chain() {
        let err = PipelineError::EmptyData("no rows".to_string()).in_step("model");
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("empty data: no rows"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_root_cause_of_plain_error_is_itself() {
        let err = PipelineError::Configuration("bad".to_string());
        assert!(matches!(err.root_cause(), PipelineError::Configuration(_)));
        assert!(err.step_path().is_empty());
    }
}
