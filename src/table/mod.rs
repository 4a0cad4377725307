//! Typed, column-oriented tables.
//!
//! A [`Table`] is an ordered set of uniquely named columns of equal length.
//! Each column carries its semantic kind explicitly ([`ColumnKind::Numeric`] or
//! [`ColumnKind::Categorical`]); kinds are declared by the caller when the
//! column is built (or through a [`Schema`] when loading CSV) and are never
//! inferred from values.
//!
//! Tables are immutable values. Row selection, column selection and
//! concatenation all return new owned tables, so transformers can borrow their
//! input read-only and hand back fresh output.
//!
//! # Example
//! ```
//! use machinelearne_pipeline::table::{Column, Table};
//!
//! let table = Table::new()
//!     .with_column("rooms", Column::numeric([Some(3.0), Some(2.0), None]))?
//!     .with_column("suburb", Column::categorical([Some("A"), Some("B"), Some("A")]))?;
//!
//! assert_eq!(table.n_rows(), 3);
//! assert_eq!(table.column("rooms").map(|c| c.n_missing()), Some(1));
//! # Ok::<(), machinelearne_pipeline::PipelineError>(())
//! ```

pub mod loader;

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub use loader::{from_reader, read_csv};

/// Semantic type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Real-valued column.
    Numeric,
    /// Column of string labels.
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// A single cell value, used for learned statistics and fill constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Label(String),
}

impl Value {
    /// The column kind this value can be stored in.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Number(_) => ColumnKind::Numeric,
            Value::Label(_) => ColumnKind::Categorical,
        }
    }

    /// The numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Label(_) => None,
        }
    }

    /// The label payload, if any.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Label(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Label(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Label(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Label(s)
    }
}

/// Column storage. `None` marks a missing entry; numeric `NaN` is treated as
/// missing as well.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    /// Build a numeric column.
    pub fn numeric(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Column::Numeric(values.into_iter().collect())
    }

    /// Build a categorical column.
    pub fn categorical<S: Into<String>>(values: impl IntoIterator<Item = Option<S>>) -> Self {
        Column::Categorical(values.into_iter().map(|v| v.map(Into::into)).collect())
    }

    /// Build a numeric column with no missing entries.
    pub fn from_f64(values: impl IntoIterator<Item = f64>) -> Self {
        Column::Numeric(values.into_iter().map(Some).collect())
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the entry at `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => !matches!(v.get(row), Some(Some(x)) if !x.is_nan()),
            Column::Categorical(v) => !matches!(v.get(row), Some(Some(_))),
        }
    }

    /// Number of missing entries.
    pub fn n_missing(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Number of distinct non-missing values.
    pub fn n_unique(&self) -> usize {
        match self {
            Column::Numeric(v) => v
                .iter()
                .flatten()
                .filter(|x| !x.is_nan())
                .map(|x| x.to_bits())
                .collect::<HashSet<_>>()
                .len(),
            Column::Categorical(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
        }
    }

    /// The value at `row`, or `None` if missing or out of range.
    pub fn get(&self, row: usize) -> Option<Value> {
        if self.is_missing(row) {
            return None;
        }
        match self {
            Column::Numeric(v) => v[row].map(Value::Number),
            Column::Categorical(v) => v[row].clone().map(Value::Label),
        }
    }

    /// Gather the given rows into a new column. Indices may repeat.
    fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named, typed column declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered list of column declarations.
///
/// Used to load delimited data with explicit column kinds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a numeric column.
    pub fn numeric(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind: ColumnKind::Numeric,
        });
        self
    }

    /// Declare a categorical column.
    pub fn categorical(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind: ColumnKind::Categorical,
        });
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up the declared kind of a column.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }
}

/// An ordered set of named columns of equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Create an empty table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with no columns but a fixed row count.
    pub fn empty(n_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows,
        }
    }

    /// Build a table from `(name, column)` pairs.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> Result<Self> {
        columns
            .into_iter()
            .try_fold(Table::new(), |table, (name, column)| {
                table.with_column(name, column)
            })
    }

    /// Append a column, consuming and returning the table.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column in place.
    ///
    /// The first column fixes the row count of a table created with
    /// [`Table::new`]; later columns must match it.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(PipelineError::Configuration(format!(
                "duplicate column name '{name}'"
            )));
        }
        if self.columns.is_empty() && self.n_rows == 0 {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} rows", self.n_rows),
                got: format!("{} rows in column '{}'", column.len(), name),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Look up a column, failing with [`PipelineError::UnknownColumn`].
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| PipelineError::UnknownColumn {
            column: name.to_string(),
        })
    }

    /// Iterate `(name, column)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    /// The schema implied by this table's columns.
    pub fn schema(&self) -> Schema {
        Schema {
            fields: self
                .iter()
                .map(|(name, column)| Field {
                    name: name.to_string(),
                    kind: column.kind(),
                })
                .collect(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// New table with only the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let mut out = Table::empty(self.n_rows);
        for name in names {
            let name = name.as_ref();
            let column = self.require_column(name)?;
            out.push_column(name, column.clone())?;
        }
        Ok(out)
    }

    /// New table without the named columns. Unknown names are ignored.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let drop: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let mut out = Table::empty(self.n_rows);
        for (name, column) in self.iter() {
            if !drop.contains(name) {
                out.names.push(name.to_string());
                out.columns.push(column.clone());
            }
        }
        out
    }

    /// New table with the given rows, in the given order. Indices may repeat.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Table> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("row index < {}", self.n_rows),
                got: format!("row index {bad}"),
            });
        }
        Ok(Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            n_rows: indices.len(),
        })
    }

    /// Concatenate tables column-wise. All tables must share a row count and
    /// column names must stay unique.
    pub fn hconcat(tables: impl IntoIterator<Item = Table>) -> Result<Table> {
        let mut iter = tables.into_iter();
        let Some(mut out) = iter.next() else {
            return Ok(Table::new());
        };
        for table in iter {
            if table.n_rows != out.n_rows {
                return Err(PipelineError::ShapeMismatch {
                    expected: format!("{} rows", out.n_rows),
                    got: format!("{} rows", table.n_rows),
                });
            }
            for (name, column) in table.names.into_iter().zip(table.columns) {
                out.push_column(name, column)?;
            }
        }
        Ok(out)
    }

    /// Split a numeric label column off the table.
    ///
    /// Returns the remaining feature table and the label values. Labels must be
    /// numeric and non-missing.
    pub fn split_target(&self, target: &str) -> Result<(Table, Vec<f64>)> {
        let labels = match self.require_column(target)? {
            Column::Numeric(values) => values
                .iter()
                .enumerate()
                .map(|(row, v)| match v {
                    Some(x) if !x.is_nan() => Ok(*x),
                    _ => Err(PipelineError::MissingValues {
                        column: target.to_string(),
                        row,
                    }),
                })
                .collect::<Result<Vec<f64>>>()?,
            Column::Categorical(_) => {
                return Err(PipelineError::ColumnType {
                    column: target.to_string(),
                    expected: ColumnKind::Numeric,
                    found: ColumnKind::Categorical,
                })
            }
        };
        Ok((self.drop_columns(&[target]), labels))
    }

    /// Names of numeric columns, in table order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.names_of_kind(ColumnKind::Numeric)
    }

    /// Names of categorical columns, in table order.
    pub fn categorical_column_names(&self) -> Vec<String> {
        self.names_of_kind(ColumnKind::Categorical)
    }

    /// Categorical columns with strictly fewer than `limit` distinct values.
    ///
    /// High-cardinality columns expand into many sparse indicators; selecting
    /// the columns to encode with this helper keeps that choice explicit.
    pub fn low_cardinality_categorical(&self, limit: usize) -> Vec<String> {
        self.iter()
            .filter(|(_, c)| c.kind() == ColumnKind::Categorical && c.n_unique() < limit)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    fn names_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.iter()
            .filter(|(_, c)| c.kind() == kind)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Convert to a dense row-major feature matrix.
    ///
    /// Fails on the first categorical column, missing value or infinite
    /// value, naming the column.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let mut matrix = Array2::zeros((self.n_rows, self.columns.len()));
        for (j, (name, column)) in self.iter().enumerate() {
            let Column::Numeric(values) = column else {
                return Err(PipelineError::ColumnType {
                    column: name.to_string(),
                    expected: ColumnKind::Numeric,
                    found: ColumnKind::Categorical,
                });
            };
            for (i, v) in values.iter().enumerate() {
                match v {
                    Some(x) if x.is_finite() => matrix[[i, j]] = *x,
                    Some(x) if !x.is_nan() => {
                        return Err(PipelineError::NonFinite {
                            column: name.to_string(),
                            row: i,
                        })
                    }
                    _ => {
                        return Err(PipelineError::MissingValues {
                            column: name.to_string(),
                            row: i,
                        })
                    }
                }
            }
        }
        Ok(matrix)
    }
}
