//! ColumnRouter for applying different transformers to different columns.
//!
//! Each group owns a disjoint set of column names and one transformer. The
//! router fits every group on its own columns only and concatenates the group
//! outputs in declaration order.

#[allow(clippy::module_inception)]
mod column_router;

pub use column_router::{ColumnGroup, ColumnRouter, FittedColumnRouter, Remainder};
