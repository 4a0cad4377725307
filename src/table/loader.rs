//! Schema-driven CSV loading.
//!
//! Column kinds come from the caller's [`Schema`]; nothing is inferred from
//! cell contents. Only schema columns are read, in schema order, and other
//! header columns are skipped.

use super::{Column, ColumnKind, Schema, Table};
use crate::error::{PipelineError, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Cell contents treated as a missing value.
const MISSING_MARKERS: &[&str] = &["", "NA", "NaN", "nan", "null", "None"];

fn is_missing_marker(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Load a CSV file with a header row.
///
/// # Example
/// ```no_run
/// use machinelearne_pipeline::table::{read_csv, Schema};
///
/// let schema = Schema::new()
///     .numeric("Rooms")
///     .categorical("Suburb")
///     .numeric("Price");
/// let table = read_csv("melb_data.csv", &schema)?;
/// # Ok::<(), machinelearne_pipeline::PipelineError>(())
/// ```
pub fn read_csv<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<Table> {
    let file = File::open(path)?;
    from_reader(BufReader::new(file), schema)
}

/// Load CSV from any reader with a header row.
pub fn from_reader<R: Read>(reader: R, schema: &Schema) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let positions = schema
        .fields()
        .iter()
        .map(|field| {
            headers
                .iter()
                .position(|h| h == field.name)
                .ok_or_else(|| PipelineError::UnknownColumn {
                    column: field.name.clone(),
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut numeric: Vec<Vec<Option<f64>>> = vec![Vec::new(); schema.len()];
    let mut categorical: Vec<Vec<Option<String>>> = vec![Vec::new(); schema.len()];

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        for (slot, (field, &pos)) in schema.fields().iter().zip(&positions).enumerate() {
            let cell = record.get(pos).unwrap_or("");
            let missing = is_missing_marker(cell);
            match field.kind {
                ColumnKind::Numeric => {
                    let value = if missing {
                        None
                    } else {
                        Some(cell.parse::<f64>().map_err(|_| PipelineError::Parse {
                            line,
                            column: field.name.clone(),
                            value: cell.to_string(),
                        })?)
                    };
                    numeric[slot].push(value);
                }
                ColumnKind::Categorical => {
                    categorical[slot].push((!missing).then(|| cell.to_string()));
                }
            }
        }
    }

    let mut table = Table::new();
    for (slot, field) in schema.fields().iter().enumerate() {
        let column = match field.kind {
            ColumnKind::Numeric => Column::Numeric(std::mem::take(&mut numeric[slot])),
            ColumnKind::Categorical => Column::Categorical(std::mem::take(&mut categorical[slot])),
        };
        table.push_column(field.name.clone(), column)?;
    }
    log::debug!(
        "loaded table with {} rows and {} columns",
        table.n_rows(),
        table.n_columns()
    );
    Ok(table)
}
