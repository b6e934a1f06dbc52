//! Collar / Survey / Lab Table Ingestion
//!
//! Reads the three drillhole tables from CSV. Column names come from the
//! `[fields]` config section and are matched case-insensitively against the
//! header row. Length columns are converted to metres here, once, through
//! [`crate::units::to_meters`]; nothing downstream sees feet.
//!
//! Rows with a blank required value are skipped and counted. A value that
//! is present but not a number fails the whole table, since it usually
//! means the column mapping is wrong.
//!
//! # Usage
//!
//! ```ignore
//! use drillhole_trace::tables::{read_collars, read_surveys, DrillholeDataset};
//!
//! let collars = read_collars("collars.csv", &config.fields, config.units.length_unit)?;
//! let surveys = read_surveys("surveys.csv", &config.fields, config.units.length_unit)?;
//! let dataset = DrillholeDataset::from_tables(collars.rows, surveys.rows, Vec::new());
//! ```

mod dataset;

pub use dataset::{DrillholeDataset, HoleData};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::FieldsConfig;
use crate::types::{Collar, LabInterval, SurveyRow};
use crate::units::{to_meters, LengthUnit};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: file is empty (no header row)")]
    EmptyFile { path: PathBuf },

    #[error("{path}: required column '{column}' not found in header")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}:{line}: column '{column}' value '{value}' is not a number")]
    Parse {
        path: PathBuf,
        line: usize,
        column: String,
        value: String,
    },
}

/// Rows read from one table plus what was left out
#[derive(Debug, Clone, PartialEq)]
pub struct TableLoad<T> {
    pub rows: Vec<T>,
    /// Rows with a blank required value
    pub skipped: usize,
}

// ============================================================================
// CSV Parsing Helpers
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                // "" inside quotes is a literal quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Header column positions, keyed by lower-cased name
struct ColumnMap {
    path: PathBuf,
    index: HashMap<String, usize>,
}

impl ColumnMap {
    fn from_header(path: &Path, header: &str) -> Self {
        let index = csv_split(header.trim_start_matches('\u{feff}'))
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Self {
            path: path.to_path_buf(),
            index,
        }
    }

    fn find(&self, column: &str) -> Option<usize> {
        self.index.get(&column.trim().to_lowercase()).copied()
    }

    fn require(&self, column: &str) -> Result<usize, TableError> {
        self.find(column).ok_or_else(|| TableError::MissingColumn {
            path: self.path.clone(),
            column: column.to_string(),
        })
    }
}

/// One data row with its 1-based file line and data row number
struct Row<'a> {
    path: &'a Path,
    line: usize,
    row_number: usize,
    fields: Vec<String>,
}

impl Row<'_> {
    /// Trimmed text of a column, `None` when blank or past the row end
    fn text(&self, idx: usize) -> Option<&str> {
        self.fields
            .get(idx)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Numeric value of a column, `None` when blank
    fn value(&self, idx: usize, column: &str) -> Result<Option<f64>, TableError> {
        let Some(text) = self.text(idx) else {
            return Ok(None);
        };
        // Exported tables often spell missing values as NaN or null
        if text.eq_ignore_ascii_case("nan") || text.eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        text.parse::<f64>().map(Some).map_err(|_| TableError::Parse {
            path: self.path.to_path_buf(),
            line: self.line,
            column: column.to_string(),
            value: text.to_string(),
        })
    }
}

/// Read a CSV file: `resolve` turns the header into column indices, then
/// `build` runs on each non-empty data row and returns `Ok(None)` to skip it.
fn read_table<I, T>(
    path: &Path,
    resolve: impl FnOnce(&ColumnMap) -> Result<I, TableError>,
    mut build: impl FnMut(&I, &Row<'_>) -> Result<Option<T>, TableError>,
) -> Result<TableLoad<T>, TableError> {
    let io_err = |source| TableError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let mut lines = BufReader::new(file).lines();

    let header = lines
        .next()
        .ok_or_else(|| TableError::EmptyFile {
            path: path.to_path_buf(),
        })?
        .map_err(io_err)?;
    let columns = resolve(&ColumnMap::from_header(path, &header))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    let mut row_number = 0usize;

    for (i, line) in lines.enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        row_number += 1;
        let row = Row {
            path,
            line: i + 2,
            row_number,
            fields: csv_split(&line),
        };
        match build(&columns, &row)? {
            Some(r) => rows.push(r),
            None => {
                tracing::debug!(file = %path.display(), line = row.line, "Skipping row with blank required value");
                skipped += 1;
            }
        }
    }

    tracing::info!(
        file = %path.display(),
        rows = rows.len(),
        skipped,
        "Table loaded"
    );
    Ok(TableLoad { rows, skipped })
}

// ============================================================================
// Table Readers
// ============================================================================

/// Read the collar table.
///
/// `z` is a length and is converted from `unit`; `x`/`y` belong to the
/// coordinate reference system and are kept as given.
pub fn read_collars(
    path: impl AsRef<Path>,
    fields: &FieldsConfig,
    unit: LengthUnit,
) -> Result<TableLoad<Collar>, TableError> {
    read_table(
        path.as_ref(),
        |cols| {
            Ok([
                cols.require(&fields.hole_id)?,
                cols.require(&fields.x)?,
                cols.require(&fields.y)?,
                cols.require(&fields.z)?,
                cols.require(&fields.dip)?,
                cols.require(&fields.bearing)?,
            ])
        },
        |idx: &[usize; 6], row| {
            let [hole_idx, x_idx, y_idx, z_idx, dip_idx, bearing_idx] = *idx;
            let Some(hole_id) = row.text(hole_idx) else {
                return Ok(None);
            };
            let x = row.value(x_idx, &fields.x)?;
            let y = row.value(y_idx, &fields.y)?;
            let z = row.value(z_idx, &fields.z)?;
            let dip = row.value(dip_idx, &fields.dip)?;
            let bearing = row.value(bearing_idx, &fields.bearing)?;
            let (Some(x), Some(y), Some(z), Some(dip), Some(bearing)) = (x, y, z, dip, bearing)
            else {
                return Ok(None);
            };
            Ok(Some(Collar {
                hole_id: hole_id.to_string(),
                x,
                y,
                z: to_meters(z, unit),
                top_dip: dip,
                top_bearing: bearing,
            }))
        },
    )
}

/// Read the directional survey table; `length` is converted from `unit`.
pub fn read_surveys(
    path: impl AsRef<Path>,
    fields: &FieldsConfig,
    unit: LengthUnit,
) -> Result<TableLoad<SurveyRow>, TableError> {
    read_table(
        path.as_ref(),
        |cols| {
            Ok([
                cols.require(&fields.hole_id)?,
                cols.require(&fields.length)?,
                cols.require(&fields.dip)?,
                cols.require(&fields.bearing)?,
            ])
        },
        |idx: &[usize; 4], row| {
            let [hole_idx, length_idx, dip_idx, bearing_idx] = *idx;
            let Some(hole_id) = row.text(hole_idx) else {
                return Ok(None);
            };
            let length = row.value(length_idx, &fields.length)?;
            let dip = row.value(dip_idx, &fields.dip)?;
            let bearing = row.value(bearing_idx, &fields.bearing)?;
            let (Some(length), Some(dip), Some(bearing)) = (length, dip, bearing) else {
                return Ok(None);
            };
            Ok(Some(SurveyRow {
                hole_id: hole_id.to_string(),
                measured_depth: to_meters(length, unit),
                dip,
                azimuth: bearing,
            }))
        },
    )
}

/// Read the lab interval table; `from`/`to` are converted from `unit`.
///
/// Without a `row_id` column the 1-based data row number identifies the row.
pub fn read_labs(
    path: impl AsRef<Path>,
    fields: &FieldsConfig,
    unit: LengthUnit,
) -> Result<TableLoad<LabInterval>, TableError> {
    let path = path.as_ref();
    read_table(
        path,
        |cols| {
            let row_id = cols.find(&fields.row_id);
            if row_id.is_none() {
                tracing::info!(
                    file = %path.display(),
                    column = %fields.row_id,
                    "No row id column, using row numbers"
                );
            }
            Ok((
                cols.require(&fields.hole_id)?,
                cols.require(&fields.from)?,
                cols.require(&fields.to)?,
                row_id,
            ))
        },
        |idx: &(usize, usize, usize, Option<usize>), row| {
            let (hole_idx, from_idx, to_idx, row_id_idx) = *idx;
            let Some(hole_id) = row.text(hole_idx) else {
                return Ok(None);
            };
            let from = row.value(from_idx, &fields.from)?;
            let to = row.value(to_idx, &fields.to)?;
            let (Some(from), Some(to)) = (from, to) else {
                return Ok(None);
            };
            let row_id = row_id_idx
                .and_then(|idx| row.text(idx))
                .map(str::to_string)
                .unwrap_or_else(|| row.row_number.to_string());
            Ok(Some(LabInterval {
                row_id,
                hole_id: hole_id.to_string(),
                from_depth: to_meters(from, unit),
                to_depth: to_meters(to, unit),
            }))
        },
    )
}
