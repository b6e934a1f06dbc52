//! Lab interval CSV writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{RecordSink, SinkError, WriteSummary};
use crate::types::{IntervalEndpoints, Point3};

const HEADER: [&str; 13] = [
    "row_id", "hole_id", "from_depth", "to_depth", "from_x", "from_y", "from_z", "mid_x",
    "mid_y", "mid_z", "to_x", "to_y", "to_z",
];

/// One row per lab interval; unresolved endpoints leave their cells empty.
pub struct IntervalCsvSink<W: Write> {
    writer: W,
    path: PathBuf,
}

impl IntervalCsvSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path).map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file), path)
    }
}

impl<W: Write> IntervalCsvSink<W> {
    /// Wrap `writer` and emit the header row. `path` is used in errors and logs.
    pub fn new(writer: W, path: &Path) -> Result<Self, SinkError> {
        let mut sink = Self {
            writer,
            path: path.to_path_buf(),
        };
        let header = HEADER.join(",");
        sink.line(&header)?;
        Ok(sink)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, line: &str) -> Result<(), SinkError> {
        writeln!(self.writer, "{line}").map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Quote a text cell when it contains a delimiter, quote or line break
fn text_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn number_cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

fn point_cells(p: Option<Point3>) -> [String; 3] {
    match p {
        Some(p) => [number_cell(p.x), number_cell(p.y), number_cell(p.z)],
        None => [String::new(), String::new(), String::new()],
    }
}

fn row(iv: &IntervalEndpoints) -> String {
    let mut cells = vec![
        text_cell(&iv.row_id),
        text_cell(&iv.hole_id),
        number_cell(iv.from_depth),
        number_cell(iv.to_depth),
    ];
    for p in [iv.from, iv.mid, iv.to] {
        cells.extend(point_cells(p));
    }
    cells.join(",")
}

impl<W: Write> RecordSink<IntervalEndpoints> for IntervalCsvSink<W> {
    fn write(&mut self, records: &[IntervalEndpoints]) -> Result<WriteSummary, SinkError> {
        for iv in records {
            let line = row(iv);
            self.line(&line)?;
        }
        Ok(WriteSummary {
            total: records.len(),
            succeeded: records.len(),
            failed: 0,
        })
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn name(&self) -> &str {
        "intervals_csv"
    }
}
