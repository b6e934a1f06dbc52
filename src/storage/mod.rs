//! Output Storage
//!
//! Computed records leave the crate through [`RecordSink`] implementations:
//! - `IntervalCsvSink`: one CSV row per lab interval
//! - `TrajectoryGeoJsonSink`: one `LineString` feature per hole
//! - `SegmentGeoJsonSink`: one 3D segment feature per lab interval
//!
//! [`write_batched`] feeds a sink in fixed-size batches, logging each batch
//! and a final total / succeeded / failed summary.

mod csv_sink;
mod geojson;

pub use csv_sink::IntervalCsvSink;
pub use geojson::{SegmentGeoJsonSink, TrajectoryGeoJsonSink};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::defaults::{
    INTERVALS_FILE, RUN_REPORT_FILE, SEGMENTS_FILE, TRAJECTORIES_FILE,
};
use crate::pipeline::{RunOutput, RunReport};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of writing a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl WriteSummary {
    pub fn merge(&mut self, other: WriteSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

impl std::fmt::Display for WriteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} total, {} succeeded, {} failed",
            self.total, self.succeeded, self.failed
        )
    }
}

/// Destination for computed records.
///
/// A record that cannot be represented (e.g. a segment with an unresolved
/// endpoint) is counted as failed and skipped. I/O failures abort the write.
pub trait RecordSink<R> {
    /// Write one batch
    fn write(&mut self, records: &[R]) -> Result<WriteSummary, SinkError>;

    /// Complete the output (closing brackets, flush)
    fn finish(&mut self) -> Result<(), SinkError>;

    /// Output name for logging
    fn name(&self) -> &str;
}

/// Write `records` through `sink` in batches of `batch_size`, then finish it.
pub fn write_batched<R, S>(
    sink: &mut S,
    records: &[R],
    batch_size: usize,
) -> Result<WriteSummary, SinkError>
where
    S: RecordSink<R> + ?Sized,
{
    let mut summary = WriteSummary::default();
    for batch in records.chunks(batch_size.max(1)) {
        let result = sink.write(batch)?;
        info!(
            output = sink.name(),
            "Batch edit results: {} of {} succeeded", result.succeeded, result.total
        );
        summary.merge(result);
    }
    sink.finish()?;

    if summary.failed > 0 {
        warn!(output = sink.name(), summary = %summary, "Records written with failures");
    } else {
        info!(output = sink.name(), summary = %summary, "Records written");
    }
    Ok(summary)
}

/// Write the three record outputs of a run into `dir`.
///
/// Summaries are keyed by file name and also stored on `output.report`.
pub fn write_outputs(
    output: &mut RunOutput,
    dir: &Path,
    batch_size: usize,
) -> Result<BTreeMap<String, WriteSummary>, SinkError> {
    std::fs::create_dir_all(dir).map_err(|source| SinkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut summaries = BTreeMap::new();

    let path = dir.join(TRAJECTORIES_FILE);
    let mut sink = TrajectoryGeoJsonSink::create(&path)?;
    let summary = write_batched(&mut sink, &output.trajectories, batch_size)?;
    summaries.insert(TRAJECTORIES_FILE.to_string(), summary);

    let path = dir.join(INTERVALS_FILE);
    let mut sink = IntervalCsvSink::create(&path)?;
    let summary = write_batched(&mut sink, &output.intervals, batch_size)?;
    summaries.insert(INTERVALS_FILE.to_string(), summary);

    let path = dir.join(SEGMENTS_FILE);
    let mut sink = SegmentGeoJsonSink::create(&path)?;
    let summary = write_batched(&mut sink, &output.intervals, batch_size)?;
    summaries.insert(SEGMENTS_FILE.to_string(), summary);

    output.report.outputs.extend(summaries.clone());
    Ok(summaries)
}

/// Write the run report as pretty JSON to `dir/run_report.json`
pub fn write_report(report: &RunReport, dir: &Path) -> Result<PathBuf, SinkError> {
    let path = dir.join(RUN_REPORT_FILE);
    let json = serde_json::to_string_pretty(report).map_err(|source| SinkError::Encode {
        what: "run report",
        source,
    })?;
    std::fs::write(&path, json).map_err(|source| SinkError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "Run report written");
    Ok(path)
}

/// Non-finite coordinates have no place in an output geometry
pub(crate) fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts even numbers, fails odd ones
    struct EvenSink {
        batches: Vec<usize>,
        finished: bool,
    }

    impl RecordSink<u32> for EvenSink {
        fn write(&mut self, records: &[u32]) -> Result<WriteSummary, SinkError> {
            self.batches.push(records.len());
            let succeeded = records.iter().filter(|r| *r % 2 == 0).count();
            Ok(WriteSummary {
                total: records.len(),
                succeeded,
                failed: records.len() - succeeded,
            })
        }

        fn finish(&mut self) -> Result<(), SinkError> {
            self.finished = true;
            Ok(())
        }

        fn name(&self) -> &str {
            "even"
        }
    }

    #[test]
    fn test_batches_and_summary() {
        let mut sink = EvenSink {
            batches: Vec::new(),
            finished: false,
        };
        let records: Vec<u32> = (0..7).collect();
        let summary = write_batched(&mut sink, &records, 3).unwrap();
        assert_eq!(sink.batches, vec![3, 3, 1]);
        assert!(sink.finished);
        assert_eq!(
            summary,
            WriteSummary {
                total: 7,
                succeeded: 4,
                failed: 3
            }
        );
    }

    #[test]
    fn test_empty_input_still_finishes() {
        let mut sink = EvenSink {
            batches: Vec::new(),
            finished: false,
        };
        let empty: [u32; 0] = [];
        let summary = write_batched(&mut sink, &empty, 10).unwrap();
        assert!(sink.batches.is_empty());
        assert!(sink.finished);
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_zero_batch_size_treated_as_one() {
        let mut sink = EvenSink {
            batches: Vec::new(),
            finished: false,
        };
        write_batched(&mut sink, &[2u32, 4], 0).unwrap();
        assert_eq!(sink.batches, vec![1, 1]);
    }
}
