//! Run report: the explicit result object of a batch run

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::WriteSummary;

/// Why a hole produced no trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingCollar,
    TooFewStations,
    InvalidSurvey,
    Cancelled,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::MissingCollar => "missing_collar",
            SkipReason::TooFewStations => "too_few_stations",
            SkipReason::InvalidSurvey => "invalid_survey",
            SkipReason::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedHole {
    pub hole_id: String,
    pub reason: SkipReason,
    pub message: String,
}

/// Skipped hole counts by reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub missing_collar: usize,
    pub too_few_stations: usize,
    pub invalid_survey: usize,
    pub cancelled: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingCollar => self.missing_collar += 1,
            SkipReason::TooFewStations => self.too_few_stations += 1,
            SkipReason::InvalidSurvey => self.invalid_survey += 1,
            SkipReason::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_collar + self.too_few_stations + self.invalid_survey + self.cancelled
    }
}

/// Summary of one batch run, written as `run_report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub project: String,
    pub method: String,
    pub frame: String,
    pub completed_at: DateTime<Utc>,
    pub elapsed_ms: u64,

    pub holes_total: usize,
    pub holes_succeeded: usize,
    pub holes_skipped: SkipCounts,
    /// Holes extended in a straight line to their deepest lab depth
    pub holes_extended: usize,
    pub skipped_holes: Vec<SkippedHole>,

    pub intervals_total: usize,
    /// Intervals with from, mid and to all placed
    pub intervals_resolved: usize,
    /// Individual from / mid / to endpoints left unset
    pub endpoints_unresolved: usize,

    /// Survey rows dropped for repeating a depth
    pub duplicate_rows_dropped: usize,
    pub unused_collars: usize,
    pub duplicate_collars: usize,
    /// Input rows skipped for blank required values, by table
    pub input_rows_skipped: BTreeMap<String, usize>,

    /// Write summaries by output file
    pub outputs: BTreeMap<String, WriteSummary>,
}

impl RunReport {
    pub fn new(project: &str, method: &str, frame: &str) -> Self {
        Self {
            project: project.to_string(),
            method: method.to_string(),
            frame: frame.to_string(),
            completed_at: Utc::now(),
            elapsed_ms: 0,
            holes_total: 0,
            holes_succeeded: 0,
            holes_skipped: SkipCounts::default(),
            holes_extended: 0,
            skipped_holes: Vec::new(),
            intervals_total: 0,
            intervals_resolved: 0,
            endpoints_unresolved: 0,
            duplicate_rows_dropped: 0,
            unused_collars: 0,
            duplicate_collars: 0,
            input_rows_skipped: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn record_skip(&mut self, skipped: SkippedHole) {
        self.holes_skipped.record(skipped.reason);
        self.skipped_holes.push(skipped);
    }

    /// Any output record that failed to write
    pub fn write_failures(&self) -> usize {
        self.outputs.values().map(|s| s.failed).sum()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Run: {} holes ({} succeeded, {} skipped), {} intervals ({} resolved, {} endpoints unresolved) in {} ms",
            self.holes_total,
            self.holes_succeeded,
            self.holes_skipped.total(),
            self.intervals_total,
            self.intervals_resolved,
            self.endpoints_unresolved,
            self.elapsed_ms
        )
    }
}
