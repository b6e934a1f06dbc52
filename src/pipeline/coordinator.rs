//! Batch Coordinator - parallel trajectory reconstruction over a dataset
//!
//! ```text
//! DrillholeDataset (holes sorted by id)
//!        │
//!        ▼
//! rayon pool (run.workers threads, 0 = all cores)
//!        │   per hole: cancelled? → process_hole
//!        ▼
//! RunOutput { trajectories, intervals, report }
//! ```
//!
//! Output order follows hole id regardless of which worker finished first.

use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::processor::{process_hole, HoleResult};
use super::report::RunReport;
use crate::config::ProjectConfig;
use crate::tables::DrillholeDataset;
use crate::types::{IntervalEndpoints, Trajectory};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Everything a run produces, ready for the sinks
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub trajectories: Vec<Trajectory>,
    pub intervals: Vec<IntervalEndpoints>,
    pub report: RunReport,
}

pub struct BatchCoordinator {
    config: ProjectConfig,
}

impl BatchCoordinator {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Process every hole of `dataset`.
    ///
    /// `cancel` is checked before each hole starts; holes not started by
    /// then are reported as cancelled.
    pub fn run(
        &self,
        dataset: &DrillholeDataset,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, PipelineError> {
        let started = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.run.workers)
            .build()?;

        info!(
            holes = dataset.len(),
            intervals = dataset.lab_count(),
            workers = pool.current_num_threads(),
            method = self.config.trajectory.method.as_str(),
            "Starting batch run"
        );

        let holes: Vec<_> = dataset.holes.iter().collect();
        let results: Vec<HoleResult> = pool.install(|| {
            holes
                .par_iter()
                .map(|(hole_id, hole)| {
                    if cancel.is_cancelled() {
                        debug!(hole_id = %hole_id, "Cancelled before start");
                        return HoleResult::cancelled(hole_id, hole);
                    }
                    process_hole(hole_id, hole, &self.config)
                })
                .collect()
        });

        let mut output = self.collect(results);
        output.report.unused_collars = dataset.unused_collars;
        output.report.duplicate_collars = dataset.duplicate_collars;
        output.report.elapsed_ms = started.elapsed().as_millis() as u64;
        output.report.completed_at = Utc::now();

        info!("{}", output.report);
        Ok(output)
    }

    fn collect(&self, results: Vec<HoleResult>) -> RunOutput {
        let mut report = RunReport::new(
            &self.config.project.name,
            self.config.trajectory.method.label_in(self.config.trajectory.frame),
            self.config.trajectory.frame.as_str(),
        );
        let mut trajectories = Vec::new();
        let mut intervals = Vec::new();

        for result in results {
            report.holes_total += 1;
            report.duplicate_rows_dropped += result.dropped_duplicates;
            if result.extended {
                report.holes_extended += 1;
            }
            match (result.trajectory, result.skipped) {
                (Some(t), _) => {
                    report.holes_succeeded += 1;
                    trajectories.push(t);
                }
                (None, Some(skipped)) => report.record_skip(skipped),
                (None, None) => {}
            }
            for iv in &result.intervals {
                report.intervals_total += 1;
                if iv.unresolved_count() == 0 {
                    report.intervals_resolved += 1;
                }
                report.endpoints_unresolved += iv.unresolved_count();
            }
            intervals.extend(result.intervals);
        }

        RunOutput {
            trajectories,
            intervals,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Collar, LabInterval, SurveyRow};

    fn dataset() -> DrillholeDataset {
        let collar = |id: &str| Collar {
            hole_id: id.to_string(),
            x: 0.0,
            y: 0.0,
            z: 100.0,
            top_dip: 90.0,
            top_bearing: 0.0,
        };
        let survey = |id: &str, md: f64| SurveyRow {
            hole_id: id.to_string(),
            measured_depth: md,
            dip: 60.0,
            azimuth: 45.0,
        };
        let lab = |id: &str, row: &str, from: f64, to: f64| LabInterval {
            row_id: row.to_string(),
            hole_id: id.to_string(),
            from_depth: from,
            to_depth: to,
        };
        DrillholeDataset::from_tables(
            vec![collar("C"), collar("A")],
            vec![
                survey("A", 0.0),
                survey("A", 50.0),
                survey("C", 0.0),
                survey("C", 80.0),
                survey("B", 0.0),
                survey("B", 10.0),
            ],
            vec![lab("A", "1", 0.0, 10.0), lab("B", "2", 0.0, 5.0), lab("C", "3", 70.0, 90.0)],
        )
    }

    fn config(workers: usize) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.run.workers = workers;
        config
    }

    #[test]
    fn test_run_counts_and_order() {
        let output = BatchCoordinator::new(config(2))
            .run(&dataset(), &CancellationToken::new())
            .unwrap();
        let r = &output.report;
        assert_eq!(r.holes_total, 3);
        assert_eq!(r.holes_succeeded, 2);
        assert_eq!(r.holes_skipped.missing_collar, 1);
        assert_eq!(r.intervals_total, 3);
        assert_eq!(r.intervals_resolved, 2);
        assert_eq!(r.endpoints_unresolved, 3);
        assert_eq!(r.holes_extended, 1);

        let ids: Vec<&str> = output.trajectories.iter().map(|t| t.hole_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        let rows: Vec<&str> = output.intervals.iter().map(|i| i.row_id.as_str()).collect();
        assert_eq!(rows, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_results_independent_of_worker_count() {
        let one = BatchCoordinator::new(config(1))
            .run(&dataset(), &CancellationToken::new())
            .unwrap();
        let four = BatchCoordinator::new(config(4))
            .run(&dataset(), &CancellationToken::new())
            .unwrap();
        assert_eq!(one.trajectories, four.trajectories);
        assert_eq!(one.intervals, four.intervals);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let output = BatchCoordinator::new(config(2)).run(&dataset(), &token).unwrap();
        assert!(output.trajectories.is_empty());
        assert_eq!(output.report.holes_skipped.cancelled, 3);
        // Lab rows still come through, unresolved
        assert_eq!(output.intervals.len(), 3);
        assert_eq!(output.report.endpoints_unresolved, 9);
    }

    #[test]
    fn test_report_method_matches_trajectory_labels() {
        let projected = BatchCoordinator::new(config(1))
            .run(&dataset(), &CancellationToken::new())
            .unwrap();
        assert_eq!(projected.report.method, "minimum_curvature");

        let mut geographic = config(1);
        geographic.trajectory.frame = crate::types::CoordinateFrame::Geographic;
        let output = BatchCoordinator::new(geographic)
            .run(&dataset(), &CancellationToken::new())
            .unwrap();
        assert_eq!(output.report.method, "geodesic_sections");
        assert!(output
            .trajectories
            .iter()
            .all(|t| t.method_label() == output.report.method));
    }
}
