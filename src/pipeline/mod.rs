//! Batch Pipeline
//!
//! ```text
//! DrillholeDataset
//!   → process_hole (normalise → trajectory → lab interval placement)
//!   → BatchCoordinator (rayon pool, cancellation per hole)
//!   → RunOutput { trajectories, intervals, report }
//! ```
//!
//! Hole-scoped failures never abort a run. They are logged and counted in
//! the [`RunReport`].

mod coordinator;
mod processor;
pub mod report;

pub use coordinator::{BatchCoordinator, PipelineError, RunOutput};
pub use processor::{process_hole, HoleResult};
pub use report::{RunReport, SkipCounts, SkipReason, SkippedHole};
