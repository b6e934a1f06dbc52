//! Shared data structures for borehole trajectory reconstruction
//!
//! This module defines the records that flow through a run:
//! - Inputs: Collar, SurveyRow, LabInterval (from the external tables)
//! - Canonical: Station (inclination-from-vertical, metres)
//! - Outputs: Trajectory (3D polyline with M per vertex), IntervalEndpoints

mod survey;
mod trajectory;
mod intervals;

pub use survey::*;
pub use trajectory::*;
pub use intervals::*;
