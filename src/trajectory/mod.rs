//! Trajectory Calculations
//!
//! Pure functions that turn a canonical survey into a 3D path and resolve
//! measured depths on that path. No I/O and no shared state: every function
//! here is safe to call from any worker thread.

pub mod angles;
pub mod interpolate;
pub mod methods;

pub use interpolate::{DepthNotFound, PathLocation, DEFAULT_DEPTH_TOLERANCE};
pub use methods::{integrate, section_displacement, Displacement};

use thiserror::Error;

/// Errors raised while building a trajectory
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrajectoryError {
    /// Fewer than two stations: no path can be created
    #[error("hole {hole_id}: path not created, {count} station(s) available (need at least 2)")]
    TooFewStations { hole_id: String, count: usize },

    #[error("hole {hole_id}: vertex {index} has measured depth {current} not above previous {previous}")]
    NonMonotonicDepth {
        hole_id: String,
        index: usize,
        previous: f64,
        current: f64,
    },
}
