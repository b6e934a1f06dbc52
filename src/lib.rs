//! drillhole-trace: Borehole Trajectory Reconstruction
//!
//! Reconstructs 3D drillhole paths from collar positions and directional
//! survey readings, then places depth-registered lab intervals on them.
//!
//! ## Architecture
//!
//! - **Survey Normaliser**: raw readings → canonical, depth-ordered stations
//! - **Trajectory Integrator**: Minimum Curvature, Average Angle, Radius of Curvature
//! - **Depth Interpolator**: measured depth → 3D point on a trajectory
//! - **Geodetic Variant**: section walk in longitude / latitude / elevation
//! - **Batch Pipeline**: per-hole processing on a rayon pool with a run report

pub mod config;
pub mod geodetic;
pub mod pipeline;
pub mod storage;
pub mod survey;
pub mod tables;
pub mod trajectory;
pub mod types;
pub mod units;

// Re-export project configuration
pub use config::ProjectConfig;

// Re-export commonly used types
pub use types::{
    Collar, CoordinateFrame, DipConvention, IntervalEndpoints, LabInterval, Method, Point3,
    Station, SurveyRow, Trajectory, Vertex,
};

// Re-export core operations
pub use survey::{normalize, CanonicalSurvey, SurveyError};
pub use trajectory::{integrate, DepthNotFound, TrajectoryError};

// Re-export the batch pipeline
pub use pipeline::{BatchCoordinator, RunOutput, RunReport};
