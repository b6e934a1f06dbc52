//! Project-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable naming a project config file.
pub const CONFIG_ENV_VAR: &str = "DRILLHOLE_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const LOCAL_CONFIG_FILE: &str = "drillhole_config.toml";

// ============================================================================
// Output
// ============================================================================

/// Records per write batch.
pub const DEFAULT_BATCH_SIZE: usize = 2_500;

pub const TRAJECTORIES_FILE: &str = "trajectories.geojson";
pub const INTERVALS_FILE: &str = "intervals.csv";
pub const SEGMENTS_FILE: &str = "segments.geojson";
pub const RUN_REPORT_FILE: &str = "run_report.json";

// ============================================================================
// Run
// ============================================================================

/// Worker counts above this are accepted but flagged as suspicious.
pub const WORKERS_WARNING_LIMIT: usize = 256;

/// Interpolation tolerance above this (m) is flagged as suspicious.
pub const TOLERANCE_WARNING_LIMIT: f64 = 0.1;
