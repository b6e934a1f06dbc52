//! Project Configuration Module
//!
//! Run settings loaded from TOML: input units and column names, trajectory
//! method and frame, interpolation tolerance, output batching and worker
//! count.
//!
//! ## Loading Order
//!
//! 1. `DRILLHOLE_CONFIG` environment variable (path to TOML file)
//! 2. `drillhole_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded `ProjectConfig` is passed by reference to whatever needs it;
//! there is no global instance.

mod project_config;
pub mod defaults;
pub mod validation;

pub use project_config::*;
