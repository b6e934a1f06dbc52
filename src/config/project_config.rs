//! Project Configuration - run settings as operator-tunable TOML values
//!
//! Every section implements `Default`, so an empty file (or no file at all)
//! runs with the built-in behaviour: metres, dip positive downward, Minimum
//! Curvature in a projected frame, extension to the deepest lab depth.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::geodetic::GeodeticModel;
use crate::survey::{DuplicateDepthPolicy, NormalizeOptions};
use crate::trajectory::DEFAULT_DEPTH_TOLERANCE;
use crate::types::{CoordinateFrame, DipConvention, Method};
use crate::units::LengthUnit;

// ============================================================================
// Config Provenance
// ============================================================================

/// Dotted key paths explicitly present in the user's TOML file.
///
/// After deserialisation every `#[serde(default)]` field has a value, so
/// this is the only record of what the user actually wrote.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvenance {
    pub explicit_keys: HashSet<String>,
}

impl ConfigProvenance {
    /// Example: `provenance.is_user_set("trajectory.method")`
    pub fn is_user_set(&self, dotted_key: &str) -> bool {
        self.explicit_keys.contains(dotted_key)
    }

    /// Explicit keys in sorted order, for display
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.explicit_keys.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Where a loaded config came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(p) => write!(f, "{}", p.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a trajectory run.
///
/// Load with `ProjectConfig::load()` which searches:
/// 1. `$DRILLHOLE_CONFIG` env var
/// 2. `./drillhole_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectInfo,

    /// Units and angle convention of the input tables
    #[serde(default)]
    pub units: UnitsConfig,

    /// Column names of the input tables
    #[serde(default)]
    pub fields: FieldsConfig,

    #[serde(default)]
    pub trajectory: TrajectoryConfig,

    #[serde(default)]
    pub interpolation: InterpolationConfig,

    #[serde(default)]
    pub geodetic: GeodeticConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub run: RunConfig,
}

impl ProjectConfig {
    /// Load configuration using the standard search order.
    ///
    /// A file that exists but fails to load is an error.
    pub fn load() -> Result<(Self, ConfigProvenance, ConfigSource), ConfigError> {
        // 1. Env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                let (config, provenance) = Self::load_from_file_with_provenance(&p)?;
                info!(path = %p.display(), project = %config.project.name, "Loaded project config from {}", defaults::CONFIG_ENV_VAR);
                return Ok((config, provenance, ConfigSource::File(p)));
            }
            warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
        }

        // 2. Working directory
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            let (config, provenance) = Self::load_from_file_with_provenance(&local)?;
            info!(project = %config.project.name, "Loaded project config from ./{}", defaults::LOCAL_CONFIG_FILE);
            return Ok((config, provenance, ConfigSource::File(local)));
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Ok((Self::default(), ConfigProvenance::default(), ConfigSource::Defaults))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let (config, _provenance) = Self::load_from_file_with_provenance(path)?;
        Ok(config)
    }

    /// Load from a specific TOML file path, also returning provenance.
    pub fn load_from_file_with_provenance(
        path: &Path,
    ) -> Result<(Self, ConfigProvenance), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents, path)
    }

    /// Parse TOML text; `origin` is only used in error messages.
    pub fn from_toml_str(
        contents: &str,
        origin: &Path,
    ) -> Result<(Self, ConfigProvenance), ConfigError> {
        // Two-pass: unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let provenance = ConfigProvenance {
            explicit_keys: super::validation::walk_toml_keys(
                &contents
                    .parse::<toml::Value>()
                    .unwrap_or(toml::Value::Table(Default::default())),
                "",
            )
            .into_iter()
            .collect(),
        };

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))?;
        config.validate()?;
        Ok((config, provenance))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate the config for internal consistency and physical ranges.
    ///
    /// Range warnings are logged; only errors fail validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        self.fields.check_distinct(&mut errors);

        let (range_errors, warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Normaliser options for a hole whose deepest lab interval ends at `lab_depth`
    pub fn normalize_options(&self, lab_depth: Option<f64>) -> NormalizeOptions {
        NormalizeOptions {
            convention: self.units.dip_convention,
            extend_to_depth: if self.trajectory.extend_to_lab_depth {
                lab_depth
            } else {
                None
            },
            duplicate_policy: self.trajectory.duplicate_depth_policy,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Project Info
// ============================================================================

/// Identification metadata, appears in logs and the run report only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default = "default_project_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

fn default_project_name() -> String {
    "DEFAULT".to_string()
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            description: String::new(),
        }
    }
}

// ============================================================================
// Units
// ============================================================================

/// Length unit and dip convention shared by all input tables.
///
/// Lengths are converted to metres once, while the tables are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitsConfig {
    #[serde(default)]
    pub length_unit: LengthUnit,

    #[serde(default)]
    pub dip_convention: DipConvention,
}

// ============================================================================
// Fields
// ============================================================================

/// Input column names, matched case-insensitively against table headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    #[serde(default = "default_hole_id_field")]
    pub hole_id: String,
    #[serde(default = "default_x_field")]
    pub x: String,
    #[serde(default = "default_y_field")]
    pub y: String,
    #[serde(default = "default_z_field")]
    pub z: String,
    #[serde(default = "default_dip_field")]
    pub dip: String,
    #[serde(default = "default_bearing_field")]
    pub bearing: String,
    /// Survey measured depth
    #[serde(default = "default_length_field")]
    pub length: String,
    /// Lab interval start depth
    #[serde(default = "default_from_field")]
    pub from: String,
    /// Lab interval end depth
    #[serde(default = "default_to_field")]
    pub to: String,
    /// Lab row identifier; the 1-based row number is used when absent
    #[serde(default = "default_row_id_field")]
    pub row_id: String,
}

fn default_hole_id_field() -> String {
    "holeID".to_string()
}
fn default_x_field() -> String {
    "x".to_string()
}
fn default_y_field() -> String {
    "y".to_string()
}
fn default_z_field() -> String {
    "z".to_string()
}
fn default_dip_field() -> String {
    "dip".to_string()
}
fn default_bearing_field() -> String {
    "bearing".to_string()
}
fn default_length_field() -> String {
    "length".to_string()
}
fn default_from_field() -> String {
    "from".to_string()
}
fn default_to_field() -> String {
    "to".to_string()
}
fn default_row_id_field() -> String {
    "row_id".to_string()
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            hole_id: default_hole_id_field(),
            x: default_x_field(),
            y: default_y_field(),
            z: default_z_field(),
            dip: default_dip_field(),
            bearing: default_bearing_field(),
            length: default_length_field(),
            from: default_from_field(),
            to: default_to_field(),
            row_id: default_row_id_field(),
        }
    }
}

impl FieldsConfig {
    /// Column names must be non-empty and distinct within each table
    fn check_distinct(&self, errors: &mut Vec<String>) {
        let tables: [(&str, Vec<(&str, &str)>); 3] = [
            (
                "collar",
                vec![
                    ("hole_id", self.hole_id.as_str()),
                    ("x", self.x.as_str()),
                    ("y", self.y.as_str()),
                    ("z", self.z.as_str()),
                    ("dip", self.dip.as_str()),
                    ("bearing", self.bearing.as_str()),
                ],
            ),
            (
                "survey",
                vec![
                    ("hole_id", self.hole_id.as_str()),
                    ("length", self.length.as_str()),
                    ("dip", self.dip.as_str()),
                    ("bearing", self.bearing.as_str()),
                ],
            ),
            (
                "lab",
                vec![
                    ("hole_id", self.hole_id.as_str()),
                    ("from", self.from.as_str()),
                    ("to", self.to.as_str()),
                    ("row_id", self.row_id.as_str()),
                ],
            ),
        ];

        for (table, columns) in &tables {
            let mut seen: Vec<(String, &str)> = Vec::new();
            for (field, column) in columns {
                let column = column.trim();
                if column.is_empty() {
                    errors.push(format!("fields.{field}: column name must not be empty"));
                    continue;
                }
                let lower = column.to_lowercase();
                if let Some((_, other)) = seen.iter().find(|(c, _)| *c == lower) {
                    errors.push(format!(
                        "fields.{field} and fields.{other} both map to column '{column}' in the {table} table"
                    ));
                } else {
                    seen.push((lower, *field));
                }
            }
        }
        // Same message from several tables is noise
        errors.dedup();
    }
}

// ============================================================================
// Trajectory
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    /// Integration method (projected frame only)
    #[serde(default)]
    pub method: Method,

    /// Frame of collar coordinates and outputs
    #[serde(default)]
    pub frame: CoordinateFrame,

    /// Extend each hole in a straight line to its deepest lab `to` depth
    #[serde(default = "default_extend_to_lab_depth")]
    pub extend_to_lab_depth: bool,

    #[serde(default)]
    pub duplicate_depth_policy: DuplicateDepthPolicy,
}

fn default_extend_to_lab_depth() -> bool {
    true
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            method: Method::default(),
            frame: CoordinateFrame::default(),
            extend_to_lab_depth: default_extend_to_lab_depth(),
            duplicate_depth_policy: DuplicateDepthPolicy::default(),
        }
    }
}

// ============================================================================
// Interpolation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Overshoot past the last vertex snapped to it (m)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_DEPTH_TOLERANCE
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

// ============================================================================
// Geodetic
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeodeticConfig {
    #[serde(default)]
    pub model: GeodeticModel,
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Records per write batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Reproject geographic outputs to web mercator (EPSG:3857)
    #[serde(default)]
    pub web_mercator: bool,
}

fn default_batch_size() -> usize {
    defaults::DEFAULT_BATCH_SIZE
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            web_mercator: false,
        }
    }
}

// ============================================================================
// Run
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Worker threads for hole processing, 0 = one per core
    #[serde(default)]
    pub workers: usize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = ProjectConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: ProjectConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.project.name, "DEFAULT");
        assert_eq!(config.units.length_unit, LengthUnit::Meters);
        assert_eq!(config.units.dip_convention, DipConvention::DipPositiveDown);
        assert_eq!(config.fields.hole_id, "holeID");
        assert_eq!(config.trajectory.method, Method::MinimumCurvature);
        assert!(config.trajectory.extend_to_lab_depth);
        assert_eq!(config.interpolation.tolerance, 1e-4);
        assert_eq!(config.output.batch_size, 2_500);
        assert_eq!(config.run.workers, 0);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[units]
length_unit = "feet"
dip_convention = "dip_negative_down"

[fields]
hole_id = "HOLE_ID"
length = "length_m"

[trajectory]
method = "radius_of_curvature"
"#;
        let config: ProjectConfig = toml::from_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.units.length_unit, LengthUnit::Feet);
        assert_eq!(config.units.dip_convention, DipConvention::DipNegativeDown);
        assert_eq!(config.fields.hole_id, "HOLE_ID");
        assert_eq!(config.fields.length, "length_m");
        assert_eq!(config.trajectory.method, Method::RadiusOfCurvature);
        // Non-overridden values retain defaults
        assert_eq!(config.fields.from, "from");
        assert_eq!(config.trajectory.frame, CoordinateFrame::Projected);
    }

    #[test]
    fn test_validation_catches_column_clash() {
        let mut config = ProjectConfig::default();
        config.fields.from = "DEPTH".to_string();
        config.fields.to = "depth".to_string();
        let result = config.validate();
        assert!(result.is_err(), "from and to sharing a column should fail");
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("fields.from") && e.contains("fields.to")));
        }
    }

    #[test]
    fn test_validation_catches_empty_column() {
        let mut config = ProjectConfig::default();
        config.fields.bearing = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_toml() {
        let original = ProjectConfig::default();
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: ProjectConfig = toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(original.fields.hole_id, roundtripped.fields.hole_id);
        assert_eq!(original.interpolation.tolerance, roundtripped.interpolation.tolerance);
        assert_eq!(original.trajectory.method, roundtripped.trajectory.method);
    }

    #[test]
    fn test_all_sections_serialize() {
        let toml_str = ProjectConfig::default().to_toml().expect("serialization should work");
        for section in [
            "[project]",
            "[units]",
            "[fields]",
            "[trajectory]",
            "[interpolation]",
            "[geodetic]",
            "[output]",
            "[run]",
        ] {
            assert!(toml_str.contains(section), "Missing {section} section");
        }
    }

    #[test]
    fn test_from_toml_str_reports_parse_error() {
        let result = ProjectConfig::from_toml_str("[trajectory]\nmethod = \"spline\"\n", Path::new("x.toml"));
        assert!(matches!(result, Err(ConfigError::Parse(_, _))));
    }

    #[test]
    fn test_provenance_tracks_explicit_keys() {
        let (_, provenance) = ProjectConfig::from_toml_str(
            "[trajectory]\nmethod = \"average_angle\"\n",
            Path::new("inline.toml"),
        )
        .unwrap();
        assert!(provenance.is_user_set("trajectory.method"));
        assert!(!provenance.is_user_set("trajectory.frame"));
        assert!(provenance.sorted_keys().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_normalize_options_respects_extension_flag() {
        let mut config = ProjectConfig::default();
        assert_eq!(config.normalize_options(Some(120.0)).extend_to_depth, Some(120.0));
        config.trajectory.extend_to_lab_depth = false;
        assert_eq!(config.normalize_options(Some(120.0)).extend_to_depth, None);
    }
}
