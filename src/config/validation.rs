//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never fail a load.

use std::collections::HashSet;

use super::defaults;
use crate::types::CoordinateFrame;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for ProjectConfig.
///
/// Maintained by hand to match the struct hierarchy in project_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [project]
        "project",
        "project.name",
        "project.description",
        // [units]
        "units",
        "units.length_unit",
        "units.dip_convention",
        // [fields]
        "fields",
        "fields.hole_id",
        "fields.x",
        "fields.y",
        "fields.z",
        "fields.dip",
        "fields.bearing",
        "fields.length",
        "fields.from",
        "fields.to",
        "fields.row_id",
        // [trajectory]
        "trajectory",
        "trajectory.method",
        "trajectory.frame",
        "trajectory.extend_to_lab_depth",
        "trajectory.duplicate_depth_policy",
        // [interpolation]
        "interpolation",
        "interpolation.tolerance",
        // [geodetic]
        "geodetic",
        "geodetic.model",
        // [output]
        "output",
        "output.batch_size",
        "output.web_mercator",
        // [run]
        "run",
        "run.workers",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the lexicographically smaller key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed ProjectConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must stop
/// the run; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::ProjectConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Tolerance: NaN/Inf comparisons silently pass, check explicitly
    let tol = config.interpolation.tolerance;
    if !tol.is_finite() || tol < 0.0 {
        errors.push(format!(
            "interpolation.tolerance = {tol} must be finite and >= 0"
        ));
    } else if tol > defaults::TOLERANCE_WARNING_LIMIT {
        warnings.push(ValidationWarning {
            field: "interpolation.tolerance".to_string(),
            message: format!(
                "interpolation.tolerance = {tol} m is large; depths that far past a hole's end are snapped to it"
            ),
            suggestion: None,
        });
    }

    if config.output.batch_size == 0 {
        errors.push("output.batch_size must be > 0".to_string());
    }

    if config.run.workers > defaults::WORKERS_WARNING_LIMIT {
        warnings.push(ValidationWarning {
            field: "run.workers".to_string(),
            message: format!(
                "run.workers = {} is above {} threads",
                config.run.workers,
                defaults::WORKERS_WARNING_LIMIT
            ),
            suggestion: None,
        });
    }

    if config.output.web_mercator && config.trajectory.frame == CoordinateFrame::Projected {
        warnings.push(ValidationWarning {
            field: "output.web_mercator".to_string(),
            message: "output.web_mercator only applies to the geographic frame and is ignored"
                .to_string(),
            suggestion: Some("trajectory.frame = \"geographic\"".to_string()),
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
