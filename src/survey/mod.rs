//! Survey-to-Section Normaliser
//!
//! Turns a hole's raw survey rows plus its collar into a canonical station
//! list: depth-ascending, anchored at measured depth 0, angles converted to
//! inclination from vertical and azimuth in `[0, 360)`.
//!
//! Steps:
//! 1. Validate and convert every raw row (finite, non-negative depth)
//! 2. Stable sort by measured depth
//! 3. Resolve repeated depths per [`DuplicateDepthPolicy`]
//! 4. Prepend a collar station at depth 0 if the survey has none
//! 5. Optionally extend in a straight line to the deepest lab depth

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trajectory::angles::{dip_to_inclination, normalize_azimuth};
use crate::types::{Collar, DipConvention, Point3, Station, SurveyRow};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurveyError {
    #[error("hole {hole_id}: survey rows present but no collar record")]
    MissingCollar { hole_id: String },

    #[error("hole {hole_id}: negative measured depth {depth}")]
    NegativeDepth { hole_id: String, depth: f64 },

    #[error("hole {hole_id}: non-finite {field} at measured depth {depth}")]
    NonFinite {
        hole_id: String,
        field: &'static str,
        depth: f64,
    },

    #[error("hole {hole_id}: repeated survey depth {depth}")]
    DuplicateDepth { hole_id: String, depth: f64 },

    #[error("hole {hole_id}: station {index} is not deeper than the one before it")]
    Unordered { hole_id: String, index: usize },

    #[error("hole {hole_id}: first station at depth {depth}, expected 0")]
    NotAnchored { hole_id: String, depth: f64 },
}

/// What to do when two survey rows share a measured depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDepthPolicy {
    /// Keep the first row in input order, drop the rest with a warning
    #[default]
    KeepFirst,
    /// Fail the hole with [`SurveyError::DuplicateDepth`]
    Reject,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizeOptions {
    pub convention: DipConvention,
    /// Straight-line extension target, usually the deepest lab `to_depth`
    pub extend_to_depth: Option<f64>,
    pub duplicate_policy: DuplicateDepthPolicy,
}

/// Validated station list for one hole.
///
/// First station at depth 0, depths strictly ascending, all values finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalSurvey {
    hole_id: String,
    stations: Vec<Station>,
}

impl CanonicalSurvey {
    /// Check the invariants on an already-canonical station list.
    ///
    /// An empty or single-station list is accepted; the integrator reports
    /// it as too short.
    pub fn from_stations(
        hole_id: impl Into<String>,
        stations: Vec<Station>,
    ) -> Result<Self, SurveyError> {
        let hole_id = hole_id.into();

        for s in &stations {
            check_finite(&hole_id, s)?;
        }
        if let Some(first) = stations.first() {
            if first.measured_depth != 0.0 {
                return Err(SurveyError::NotAnchored {
                    hole_id,
                    depth: first.measured_depth,
                });
            }
        }
        for (i, pair) in stations.windows(2).enumerate() {
            if pair[1].measured_depth <= pair[0].measured_depth {
                return Err(SurveyError::Unordered {
                    hole_id,
                    index: i + 1,
                });
            }
        }

        Ok(Self { hole_id, stations })
    }

    pub fn hole_id(&self) -> &str {
        &self.hole_id
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Depth of the last station, 0 for an empty survey
    pub fn max_depth(&self) -> f64 {
        self.stations.last().map_or(0.0, |s| s.measured_depth)
    }
}

/// Normaliser output
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSurvey {
    pub survey: CanonicalSurvey,
    /// Rows dropped under [`DuplicateDepthPolicy::KeepFirst`]
    pub dropped_duplicates: usize,
    /// A straight-line station was appended past the last survey shot
    pub extended: bool,
}

fn check_finite(hole_id: &str, s: &Station) -> Result<(), SurveyError> {
    let fields = [
        ("measured_depth", s.measured_depth),
        ("inclination", s.inclination),
        ("azimuth", s.azimuth),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(SurveyError::NonFinite {
                hole_id: hole_id.to_string(),
                field,
                depth: s.measured_depth,
            });
        }
    }
    Ok(())
}

fn station_from_reading(
    hole_id: &str,
    depth: f64,
    dip: f64,
    azimuth: f64,
    convention: DipConvention,
) -> Result<Station, SurveyError> {
    // Check the raw values so the error names the input column
    for (field, value) in [("measured_depth", depth), ("dip", dip), ("azimuth", azimuth)] {
        if !value.is_finite() {
            return Err(SurveyError::NonFinite {
                hole_id: hole_id.to_string(),
                field,
                depth,
            });
        }
    }
    if depth < 0.0 {
        return Err(SurveyError::NegativeDepth {
            hole_id: hole_id.to_string(),
            depth,
        });
    }
    Ok(Station::new(
        depth,
        dip_to_inclination(dip, convention),
        normalize_azimuth(azimuth),
    ))
}

/// Build the canonical survey of one hole.
///
/// `collar` is `None` when the collar table has no row for the hole, which
/// fails with [`SurveyError::MissingCollar`].
pub fn normalize(
    hole_id: &str,
    collar: Option<&Collar>,
    rows: &[SurveyRow],
    options: &NormalizeOptions,
) -> Result<NormalizedSurvey, SurveyError> {
    let collar = collar.ok_or_else(|| SurveyError::MissingCollar {
        hole_id: hole_id.to_string(),
    })?;

    let mut stations = rows
        .iter()
        .map(|r| station_from_reading(hole_id, r.measured_depth, r.dip, r.azimuth, options.convention))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: rows sharing a depth keep their input order
    stations.sort_by(|a, b| a.measured_depth.total_cmp(&b.measured_depth));

    let mut dropped_duplicates = 0;
    let mut deduped: Vec<Station> = Vec::with_capacity(stations.len() + 2);
    for station in stations {
        match deduped.last() {
            Some(prev) if prev.measured_depth == station.measured_depth => {
                match options.duplicate_policy {
                    DuplicateDepthPolicy::KeepFirst => {
                        tracing::warn!(
                            hole_id = %hole_id,
                            depth = station.measured_depth,
                            "Dropping survey row with repeated depth"
                        );
                        dropped_duplicates += 1;
                    }
                    DuplicateDepthPolicy::Reject => {
                        return Err(SurveyError::DuplicateDepth {
                            hole_id: hole_id.to_string(),
                            depth: station.measured_depth,
                        });
                    }
                }
            }
            _ => deduped.push(station),
        }
    }

    // A surveyed station at depth 0 wins over the collar orientation
    if deduped.first().map_or(true, |s| s.measured_depth != 0.0) {
        let top = station_from_reading(
            hole_id,
            0.0,
            collar.top_dip,
            collar.top_bearing,
            options.convention,
        )?;
        deduped.insert(0, top);
    }

    let mut extended = false;
    if let Some(target) = options.extend_to_depth {
        if let Some(last) = deduped.last().copied() {
            if target.is_finite() && target > last.measured_depth {
                deduped.push(Station::new(target, last.inclination, last.azimuth));
                extended = true;
            }
        }
    }

    let survey = CanonicalSurvey::from_stations(hole_id, deduped)?;
    Ok(NormalizedSurvey {
        survey,
        dropped_duplicates,
        extended,
    })
}

/// MD5 hex digest of a hole's collar position and canonical stations.
///
/// Floats are written with their exact round-trip representation, so the
/// digest changes whenever any input bit changes.
pub fn input_digest(collar: Point3, survey: &CanonicalSurvey) -> String {
    let mut content = format!(
        "{}|{:?},{:?},{:?}",
        survey.hole_id(),
        collar.x,
        collar.y,
        collar.z
    );
    for s in survey.stations() {
        content.push_str(&format!(
            "|{:?},{:?},{:?}",
            s.measured_depth, s.inclination, s.azimuth
        ));
    }
    format!("{:x}", md5::compute(content.as_bytes()))
}
