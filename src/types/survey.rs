//! Survey input records and the canonical station

use serde::{Deserialize, Serialize};

/// How the dip column of a survey or collar table is expressed.
///
/// The core works in inclination from vertical (0 = straight down,
/// 90 = horizontal). Conversion happens once, in the normaliser, through
/// [`crate::trajectory::angles::dip_to_inclination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DipConvention {
    /// Dip from horizontal, positive downward (90 = straight down)
    #[default]
    DipPositiveDown,
    /// Dip from horizontal, negative downward (-90 = straight down)
    DipNegativeDown,
    /// Already inclination from vertical
    Inclination,
}

impl DipConvention {
    pub fn as_str(self) -> &'static str {
        match self {
            DipConvention::DipPositiveDown => "dip_positive_down",
            DipConvention::DipNegativeDown => "dip_negative_down",
            DipConvention::Inclination => "inclination",
        }
    }
}

/// One raw directional-survey reading, lengths already in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRow {
    pub hole_id: String,
    /// Distance along the hole from the collar (m)
    pub measured_depth: f64,
    /// Dip in the table's [`DipConvention`]
    pub dip: f64,
    /// Compass bearing, degrees clockwise from north
    pub azimuth: f64,
}

/// Surface entry point of a hole.
///
/// In the projected frame `x`/`y` are easting/northing (m). In the geographic
/// frame `x` is longitude and `y` latitude (degrees). `z` is elevation (m).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collar {
    pub hole_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Collar dip in the table's [`DipConvention`]
    pub top_dip: f64,
    /// Collar bearing, degrees clockwise from north
    pub top_bearing: f64,
}

/// Canonical survey station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Measured depth along the hole (m)
    pub measured_depth: f64,
    /// Inclination from vertical (degrees, 0 = down, 90 = horizontal)
    pub inclination: f64,
    /// Azimuth in `[0, 360)` degrees clockwise from north
    pub azimuth: f64,
}

impl Station {
    pub fn new(measured_depth: f64, inclination: f64, azimuth: f64) -> Self {
        Self {
            measured_depth,
            inclination,
            azimuth,
        }
    }
}

/// Assay / sample interval on a hole, depths in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabInterval {
    /// Identifier of the originating lab row
    pub row_id: String,
    pub hole_id: String,
    pub from_depth: f64,
    pub to_depth: f64,
}

impl LabInterval {
    /// Depth halfway along the interval (sample midpoint)
    pub fn midpoint_depth(&self) -> f64 {
        (self.from_depth + self.to_depth) / 2.0
    }

    /// Interval length along the hole
    pub fn length(&self) -> f64 {
        self.to_depth - self.from_depth
    }
}
