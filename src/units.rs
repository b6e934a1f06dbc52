//! Length units
//!
//! Every length entering the core is in metres. Input tables carry a
//! `LengthUnit` tag and are converted here, once, at ingestion.

use serde::{Deserialize, Serialize};

/// International feet per metre
pub const FEET_PER_METER: f64 = 3.28084;

/// Unit of a length column in an input table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Meters,
    Feet,
}

impl LengthUnit {
    /// Short suffix used in logs and report headers
    pub fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Meters => "m",
            LengthUnit::Feet => "ft",
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Convert a length in `unit` to metres
pub fn to_meters(value: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Meters => value,
        LengthUnit::Feet => value / FEET_PER_METER,
    }
}
