//! Lab interval placement results

use serde::{Deserialize, Serialize};

use super::Point3;

/// Spatial endpoints of one lab interval.
///
/// An endpoint is `None` when its depth could not be resolved on the hole's
/// trajectory; the record is still emitted so the lab row is not lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalEndpoints {
    /// Identifier of the originating lab row
    pub row_id: String,
    pub hole_id: String,
    pub from_depth: f64,
    pub to_depth: f64,
    pub from: Option<Point3>,
    /// Sample midpoint, `(from_depth + to_depth) / 2`
    pub mid: Option<Point3>,
    pub to: Option<Point3>,
}

impl IntervalEndpoints {
    /// Both segment endpoints resolved (a 3D segment can be built)
    pub fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Number of unresolved endpoints among from / mid / to
    pub fn unresolved_count(&self) -> usize {
        [self.from, self.mid, self.to]
            .iter()
            .filter(|p| p.is_none())
            .count()
    }

    /// Interval length along the hole, used as the M value at `to`
    pub fn length(&self) -> f64 {
        self.to_depth - self.from_depth
    }
}
