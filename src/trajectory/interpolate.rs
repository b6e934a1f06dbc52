//! Depth interpolation along a computed trajectory

use thiserror::Error;

use crate::types::{Point3, Trajectory};

/// Overshoot past the last vertex absorbed as floating-point round-off (m)
pub const DEFAULT_DEPTH_TOLERANCE: f64 = 1e-4;

/// Target depth could not be placed on the trajectory
#[derive(Debug, Clone, PartialEq, Error)]
#[error("hole {hole_id}: depth {depth} not found on trajectory (0 to {max_depth})")]
pub struct DepthNotFound {
    pub hole_id: String,
    pub depth: f64,
    pub max_depth: f64,
}

/// Position along a trajectory: vertex pair index plus fraction within it.
///
/// Derived ordering is lexicographic (segment first, then ratio), which is
/// the along-path order.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PathLocation {
    /// Index of the first vertex of the containing pair
    pub segment: usize,
    /// `(target - start) / (end - start)`, in `[0, 1]`
    pub ratio: f64,
}

impl Trajectory {
    /// Find the vertex pair containing `depth`.
    ///
    /// The first pair whose inclusive range `[start, end]` contains the depth
    /// wins, so a depth equal to an interior vertex resolves to the end of the
    /// earlier pair. Depths past the last vertex by no more than `tolerance`
    /// snap to it.
    pub fn locate(&self, depth: f64, tolerance: f64) -> Result<PathLocation, DepthNotFound> {
        let vertices = self.vertices();
        let max_depth = vertices.last().map_or(0.0, |v| v.m);
        let not_found = || DepthNotFound {
            hole_id: self.hole_id.clone(),
            depth,
            max_depth,
        };
        let Some(last_segment) = vertices.len().checked_sub(2) else {
            return Err(not_found());
        };

        for (segment, pair) in vertices.windows(2).enumerate() {
            let (start, end) = (pair[0].m, pair[1].m);
            if depth >= start && depth <= end {
                return Ok(PathLocation {
                    segment,
                    ratio: (depth - start) / (end - start),
                });
            }
        }

        if depth > max_depth && depth - max_depth <= tolerance {
            return Ok(PathLocation {
                segment: last_segment,
                ratio: 1.0,
            });
        }

        Err(not_found())
    }

    /// Interpolated position at `depth` (linear in x, y and z independently)
    pub fn point_at(&self, depth: f64, tolerance: f64) -> Result<Point3, DepthNotFound> {
        let loc = self.locate(depth, tolerance)?;
        let a = &self.vertices()[loc.segment];
        let b = &self.vertices()[loc.segment + 1];

        // Exact vertex coordinates at the pair ends, no lerp round-off
        if loc.ratio == 0.0 {
            return Ok(a.point());
        }
        if loc.ratio == 1.0 {
            return Ok(b.point());
        }

        let lerp = |start: f64, end: f64| start + loc.ratio * (end - start);
        Ok(Point3::new(lerp(a.x, b.x), lerp(a.y, b.y), lerp(a.z, b.z)))
    }
}
