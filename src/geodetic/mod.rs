//! Geodetic Offset Variant
//!
//! Walks a canonical survey section by section directly in longitude /
//! latitude / elevation. Each section `[md_i, md_i+1)` uses station `i`'s
//! orientation and is projected from the current running position, so
//! curvature of the earth accumulates section by section instead of in a
//! flat local frame.
//!
//! Per section of processed length `L` at inclination `I` and azimuth `A`:
//! - horizontal distance `L·|sin I|` (= `L·cos |dip|`), applied as a destination-point step on bearing `A`
//! - vertical drop `L·|cos I|` (= `L·sin |dip|`), always subtracted from elevation
//!
//! Known limitation: paths crossing the date line or passing near a pole
//! are not handled.

pub mod mercator;
pub mod vincenty;

pub use mercator::{project_point, to_web_mercator};
pub use vincenty::{spherical_offset, vincenty_direct};

use serde::{Deserialize, Serialize};

use crate::survey::CanonicalSurvey;
use crate::trajectory::angles::{cos_deg, sin_deg};
use crate::trajectory::{DepthNotFound, TrajectoryError};
use crate::types::{CoordinateFrame, Method, Point3, Station, Trajectory, Vertex};

/// Earth model for the destination-point step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeodeticModel {
    /// Vincenty direct on the WGS84 ellipsoid
    #[default]
    Ellipsoidal,
    /// North / east arc offsets on a 6 371 km sphere at the running latitude
    LocalSpherical,
}

impl GeodeticModel {
    pub fn as_str(self) -> &'static str {
        match self {
            GeodeticModel::Ellipsoidal => "ellipsoidal",
            GeodeticModel::LocalSpherical => "local_spherical",
        }
    }

    /// `(lat, lon)` reached from `(lat, lon)` after `distance` metres on `bearing`
    pub fn destination(self, lat: f64, lon: f64, bearing: f64, distance: f64) -> (f64, f64) {
        match self {
            GeodeticModel::Ellipsoidal => vincenty_direct(lat, lon, bearing, distance),
            GeodeticModel::LocalSpherical => spherical_offset(lat, lon, bearing, distance),
        }
    }
}

/// Advance `position` (lon, lat, elevation) by `length` metres along `station`'s orientation.
///
/// The section always descends: an upward inclination (> 90°, a negative
/// dip) drops by `L·sin |dip|` like its downward mirror.
fn step(position: Point3, station: &Station, length: f64, model: GeodeticModel) -> Point3 {
    let horizontal = length * sin_deg(station.inclination).abs();
    let drop = length * cos_deg(station.inclination).abs();
    let (lat, lon) = model.destination(position.y, position.x, station.azimuth, horizontal);
    Point3::new(lon, lat, position.z - drop)
}

/// Position at measured depth `target` below a geographic collar.
///
/// `collar` is `(lon, lat, elevation)`. Targets past the last station by
/// more than `tolerance` are reported as [`DepthNotFound`], as are negative
/// or non-finite targets.
pub fn position_at_depth(
    collar: Point3,
    survey: &CanonicalSurvey,
    target: f64,
    model: GeodeticModel,
    tolerance: f64,
) -> Result<Point3, DepthNotFound> {
    let max_depth = survey.max_depth();
    let not_found = || DepthNotFound {
        hole_id: survey.hole_id().to_string(),
        depth: target,
        max_depth,
    };

    if survey.is_empty() || !(target >= 0.0) {
        return Err(not_found());
    }
    let target = if target > max_depth {
        if target - max_depth > tolerance {
            return Err(not_found());
        }
        max_depth
    } else {
        target
    };

    let mut position = collar;
    for pair in survey.stations().windows(2) {
        let start = pair[0].measured_depth;
        if start >= target {
            break;
        }
        let length = pair[1].measured_depth.min(target) - start;
        position = step(position, &pair[0], length, model);
    }
    Ok(position)
}

/// Geographic trajectory with one vertex per station.
///
/// Vertices are `(lon, lat, elevation, md)`. The `method` recorded on the
/// result is the default integrator; [`Trajectory::frame`] marks it as
/// geographic.
pub fn trajectory(
    collar: Point3,
    survey: &CanonicalSurvey,
    model: GeodeticModel,
) -> Result<Trajectory, TrajectoryError> {
    let stations = survey.stations();
    if stations.len() < 2 {
        return Err(TrajectoryError::TooFewStations {
            hole_id: survey.hole_id().to_string(),
            count: stations.len(),
        });
    }

    let mut position = collar;
    let mut vertices = Vec::with_capacity(stations.len());
    vertices.push(Vertex::new(position.x, position.y, position.z, stations[0].measured_depth));
    for pair in stations.windows(2) {
        let length = pair[1].measured_depth - pair[0].measured_depth;
        position = step(position, &pair[0], length, model);
        vertices.push(Vertex::new(position.x, position.y, position.z, pair[1].measured_depth));
    }

    Ok(Trajectory::from_vertices(survey.hole_id(), Method::default(), vertices)?
        .in_frame(CoordinateFrame::Geographic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::DEFAULT_DEPTH_TOLERANCE;

    fn survey(stations: Vec<Station>) -> CanonicalSurvey {
        CanonicalSurvey::from_stations("GEO-1", stations).unwrap()
    }

    fn collar() -> Point3 {
        Point3::new(0.0, 0.0, 500.0)
    }

    /// Rough local metres between two nearby geographic points
    fn ground_distance(a: Point3, b: Point3) -> f64 {
        let dy = (b.y - a.y) * 111_320.0;
        let dx = (b.x - a.x) * 111_320.0 * a.y.to_radians().cos();
        (dx * dx + dy * dy).sqrt()
    }

    #[test]
    fn test_zero_depth_returns_collar() {
        let s = survey(vec![Station::new(0.0, 45.0, 30.0), Station::new(100.0, 45.0, 30.0)]);
        for model in [GeodeticModel::Ellipsoidal, GeodeticModel::LocalSpherical] {
            let p = position_at_depth(collar(), &s, 0.0, model, DEFAULT_DEPTH_TOLERANCE).unwrap();
            assert_eq!(p, collar());
        }
    }

    #[test]
    fn test_vertical_hole_moves_only_elevation() {
        let s = survey(vec![Station::new(0.0, 0.0, 0.0), Station::new(250.0, 0.0, 0.0)]);
        let p = position_at_depth(collar(), &s, 200.0, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
        assert!((p.z - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_north_at_equator() {
        let s = survey(vec![Station::new(0.0, 90.0, 0.0), Station::new(1000.0, 90.0, 0.0)]);
        let p = position_at_depth(collar(), &s, 1000.0, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        assert!((p.y - 0.00904).abs() < 1e-5, "lat = {}", p.y);
        assert!(p.x.abs() < 1e-12);
        assert!((p.z - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_section_uses_upper_station_orientation() {
        // Vertical first section, then a horizontal one heading east
        let s = survey(vec![
            Station::new(0.0, 0.0, 0.0),
            Station::new(100.0, 90.0, 90.0),
            Station::new(200.0, 90.0, 90.0),
        ]);
        let at_100 = position_at_depth(collar(), &s, 100.0, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        assert_eq!(at_100.x, 0.0);
        assert!((at_100.z - 400.0).abs() < 1e-9);

        let at_150 = position_at_depth(collar(), &s, 150.0, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        assert!(at_150.x > 0.0);
        assert!((at_150.z - 400.0).abs() < 1e-9);
        assert!((ground_distance(at_100, at_150) - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_models_agree_on_short_hole() {
        let s = survey(vec![
            Station::new(0.0, 30.0, 45.0),
            Station::new(80.0, 40.0, 60.0),
            Station::new(160.0, 50.0, 75.0),
        ]);
        let start = Point3::new(-70.5, -24.3, 3100.0);
        let e = position_at_depth(start, &s, 160.0, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        let sph = position_at_depth(start, &s, 160.0, GeodeticModel::LocalSpherical, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        assert!(ground_distance(e, sph) < 1.0);
        assert!((e.z - sph.z).abs() < 1e-9);
    }

    #[test]
    fn test_beyond_last_station_is_not_found() {
        let s = survey(vec![Station::new(0.0, 10.0, 0.0), Station::new(50.0, 10.0, 0.0)]);
        let model = GeodeticModel::Ellipsoidal;
        assert!(position_at_depth(collar(), &s, 50.00005, model, DEFAULT_DEPTH_TOLERANCE).is_ok());
        let err = position_at_depth(collar(), &s, 51.0, model, DEFAULT_DEPTH_TOLERANCE).unwrap_err();
        assert_eq!(err.max_depth, 50.0);
        assert!(position_at_depth(collar(), &s, -1.0, model, DEFAULT_DEPTH_TOLERANCE).is_err());
    }

    #[test]
    fn test_negative_dip_still_descends() {
        // dip -60 under the dip-positive-down convention is inclination 150
        let s = survey(vec![Station::new(0.0, 150.0, 0.0), Station::new(100.0, 150.0, 0.0)]);
        let start = Point3::new(0.0, 0.0, 1000.0);
        let p = position_at_depth(start, &s, 100.0, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        let expected = 1000.0 - 100.0 * 60f64.to_radians().sin();
        assert!((p.z - expected).abs() < 1e-9, "elevation {}", p.z);
        assert!((ground_distance(start, p) - 50.0).abs() < 0.1);

        let mirror = survey(vec![Station::new(0.0, 30.0, 0.0), Station::new(100.0, 30.0, 0.0)]);
        let q = position_at_depth(start, &mirror, 100.0, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
            .unwrap();
        assert!((p.z - q.z).abs() < 1e-9);
        assert!((p.y - q.y).abs() < 1e-12);
    }

    #[test]
    fn test_trajectory_vertices_match_walk() {
        let s = survey(vec![
            Station::new(0.0, 20.0, 10.0),
            Station::new(60.0, 25.0, 15.0),
            Station::new(130.0, 30.0, 20.0),
        ]);
        let t = trajectory(collar(), &s, GeodeticModel::Ellipsoidal).unwrap();
        assert_eq!(t.frame, CoordinateFrame::Geographic);
        for v in t.vertices() {
            let p = position_at_depth(collar(), &s, v.m, GeodeticModel::Ellipsoidal, DEFAULT_DEPTH_TOLERANCE)
                .unwrap();
            assert_eq!(p, v.point());
        }
    }
}
