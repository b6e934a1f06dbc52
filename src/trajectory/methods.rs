//! Trajectory integration methods
//!
//! Each method turns one pair of consecutive stations into an incremental
//! displacement (north, east, true vertical depth). [`integrate`] walks the
//! canonical station list once and accumulates those increments from the
//! collar.
//!
//! ## Axis mapping
//! - `x` = collar x + east
//! - `y` = collar y + north
//! - `z` = collar z - tvd (elevation, up positive; tvd grows downward)

use super::angles::{azimuth_delta, cos_deg, sin_deg};
use super::TrajectoryError;
use crate::survey::CanonicalSurvey;
use crate::types::{Method, Point3, Station, Trajectory, Vertex};

/// Minimum angular separation (radians) used as the Radius of Curvature
/// denominator when two stations share an inclination or an azimuth.
pub const ROC_EPSILON: f64 = 1e-6;

/// Incremental displacement between two stations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub north: f64,
    pub east: f64,
    /// Vertical depth gained, positive downward
    pub tvd: f64,
}

/// Dogleg angle between two stations, in radians.
///
/// `β = acos(cos(I2−I1) − sin I1 · sin I2 · (1 − cos(A2−A1)))`
pub fn dogleg_angle(s1: &Station, s2: &Station) -> f64 {
    let cos_beta = cos_deg(s2.inclination - s1.inclination)
        - sin_deg(s1.inclination)
            * sin_deg(s2.inclination)
            * (1.0 - cos_deg(s2.azimuth - s1.azimuth));
    // Round-off can push the argument just outside acos' domain
    cos_beta.clamp(-1.0, 1.0).acos()
}

/// Minimum Curvature: circular arc through both orientation vectors, scaled
/// by the ratio factor `rf = (2/β)·tan(β/2)` (1 when β = 0).
pub fn minimum_curvature(s1: &Station, s2: &Station) -> Displacement {
    let d_md = s2.measured_depth - s1.measured_depth;
    let beta = dogleg_angle(s1, s2);
    let rf = if beta == 0.0 {
        1.0
    } else {
        (2.0 / beta) * (beta / 2.0).tan()
    };

    let (si1, si2) = (sin_deg(s1.inclination), sin_deg(s2.inclination));
    let half = d_md / 2.0;

    Displacement {
        north: half * (si1 * cos_deg(s1.azimuth) + si2 * cos_deg(s2.azimuth)) * rf,
        east: half * (si1 * sin_deg(s1.azimuth) + si2 * sin_deg(s2.azimuth)) * rf,
        tvd: half * (cos_deg(s1.inclination) + cos_deg(s2.inclination)) * rf,
    }
}

/// Average Angle: straight section along the mean inclination and azimuth.
///
/// The mean azimuth follows the shortest turn, so 350° and 10° average to 0°
/// rather than 180°.
pub fn average_angle(s1: &Station, s2: &Station) -> Displacement {
    let d_md = s2.measured_depth - s1.measured_depth;
    let incl = (s1.inclination + s2.inclination) / 2.0;
    let az = s1.azimuth + azimuth_delta(s1.azimuth, s2.azimuth) / 2.0;

    Displacement {
        north: d_md * sin_deg(incl) * cos_deg(az),
        east: d_md * sin_deg(incl) * sin_deg(az),
        tvd: d_md * cos_deg(incl),
    }
}

/// Radius of Curvature: one arc in the vertical plane, one in the horizontal.
///
/// ```text
/// Δtvd = Δmd · (sin I2 − sin I1) / (I2 − I1)
/// Δh   = Δmd · (cos I1 − cos I2) / (I2 − I1)
/// Δns  = Δh  · (sin A2 − sin A1) / (A2 − A1)
/// Δew  = Δh  · (cos A1 − cos A2) / (A2 − A1)
/// ```
///
/// When an angle pair is closer than [`ROC_EPSILON`], the pair is spread to
/// `mid ± ε/2` and the denominator is exactly `ε`, which keeps each quotient
/// at its finite limit instead of dividing by zero.
pub fn radius_of_curvature(s1: &Station, s2: &Station) -> Displacement {
    let d_md = s2.measured_depth - s1.measured_depth;

    let (i1, i2, di) = spread_pair(
        s1.inclination.to_radians(),
        s2.inclination.to_radians(),
    );
    let a1 = s1.azimuth.to_radians();
    let (a1, a2, da) = spread_pair(
        a1,
        a1 + azimuth_delta(s1.azimuth, s2.azimuth).to_radians(),
    );

    let tvd = d_md * (i2.sin() - i1.sin()) / di;
    let horizontal = d_md * (i1.cos() - i2.cos()) / di;

    Displacement {
        north: horizontal * (a2.sin() - a1.sin()) / da,
        east: horizontal * (a1.cos() - a2.cos()) / da,
        tvd,
    }
}

/// Returns `(first, second, second - first)` with the difference at least
/// [`ROC_EPSILON`] in magnitude.
fn spread_pair(first: f64, second: f64) -> (f64, f64, f64) {
    let diff = second - first;
    if diff.abs() < ROC_EPSILON {
        let mid = (first + second) / 2.0;
        let half = ROC_EPSILON / 2.0;
        (mid - half, mid + half, ROC_EPSILON)
    } else {
        (first, second, diff)
    }
}

/// Displacement for one station pair with the selected method
pub fn section_displacement(method: Method, s1: &Station, s2: &Station) -> Displacement {
    match method {
        Method::MinimumCurvature => minimum_curvature(s1, s2),
        Method::AverageAngle => average_angle(s1, s2),
        Method::RadiusOfCurvature => radius_of_curvature(s1, s2),
    }
}

/// Integrate a canonical survey into a 3D trajectory starting at `collar`.
///
/// Returns one vertex per station, the first at the collar with `m = 0`.
/// A survey with fewer than two stations yields
/// [`TrajectoryError::TooFewStations`] ("path not created").
pub fn integrate(
    survey: &CanonicalSurvey,
    collar: Point3,
    method: Method,
) -> Result<Trajectory, TrajectoryError> {
    let stations = survey.stations();
    if stations.len() < 2 {
        return Err(TrajectoryError::TooFewStations {
            hole_id: survey.hole_id().to_string(),
            count: stations.len(),
        });
    }

    let mut vertices = Vec::with_capacity(stations.len());
    vertices.push(Vertex::new(
        collar.x,
        collar.y,
        collar.z,
        stations[0].measured_depth,
    ));

    let mut total = Displacement::default();
    for pair in stations.windows(2) {
        let step = section_displacement(method, &pair[0], &pair[1]);
        total.north += step.north;
        total.east += step.east;
        total.tvd += step.tvd;

        vertices.push(Vertex::new(
            collar.x + total.east,
            collar.y + total.north,
            collar.z - total.tvd,
            pair[1].measured_depth,
        ));
    }

    Trajectory::from_vertices(survey.hole_id(), method, vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METHODS: [Method; 3] = [
        Method::MinimumCurvature,
        Method::AverageAngle,
        Method::RadiusOfCurvature,
    ];

    fn survey(stations: Vec<Station>) -> CanonicalSurvey {
        CanonicalSurvey::from_stations("TEST-1", stations).unwrap()
    }

    #[test]
    fn test_dogleg_zero_for_identical_orientation() {
        let s1 = Station::new(0.0, 35.0, 120.0);
        let s2 = Station::new(30.0, 35.0, 120.0);
        assert_eq!(dogleg_angle(&s1, &s2), 0.0);
    }

    #[test]
    fn test_dogleg_pure_build() {
        // Build from 10° to 20° at constant azimuth is a 10° dogleg
        let s1 = Station::new(0.0, 10.0, 45.0);
        let s2 = Station::new(30.0, 20.0, 45.0);
        assert!((dogleg_angle(&s1, &s2).to_degrees() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_minimum_curvature_straight_down_scenario() {
        let t = integrate(
            &survey(vec![Station::new(0.0, 0.0, 0.0), Station::new(100.0, 0.0, 0.0)]),
            Point3::new(0.0, 0.0, 0.0),
            Method::MinimumCurvature,
        )
        .unwrap();
        assert_eq!(*t.end(), Vertex::new(0.0, 0.0, -100.0, 100.0));
    }

    #[test]
    fn test_average_angle_due_east_horizontal_scenario() {
        let t = integrate(
            &survey(vec![Station::new(0.0, 90.0, 90.0), Station::new(100.0, 90.0, 90.0)]),
            Point3::new(0.0, 0.0, 0.0),
            Method::AverageAngle,
        )
        .unwrap();
        let end = t.end();
        assert!((end.x - 100.0).abs() < 1e-9, "east should be +x, got {:?}", end);
        assert!(end.y.abs() < 1e-9);
        assert!(end.z.abs() < 1e-9);
        assert_eq!(end.m, 100.0);
    }

    #[test]
    fn test_vertical_hole_all_methods() {
        let stations = vec![
            Station::new(0.0, 0.0, 0.0),
            Station::new(50.0, 0.0, 0.0),
            Station::new(120.0, 0.0, 0.0),
            Station::new(300.0, 0.0, 0.0),
        ];
        for method in ALL_METHODS {
            let t = integrate(&survey(stations.clone()), Point3::new(500.0, 800.0, 1200.0), method)
                .unwrap();
            let mut last_z = f64::INFINITY;
            for v in t.vertices() {
                assert!((v.x - 500.0).abs() < 1e-3, "{method}: x drifted: {:?}", v);
                assert!((v.y - 800.0).abs() < 1e-3, "{method}: y drifted: {:?}", v);
                assert!((v.z - (1200.0 - v.m)).abs() < 1e-6, "{method}: z != z0 - md: {:?}", v);
                assert!(v.z < last_z);
                last_z = v.z;
            }
        }
    }

    #[test]
    fn test_horizontal_hole_all_methods() {
        let stations = vec![
            Station::new(0.0, 90.0, 30.0),
            Station::new(40.0, 90.0, 30.0),
            Station::new(100.0, 90.0, 30.0),
        ];
        for method in ALL_METHODS {
            let s = survey(stations.clone());
            for pair in s.stations().windows(2) {
                let step = section_displacement(method, &pair[0], &pair[1]);
                assert!(step.tvd.abs() < 1e-6, "{method}: tvd step {}", step.tvd);
            }
            let t = integrate(&s, Point3::new(0.0, 0.0, 0.0), method).unwrap();
            for v in t.vertices() {
                let horizontal = (v.x * v.x + v.y * v.y).sqrt();
                assert!((horizontal - v.m).abs() < 1e-6, "{method}: {:?}", v);
                assert!(v.z.abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_mincurv_matches_average_angle_without_dogleg() {
        let s1 = Station::new(120.0, 37.0, 211.0);
        let s2 = Station::new(180.0, 37.0, 211.0);
        let mc = minimum_curvature(&s1, &s2);
        let aa = average_angle(&s1, &s2);
        let scale = 60.0;
        assert!((mc.north - aa.north).abs() / scale < 1e-6);
        assert!((mc.east - aa.east).abs() / scale < 1e-6);
        assert!((mc.tvd - aa.tvd).abs() / scale < 1e-6);
    }

    #[test]
    fn test_radius_of_curvature_equal_angles_is_finite() {
        let same_incl = radius_of_curvature(
            &Station::new(0.0, 45.0, 10.0),
            &Station::new(30.0, 45.0, 80.0),
        );
        let same_az = radius_of_curvature(
            &Station::new(0.0, 10.0, 60.0),
            &Station::new(30.0, 40.0, 60.0),
        );
        let both = radius_of_curvature(
            &Station::new(0.0, 45.0, 60.0),
            &Station::new(30.0, 45.0, 60.0),
        );
        for d in [same_incl, same_az, both] {
            assert!(d.north.is_finite() && d.east.is_finite() && d.tvd.is_finite(), "{:?}", d);
        }
        // Constant orientation: a straight 30 m section at 45°
        let expected = 30.0 * 45f64.to_radians().cos();
        assert!((both.tvd - expected).abs() < 1e-6);
    }

    #[test]
    fn test_methods_converge_on_gentle_build() {
        // 1° per 30 m build: all three methods agree closely
        let s1 = Station::new(0.0, 20.0, 100.0);
        let s2 = Station::new(30.0, 21.0, 101.0);
        let mc = minimum_curvature(&s1, &s2);
        let aa = average_angle(&s1, &s2);
        let rc = radius_of_curvature(&s1, &s2);
        for d in [aa, rc] {
            assert!((d.north - mc.north).abs() < 1e-3);
            assert!((d.east - mc.east).abs() < 1e-3);
            assert!((d.tvd - mc.tvd).abs() < 1e-3);
        }
    }

    #[test]
    fn test_average_angle_straddling_north() {
        // 350° -> 10° should head north, not south
        let d = average_angle(&Station::new(0.0, 90.0, 350.0), &Station::new(10.0, 90.0, 10.0));
        assert!(d.north > 9.9, "expected northward displacement, got {:?}", d);
        assert!(d.east.abs() < 1e-9);
    }

    #[test]
    fn test_integrate_rejects_single_station() {
        let result = integrate(
            &survey(vec![Station::new(0.0, 0.0, 0.0)]),
            Point3::new(0.0, 0.0, 0.0),
            Method::MinimumCurvature,
        );
        assert!(matches!(result, Err(TrajectoryError::TooFewStations { count: 1, .. })));
    }

    #[test]
    fn test_integrate_does_not_mutate_survey() {
        let s = survey(vec![Station::new(0.0, 10.0, 0.0), Station::new(50.0, 20.0, 15.0)]);
        let before = s.clone();
        let _ = integrate(&s, Point3::new(0.0, 0.0, 0.0), Method::RadiusOfCurvature);
        assert_eq!(s, before);
    }
}
