//! Degree-based trigonometry and angle conventions
//!
//! Survey angles are stored in degrees. These helpers keep the conversion to
//! radians in one place so trajectory formulas read like their textbook form.

use crate::types::DipConvention;

#[inline]
pub fn sin_deg(d: f64) -> f64 {
    d.to_radians().sin()
}

#[inline]
pub fn cos_deg(d: f64) -> f64 {
    d.to_radians().cos()
}

#[inline]
pub fn tan_deg(d: f64) -> f64 {
    d.to_radians().tan()
}

/// Convert a raw dip reading to inclination from vertical.
///
/// - `DipPositiveDown`: `inclination = 90 - dip` (dip 90 is straight down)
/// - `DipNegativeDown`: `inclination = 90 + dip` (dip -90 is straight down)
/// - `Inclination`: value is passed through
///
/// An inclination above 90 points upward.
pub fn dip_to_inclination(dip: f64, convention: DipConvention) -> f64 {
    match convention {
        DipConvention::DipPositiveDown => 90.0 - dip,
        DipConvention::DipNegativeDown => 90.0 + dip,
        DipConvention::Inclination => dip,
    }
}

/// Wrap an azimuth into `[0, 360)`.
pub fn normalize_azimuth(azimuth: f64) -> f64 {
    let a = azimuth.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360.0
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Signed shortest turn from `from` to `to`, in `(-180, 180]` degrees.
pub fn azimuth_delta(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_trig() {
        assert!((sin_deg(30.0) - 0.5).abs() < 1e-12);
        assert!((cos_deg(60.0) - 0.5).abs() < 1e-12);
        assert!((tan_deg(45.0) - 1.0).abs() < 1e-12);
        assert_eq!(sin_deg(0.0), 0.0);
        assert_eq!(cos_deg(0.0), 1.0);
    }

    #[test]
    fn test_dip_positive_down() {
        assert_eq!(dip_to_inclination(90.0, DipConvention::DipPositiveDown), 0.0);
        assert_eq!(dip_to_inclination(0.0, DipConvention::DipPositiveDown), 90.0);
        assert_eq!(dip_to_inclination(60.0, DipConvention::DipPositiveDown), 30.0);
        // negative dip in a positive-down table points up
        assert_eq!(dip_to_inclination(-30.0, DipConvention::DipPositiveDown), 120.0);
    }

    #[test]
    fn test_dip_negative_down() {
        assert_eq!(dip_to_inclination(-90.0, DipConvention::DipNegativeDown), 0.0);
        assert_eq!(dip_to_inclination(-60.0, DipConvention::DipNegativeDown), 30.0);
        assert_eq!(dip_to_inclination(0.0, DipConvention::DipNegativeDown), 90.0);
    }

    #[test]
    fn test_inclination_passthrough() {
        assert_eq!(dip_to_inclination(12.5, DipConvention::Inclination), 12.5);
    }

    #[test]
    fn test_normalize_azimuth() {
        assert_eq!(normalize_azimuth(370.0), 10.0);
        assert_eq!(normalize_azimuth(-90.0), 270.0);
        assert_eq!(normalize_azimuth(360.0), 0.0);
        assert_eq!(normalize_azimuth(-1e-20), 0.0);
    }

    #[test]
    fn test_azimuth_delta_wraps_through_north() {
        assert_eq!(azimuth_delta(350.0, 10.0), 20.0);
        assert_eq!(azimuth_delta(10.0, 350.0), -20.0);
        assert_eq!(azimuth_delta(90.0, 270.0), 180.0);
        assert_eq!(azimuth_delta(45.0, 45.0), 0.0);
    }
}
