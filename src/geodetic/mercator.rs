//! Spherical (web) mercator forward projection, EPSG:3857

use std::f64::consts::FRAC_PI_4;

use super::vincenty::WGS84_A;
use crate::types::Point3;

/// Latitude limit that keeps the projected extent square
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Project longitude / latitude (degrees) to web-mercator metres.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped.
pub fn to_web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = WGS84_A * lon.to_radians();
    let y = WGS84_A * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Project a geographic point, keeping its elevation
pub fn project_point(p: Point3) -> Point3 {
    let (x, y) = to_web_mercator(p.x, p.y);
    Point3::new(x, y, p.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = to_web_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_known_values() {
        let (x, _) = to_web_mercator(180.0, 0.0);
        assert!((x - 20_037_508.342_789_244).abs() < 1e-6);
        let (_, y) = to_web_mercator(0.0, 45.0);
        assert!((y - 5_621_521.486_192_066).abs() < 1e-4);
    }

    #[test]
    fn test_elevation_kept() {
        let p = project_point(Point3::new(10.0, -20.0, 412.5));
        assert_eq!(p.z, 412.5);
        assert!(p.x > 0.0 && p.y < 0.0);
    }
}
