//! Destination-point projection on the WGS84 ellipsoid and on a sphere

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (m)
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// Mean Earth radius for the spherical model (m)
pub const EARTH_RADIUS: f64 = 6_371_000.0;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// Vincenty direct formula: point reached from `(lat, lon)` after `distance`
/// metres along the geodesic with initial `bearing`.
///
/// # Arguments
/// * `lat`, `lon` - Start point in degrees
/// * `bearing` - Initial azimuth in degrees clockwise from north
/// * `distance` - Geodesic distance in metres
///
/// # Returns
/// `(lat, lon)` of the destination in degrees
pub fn vincenty_direct(lat: f64, lon: f64, bearing: f64, distance: f64) -> (f64, f64) {
    if distance == 0.0 {
        return (lat, lon);
    }

    let a = WGS84_A;
    let b = WGS84_B;
    let f = WGS84_F;

    let alpha1 = bearing.to_radians();
    let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();

    let tan_u1 = (1.0 - f) * lat.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos2_alpha = 1.0 - sin_alpha * sin_alpha;

    let u2 = cos2_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u2 / 16384.0 * (4096.0 + u2 * (-768.0 + u2 * (320.0 - 175.0 * u2)));
    let big_b = u2 / 1024.0 * (256.0 + u2 * (-128.0 + u2 * (74.0 - 47.0 * u2)));

    let sigma0 = distance / (b * big_a);
    let mut sigma = sigma0;
    for _ in 0..MAX_ITERATIONS {
        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
        let previous = sigma;
        sigma = sigma0 + delta_sigma;
        if (sigma - previous).abs() < CONVERGENCE {
            break;
        }
    }

    let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
    let (sin_sigma, cos_sigma) = sigma.sin_cos();

    let x = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt());
    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos2_alpha * (4.0 + f * (4.0 - 3.0 * cos2_alpha));
    let big_l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    (lat2.to_degrees(), lon + big_l.to_degrees())
}

/// Small-offset step on a sphere of radius [`EARTH_RADIUS`].
///
/// Splits `distance` into north and east components and converts each to an
/// angle; the east component uses the parallel radius at `lat`.
pub fn spherical_offset(lat: f64, lon: f64, bearing: f64, distance: f64) -> (f64, f64) {
    let (sin_b, cos_b) = bearing.to_radians().sin_cos();
    let d_lat = distance * cos_b / EARTH_RADIUS;
    let d_lon = distance * sin_b / (EARTH_RADIUS * lat.to_radians().cos());
    (lat + d_lat.to_degrees(), lon + d_lon.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vincenty_due_north_at_equator() {
        let (lat, lon) = vincenty_direct(0.0, 0.0, 0.0, 1000.0);
        assert!((lat - 0.009_043_69).abs() < 1e-7, "lat = {lat}");
        assert!(lon.abs() < 1e-12);
    }

    #[test]
    fn test_vincenty_due_east_at_equator() {
        let (lat, lon) = vincenty_direct(0.0, 0.0, 90.0, 1000.0);
        assert!(lat.abs() < 1e-12);
        assert!((lon - 0.008_983_153).abs() < 1e-8, "lon = {lon}");
    }

    #[test]
    fn test_vincenty_flinders_peak_to_buninyong() {
        // Reference geodesic from Vincenty (1975)
        let (lat, lon) = vincenty_direct(-37.951_033_42, 144.424_867_89, 306.868_16, 54_972.271);
        assert!((lat - (-37.652_821_14)).abs() < 1e-7, "lat = {lat}");
        assert!((lon - 143.926_495_53).abs() < 1e-7, "lon = {lon}");
    }

    #[test]
    fn test_zero_distance_is_identity() {
        assert_eq!(vincenty_direct(12.5, -70.25, 33.0, 0.0), (12.5, -70.25));
        assert_eq!(spherical_offset(12.5, -70.25, 33.0, 0.0), (12.5, -70.25));
    }

    #[test]
    fn test_spherical_due_north() {
        let (lat, _) = spherical_offset(0.0, 0.0, 0.0, 1000.0);
        assert!((lat - 0.008_993_2).abs() < 1e-6, "lat = {lat}");
    }
}
