//! Spherical geometry helpers.

/// Earth radius used by the tracking products (meters).
pub const EARTH_RADIUS_M: f64 = 6_370_997.0;

/// Great-circle distance in meters between two positions in degrees.
pub fn distance(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> f64 {
    let sin_dlat = ((lat1 - lat0) * 0.5).to_radians().sin();
    let sin_dlon = ((lon1 - lon0) * 0.5).to_radians().sin();
    let cos_lat0 = lat0.to_radians().cos();
    let cos_lat1 = lat1.to_radians().cos();
    let a = sin_dlon * sin_dlon * cos_lat0 * cos_lat1 + sin_dlat * sin_dlat;
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Bring `lon` into `[reference - 180, reference + 180)`.
pub fn unwrap_longitude(lon: f64, reference: f64) -> f64 {
    let west = reference - 180.0;
    (lon - west).rem_euclid(360.0) + west
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero() {
        assert_eq!(distance(12.0, 40.0, 12.0, 40.0), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance(0.0, 0.0, 0.0, 1.0);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-6, "{} vs {}", d, expected);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = distance(-5.0, 35.0, 10.0, 42.0);
        let b = distance(10.0, 42.0, -5.0, 35.0);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_unwrap_longitude() {
        assert_eq!(unwrap_longitude(359.0, 0.0), -1.0);
        assert_eq!(unwrap_longitude(-179.0, 170.0), 181.0);
        assert_eq!(unwrap_longitude(10.0, 0.0), 10.0);
    }
}
