//! Nearest-store math for the geospatial matcher.
//!
//! Candidate sellers are prefiltered in SQL with a bounding box, then ranked
//! by exact haversine distance in process.

pub const DEFAULT_RADIUS_METERS: f64 = 3000.0;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two (latitude, longitude) points in meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * a.sqrt().asin() * EARTH_RADIUS_METERS
}

/// Axis-aligned box containing every point within `radius_meters` of the
/// center: `(lat_min, lat_max, lon_min, lon_max)`.
pub fn bounding_box(lat: f64, lon: f64, radius_meters: f64) -> (f64, f64, f64, f64) {
    let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    // Longitude degrees shrink with latitude; guard the poles.
    let lon_delta = lat_delta / lat.to_radians().cos().abs().max(1e-6);

    (lat - lat_delta, lat + lat_delta, lon - lon_delta, lon + lon_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Connaught Place and India Gate, New Delhi: ~2.6 km apart.
    const CP: (f64, f64) = (28.6315, 77.2167);
    const INDIA_GATE: (f64, f64) = (28.6129, 77.2295);

    #[test]
    fn haversine_matches_known_distance() {
        let d = haversine_meters(CP.0, CP.1, INDIA_GATE.0, INDIA_GATE.1);
        assert!((2300.0..2900.0).contains(&d), "got {d}");
    }

    #[test]
    fn zero_distance_to_self() {
        assert!(haversine_meters(CP.0, CP.1, CP.0, CP.1) < 1e-6);
    }

    #[test]
    fn bounding_box_contains_radius() {
        let (lat_min, lat_max, lon_min, lon_max) = bounding_box(CP.0, CP.1, 3000.0);
        // India Gate is within 3km, so it must fall inside the box.
        assert!(lat_min < INDIA_GATE.0 && INDIA_GATE.0 < lat_max);
        assert!(lon_min < INDIA_GATE.1 && INDIA_GATE.1 < lon_max);
    }

    #[test]
    fn points_outside_radius_are_cut_by_distance_check() {
        // Qutub Minar is ~14km from Connaught Place.
        let d = haversine_meters(CP.0, CP.1, 28.5245, 77.1855);
        assert!(d > DEFAULT_RADIUS_METERS);
    }
}
