use crate::models::GeoPoint;

/// Earth's mean radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers, never negative
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two positions in kilometers
#[inline]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Ground travel time in minutes at a constant speed
///
/// A non-positive speed cannot cover any distance; the ETA is then infinite
/// for any non-zero distance.
#[inline]
pub fn eta_minutes(distance_km: f64, ground_speed_kmh: f64) -> f64 {
    if distance_km <= 0.0 {
        return 0.0;
    }
    if ground_speed_kmh <= 0.0 {
        return f64::INFINITY;
    }
    distance_km / ground_speed_kmh * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let london_lat = 51.5074;
        let london_lon = -0.1278;
        let paris_lat = 48.8566;
        let paris_lon = 2.3522;

        let distance = haversine_distance(london_lat, london_lon, paris_lat, paris_lon);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_identical_points() {
        let point = GeoPoint::new(42.8782, -8.5448);
        assert_eq!(distance_km(point, point), 0.0);
        assert_eq!(eta_minutes(0.0, 60.0), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = GeoPoint::new(42.8782, -8.5448);
        let b = GeoPoint::new(43.3623, -8.4115);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn test_antipodal_points() {
        let distance = haversine_distance(0.0, 0.0, 0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((distance - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_eta_at_default_speed() {
        // 60 km/h covers a kilometer a minute
        assert!((eta_minutes(5.0, 60.0) - 5.0).abs() < 1e-9);
        assert!((eta_minutes(30.0, 120.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_eta_without_speed() {
        assert!(eta_minutes(1.0, 0.0).is_infinite());
    }
}
