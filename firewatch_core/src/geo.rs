// firewatch_core/src/geo.rs

//! Distance and offset helpers shared by the simulator, the coordinator and
//! the in-memory map surface.

use nalgebra::Vector2;

use crate::types::LatLng;

/// Mean earth radius used by the haversine distance.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate length of one degree of latitude, used for the planar
/// degree offsets the hazard simulator works in.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two coordinates, in metres.
pub fn haversine_meters(a: LatLng, b: LatLng) -> f64 {
    let phi_a = a.lat.to_radians();
    let phi_b = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Applies a planar offset expressed in degrees.
/// `offset.x` moves along latitude (north), `offset.y` along longitude (east).
pub fn offset_by_degrees(origin: LatLng, offset: &Vector2<f64>) -> LatLng {
    LatLng::new(origin.lat + offset.x, origin.lng + offset.y)
}

/// Converts an east/north displacement in metres into a degree offset at
/// `origin`, scaling longitude by the parallel's circumference.
pub fn meters_to_degrees(origin: LatLng, east_m: f64, north_m: f64) -> Vector2<f64> {
    let lat_scale = origin.lat.to_radians().cos().abs().max(1e-6);
    Vector2::new(
        north_m / METERS_PER_DEGREE,
        east_m / (METERS_PER_DEGREE * lat_scale),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_haversine_zero_for_identical_points() {
        let p = LatLng::new(14.2833, 121.4194);
        assert_abs_diff_eq!(haversine_meters(p, p), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let a = LatLng::new(14.0, 121.0);
        let b = LatLng::new(15.0, 121.0);
        // 2 * pi * R / 360
        assert_abs_diff_eq!(haversine_meters(a, b), 111_194.93, epsilon = 1.0);
    }

    #[test]
    fn test_haversine_small_jitter_is_metres() {
        let a = LatLng::new(14.2800, 121.4000);
        let b = LatLng::new(14.2801, 121.4001);
        let d = haversine_meters(a, b);
        assert!(d > 10.0 && d < 20.0, "jitter distance was {d}");
    }

    #[test]
    fn test_meters_to_degrees_round_trips_through_haversine() {
        let origin = LatLng::new(14.2833, 121.4194);
        let offset = meters_to_degrees(origin, 300.0, 400.0);
        let moved = offset_by_degrees(origin, &offset);
        assert_abs_diff_eq!(haversine_meters(origin, moved), 500.0, epsilon = 2.0);
    }
}
