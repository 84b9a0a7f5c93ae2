// firewatch_sim/src/simulation/plugins/device/track.rs

use crate::simulation::config::Waypoint;
use firewatch_core::prelude::LatLng;

/// Where the handset truly is over time: piecewise-linear between waypoints,
/// held at the first and last waypoint outside their span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruthTrack {
    waypoints: Vec<Waypoint>,
}

impl GroundTruthTrack {
    /// Waypoints are sorted by time; ties keep their file order.
    pub fn new(mut waypoints: Vec<Waypoint>) -> Self {
        waypoints.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Self { waypoints }
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn position_at(&self, secs: f64) -> Option<LatLng> {
        let first = self.waypoints.first()?;
        if secs <= first.at_secs {
            return Some(first.location());
        }
        // Index of the first waypoint strictly after `secs`.
        let next = self.waypoints.partition_point(|w| w.at_secs <= secs);
        let Some(b) = self.waypoints.get(next) else {
            return self.waypoints.last().map(Waypoint::location);
        };
        let Some(a) = next.checked_sub(1).and_then(|i| self.waypoints.get(i)) else {
            return Some(first.location());
        };

        let span = b.at_secs - a.at_secs;
        if span <= 0.0 {
            return Some(b.location());
        }
        let t = (secs - a.at_secs) / span;
        Some(LatLng::new(
            a.lat + (b.lat - a.lat) * t,
            a.lng + (b.lng - a.lng) * t,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track() -> GroundTruthTrack {
        GroundTruthTrack::new(vec![
            Waypoint { at_secs: 10.0, lat: 14.0, lng: 121.0 },
            Waypoint { at_secs: 0.0, lat: 13.0, lng: 120.0 },
            Waypoint { at_secs: 20.0, lat: 14.0, lng: 122.0 },
        ])
    }

    #[test]
    fn test_interpolates_between_waypoints() {
        let track = track();
        let mid = track.position_at(5.0).expect("position");
        assert_relative_eq!(mid.lat, 13.5, epsilon = 1e-12);
        assert_relative_eq!(mid.lng, 120.5, epsilon = 1e-12);

        let later = track.position_at(17.5).expect("position");
        assert_relative_eq!(later.lat, 14.0, epsilon = 1e-12);
        assert_relative_eq!(later.lng, 121.75, epsilon = 1e-12);
    }

    #[test]
    fn test_holds_at_the_ends() {
        let track = track();
        assert_eq!(track.position_at(-3.0), Some(LatLng::new(13.0, 120.0)));
        assert_eq!(track.position_at(10.0), Some(LatLng::new(14.0, 121.0)));
        assert_eq!(track.position_at(500.0), Some(LatLng::new(14.0, 122.0)));
    }

    #[test]
    fn test_empty_track_has_no_position() {
        assert_eq!(GroundTruthTrack::default().position_at(1.0), None);
    }
}
