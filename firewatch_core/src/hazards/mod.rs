// firewatch_core/src/hazards/mod.rs

//! Synthetic hazard (fire) points and the policy for when to regenerate them.
//!
//! Nothing here is derived from a real incident feed. Points are randomised
//! around a center purely for the demo.

use nalgebra::Vector2;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::TAU;
use std::sync::Arc;

use crate::geo::{haversine_meters, offset_by_degrees, METERS_PER_DEGREE};
use crate::surface::LayerHandle;
use crate::types::{LatLng, Severity, Timestamp};

/// Parameters of one generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HazardConfig {
    pub min_count: u32,
    pub max_count: u32,
    pub radius_meters: f64,
    /// Metres per degree used to turn `radius_meters` into a degree radius.
    pub meters_per_degree: f64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            min_count: 2,
            max_count: 4,
            radius_meters: 3_000.0,
            meters_per_degree: METERS_PER_DEGREE,
        }
    }
}

impl HazardConfig {
    /// Count bounds in ascending order.
    pub fn count_range(&self) -> (u32, u32) {
        if self.min_count <= self.max_count {
            (self.min_count, self.max_count)
        } else {
            (self.max_count, self.min_count)
        }
    }

    /// Zero for any radius that cannot be sampled from.
    fn radius_degrees(&self) -> f64 {
        let degrees = self.radius_meters / self.meters_per_degree;
        if degrees.is_finite() && degrees > 0.0 {
            degrees
        } else {
            0.0
        }
    }
}

/// Where a hazard point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardOrigin {
    Simulated,
    Reported,
}

/// One synthetic incident.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardPoint {
    pub id: u64,
    pub location: LatLng,
    pub severity: Severity,
    pub reported_at: Timestamp,
    pub origin: HazardOrigin,
    /// Set once the coordinator has drawn the point.
    pub marker: Option<LayerHandle>,
}

impl HazardPoint {
    pub fn with_marker(mut self, marker: LayerHandle) -> Self {
        self.marker = Some(marker);
        self
    }
}

/// The active hazard set. Immutable once built: membership only changes by
/// replacing the whole set, so an unchanged set stays pointer-identical.
#[derive(Debug, Clone, Default)]
pub struct HazardSet(Arc<[HazardPoint]>);

impl HazardSet {
    pub fn new(points: Vec<HazardPoint>) -> Self {
        Self(points.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A new set with `point` appended.
    pub fn with_added(&self, point: HazardPoint) -> Self {
        let mut points = self.0.to_vec();
        points.push(point);
        Self::new(points)
    }

    pub fn ptr_eq(&self, other: &HazardSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HazardPoint> {
        self.0.iter()
    }

    pub fn points(&self) -> &[HazardPoint] {
        &self.0
    }
}

// =========================================================================
// == Simulator ==
// =========================================================================

/// Produces fresh, unrelated hazard sets around a center.
#[derive(Debug, Default)]
pub struct HazardSimulator {
    next_id: u64,
}

impl HazardSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates between `min_count` and `max_count` points inside
    /// `radius_meters` of `center`.
    ///
    /// Angle and radius are both drawn uniformly, so points cluster towards
    /// the center instead of spreading evenly over the disc.
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        center: LatLng,
        config: &HazardConfig,
        reported_at: Timestamp,
        rng: &mut R,
    ) -> Vec<HazardPoint> {
        let (min_count, max_count) = config.count_range();
        let count = rng.gen_range(min_count..=max_count);

        let radius_deg = config.radius_degrees();
        let angle_dist = Uniform::new(0.0, TAU);

        (0..count)
            .map(|_| {
                let angle = angle_dist.sample(rng);
                let distance = if radius_deg > 0.0 {
                    rng.gen_range(0.0..radius_deg)
                } else {
                    0.0
                };
                let offset = Vector2::new(angle.cos(), angle.sin()) * distance;
                let severity = Severity::SIMULATED[rng.gen_range(0..Severity::SIMULATED.len())];
                self.next_point(offset_by_degrees(center, &offset), severity, reported_at, HazardOrigin::Simulated)
            })
            .collect()
    }

    /// A hazard pinned at `location` for an operator report.
    pub fn reported(&mut self, location: LatLng, reported_at: Timestamp) -> HazardPoint {
        self.next_point(location, Severity::Emergency, reported_at, HazardOrigin::Reported)
    }

    fn next_point(
        &mut self,
        location: LatLng,
        severity: Severity,
        reported_at: Timestamp,
        origin: HazardOrigin,
    ) -> HazardPoint {
        self.next_id += 1;
        HazardPoint {
            id: self.next_id,
            location,
            severity,
            reported_at,
            origin,
            marker: None,
        }
    }
}

// =========================================================================
// == Regeneration Policy ==
// =========================================================================

/// How a fix reached the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    Manual,
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegenerationPolicy {
    pub displacement_threshold_meters: f64,
}

impl RegenerationPolicy {
    pub fn new(displacement_threshold_meters: f64) -> Self {
        Self {
            displacement_threshold_meters,
        }
    }

    /// Manual fixes always regenerate. Continuous fixes regenerate once they
    /// are at least the threshold away from where hazards were last generated.
    pub fn should_regenerate(&self, kind: FixKind, anchor: Option<LatLng>, fix: LatLng) -> bool {
        match (kind, anchor) {
            (FixKind::Manual, _) => true,
            (FixKind::Continuous, None) => true,
            (FixKind::Continuous, Some(anchor)) => {
                haversine_meters(anchor, fix) >= self.displacement_threshold_meters
            }
        }
    }
}
