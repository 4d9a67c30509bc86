//! Simulated traffic overlay
//!
//! Ten synthetic congestion points are scattered uniformly across the
//! current viewport; every regeneration discards the previous set wholesale.
//! The generator is generic over `rand::Rng` so tests drive it with a
//! seeded RNG.

use crate::coords::{Coordinate, Viewport};
use rand::Rng;

/// Points generated per viewport.
pub const TRAFFIC_POINT_COUNT: usize = 10;

/// Congestion radius range in meters.
pub const RADIUS_MIN_M: f64 = 200.0;
pub const RADIUS_MAX_M: f64 = 700.0;

/// A synthetic congestion point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrafficPoint {
    pub center: Coordinate,
    pub radius_meters: f64,
    /// Congestion intensity in [0, 1).
    pub intensity: f64,
}

impl TrafficPoint {
    pub fn level(&self) -> TrafficLevel {
        TrafficLevel::from_intensity(self.intensity)
    }
}

/// Intensity band, used for color and label selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrafficLevel {
    Light,
    Moderate,
    Heavy,
}

impl TrafficLevel {
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity < 0.3 {
            Self::Light
        } else if intensity < 0.7 {
            Self::Moderate
        } else {
            Self::Heavy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "Light traffic",
            Self::Moderate => "Moderate traffic",
            Self::Heavy => "Heavy traffic",
        }
    }
}

#[derive(Default)]
pub struct TrafficSimulator {
    active: bool,
    points: Vec<TrafficPoint>,
}

impl TrafficSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn points(&self) -> &[TrafficPoint] {
        &self.points
    }

    /// Turn the overlay on and generate points for the given viewport.
    pub fn activate<R: Rng>(&mut self, viewport: &Viewport, rng: &mut R) {
        self.active = true;
        self.regenerate(viewport, rng);
    }

    /// Turn the overlay off, discarding all points.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.points.clear();
    }

    /// Regenerate for a settled viewport. No-op while inactive.
    pub fn on_viewport_change<R: Rng>(&mut self, viewport: &Viewport, rng: &mut R) {
        if self.active {
            self.regenerate(viewport, rng);
        }
    }

    fn regenerate<R: Rng>(&mut self, viewport: &Viewport, rng: &mut R) {
        let rect = viewport.bounds.to_rect();
        self.points = (0..TRAFFIC_POINT_COUNT)
            .map(|_| TrafficPoint {
                center: Coordinate::new(
                    rng.random_range(rect.min().y..=rect.max().y),
                    rng.random_range(rect.min().x..=rect.max().x),
                ),
                radius_meters: rng.random_range(RADIUS_MIN_M..=RADIUS_MAX_M),
                intensity: rng.random::<f64>(),
            })
            .collect();
        tracing::trace!(count = self.points.len(), "regenerated traffic points");
    }
}
