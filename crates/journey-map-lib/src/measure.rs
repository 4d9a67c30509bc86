//! Ad-hoc distance measurement
//!
//! One measurement session at a time. While enabled, clicked points extend
//! an uncommitted polyline; finishing commits it as a segment with its
//! great-circle length. Disabling discards the uncommitted polyline but
//! keeps committed segments visible until the tool is torn down entirely.

use crate::coords::{Coordinate, format_distance, haversine_distance};

/// A finalized measured polyline.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasuredSegment {
    pub points: Vec<Coordinate>,
    pub distance_meters: f64,
}

impl MeasuredSegment {
    pub fn formatted(&self) -> String {
        format_distance(self.distance_meters)
    }
}

#[derive(Default)]
pub struct MeasurementTool {
    enabled: bool,
    /// The in-progress, uncommitted polyline.
    active: Vec<Coordinate>,
    /// Finalized readings, kept until teardown.
    committed: Vec<MeasuredSegment>,
}

impl MeasurementTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a measurement session. Enabling while enabled is a no-op.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// End the session: the uncommitted polyline is discarded, committed
    /// segments stay visible.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.active.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Extend the active polyline. Ignored while disabled.
    pub fn add_point(&mut self, coordinate: Coordinate) {
        if self.enabled {
            self.active.push(coordinate);
        }
    }

    pub fn active_points(&self) -> &[Coordinate] {
        &self.active
    }

    /// Cumulative great-circle length of the active polyline.
    pub fn active_distance(&self) -> f64 {
        polyline_distance(&self.active)
    }

    /// Commit the active polyline as a measured segment and return its
    /// formatted reading. Polylines with fewer than two points are
    /// discarded without a reading.
    pub fn finish_segment(&mut self) -> Option<String> {
        let points = std::mem::take(&mut self.active);
        if points.len() < 2 {
            return None;
        }
        let distance_meters = polyline_distance(&points);
        let segment = MeasuredSegment {
            points,
            distance_meters,
        };
        let formatted = segment.formatted();
        self.committed.push(segment);
        Some(formatted)
    }

    pub fn committed(&self) -> &[MeasuredSegment] {
        &self.committed
    }

    /// Tear the tool down entirely, discarding committed readings too.
    pub fn teardown(&mut self) {
        self.enabled = false;
        self.active.clear();
        self.committed.clear();
    }
}

fn polyline_distance(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .sum()
}
