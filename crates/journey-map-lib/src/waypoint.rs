//! Ordered route waypoints
//!
//! A waypoint's role is derived from its position in the list: the first is
//! the start, the last is the destination, everything between is a stop.
//! Removal renumbers implicitly because position *is* the index.
//!
//! `WaypointList` compares by content. The route engine relies on this: a
//! resolved route is keyed by the list value that produced it, and any
//! mutation produces a new value that no longer matches.

use crate::coords::Coordinate;

/// Semantic role of a waypoint, derived from its list position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaypointRole {
    Start,
    Stop,
    Destination,
}

/// A coordinate with an optional display label, ordered within a route.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub coordinate: Coordinate,
    pub label: Option<String>,
}

impl Waypoint {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            label: None,
        }
    }

    pub fn labeled(coordinate: Coordinate, label: impl Into<String>) -> Self {
        Self {
            coordinate,
            label: Some(label.into()),
        }
    }
}

/// An ordered waypoint list with value semantics.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointList {
    points: Vec<Waypoint>,
}

impl WaypointList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, waypoint: Waypoint) {
        self.points.push(waypoint);
    }

    /// Remove the waypoint at `index`. Subsequent ordinals shift down
    /// implicitly. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Waypoint> {
        if index < self.points.len() {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.points.iter()
    }

    /// Role of the waypoint at `index`, derived from position.
    pub fn role_of(&self, index: usize) -> Option<WaypointRole> {
        if index >= self.points.len() {
            return None;
        }
        Some(if index == 0 {
            WaypointRole::Start
        } else if index == self.points.len() - 1 {
            WaypointRole::Destination
        } else {
            WaypointRole::Stop
        })
    }

    /// Whether this list has enough resolvable endpoints to route.
    pub fn is_routable(&self) -> bool {
        self.points.len() >= 2 && self.points.iter().all(|w| w.coordinate.is_valid())
    }
}

impl FromIterator<Waypoint> for WaypointList {
    fn from_iter<I: IntoIterator<Item = Waypoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
