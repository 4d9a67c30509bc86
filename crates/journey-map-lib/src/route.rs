//! Route calculation state machine
//!
//! The external engine cannot be cancelled once invoked, so correctness is
//! entirely about what happens at the boundaries: a computation is keyed by
//! the waypoint-list value that requested it, and a completion whose key no
//! longer matches the current state is ignored. At most one computation is
//! pending per list, and at most one result is live at any time.

use crate::waypoint::WaypointList;
use crate::{MapError, coords::Coordinate};

/// A computed route: the resolved path (not necessarily the input
/// waypoints) plus its summary. Immutable once produced; superseded, never
/// mutated, when waypoints change.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteResult {
    pub path: Vec<Coordinate>,
    pub total_distance_meters: f64,
    pub total_time_seconds: f64,
}

/// A computation the transport layer should now start.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteRequest {
    pub waypoints: WaypointList,
}

/// Observable engine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutePhase {
    Idle,
    Pending,
    Resolved,
}

enum State {
    Idle,
    Pending { key: WaypointList },
    Resolved { key: WaypointList, result: RouteResult },
}

/// Idle -> Pending -> Resolved, keyed by the waypoint-list value.
pub struct RouteEngine {
    state: State,
}

impl RouteEngine {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn phase(&self) -> RoutePhase {
        match self.state {
            State::Idle => RoutePhase::Idle,
            State::Pending { .. } => RoutePhase::Pending,
            State::Resolved { .. } => RoutePhase::Resolved,
        }
    }

    /// The live result, if any.
    pub fn result(&self) -> Option<&RouteResult> {
        match &self.state {
            State::Resolved { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Reconcile the engine against the current waypoint list.
    ///
    /// An unroutable list forces Idle (clearing any result). A Pending or
    /// Resolved state for the *same* list returns `None`: no duplicate
    /// computation may start while one is pending, and a resolved list is
    /// not recomputed. Any other list invalidates the previous state first
    /// and then enters Pending.
    pub fn request(&mut self, waypoints: &WaypointList) -> Option<RouteRequest> {
        if !waypoints.is_routable() {
            if !matches!(self.state, State::Idle) {
                tracing::debug!("waypoints no longer routable, clearing route state");
                self.state = State::Idle;
            }
            return None;
        }

        match &self.state {
            State::Pending { key } | State::Resolved { key, .. } if key == waypoints => None,
            _ => {
                self.state = State::Pending {
                    key: waypoints.clone(),
                };
                Some(RouteRequest {
                    waypoints: waypoints.clone(),
                })
            }
        }
    }

    /// Apply a completion from the engine.
    ///
    /// Stale completions (the waypoint list has changed since invocation)
    /// are ignored. A successful completion for the pending list transitions
    /// to Resolved and returns the result exactly once, for host delivery.
    /// A failed completion clears to Idle; the previous result, if any, was
    /// already invalidated when the computation started.
    pub fn complete(
        &mut self,
        key: &WaypointList,
        outcome: Result<RouteResult, MapError>,
    ) -> Option<RouteResult> {
        match &self.state {
            State::Pending { key: pending } if pending == key => match outcome {
                Ok(result) => {
                    self.state = State::Resolved {
                        key: key.clone(),
                        result: result.clone(),
                    };
                    Some(result)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "route calculation produced no result");
                    self.state = State::Idle;
                    None
                }
            },
            _ => {
                tracing::debug!("ignoring stale route completion");
                None
            }
        }
    }

    /// Back to Idle, e.g. when directions mode ends.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }
}

impl Default for RouteEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::Waypoint;

    fn list(coords: &[(f64, f64)]) -> WaypointList {
        coords
            .iter()
            .map(|&(lat, lon)| Waypoint::new(Coordinate::new(lat, lon)))
            .collect()
    }

    fn route(distance: f64) -> RouteResult {
        RouteResult {
            path: vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)],
            total_distance_meters: distance,
            total_time_seconds: distance / 10.0,
        }
    }

    #[test]
    fn test_fewer_than_two_endpoints_is_idle() {
        let mut engine = RouteEngine::new();
        assert!(engine.request(&list(&[(1.0, 1.0)])).is_none());
        assert_eq!(engine.phase(), RoutePhase::Idle);
    }

    #[test]
    fn test_pending_then_resolved_delivers_once() {
        let mut engine = RouteEngine::new();
        let ab = list(&[(1.0, 1.0), (2.0, 2.0)]);

        let request = engine.request(&ab).unwrap();
        assert_eq!(engine.phase(), RoutePhase::Pending);

        let delivered = engine.complete(&request.waypoints, Ok(route(5000.0)));
        assert_eq!(delivered.unwrap().total_distance_meters, 5000.0);
        assert_eq!(engine.phase(), RoutePhase::Resolved);

        // Same list again: no recomputation, no second delivery
        assert!(engine.request(&ab).is_none());
        assert_eq!(engine.result().unwrap().total_distance_meters, 5000.0);
    }

    #[test]
    fn test_no_duplicate_computation_while_pending() {
        let mut engine = RouteEngine::new();
        let ab = list(&[(1.0, 1.0), (2.0, 2.0)]);

        assert!(engine.request(&ab).is_some());
        assert!(engine.request(&ab).is_none());
        assert_eq!(engine.phase(), RoutePhase::Pending);
    }

    #[test]
    fn test_mutation_invalidates_before_recompute() {
        let mut engine = RouteEngine::new();
        let ab = list(&[(1.0, 1.0), (2.0, 2.0)]);
        let abc = list(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);

        let request = engine.request(&ab).unwrap();
        engine.complete(&request.waypoints, Ok(route(5000.0)));
        assert_eq!(engine.phase(), RoutePhase::Resolved);

        // Adding a waypoint invalidates the resolved state and re-enters
        // Pending for the new list
        let request = engine.request(&abc).unwrap();
        assert_eq!(request.waypoints, abc);
        assert_eq!(engine.phase(), RoutePhase::Pending);
        assert!(engine.result().is_none());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut engine = RouteEngine::new();
        let ab = list(&[(1.0, 1.0), (2.0, 2.0)]);
        let abc = list(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);

        engine.request(&ab).unwrap();
        engine.request(&abc).unwrap();

        // The first computation resolves after the list changed
        assert!(engine.complete(&ab, Ok(route(5000.0))).is_none());
        assert_eq!(engine.phase(), RoutePhase::Pending);

        // The current computation still resolves normally
        let delivered = engine.complete(&abc, Ok(route(7500.0)));
        assert_eq!(delivered.unwrap().total_distance_meters, 7500.0);
    }

    #[test]
    fn test_failure_clears_to_idle() {
        let mut engine = RouteEngine::new();
        let ab = list(&[(1.0, 1.0), (2.0, 2.0)]);

        let request = engine.request(&ab).unwrap();
        assert!(
            engine
                .complete(&request.waypoints, Err(MapError::NoRoute))
                .is_none()
        );
        assert_eq!(engine.phase(), RoutePhase::Idle);
        assert!(engine.result().is_none());
    }

    #[test]
    fn test_unroutable_list_clears_resolved_state() {
        let mut engine = RouteEngine::new();
        let ab = list(&[(1.0, 1.0), (2.0, 2.0)]);

        let request = engine.request(&ab).unwrap();
        engine.complete(&request.waypoints, Ok(route(5000.0)));

        assert!(engine.request(&list(&[(1.0, 1.0)])).is_none());
        assert_eq!(engine.phase(), RoutePhase::Idle);
        assert!(engine.result().is_none());
    }
}
