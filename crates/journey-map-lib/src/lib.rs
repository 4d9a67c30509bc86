//! Journey Map Core - Orchestration Logic for the Interactive Map View
//!
//! This library contains everything about the map view that is not rendering:
//! the layer lookup table, the debounced location search, the route-engine
//! state machine, the measurement tool, the simulated traffic generator, the
//! in-process event bus, and the [`MapOrchestrator`] that composes them into
//! a single consistent view state.
//!
//! # Architecture
//!
//! - **[`Coordinate`] / [`WaypointList`]**: immutable value types; state is
//!   always replaced wholesale, never mutated, so staleness can be detected
//!   by equality
//! - **[`RouteEngine`]**: explicit Idle/Pending/Resolved state machine keyed
//!   by the waypoint-list value
//! - **[`SearchCoordinator`]**: debounced lookups with query-order result
//!   application
//! - **[`MapOrchestrator`]**: the composition root; the only receiver of
//!   user-driven mutations
//!
//! Time is injected as `instant::Instant` throughout, so all scheduling
//! logic is testable without sleeping.

mod coords;
mod debounce;
mod events;
mod layers;
mod measure;
mod orchestrator;
mod route;
mod search;
mod traffic;
mod waypoint;

// Public API exports
pub use coords::{
    Coordinate, LatLngBounds, Viewport, format_distance, format_duration, haversine_distance,
};
pub use debounce::Debouncer;
pub use events::{EventBus, HelpSignal, MapControl, Topic, drain_latest};
pub use layers::{LayerStyle, ResolvedLayer};
pub use measure::{MeasuredSegment, MeasurementTool};
pub use orchestrator::{FOCUS_ZOOM, MapHooks, MapOrchestrator};
pub use route::{RouteEngine, RoutePhase, RouteRequest, RouteResult};
pub use search::{LookupRequest, MIN_QUERY_LEN, SearchCoordinator, SearchResult};
pub use traffic::{TrafficLevel, TrafficPoint, TrafficSimulator};
pub use waypoint::{Waypoint, WaypointList, WaypointRole};

/// Error types for the orchestration core
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("geocoding lookup failed: {0}")]
    Geocoding(String),

    #[error("route calculation failed: {0}")]
    Routing(String),

    #[error("no route found between the requested waypoints")]
    NoRoute,

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

pub type Result<T> = std::result::Result<T, MapError>;
