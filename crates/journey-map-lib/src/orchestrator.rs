//! Map view composition root
//!
//! `MapOrchestrator` owns the view state (center, zoom, user location, dark
//! mode) and composes search, routing, measurement, traffic and help
//! signaling into one consistent whole. It is the only place that receives
//! user-driven mutations.
//!
//! Every mutator is synchronous on state and only *schedules* dependent
//! asynchronous work: the shell drains the `poll_*`/`take_*` surface each
//! frame, performs the network round-trips, and feeds outcomes back through
//! the `apply_*` methods. Stale outcomes are rejected there by value
//! comparison, so interleaved completions can never produce inconsistent
//! view state.

use crate::coords::{Coordinate, Viewport};
use crate::debounce::Debouncer;
use crate::events::{EventBus, HelpSignal, Topic};
use crate::layers::{LayerStyle, ResolvedLayer};
use crate::measure::MeasurementTool;
use crate::route::{RouteEngine, RouteRequest, RouteResult};
use crate::search::{LookupRequest, SearchCoordinator, SearchResult};
use crate::traffic::TrafficSimulator;
use crate::waypoint::{Waypoint, WaypointList};
use crate::Result;
use instant::Instant;
use rand::Rng;
use std::time::Duration;

/// Zoom applied when centering on a picked location.
pub const FOCUS_ZOOM: f64 = 13.0;

/// How long the viewport must hold still before it counts as settled.
pub const SETTLE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Host-application callbacks; the only escape hatches out of the map view.
#[derive(Default)]
pub struct MapHooks {
    /// Fired exactly once, when the surface first reports ready.
    pub on_map_loaded: Option<Box<dyn FnMut()>>,
    /// Fired at most once per resolved waypoint set.
    pub on_route_calculated: Option<Box<dyn FnMut(&RouteResult)>>,
}

pub struct MapOrchestrator {
    // View state
    center: Coordinate,
    zoom: f64,
    user_location: Option<Coordinate>,
    dark_mode: bool,
    layer_style: LayerStyle,
    follow_user: bool,

    // Trip state
    destination: Option<Waypoint>,
    stops: WaypointList,
    search_pin: Option<Waypoint>,

    // Components
    search: SearchCoordinator,
    route: RouteEngine,
    measure: MeasurementTool,
    traffic: TrafficSimulator,
    help: EventBus<HelpSignal>,

    // Surface coordination
    viewport: Option<Viewport>,
    settle: Debouncer,
    pending_view: Option<(Coordinate, f64)>,
    pending_route: Option<RouteRequest>,
    surface_ready: bool,
    hooks: MapHooks,
}

impl MapOrchestrator {
    pub fn new(center: Coordinate, user_location: Option<Coordinate>, dark_mode: bool) -> Self {
        Self {
            center,
            zoom: FOCUS_ZOOM,
            user_location,
            dark_mode,
            layer_style: LayerStyle::default(),
            follow_user: false,
            destination: None,
            stops: WaypointList::new(),
            search_pin: None,
            search: SearchCoordinator::new(),
            route: RouteEngine::new(),
            measure: MeasurementTool::new(),
            traffic: TrafficSimulator::new(),
            help: EventBus::new(),
            viewport: None,
            settle: Debouncer::new(SETTLE_DEBOUNCE),
            pending_view: Some((center, FOCUS_ZOOM)),
            pending_route: None,
            surface_ready: false,
            hooks: MapHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: MapHooks) -> Self {
        self.hooks = hooks;
        self
    }

    // === View state ===

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn user_location(&self) -> Option<Coordinate> {
        self.user_location
    }

    pub fn set_user_location(&mut self, coordinate: Coordinate) {
        self.user_location = Some(coordinate);
        self.sync_route();
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.dark_mode = dark;
    }

    pub fn layer_style(&self) -> LayerStyle {
        self.layer_style
    }

    /// Switch the base layer. Touches nothing but the style: waypoints,
    /// search pin, route and traffic state persist across a style change.
    pub fn set_layer_style(&mut self, style: LayerStyle) {
        self.layer_style = style;
    }

    /// The current style resolved against the theme.
    pub fn resolved_layer(&self) -> ResolvedLayer {
        self.layer_style.resolve(self.dark_mode)
    }

    /// Lock the view on the user position. Released by any explicit view
    /// request or by the surface reporting a user pan.
    pub fn set_follow_user(&mut self, follow: bool) {
        if follow && self.user_location.is_none() {
            tracing::debug!("cannot follow user without a known location");
            return;
        }
        self.follow_user = follow;
    }

    pub fn follow_user(&self) -> bool {
        self.follow_user
    }

    // === Trip state ===

    pub fn destination(&self) -> Option<&Waypoint> {
        self.destination.as_ref()
    }

    /// Directions mode: a destination is actively requested.
    pub fn directions_active(&self) -> bool {
        self.destination.is_some()
    }

    pub fn set_destination(&mut self, coordinate: Coordinate, display_name: &str) {
        self.destination = Some(Waypoint::labeled(coordinate, display_name));
        self.request_view(coordinate, FOCUS_ZOOM);
        self.sync_route();
    }

    pub fn clear_destination(&mut self) {
        self.destination = None;
        self.sync_route();
    }

    pub fn stops(&self) -> &WaypointList {
        &self.stops
    }

    pub fn add_waypoint(&mut self, coordinate: Coordinate) {
        self.stops.push(Waypoint::new(coordinate));
        self.sync_route();
    }

    pub fn remove_waypoint(&mut self, index: usize) {
        if self.stops.remove(index).is_some() {
            self.sync_route();
        }
    }

    pub fn clear_waypoints(&mut self) {
        self.stops.clear();
        self.sync_route();
    }

    pub fn search_pin(&self) -> Option<&Waypoint> {
        self.search_pin.as_ref()
    }

    /// The effective route list: user location (origin, when known), then
    /// the added stops, then the destination. Empty outside directions mode.
    pub fn route_waypoints(&self) -> WaypointList {
        let Some(destination) = &self.destination else {
            return WaypointList::new();
        };
        self.user_location
            .map(|c| Waypoint::labeled(c, "Your location"))
            .into_iter()
            .chain(self.stops.iter().cloned())
            .chain(std::iter::once(destination.clone()))
            .collect()
    }

    /// Reconcile the route engine with the current waypoint list. Called
    /// from every mutator so a stale result is invalidated immediately, not
    /// on the next frame.
    fn sync_route(&mut self) {
        let waypoints = self.route_waypoints();
        if let Some(request) = self.route.request(&waypoints) {
            self.pending_route = Some(request);
        } else if !waypoints.is_routable() {
            self.pending_route = None;
        }
    }

    // === Search ===

    pub fn set_search_query(&mut self, text: &str, now: Instant) {
        self.search.set_query(text, now);
    }

    pub fn search(&self) -> &SearchCoordinator {
        &self.search
    }

    /// Select a search result: drop a pin, make it the destination, and
    /// center the view on it. The result list is consumed by the selection.
    pub fn select_search_result(&mut self, index: usize) {
        let Some(result) = self.search.results().get(index).cloned() else {
            return;
        };
        self.search_pin = Some(Waypoint::labeled(result.coordinate, result.name.clone()));
        self.set_destination(result.coordinate, &result.name);
        self.search.reset();
    }

    pub fn poll_search(&mut self, now: Instant) -> Option<LookupRequest> {
        self.search.poll(now)
    }

    pub fn apply_search_response(&mut self, query: &str, outcome: Result<Vec<SearchResult>>) {
        self.search.apply_response(query, outcome);
    }

    // === Routing ===

    pub fn route_result(&self) -> Option<&RouteResult> {
        self.route.result()
    }

    pub fn route_phase(&self) -> crate::route::RoutePhase {
        self.route.phase()
    }

    pub fn poll_route(&mut self) -> Option<RouteRequest> {
        self.pending_route.take()
    }

    /// Feed a routing completion back in. Stale completions are discarded
    /// by the engine; a fresh result fits the view to the path and fires
    /// the host callback exactly once.
    pub fn apply_route_response(&mut self, key: &WaypointList, outcome: Result<RouteResult>) {
        if let Some(result) = self.route.complete(key, outcome) {
            if let Some((center, zoom)) = fit_view(&result.path) {
                self.request_view(center, zoom);
            }
            if let Some(callback) = self.hooks.on_route_calculated.as_mut() {
                callback(&result);
            }
        }
    }

    // === Traffic ===

    pub fn traffic(&self) -> &TrafficSimulator {
        &self.traffic
    }

    pub fn toggle_traffic<R: Rng>(&mut self, rng: &mut R) {
        if self.traffic.is_active() {
            self.traffic.deactivate();
        } else if let Some(viewport) = self.viewport {
            self.traffic.activate(&viewport, rng);
        } else {
            tracing::debug!("traffic toggle ignored before the first viewport report");
        }
    }

    // === Measurement ===

    pub fn measure(&self) -> &MeasurementTool {
        &self.measure
    }

    pub fn toggle_measurement(&mut self) {
        if self.measure.is_enabled() {
            self.measure.disable();
        } else {
            self.measure.enable();
        }
    }

    /// Commit the traced polyline and return its formatted reading.
    pub fn finish_measurement(&mut self) -> Option<String> {
        self.measure.finish_segment()
    }

    /// Tear the measurement tool down entirely; committed readings only
    /// disappear here.
    pub fn teardown_measurement(&mut self) {
        self.measure.teardown();
    }

    // === Surface coordination ===

    /// A click on the map surface. Measurement takes priority; in
    /// directions mode a click appends a stop; otherwise it drops the
    /// destination pin.
    pub fn handle_map_click(&mut self, coordinate: Coordinate) {
        if self.measure.is_enabled() {
            self.measure.add_point(coordinate);
        } else if self.directions_active() {
            self.add_waypoint(coordinate);
        } else {
            self.set_destination(coordinate, "Dropped pin");
        }
    }

    /// The surface reports its viewport every frame. A change (re)arms the
    /// settle debounce; traffic regenerates only once it fires.
    pub fn note_viewport(&mut self, viewport: Viewport, now: Instant) {
        if self.viewport != Some(viewport) {
            if self.viewport.is_some() {
                self.settle.schedule(now);
            }
            self.center = viewport.center;
            self.zoom = viewport.zoom;
            self.viewport = Some(viewport);
        }
    }

    /// Regenerate traffic when the viewport has settled.
    pub fn poll_traffic<R: Rng>(&mut self, now: Instant, rng: &mut R) {
        if self.settle.fire(now) {
            if let Some(viewport) = self.viewport {
                self.traffic.on_viewport_change(&viewport, rng);
            }
        }
    }

    /// An explicit view request releases the follow-user lock: the surface
    /// must get its normal panning behavior back.
    fn request_view(&mut self, center: Coordinate, zoom: f64) {
        self.follow_user = false;
        self.pending_view = Some((center, zoom));
    }

    /// The view the surface should move to, if one was requested.
    pub fn take_pending_view(&mut self) -> Option<(Coordinate, f64)> {
        self.pending_view.take()
    }

    /// The surface is ready; fires `on_map_loaded` exactly once.
    pub fn notify_surface_ready(&mut self) {
        if !self.surface_ready {
            self.surface_ready = true;
            tracing::info!("map surface ready");
            if let Some(callback) = self.hooks.on_map_loaded.as_mut() {
                callback();
            }
        }
    }

    /// The earliest pending deadline, so the render loop can schedule a
    /// wakeup instead of repainting blindly.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.search.next_deadline(), self.settle.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // === Help signaling ===

    pub fn subscribe_help(&mut self) -> tokio::sync::broadcast::Receiver<HelpSignal> {
        self.help.subscribe(Topic::ControlHelp)
    }

    pub fn publish_help(&mut self, signal: HelpSignal) {
        self.help.publish(Topic::ControlHelp, signal);
    }
}

/// Center and zoom that frame the given path, using the span heuristic the
/// surface cannot do for us (it only exposes `center_at`/`set_zoom`).
fn fit_view(path: &[Coordinate]) -> Option<(Coordinate, f64)> {
    let first = path.first()?;
    let mut min_lat = first.latitude;
    let mut max_lat = first.latitude;
    let mut min_lon = first.longitude;
    let mut max_lon = first.longitude;

    for point in path {
        min_lat = min_lat.min(point.latitude);
        max_lat = max_lat.max(point.latitude);
        min_lon = min_lon.min(point.longitude);
        max_lon = max_lon.max(point.longitude);
    }

    let center = Coordinate::new((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0);
    let max_span = (max_lat - min_lat).max(max_lon - min_lon);

    let zoom = if max_span > 0.0 {
        ((4.0 * 360.0 / max_span).log2() - 0.5).clamp(1.0, 18.0)
    } else {
        FOCUS_ZOOM
    };

    Some((center, zoom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::LatLngBounds;
    use crate::route::RoutePhase;
    use crate::search::SEARCH_DEBOUNCE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::Cell;
    use std::rc::Rc;

    fn paris() -> Coordinate {
        Coordinate::new(48.8566, 2.3522)
    }

    fn viewport() -> Viewport {
        Viewport::new(
            paris(),
            12.0,
            LatLngBounds::new(Coordinate::new(48.0, 2.0), Coordinate::new(49.0, 3.0)),
        )
    }

    fn route_result() -> RouteResult {
        RouteResult {
            path: vec![paris(), Coordinate::new(48.9, 2.4)],
            total_distance_meters: 5000.0,
            total_time_seconds: 600.0,
        }
    }

    fn orchestrator_with_user() -> MapOrchestrator {
        MapOrchestrator::new(paris(), Some(Coordinate::new(48.80, 2.30)), false)
    }

    #[test]
    fn test_map_loaded_fires_once() {
        let count = Rc::new(Cell::new(0u32));
        let hook_count = count.clone();

        let mut map = MapOrchestrator::new(paris(), None, false).with_hooks(MapHooks {
            on_map_loaded: Some(Box::new(move || hook_count.set(hook_count.get() + 1))),
            on_route_calculated: None,
        });

        map.notify_surface_ready();
        map.notify_surface_ready();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_route_scenario_with_single_delivery() {
        let summaries = Rc::new(Cell::new(0u32));
        let hook_summaries = summaries.clone();

        let mut map = orchestrator_with_user().with_hooks(MapHooks {
            on_map_loaded: None,
            on_route_calculated: Some(Box::new(move |result| {
                assert_eq!(result.total_distance_meters, 5000.0);
                hook_summaries.set(hook_summaries.get() + 1);
            })),
        });

        // Setting a destination with a known user location enters Pending
        map.set_destination(paris(), "Paris");
        let request = map.poll_route().unwrap();
        assert_eq!(request.waypoints.len(), 2);

        map.apply_route_response(&request.waypoints, Ok(route_result()));
        assert_eq!(summaries.get(), 1);
        assert_eq!(map.route_result().unwrap().total_distance_meters, 5000.0);

        // Adding a stop invalidates the resolved route and re-enters
        // Pending for the three-point list
        map.add_waypoint(Coordinate::new(48.87, 2.36));
        assert!(map.route_result().is_none());
        let request = map.poll_route().unwrap();
        assert_eq!(request.waypoints.len(), 3);
        assert_eq!(summaries.get(), 1);
    }

    #[test]
    fn test_stale_route_completion_ignored_after_mutation() {
        let mut map = orchestrator_with_user();

        map.set_destination(paris(), "Paris");
        let first = map.poll_route().unwrap();

        map.add_waypoint(Coordinate::new(48.87, 2.36));
        let second = map.poll_route().unwrap();

        // The pre-mutation computation resolves late: discarded
        map.apply_route_response(&first.waypoints, Ok(route_result()));
        assert!(map.route_result().is_none());

        map.apply_route_response(&second.waypoints, Ok(route_result()));
        assert!(map.route_result().is_some());
    }

    #[test]
    fn test_no_route_without_two_endpoints() {
        // No user location: a destination alone is not routable
        let mut map = MapOrchestrator::new(paris(), None, false);
        map.set_destination(paris(), "Paris");
        assert!(map.poll_route().is_none());

        // A stop provides the second endpoint
        map.add_waypoint(Coordinate::new(48.87, 2.36));
        assert!(map.poll_route().is_some());
    }

    #[test]
    fn test_layer_switch_preserves_unrelated_state() {
        let mut map = orchestrator_with_user();
        let mut rng = StdRng::seed_from_u64(3);
        let t0 = Instant::now();

        map.note_viewport(viewport(), t0);

        // A selected search result (pin + destination), a stop, a resolved
        // route and an active traffic overlay...
        map.set_search_query("Par", t0);
        let lookup = map.poll_search(t0 + SEARCH_DEBOUNCE).unwrap();
        map.apply_search_response(
            &lookup.query,
            Ok(vec![SearchResult {
                name: "Paris".to_string(),
                coordinate: paris(),
                country: Some("France".to_string()),
                admin_area: None,
                population: None,
            }]),
        );
        map.select_search_result(0);
        map.add_waypoint(Coordinate::new(48.87, 2.36));
        let request = map.poll_route().unwrap();
        map.apply_route_response(&request.waypoints, Ok(route_result()));
        map.toggle_traffic(&mut rng);

        // ...all survive a (repeated) style change untouched
        let first = map.resolved_layer();
        map.set_layer_style(LayerStyle::Satellite);
        map.set_layer_style(LayerStyle::Satellite);
        let second = map.resolved_layer();
        let third = map.resolved_layer();

        assert_eq!(second, third);
        assert_ne!(first, second);
        assert!(map.search_pin().is_some());
        assert_eq!(map.stops().len(), 1);
        assert!(map.route_result().is_some());
        assert_eq!(map.traffic().points().len(), 10);
        assert!(map.destination().is_some());
    }

    #[test]
    fn test_traffic_regenerates_on_settled_viewport_only() {
        let mut map = orchestrator_with_user();
        let mut rng = StdRng::seed_from_u64(3);
        let t0 = Instant::now();

        map.note_viewport(viewport(), t0);
        map.toggle_traffic(&mut rng);
        let initial = map.traffic().points().to_vec();

        // A pan starts: new viewport, not yet settled
        let panned = Viewport::new(
            Coordinate::new(48.6, 2.6),
            12.0,
            LatLngBounds::new(Coordinate::new(48.1, 2.1), Coordinate::new(49.1, 3.1)),
        );
        map.note_viewport(panned, t0 + Duration::from_millis(50));
        map.poll_traffic(t0 + Duration::from_millis(100), &mut rng);
        assert_eq!(map.traffic().points(), &initial[..]);

        // After the settle window, the set is replaced wholesale
        map.poll_traffic(t0 + Duration::from_millis(400), &mut rng);
        assert_ne!(map.traffic().points(), &initial[..]);
        assert_eq!(map.traffic().points().len(), 10);
    }

    #[test]
    fn test_search_selection_sets_pin_and_destination() {
        let mut map = orchestrator_with_user();
        let t0 = Instant::now();

        map.set_search_query("Par", t0);
        let lookup = map.poll_search(t0 + SEARCH_DEBOUNCE).unwrap();
        map.apply_search_response(
            &lookup.query,
            Ok(vec![SearchResult {
                name: "Paris".to_string(),
                coordinate: paris(),
                country: Some("France".to_string()),
                admin_area: None,
                population: Some(2_140_526),
            }]),
        );

        map.select_search_result(0);
        assert_eq!(map.search_pin().unwrap().label.as_deref(), Some("Paris"));
        assert!(map.directions_active());
        assert!(map.search().results().is_empty());
        assert_eq!(map.search().query(), "");

        // The view was centered on the selection
        let (center, zoom) = map.take_pending_view().unwrap();
        assert_eq!(center, paris());
        assert_eq!(zoom, FOCUS_ZOOM);
    }

    #[test]
    fn test_map_click_routing() {
        let mut map = orchestrator_with_user();

        // No destination yet: a click drops the pin
        map.handle_map_click(paris());
        assert!(map.directions_active());

        // Directions mode: a click appends a stop
        map.handle_map_click(Coordinate::new(48.87, 2.36));
        assert_eq!(map.stops().len(), 1);

        // Measurement takes priority over both
        map.toggle_measurement();
        map.handle_map_click(Coordinate::new(48.88, 2.37));
        assert_eq!(map.stops().len(), 1);
        assert_eq!(map.measure().active_points().len(), 1);
    }

    #[test]
    fn test_follow_lock_released_by_view_request() {
        let mut map = orchestrator_with_user();
        map.take_pending_view();

        map.set_follow_user(true);
        assert!(map.follow_user());

        map.set_destination(paris(), "Paris");
        assert!(!map.follow_user());
        assert!(map.take_pending_view().is_some());
    }

    #[test]
    fn test_follow_lock_requires_user_location() {
        let mut map = MapOrchestrator::new(paris(), None, false);
        map.set_follow_user(true);
        assert!(!map.follow_user());
    }

    #[test]
    fn test_remove_then_re_add_waypoint_round_trip() {
        let mut map = orchestrator_with_user();
        map.set_destination(paris(), "Paris");

        let b = Coordinate::new(48.87, 2.36);
        map.add_waypoint(b);
        map.add_waypoint(Coordinate::new(48.88, 2.37));
        let reference = map.route_waypoints();

        map.remove_waypoint(0);
        map.add_waypoint(b);
        let rebuilt = map.route_waypoints();

        let mut reference_coords: Vec<_> = reference.iter().map(|w| w.coordinate).collect();
        let mut rebuilt_coords: Vec<_> = rebuilt.iter().map(|w| w.coordinate).collect();
        let key = |c: &Coordinate| (c.latitude * 1e6) as i64;
        reference_coords.sort_by_key(key);
        rebuilt_coords.sort_by_key(key);
        assert_eq!(reference_coords, rebuilt_coords);
    }

    #[test]
    fn test_clearing_waypoints_below_two_endpoints_resets_route() {
        let mut map = MapOrchestrator::new(paris(), None, false);
        map.set_destination(paris(), "Paris");
        map.add_waypoint(Coordinate::new(48.87, 2.36));

        let request = map.poll_route().unwrap();
        map.apply_route_response(&request.waypoints, Ok(route_result()));
        assert_eq!(map.route.phase(), RoutePhase::Resolved);

        map.clear_waypoints();
        assert_eq!(map.route.phase(), RoutePhase::Idle);
        assert!(map.route_result().is_none());
        assert!(map.poll_route().is_none());
    }

    #[test]
    fn test_fit_view_frames_the_path() {
        let (center, zoom) = fit_view(&[
            Coordinate::new(48.0, 2.0),
            Coordinate::new(49.0, 3.0),
        ])
        .unwrap();
        assert_eq!(center, Coordinate::new(48.5, 2.5));
        assert!(zoom >= 1.0 && zoom <= 18.0);

        // Degenerate path: a single point gets the focus zoom
        let (_, zoom) = fit_view(&[paris()]).unwrap();
        assert_eq!(zoom, FOCUS_ZOOM);
        assert!(fit_view(&[]).is_none());
    }
}
