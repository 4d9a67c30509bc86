//! Application state management
//!
//! Wires the orchestration core to the things it must not know about: the
//! tokio runtime the service calls run on, the mpsc channel their
//! completions come back over, the shared cell the map surface reports
//! into, and the persisted view preferences.

use crate::app::plugins::SurfaceCapture;
use crate::app::settings::Settings;
use crate::services::{GeocodingClient, RoutingClient, ServiceError};
use journey_map_lib::{
    Coordinate, HelpSignal, LayerStyle, LookupRequest, MapControl, MapError, MapHooks,
    MapOrchestrator, RouteRequest, RouteResult, SearchResult, WaypointList, drain_latest,
    format_distance, format_duration,
};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

/// Completions arriving from the spawned service tasks.
pub enum ServiceEvent {
    SearchCompleted {
        query: String,
        outcome: Result<Vec<SearchResult>, ServiceError>,
    },
    RouteCompleted {
        key: WaypointList,
        outcome: Result<Option<RouteResult>, ServiceError>,
    },
}

/// View preferences persisted across runs (no trip data).
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PersistedSettings {
    pub layer_style: String,
    pub dark_mode: bool,
    pub lat: f64,
    pub lon: f64,
}

pub struct AppState {
    pub orchestrator: MapOrchestrator,

    /// Written by `SurfacePlugin` during the map widget pass, drained after.
    pub capture: Arc<Mutex<SurfaceCapture>>,

    // Service plumbing
    runtime: tokio::runtime::Handle,
    events_tx: mpsc::UnboundedSender<ServiceEvent>,
    events_rx: mpsc::UnboundedReceiver<ServiceEvent>,
    geocoder: Arc<GeocodingClient>,
    router: Arc<RoutingClient>,

    // Help signaling
    help_rx: broadcast::Receiver<HelpSignal>,
    pub help_card: Option<MapControl>,
    last_hover: Option<MapControl>,

    /// Last summary delivered through the `on_route_calculated` host hook.
    pub route_banner: Arc<Mutex<Option<String>>>,
}

impl AppState {
    pub fn new(settings: &Settings, persisted: Option<PersistedSettings>) -> Self {
        let center = persisted
            .as_ref()
            .map(|p| Coordinate::new(p.lat, p.lon))
            .unwrap_or_else(|| settings.center());
        let dark_mode = persisted.as_ref().map(|p| p.dark_mode).unwrap_or(settings.dark);
        let layer_style = persisted
            .as_ref()
            .map(|p| layer_style_from_name(&p.layer_style))
            .unwrap_or_default();

        let route_banner: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let hooks = MapHooks {
            on_map_loaded: Some(Box::new(|| {
                tracing::info!("host notified: map loaded");
            })),
            on_route_calculated: Some(Box::new({
                let banner = route_banner.clone();
                move |result| {
                    let summary = format!(
                        "{} · {}",
                        format_distance(result.total_distance_meters),
                        format_duration(result.total_time_seconds)
                    );
                    tracing::info!(summary, "host notified: route calculated");
                    *banner.lock().unwrap() = Some(summary);
                }
            })),
        };

        let mut orchestrator =
            MapOrchestrator::new(center, settings.user_location(), dark_mode).with_hooks(hooks);
        orchestrator.set_layer_style(layer_style);
        let help_rx = orchestrator.subscribe_help();

        let http = reqwest::Client::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            orchestrator,
            capture: Arc::new(Mutex::new(SurfaceCapture::default())),
            runtime: tokio::runtime::Handle::current(),
            events_tx,
            events_rx,
            geocoder: Arc::new(GeocodingClient::new(
                http.clone(),
                settings.geocoding_url.clone(),
            )),
            router: Arc::new(RoutingClient::new(http, settings.routing_url.clone())),
            help_rx,
            help_card: None,
            last_hover: None,
            route_banner,
        }
    }

    /// Snapshot the preferences worth keeping across runs.
    pub fn persisted(&self) -> PersistedSettings {
        PersistedSettings {
            layer_style: format!("{:?}", self.orchestrator.layer_style()),
            dark_mode: self.orchestrator.dark_mode(),
            lat: self.orchestrator.center().latitude,
            lon: self.orchestrator.center().longitude,
        }
    }

    /// Run a geocoding lookup in the background; its completion comes back
    /// through the event channel.
    pub fn dispatch_search(&self, request: LookupRequest) {
        let geocoder = self.geocoder.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let outcome = geocoder.lookup(&request.query).await;
            let _ = tx.send(ServiceEvent::SearchCompleted {
                query: request.query,
                outcome,
            });
        });
    }

    /// Start a route computation in the background. The computation cannot
    /// be cancelled; staleness is handled when the completion is applied.
    pub fn dispatch_route(&self, request: RouteRequest) {
        let router = self.router.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let outcome = router.compute(&request.waypoints).await;
            let _ = tx.send(ServiceEvent::RouteCompleted {
                key: request.waypoints,
                outcome,
            });
        });
    }

    /// Drain service completions into the orchestrator. Failures become
    /// "no update" outcomes here; nothing propagates further.
    pub fn drain_service_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                ServiceEvent::SearchCompleted { query, outcome } => {
                    let outcome = outcome.map_err(|e| MapError::Geocoding(e.to_string()));
                    self.orchestrator.apply_search_response(&query, outcome);
                }
                ServiceEvent::RouteCompleted { key, outcome } => {
                    let outcome = match outcome {
                        Ok(Some(result)) => Ok(result),
                        Ok(None) => Err(MapError::NoRoute),
                        Err(e) => Err(MapError::Routing(e.to_string())),
                    };
                    if matches!(outcome, Err(MapError::NoRoute)) {
                        self.route_banner.lock().unwrap().take();
                    }
                    self.orchestrator.apply_route_response(&key, outcome);
                }
            }
        }
    }

    /// Apply the newest help signal, if any ("most recent publish wins").
    pub fn process_help_signals(&mut self) {
        if let Some(signal) = drain_latest(&mut self.help_rx) {
            self.help_card = match signal {
                HelpSignal::Show(control) => Some(control),
                HelpSignal::Clear => None,
            };
        }
    }

    /// Publish the hover state of the map controls, but only on change so
    /// the bus is not flooded every frame.
    pub fn publish_hover(&mut self, hovered: Option<MapControl>) {
        if hovered != self.last_hover {
            match hovered {
                Some(control) => self.orchestrator.publish_help(HelpSignal::Show(control)),
                None => self.orchestrator.publish_help(HelpSignal::Clear),
            }
            self.last_hover = hovered;
        }
    }

    pub fn route_banner_text(&self) -> Option<String> {
        self.route_banner.lock().unwrap().clone()
    }
}

fn layer_style_from_name(name: &str) -> LayerStyle {
    match name {
        "Satellite" => LayerStyle::Satellite,
        "Terrain" => LayerStyle::Terrain,
        "Transport" => LayerStyle::Transport,
        _ => LayerStyle::Standard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_style_name_round_trip() {
        for style in LayerStyle::all() {
            assert_eq!(layer_style_from_name(&format!("{:?}", style)), *style);
        }
        assert_eq!(layer_style_from_name("garbage"), LayerStyle::Standard);
    }
}
