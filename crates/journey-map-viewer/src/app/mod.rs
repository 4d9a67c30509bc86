//! Application module
//!
//! `JourneyMapApp` hosts the walkers map surface and drives the
//! orchestration core once per frame:
//! service completions are drained first, then the sidebar mutates state,
//! then the map widget renders with the per-frame overlay plugin set, and
//! finally the poll surface dispatches whatever asynchronous work the
//! mutations scheduled. The surface instance (tiles + map memory) is owned
//! here and nowhere else.

pub mod plugins;
pub mod settings;
pub mod state;
pub mod ui_panels;

use crate::app::plugins::{
    MarkerKind, MarkerPlugin, MeasurePlugin, RoutePlugin, SurfacePlugin, TrafficPlugin,
    to_position,
};
use crate::app::settings::Settings;
use crate::app::state::{AppState, PersistedSettings};
use eframe::egui;
use instant::Instant;
use journey_map_lib::{LayerStyle, ResolvedLayer, RoutePhase};
use std::collections::HashMap;
use walkers::{
    HttpTiles, Map, MapMemory, TileId,
    sources::{Attribution, TileSource},
};

/// Tile source backed by a resolved layer's `{z}/{x}/{y}` URL template.
struct TemplateSource(ResolvedLayer);

impl TileSource for TemplateSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        self.0
            .tile_url
            .replace("{z}", &tile_id.zoom.to_string())
            .replace("{x}", &tile_id.x.to_string())
            .replace("{y}", &tile_id.y.to_string())
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.0.attribution,
            url: self.0.attribution_url,
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// Main application structure
pub struct JourneyMapApp {
    /// Orchestration core plus service plumbing
    state: AppState,

    /// One tile pipeline per (style, theme) pair, created on first use.
    /// Keeping them alive preserves the tile cache across style switches.
    tiles: HashMap<(LayerStyle, bool), HttpTiles>,

    /// Map state (camera position, zoom, etc.)
    map_memory: MapMemory,
}

impl JourneyMapApp {
    pub fn new(settings: Settings, cc: &eframe::CreationContext<'_>) -> Self {
        let persisted = if settings.ignore_persisted {
            tracing::info!("ignoring persisted state (--ignore-persisted flag)");
            None
        } else {
            cc.storage.and_then(load_persisted)
        };

        Self {
            state: AppState::new(&settings, persisted),
            tiles: HashMap::new(),
            map_memory: MapMemory::default(),
        }
    }
}

/// Load persisted view settings from storage (fast, no trip data).
fn load_persisted(storage: &dyn eframe::Storage) -> Option<PersistedSettings> {
    let json = storage.get_string("persisted_settings")?;
    match serde_json::from_str(&json) {
        Ok(persisted) => {
            tracing::info!("restored persisted view settings");
            Some(persisted)
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not decode persisted settings, starting fresh");
            None
        }
    }
}

impl eframe::App for JourneyMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Apply whatever the service tasks completed since the last frame,
        // before anything reads route/search state
        self.state.drain_service_events();
        self.state.process_help_signals();

        ctx.set_visuals(if self.state.orchestrator.dark_mode() {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        ui_panels::render_sidebar(ctx, &mut self.state, now);

        // Central panel: the map surface (full remaining area)
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let orchestrator = &self.state.orchestrator;
                let resolved = orchestrator.resolved_layer();

                // Derive the per-frame overlay set from orchestrator state.
                // This is the only place plugins are assembled, which is
                // what keeps route/measurement overlays singular.
                let mut markers = Vec::new();
                if let Some(user) = orchestrator.user_location() {
                    markers.push((user, MarkerKind::UserLocation));
                }
                for result in orchestrator.search().results() {
                    markers.push((result.coordinate, MarkerKind::PointOfInterest));
                }
                if let Some(pin) = orchestrator.search_pin() {
                    markers.push((pin.coordinate, MarkerKind::SearchPin));
                }
                for stop in orchestrator.stops().iter() {
                    markers.push((stop.coordinate, MarkerKind::Stop));
                }
                if let Some(destination) = orchestrator.destination() {
                    markers.push((destination.coordinate, MarkerKind::Destination));
                }

                let route_path = orchestrator.route_result().map(|r| r.path.clone());
                let traffic_points = orchestrator.traffic().points().to_vec();
                let measure_active = orchestrator.measure().active_points().to_vec();
                let measure_committed = orchestrator.measure().committed().to_vec();
                let show_measure =
                    orchestrator.measure().is_enabled() || !measure_committed.is_empty();
                let my_position = to_position(
                    &orchestrator.user_location().unwrap_or(orchestrator.center()),
                );
                let follow = orchestrator.follow_user();

                let tiles = self
                    .tiles
                    .entry((orchestrator.layer_style(), orchestrator.dark_mode()))
                    .or_insert_with(|| {
                        HttpTiles::new(TemplateSource(resolved), ctx.clone())
                    });

                let mut map = Map::new(Some(tiles), &mut self.map_memory, my_position)
                    .with_plugin(SurfacePlugin::new(self.state.capture.clone()));
                if let Some(path) = route_path {
                    map = map.with_plugin(RoutePlugin::new(path));
                }
                if !traffic_points.is_empty() {
                    map = map.with_plugin(TrafficPlugin::new(traffic_points));
                }
                if show_measure {
                    map = map.with_plugin(MeasurePlugin::new(measure_active, measure_committed));
                }
                map = map.with_plugin(MarkerPlugin::new(markers));

                let map_response = ui.add(map);

                // A drag releases the center-on-user lock; normal panning is
                // restored because we stop overriding the center below
                if follow && map_response.dragged() {
                    self.state.orchestrator.set_follow_user(false);
                }

                let painter = ui.painter();
                let screen_rect = ui.max_rect();
                painter.text(
                    screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
                    egui::Align2::CENTER_BOTTOM,
                    resolved.attribution,
                    egui::FontId::proportional(10.0),
                    ui.visuals().text_color(),
                );
            });

        // Drain what the surface reported during the widget pass
        let (viewport, clicks) = {
            let mut capture = self.state.capture.lock().unwrap();
            (capture.viewport.take(), std::mem::take(&mut capture.clicks))
        };
        for click in clicks {
            self.state.orchestrator.handle_map_click(click);
        }
        if let Some(viewport) = viewport {
            self.state.orchestrator.note_viewport(viewport, now);
            // The first viewport report means the initial view is set
            self.state.orchestrator.notify_surface_ready();
        }

        // Requested view changes (search selection, fit-to-route)
        if let Some((center, zoom)) = self.state.orchestrator.take_pending_view() {
            self.map_memory.center_at(to_position(&center));
            let _ = self.map_memory.set_zoom(zoom);
        }

        // While the lock is engaged the view is pinned to the user position
        if self.state.orchestrator.follow_user() {
            if let Some(user) = self.state.orchestrator.user_location() {
                self.map_memory.center_at(to_position(&user));
            }
        }

        // Dispatch the asynchronous work this frame's mutations scheduled
        if let Some(request) = self.state.orchestrator.poll_search(now) {
            self.state.dispatch_search(request);
        }
        if let Some(request) = self.state.orchestrator.poll_route() {
            self.state.dispatch_route(request);
        }
        self.state.orchestrator.poll_traffic(now, &mut rand::rng());

        ui_panels::help_card(ctx, &self.state);

        // Wake up for the next debounce/settle deadline instead of polling
        if let Some(deadline) = self.state.orchestrator.next_deadline() {
            if deadline > now {
                ctx.request_repaint_after(deadline - now);
            } else {
                ctx.request_repaint();
            }
        }
        // Completions arrive over a channel; keep repainting while waiting
        if self.state.orchestrator.search().is_searching()
            || self.state.orchestrator.route_phase() == RoutePhase::Pending
        {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        // Save view preferences only (no trip data - fast)
        if let Ok(json) = serde_json::to_string(&self.state.persisted()) {
            storage.set_string("persisted_settings", json);
            tracing::debug!("saved view settings on exit");
        }
    }
}
