//! UI panels for the map view
//!
//! The sidebar hosts every map control. Controls publish their hover state
//! onto the event bus; the help card at the bottom of the map subscribes
//! and renders whatever was hovered last. The two sides only meet on the
//! bus - they have no widget-tree relationship.

use crate::app::state::AppState;
use egui::{RichText, Ui};
use instant::Instant;
use journey_map_lib::{
    LayerStyle, MapControl, RoutePhase, SearchResult, format_distance, format_duration,
};

pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState, now: Instant) {
    egui::SidePanel::right("map_sidebar")
        .default_width(300.0)
        .min_width(260.0)
        .max_width(420.0)
        .resizable(true)
        .show(ctx, |ui| {
            let mut hovered = None;

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    render_search_section(ui, state, now, &mut hovered);
                    ui.separator();
                    render_style_section(ui, state, &mut hovered);
                    ui.separator();
                    render_overlay_section(ui, state, &mut hovered);
                    ui.separator();
                    render_directions_section(ui, state, &mut hovered);
                    render_measure_section(ui, state);
                });

            state.publish_hover(hovered);
        });
}

fn render_search_section(
    ui: &mut Ui,
    state: &mut AppState,
    now: Instant,
    hovered: &mut Option<MapControl>,
) {
    ui.label(RichText::new("🔍 Search").strong());

    let mut query = state.orchestrator.search().query().to_string();
    let response = ui.text_edit_singleline(&mut query);
    if response.hovered() {
        *hovered = Some(MapControl::SearchBox);
    }
    if response.changed() {
        state.orchestrator.set_search_query(&query, now);
    }

    if state.orchestrator.search().is_searching() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Searching…");
        });
    } else if state.orchestrator.search().found_nothing() {
        ui.label(RichText::new("No places found").weak());
    }

    let results: Vec<SearchResult> = state.orchestrator.search().results().to_vec();
    for (index, result) in results.iter().enumerate() {
        ui.horizontal(|ui| {
            if ui.button(&result.name).clicked() {
                state.orchestrator.select_search_result(index);
            }
            if ui
                .small_button("➕")
                .on_hover_text("Add as a stop")
                .clicked()
            {
                state.orchestrator.add_waypoint(result.coordinate);
            }
            ui.label(RichText::new(place_detail(result)).weak().small());
        });
    }
}

/// "Région, Country · pop." detail line of a search hit.
fn place_detail(result: &SearchResult) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(admin_area) = &result.admin_area {
        parts.push(admin_area.clone());
    }
    if let Some(country) = &result.country {
        parts.push(country.clone());
    }
    let mut detail = parts.join(", ");
    if let Some(population) = result.population {
        if !detail.is_empty() {
            detail.push_str(" · ");
        }
        detail.push_str(&format!("{population} inhabitants"));
    }
    detail
}

fn render_style_section(ui: &mut Ui, state: &mut AppState, hovered: &mut Option<MapControl>) {
    ui.label(RichText::new("🗺 Map style").strong());

    let mut style = state.orchestrator.layer_style();
    let combo = egui::ComboBox::from_id_salt("layer_style")
        .selected_text(style.name())
        .show_ui(ui, |ui| {
            for candidate in LayerStyle::all() {
                ui.selectable_value(&mut style, *candidate, candidate.name());
            }
        });
    if combo.response.hovered() {
        *hovered = Some(MapControl::LayerPicker);
    }
    if style != state.orchestrator.layer_style() {
        state.orchestrator.set_layer_style(style);
    }

    let mut dark = state.orchestrator.dark_mode();
    if ui.checkbox(&mut dark, "Dark theme").changed() {
        state.orchestrator.set_dark_mode(dark);
    }
}

fn render_overlay_section(ui: &mut Ui, state: &mut AppState, hovered: &mut Option<MapControl>) {
    ui.label(RichText::new("🚦 Overlays").strong());

    let mut traffic = state.orchestrator.traffic().is_active();
    let response = ui.checkbox(&mut traffic, "Simulated traffic");
    if response.hovered() {
        *hovered = Some(MapControl::TrafficToggle);
    }
    if response.changed() {
        state.orchestrator.toggle_traffic(&mut rand::rng());
    }

    let mut measuring = state.orchestrator.measure().is_enabled();
    let response = ui.checkbox(&mut measuring, "Measure distance");
    if response.hovered() {
        *hovered = Some(MapControl::MeasureTool);
    }
    if response.changed() {
        state.orchestrator.toggle_measurement();
    }

    if state.orchestrator.measure().is_enabled() {
        ui.label(RichText::new("Click the map to trace a line.").weak());
        if ui.button("Finish segment").clicked() {
            if let Some(reading) = state.orchestrator.finish_measurement() {
                tracing::debug!(reading, "measurement committed");
            }
        }
    }

    if state.orchestrator.user_location().is_some() {
        let response = ui.button("📍 Center on you");
        if response.hovered() {
            *hovered = Some(MapControl::CenterOnUser);
        }
        if response.clicked() {
            state.orchestrator.set_follow_user(true);
        }
    }
}

fn render_directions_section(ui: &mut Ui, state: &mut AppState, hovered: &mut Option<MapControl>) {
    let group = ui.group(|ui| {
        ui.label(RichText::new("🧭 Directions").strong());

        match state.orchestrator.destination().cloned() {
            Some(destination) => {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "To: {}",
                        destination.label.as_deref().unwrap_or("destination")
                    ));
                    if ui.small_button("✕").clicked() {
                        state.orchestrator.clear_destination();
                    }
                });
            }
            None => {
                ui.label(
                    RichText::new("Click the map or pick a search result to set a destination.")
                        .weak(),
                );
            }
        }

        let stops: Vec<_> = state.orchestrator.stops().iter().cloned().collect();
        let mut remove_index = None;
        for (index, stop) in stops.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{}. {:.4}, {:.4}",
                    index + 1,
                    stop.coordinate.latitude,
                    stop.coordinate.longitude
                ));
                if ui.small_button("✕").clicked() {
                    remove_index = Some(index);
                }
            });
        }
        if let Some(index) = remove_index {
            state.orchestrator.remove_waypoint(index);
        }
        if !stops.is_empty() && ui.button("Clear stops").clicked() {
            state.orchestrator.clear_waypoints();
        }

        match state.orchestrator.route_phase() {
            RoutePhase::Pending => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Calculating route…");
                });
            }
            RoutePhase::Resolved => {
                if let Some(result) = state.orchestrator.route_result() {
                    ui.label(
                        RichText::new(format!(
                            "Route: {} · {}",
                            format_distance(result.total_distance_meters),
                            format_duration(result.total_time_seconds)
                        ))
                        .strong(),
                    );
                }
            }
            RoutePhase::Idle => {}
        }

        if let Some(banner) = state.route_banner_text() {
            ui.label(RichText::new(banner).weak().small());
        }
    });

    if group.response.hovered() {
        *hovered = Some(MapControl::DirectionsPanel);
    }
}

fn render_measure_section(ui: &mut Ui, state: &mut AppState) {
    let committed = state.orchestrator.measure().committed();
    if committed.is_empty() {
        return;
    }

    ui.separator();
    ui.label(RichText::new("📐 Measurements").strong());
    for (index, segment) in committed.iter().enumerate() {
        ui.label(format!("{}. {}", index + 1, segment.formatted()));
    }
    if ui.button("Discard measurements").clicked() {
        state.orchestrator.teardown_measurement();
    }
}

/// The help card: renders whatever control was hovered last, cleared when
/// the hover ends. Fed exclusively through the event bus.
pub fn help_card(ctx: &egui::Context, state: &AppState) {
    let Some(control) = state.help_card else {
        return;
    };

    egui::Window::new("help_card")
        .title_bar(false)
        .resizable(false)
        .interactable(false)
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
        .show(ctx, |ui| {
            ui.label(RichText::new(control.title()).strong());
            ui.label(control.body());
        });
}
