//! Walkers plugins: the overlay controls attached to the map surface
//!
//! Overlays live outside the normal widget tree, so each one is a walkers
//! [`Plugin`] rebuilt per frame from orchestrator state in exactly one place
//! (`JourneyMapApp::update`). That single assembly point is what guarantees
//! at most one route overlay and one measurement overlay at a time.
//!
//! `SurfacePlugin` is the input side: it captures the current viewport and
//! any click back into a shared cell the frame loop drains after the map
//! widget has been added.

use egui::{Align2, Color32, FontId, Pos2, Stroke};
use journey_map_lib::{
    Coordinate, LatLngBounds, MeasuredSegment, TrafficPoint, TrafficLevel, Viewport,
    format_distance,
};
use std::sync::{Arc, Mutex};
use walkers::{MapMemory, Plugin, Position, Projector};

pub fn to_position(coordinate: &Coordinate) -> Position {
    walkers::lat_lon(coordinate.latitude, coordinate.longitude)
}

fn to_coordinate(position: Position) -> Coordinate {
    Coordinate::new(position.y(), position.x())
}

fn to_screen(projector: &Projector, coordinate: &Coordinate) -> Pos2 {
    let screen_vec = projector.project(to_position(coordinate));
    Pos2::new(screen_vec.x, screen_vec.y)
}

/// Semantic role of a point marker; color and size derive from it alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    Destination,
    UserLocation,
    Stop,
    SearchPin,
    PointOfInterest,
}

impl MarkerKind {
    fn color(&self) -> Color32 {
        match self {
            Self::Destination => Color32::from_rgb(220, 60, 60),
            Self::UserLocation => Color32::from_rgb(60, 120, 220),
            Self::Stop => Color32::from_rgb(240, 160, 40),
            Self::SearchPin => Color32::from_rgb(150, 70, 200),
            Self::PointOfInterest => Color32::from_rgb(120, 120, 120),
        }
    }

    fn radius(&self) -> f32 {
        match self {
            Self::Destination => 9.0,
            Self::UserLocation => 7.0,
            Self::Stop => 6.0,
            Self::SearchPin => 7.0,
            Self::PointOfInterest => 5.0,
        }
    }
}

/// Renders point markers given position + semantic role; no state beyond
/// what it is constructed with.
pub struct MarkerPlugin {
    markers: Vec<(Coordinate, MarkerKind)>,
}

impl MarkerPlugin {
    pub fn new(markers: Vec<(Coordinate, MarkerKind)>) -> Self {
        Self { markers }
    }
}

impl Plugin for MarkerPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        _response: &egui::Response,
        projector: &Projector,
        _map_memory: &MapMemory,
    ) {
        let painter = ui.painter();

        for (coordinate, kind) in &self.markers {
            let screen_pos = to_screen(projector, coordinate);
            let radius = kind.radius();

            painter.circle_filled(screen_pos, radius, kind.color());
            painter.circle_stroke(screen_pos, radius, Stroke::new(1.5, Color32::WHITE));

            // The destination gets an outer ring so it reads as "the" target
            if *kind == MarkerKind::Destination {
                painter.circle_stroke(
                    screen_pos,
                    radius + 4.0,
                    Stroke::new(1.0, kind.color()),
                );
            }
        }
    }
}

/// Draws the resolved route path as a single polyline.
pub struct RoutePlugin {
    path: Vec<Coordinate>,
}

impl RoutePlugin {
    pub fn new(path: Vec<Coordinate>) -> Self {
        Self { path }
    }
}

impl Plugin for RoutePlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        _response: &egui::Response,
        projector: &Projector,
        _map_memory: &MapMemory,
    ) {
        let painter = ui.painter();
        let stroke = Stroke::new(4.0, Color32::from_rgb(70, 130, 220));

        let screen_points: Vec<Pos2> = self
            .path
            .iter()
            .map(|coordinate| to_screen(projector, coordinate))
            .collect();

        if screen_points.len() >= 2 {
            painter.add(egui::Shape::line(screen_points, stroke));
        }
    }
}

/// Draws the simulated congestion points as meter-scaled circles.
pub struct TrafficPlugin {
    points: Vec<TrafficPoint>,
}

impl TrafficPlugin {
    pub fn new(points: Vec<TrafficPoint>) -> Self {
        Self { points }
    }

    fn fill_color(level: TrafficLevel) -> Color32 {
        match level {
            TrafficLevel::Light => Color32::from_rgba_unmultiplied(80, 180, 80, 80),
            TrafficLevel::Moderate => Color32::from_rgba_unmultiplied(230, 160, 40, 90),
            TrafficLevel::Heavy => Color32::from_rgba_unmultiplied(210, 60, 50, 100),
        }
    }
}

impl Plugin for TrafficPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        _response: &egui::Response,
        projector: &Projector,
        _map_memory: &MapMemory,
    ) {
        let painter = ui.painter();

        for point in &self.points {
            let center = to_screen(projector, &point.center);

            // Scale the meter radius into pixels by projecting a point
            // radius_meters east of the center
            let meters_per_deg_lon = 111_320.0 * point.center.latitude.to_radians().cos();
            if meters_per_deg_lon <= 0.0 {
                continue;
            }
            let edge = Coordinate::new(
                point.center.latitude,
                point.center.longitude + point.radius_meters / meters_per_deg_lon,
            );
            let radius_px = (to_screen(projector, &edge).x - center.x).abs().max(2.0);

            let level = point.level();
            painter.circle_filled(center, radius_px, Self::fill_color(level));
            painter.circle_stroke(
                center,
                radius_px,
                Stroke::new(1.0, Self::fill_color(level).to_opaque()),
            );
        }
    }
}

/// Draws the measurement overlay: committed readings and the polyline in
/// progress.
pub struct MeasurePlugin {
    active: Vec<Coordinate>,
    committed: Vec<MeasuredSegment>,
}

impl MeasurePlugin {
    pub fn new(active: Vec<Coordinate>, committed: Vec<MeasuredSegment>) -> Self {
        Self { active, committed }
    }

    fn draw_polyline(painter: &egui::Painter, projector: &Projector, points: &[Coordinate], stroke: Stroke) {
        let screen_points: Vec<Pos2> = points
            .iter()
            .map(|coordinate| to_screen(projector, coordinate))
            .collect();

        for pos in &screen_points {
            painter.circle_filled(*pos, 3.0, stroke.color);
        }
        if screen_points.len() >= 2 {
            painter.add(egui::Shape::line(screen_points, stroke));
        }
    }
}

impl Plugin for MeasurePlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        _response: &egui::Response,
        projector: &Projector,
        _map_memory: &MapMemory,
    ) {
        let painter = ui.painter();
        let committed_stroke = Stroke::new(2.5, Color32::from_rgb(60, 160, 90));
        let active_stroke = Stroke::new(2.0, Color32::from_rgb(230, 90, 140));

        for segment in &self.committed {
            Self::draw_polyline(painter, projector, &segment.points, committed_stroke);
            if let Some(last) = segment.points.last() {
                painter.text(
                    to_screen(projector, last) + egui::vec2(8.0, -8.0),
                    Align2::LEFT_BOTTOM,
                    segment.formatted(),
                    FontId::proportional(12.0),
                    committed_stroke.color,
                );
            }
        }

        Self::draw_polyline(painter, projector, &self.active, active_stroke);
        if self.active.len() >= 2 {
            let distance: f64 = self
                .active
                .windows(2)
                .map(|pair| journey_map_lib::haversine_distance(&pair[0], &pair[1]))
                .sum();
            if let Some(last) = self.active.last() {
                painter.text(
                    to_screen(projector, last) + egui::vec2(8.0, -8.0),
                    Align2::LEFT_BOTTOM,
                    format_distance(distance),
                    FontId::proportional(12.0),
                    active_stroke.color,
                );
            }
        }
    }
}

/// What the surface reported this frame.
#[derive(Default)]
pub struct SurfaceCapture {
    pub viewport: Option<Viewport>,
    pub clicks: Vec<Coordinate>,
}

/// Input side of the surface: captures viewport and clicks into a shared
/// cell for the frame loop to drain.
pub struct SurfacePlugin {
    capture: Arc<Mutex<SurfaceCapture>>,
}

impl SurfacePlugin {
    pub fn new(capture: Arc<Mutex<SurfaceCapture>>) -> Self {
        Self { capture }
    }
}

impl Plugin for SurfacePlugin {
    fn run(
        self: Box<Self>,
        _ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &MapMemory,
    ) {
        let rect = response.rect;
        let top_left = projector.unproject(rect.min.to_vec2());
        let bottom_right = projector.unproject(rect.max.to_vec2());

        let south_west = Coordinate::new(
            top_left.y().min(bottom_right.y()),
            top_left.x().min(bottom_right.x()),
        );
        let north_east = Coordinate::new(
            top_left.y().max(bottom_right.y()),
            top_left.x().max(bottom_right.x()),
        );

        // Derive the zoom level from the visible longitude span; the
        // standard slippy-map relation is span = 360 * width / (256 * 2^z)
        let lon_span = (north_east.longitude - south_west.longitude).abs().max(1e-9);
        let zoom = ((360.0 * rect.width() as f64) / (256.0 * lon_span)).log2();

        let viewport = Viewport::new(
            to_coordinate(projector.unproject(rect.center().to_vec2())),
            zoom,
            LatLngBounds::new(south_west, north_east),
        );

        let click = if response.clicked() {
            response
                .interact_pointer_pos()
                .map(|pos| to_coordinate(projector.unproject(pos.to_vec2())))
        } else {
            None
        };

        if let Ok(mut capture) = self.capture.lock() {
            capture.viewport = Some(viewport);
            if let Some(coordinate) = click {
                capture.clicks.push(coordinate);
            }
        }
    }
}
