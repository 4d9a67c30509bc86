#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod app;
mod services;

use app::JourneyMapApp;
use app::settings::Settings;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    // Setup logging
    tracing_subscriber::fmt::init();

    let settings = Settings::from_cli();
    tracing::info!(
        lat = settings.lat,
        lon = settings.lon,
        dark = settings.dark,
        "starting journey map viewer"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("Journey Map"),
        ..Default::default()
    };

    let _ = eframe::run_native(
        "Journey Map",
        native_options,
        Box::new(move |cc| Ok(Box::new(JourneyMapApp::new(settings, cc)))),
    );
}
