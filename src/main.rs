mod app;
mod color;
mod config;
mod data;
mod insights;
mod state;
mod ui;

use std::path::PathBuf;

use app::SkyfareApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional first argument: booking file to open at startup.
    let cli_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = config::from_env(cli_path.clone()).unwrap_or_else(|e| {
        log::error!("{e:#}; falling back to default settings");
        config::Settings {
            data_path: cli_path,
            ..Default::default()
        }
    });
    let [width, height] = settings.window_size;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Skyfare – Flight Booking Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SkyfareApp::new(settings)))),
    )
}
