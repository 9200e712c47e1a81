mod app;
mod color;
mod data;
mod embedding;
mod export;
mod state;
mod ui;
mod view;

use std::path::PathBuf;

use app::EmbleApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional table to open at start.
    let initial = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Emble – Embedding Explorer",
        options,
        Box::new(|cc| Ok(Box::new(EmbleApp::new(cc, initial)))),
    )
}
