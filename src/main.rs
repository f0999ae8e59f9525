mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::RustyFluoApp;
use eframe::egui;
use rusty_fluo::settings::PlotSettings;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let mut state = AppState::new(PlotSettings::from_env());
    // Files given on the command line start out selected.
    state.add_files(std::env::args_os().skip(1).map(PathBuf::from));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Fluo – Fluorescence Data Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(RustyFluoApp::new(state)))),
    )
}
