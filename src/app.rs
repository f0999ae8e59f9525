use eframe::egui;

use crate::state::{AppState, Screen};
use crate::ui::{files, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyFluoApp {
    pub state: AppState,
}

impl RustyFluoApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for RustyFluoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        if self.state.screen == Screen::FileSelection {
            egui::CentralPanel::default().show(ctx, |ui| {
                files::file_selection(ui, &mut self.state);
            });
            return;
        }

        // ---- Navigation bar ----
        egui::TopBottomPanel::top("nav_bar").show(ctx, |ui| {
            panels::nav_bar(ui, &mut self.state);
        });

        // ---- Left side panel: plot parameters ----
        egui::SidePanel::left("param_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                plot::fluorescence_plot(ui, &self.state);
            });
        });
    }
}
