use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{AppState, Screen};
use crate::ui::panels::open_files_dialog;

// ---------------------------------------------------------------------------
// File selection screen
// ---------------------------------------------------------------------------

/// Render the list of chosen files and the buttons leading to the plots.
pub fn file_selection(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("Select Fluorescence Data Files");
    });
    ui.add_space(4.0);

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Select Files").clicked() {
            open_files_dialog(state);
        }
        if ui
            .add_enabled(
                !state.selected_files.is_empty(),
                egui::Button::new("Remove Selected"),
            )
            .clicked()
        {
            state.remove_selected_files();
        }
    });
    ui.separator();

    if state.file_paths.is_empty() {
        ui.label("No files selected.");
    } else {
        file_table(ui, state);
    }

    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        let ready = !state.file_paths.is_empty();
        if ui
            .add_enabled(ready, egui::Button::new("Plot Individual Cells"))
            .clicked()
        {
            state.proceed_to(Screen::CellPlot);
        }
        if ui
            .add_enabled(ready, egui::Button::new("Plot Average Intensity"))
            .clicked()
        {
            state.proceed_to(Screen::AveragePlot);
        }
    });
}

fn file_table(ui: &mut Ui, state: &mut AppState) {
    let rows: Vec<(String, String)> = state
        .file_paths
        .iter()
        .map(|p| {
            (
                rusty_fluo::data::loader::label_from_path(p),
                p.display().to_string(),
            )
        })
        .collect();

    let mut toggled = None;
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(240.0)
        .column(Column::auto())
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("");
            });
            header.col(|ui| {
                ui.strong("Label");
            });
            header.col(|ui| {
                ui.strong("Path");
            });
        })
        .body(|mut body| {
            for (i, (label, path)) in rows.iter().enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        let mut checked = state.selected_files.contains(&i);
                        if ui.checkbox(&mut checked, "").changed() {
                            toggled = Some(i);
                        }
                    });
                    row.col(|ui| {
                        ui.label(label);
                    });
                    row.col(|ui| {
                        ui.label(path);
                    });
                });
            }
        });

    if let Some(i) = toggled {
        state.toggle_file_selection(i);
    }
}
