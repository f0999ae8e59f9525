use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use rusty_fluo::settings::VariabilityKind;

use crate::state::{AppState, Screen};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Add files…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
            let can_save = state.figure.is_some();
            if ui
                .add_enabled(can_save, egui::Button::new("Save plot…"))
                .clicked()
            {
                save_plot_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.datasets.is_empty() {
            let cells: usize = state.datasets.iter().map(|d| d.len()).sum();
            ui.label(format!(
                "{} file(s) loaded, {cells} cells",
                state.datasets.len()
            ));
            ui.separator();
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        } else if let Some(msg) = &state.notice {
            ui.label(RichText::new(msg).color(Color32::DARK_GREEN));
        }
    });
}

// ---------------------------------------------------------------------------
// Navigation bar (plot screens)
// ---------------------------------------------------------------------------

pub fn nav_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Back to File Selection").clicked() {
            state.back_to_file_selection();
        }
        let switch_text = match state.screen {
            Screen::AveragePlot => "Switch to Individual Plot",
            _ => "Switch to Average Plot",
        };
        if ui.button(switch_text).clicked() {
            state.switch_plot();
        }
        if ui
            .add_enabled(state.figure.is_some(), egui::Button::new("Save Plot"))
            .clicked()
        {
            save_plot_dialog(state);
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – plot parameters
// ---------------------------------------------------------------------------

/// Render the parameter panel of the current plot screen.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Parameters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("plot_params")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui: &mut Ui| {
                    if state.screen == Screen::CellPlot {
                        cell_selector(ui, state);
                    }

                    let s = &mut state.settings;
                    ui.label("Figure Size (w,h):");
                    ui.text_edit_singleline(&mut s.figure_size);
                    ui.end_row();

                    ui.label("Colors (comma separated):");
                    ui.text_edit_singleline(&mut s.colors);
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut s.show_y_ticks, "Show Y-Tick");
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut s.log_scale, "Log Scale");
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut s.normalize, "Normalize Data");
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut s.grid, "Grid");
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut s.show_x_ticks, "Show X-Ticks");
                    ui.end_row();

                    ui.label("Y Label:");
                    ui.text_edit_singleline(&mut s.y_label);
                    ui.end_row();

                    ui.label("X Label:");
                    ui.text_edit_singleline(&mut s.x_label);
                    ui.end_row();

                    ui.label("Title:");
                    ui.text_edit_singleline(&mut s.title);
                    ui.end_row();

                    if state.screen == Screen::AveragePlot {
                        ui.label("Percentile Range (low, high):");
                        ui.text_edit_singleline(&mut s.percentile_range);
                        ui.end_row();

                        ui.label("Variability Type:");
                        egui::ComboBox::from_id_salt("variability")
                            .selected_text(s.variability.label())
                            .show_ui(ui, |ui: &mut Ui| {
                                for kind in VariabilityKind::ALL {
                                    ui.selectable_value(&mut s.variability, kind, kind.label());
                                }
                            });
                        ui.end_row();
                    }
                });

            ui.add_space(8.0);
            if ui.button("Plot").clicked() {
                state.plot();
            }
        });
}

fn cell_selector(ui: &mut Ui, state: &mut AppState) {
    ui.label("Select Cell ID:");
    let ids = state.cell_ids().to_vec();
    let selected_text = state
        .selected_cell
        .map(|id| id.to_string())
        .unwrap_or_default();
    egui::ComboBox::from_id_salt("cell_id")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            for id in ids {
                ui.selectable_value(&mut state.selected_cell, Some(id), id.to_string());
            }
        });
    ui.end_row();
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Select Fluorescence Data Files")
        .add_filter("Tab-separated", &["tsv", "txt", "csv"])
        .add_filter("All files", &["*"])
        .pick_files();

    if let Some(paths) = files {
        log::info!("Selected {} file(s)", paths.len());
        state.add_files(paths);
    }
}

pub fn save_plot_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save plot")
        .add_filter("JPEG files", &["jpeg", "jpg"])
        .add_filter("PNG files", &["png"])
        .set_file_name("plot.jpeg")
        .save_file();

    if let Some(mut path) = file {
        if path.extension().is_none() {
            path.set_extension("jpeg");
        }
        state.save_plot(&path);
    }
}
