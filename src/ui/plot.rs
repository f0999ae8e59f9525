use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Polygon};

use rusty_fluo::color::{color_for, parse_colors, Rgb};
use rusty_fluo::figure::{band_quads, finite_runs, Figure};
use rusty_fluo::settings::PlotSettings;

use crate::state::AppState;

/// On-screen pixels per inch of figure size.
const SCREEN_DPI: f32 = 100.0;

// ---------------------------------------------------------------------------
// Fluorescence plot (central panel)
// ---------------------------------------------------------------------------

/// Render the current figure in the central panel.
pub fn fluorescence_plot(ui: &mut Ui, state: &AppState) {
    let figure = match &state.figure {
        Some(f) => f,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Adjust the parameters and press Plot");
            });
            return;
        }
    };

    let settings = &state.settings;
    let colors = parse_colors(&settings.colors, figure.len());
    let size = settings.figure_size();

    ui.heading(figure.title(settings));

    let mut plot = Plot::new("fluorescence_plot")
        .legend(Legend::default())
        .x_axis_label(settings.x_label.clone())
        .y_axis_label(y_axis_label(settings))
        .show_grid(settings.grid)
        .width(size.width * SCREEN_DPI)
        .height(size.height * SCREEN_DPI)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if !settings.show_x_ticks {
        plot = plot.x_axis_formatter(|_, _| String::new());
    }
    if !settings.show_y_ticks {
        plot = plot.y_axis_formatter(|_, _| String::new());
    } else if settings.log_scale {
        plot = plot.y_axis_formatter(|mark, _| format!("{:.1e}", 10f64.powf(mark.value)));
    }

    let log_scale = settings.log_scale;
    plot.show(ui, |plot_ui| match figure {
        Figure::Cell { curves, .. } => {
            for (i, curve) in curves.iter().enumerate() {
                let color = to_color32(color_for(&colors, i));
                let name = curve.legend_label();
                for run in finite_runs(&curve.values, log_scale) {
                    let points: PlotPoints = run.into_iter().map(|(x, y)| [x, y]).collect();
                    plot_ui.line(Line::new(points).name(&name).color(color).width(1.5));
                }
            }
        }
        Figure::Average { curves } => {
            for (i, curve) in curves.iter().enumerate() {
                let color = to_color32(color_for(&colors, i));
                let fill = color.gamma_multiply(0.3);
                for quad in band_quads(&curve.lower, &curve.upper, log_scale) {
                    let band = Polygon::new(PlotPoints::from(quad.to_vec()))
                        .fill_color(fill)
                        .stroke(Stroke::NONE);
                    plot_ui.polygon(band);
                }
                for run in finite_runs(&curve.mean, log_scale) {
                    let points: PlotPoints = run.into_iter().map(|(x, y)| [x, y]).collect();
                    plot_ui.line(Line::new(points).name(&curve.label).color(color).width(1.5));
                }
            }
        }
    });
}

fn y_axis_label(settings: &PlotSettings) -> String {
    if settings.log_scale {
        format!("{} (log)", settings.y_label)
    } else {
        settings.y_label.clone()
    }
}

fn to_color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}
