//! Raster export of the current figure.
//!
//! Figures are redrawn off-screen with plotters at [`EXPORT_DPI`] pixels per
//! inch of the configured figure size, then encoded as JPEG (default) or PNG.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::{ExtendedColorType, ImageFormat};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::color::{color_for, parse_colors, Rgb};
use crate::error::ExportError;
use crate::figure::{band_polygons, finite_runs, y_position, Figure};
use crate::settings::PlotSettings;

/// Resolution of exported images.
pub const EXPORT_DPI: u16 = 300;

const JPEG_QUALITY: u8 = 95;

/// Largest exported image side in pixels.
pub const MAX_EXPORT_SIDE: u32 = 1 << 16;

/// Largest exported image area in pixels (8192 × 8192).
pub const MAX_EXPORT_PIXELS: u64 = 1 << 26;

/// An RGB8 pixel buffer.
#[derive(Debug, Clone)]
pub struct RenderedFigure {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Render `figure` and write it to `path`. `.png` paths are written as PNG,
/// everything else as JPEG.
pub fn save_figure(
    figure: &Figure,
    settings: &PlotSettings,
    path: &Path,
) -> Result<(), ExportError> {
    let rendered = render_figure(figure, settings)?;
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));

    if is_png {
        image::save_buffer_with_format(
            path,
            &rendered.pixels,
            rendered.width,
            rendered.height,
            ExtendedColorType::Rgb8,
            ImageFormat::Png,
        )?;
    } else {
        let io_err = |source: std::io::Error| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.set_pixel_density(PixelDensity::dpi(EXPORT_DPI));
            encoder.encode(
                &rendered.pixels,
                rendered.width,
                rendered.height,
                ExtendedColorType::Rgb8,
            )?;
        }
        writer.flush().map_err(io_err)?;
    }

    log::info!(
        "Saved {}×{} figure to {}",
        rendered.width,
        rendered.height,
        path.display()
    );
    Ok(())
}

/// Draw `figure` into an in-memory RGB buffer.
pub fn render_figure(
    figure: &Figure,
    settings: &PlotSettings,
) -> Result<RenderedFigure, ExportError> {
    let dpi = f32::from(EXPORT_DPI);
    let (width, height) = settings.figure_size().pixels(dpi);
    // Sizes below are in points (1/72 inch).
    let px = |points: f64| points * f64::from(dpi) / 72.0;

    let colors = parse_colors(&settings.colors, figure.len());
    let log_scale = settings.log_scale;
    let (x_max, (y_min, y_max)) = axis_ranges(figure, log_scale);

    let len = buffer_len(width, height).ok_or(ExportError::TooLarge { width, height })?;
    let mut pixels = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(px(8.0) as u32)
            .caption(figure.title(settings), ("sans-serif", px(12.0)).into_font())
            .x_label_area_size(px(30.0) as u32)
            .y_label_area_size(px(42.0) as u32)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

        let no_labels = |_: &f64| String::new();
        let log_labels = |v: &f64| format!("{:.1e}", 10f64.powf(*v));
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(settings.x_label.as_str())
            .y_desc(settings.y_label.as_str())
            .label_style(("sans-serif", px(8.0)).into_font())
            .axis_desc_style(("sans-serif", px(10.0)).into_font());
        if !settings.grid {
            mesh.disable_mesh();
        }
        if !settings.show_x_ticks {
            mesh.x_label_formatter(&no_labels);
        }
        if !settings.show_y_ticks {
            mesh.y_label_formatter(&no_labels);
        } else if log_scale {
            mesh.y_label_formatter(&log_labels);
        }
        mesh.draw()?;

        let line_width = px(1.5) as u32;
        match figure {
            Figure::Cell { curves, .. } => {
                for (i, curve) in curves.iter().enumerate() {
                    let color = to_plotters(color_for(&colors, i));
                    let label = curve.legend_label();
                    draw_line(&mut chart, &curve.values, log_scale, color, line_width, label)?;
                }
            }
            Figure::Average { curves } => {
                for (i, curve) in curves.iter().enumerate() {
                    let color = to_plotters(color_for(&colors, i));
                    for polygon in band_polygons(&curve.lower, &curve.upper, log_scale) {
                        chart.draw_series(std::iter::once(Polygon::new(
                            polygon,
                            color.mix(0.3).filled(),
                        )))?;
                    }
                    let label = curve.label.clone();
                    draw_line(&mut chart, &curve.mean, log_scale, color, line_width, label)?;
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", px(8.0)).into_font())
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(RenderedFigure {
        width,
        height,
        pixels,
    })
}

// ---------------------------------------------------------------------------
// Drawing helpers
// ---------------------------------------------------------------------------

/// Byte length of an RGB8 buffer, or `None` past the export limits.
fn buffer_len(width: u32, height: u32) -> Option<usize> {
    if width > MAX_EXPORT_SIDE || height > MAX_EXPORT_SIDE {
        return None;
    }
    let area = u64::from(width).checked_mul(u64::from(height))?;
    if area > MAX_EXPORT_PIXELS {
        return None;
    }
    usize::try_from(area).ok()?.checked_mul(3)
}

type Chart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn to_plotters(c: Rgb) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

/// Draw one curve (split at gaps) with a single legend entry.
fn draw_line(
    chart: &mut Chart<'_, '_>,
    values: &[f64],
    log_scale: bool,
    color: RGBColor,
    width: u32,
    label: String,
) -> Result<(), ExportError> {
    let style = color.stroke_width(width);
    let mut runs = finite_runs(values, log_scale).into_iter();
    let first = runs.next().unwrap_or_default();
    chart
        .draw_series(LineSeries::new(first, style))?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    for run in runs {
        chart.draw_series(LineSeries::new(run, style))?;
    }
    Ok(())
}

/// Upper x bound and padded y range covering every plotted value.
pub(crate) fn axis_ranges(figure: &Figure, log_scale: bool) -> (f64, (f64, f64)) {
    let series: Vec<&[f64]> = match figure {
        Figure::Cell { curves, .. } => curves.iter().map(|c| c.values.as_slice()).collect(),
        Figure::Average { curves } => curves
            .iter()
            .flat_map(|c| [c.mean.as_slice(), c.lower.as_slice(), c.upper.as_slice()])
            .collect(),
    };

    let len = series.iter().map(|s| s.len()).max().unwrap_or(0);
    let x_max = len.saturating_sub(1).max(1) as f64;

    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.iter())
        .map(|&v| y_position(v, log_scale))
        .filter(|y| y.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });

    let y_range = if lo > hi {
        (0.0, 1.0)
    } else if (hi - lo).abs() < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    };
    (x_max, y_range)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::data::aggregate::{AverageCurve, CellCurve};

    fn average_figure() -> Figure {
        Figure::Average {
            curves: vec![
                AverageCurve {
                    label: "ctrl".to_string(),
                    mean: vec![0.2, 0.5, 0.8, 0.4],
                    lower: vec![0.1, 0.4, 0.6, 0.3],
                    upper: vec![0.3, 0.6, 1.0, 0.5],
                },
                AverageCurve {
                    label: "ko".to_string(),
                    mean: vec![0.1, f64::NAN, 0.3, 0.2],
                    lower: vec![0.0, f64::NAN, 0.2, 0.1],
                    upper: vec![0.2, f64::NAN, 0.4, 0.3],
                },
            ],
        }
    }

    /// Units byte and horizontal density from the JFIF header.
    fn jfif_density(bytes: &[u8]) -> Option<(u8, u16)> {
        let at = bytes.windows(5).position(|w| w == b"JFIF\0")?;
        let units = *bytes.get(at + 7)?;
        let x = u16::from_be_bytes([*bytes.get(at + 8)?, *bytes.get(at + 9)?]);
        Some((units, x))
    }

    #[test]
    fn renders_at_export_resolution() {
        let rendered = render_figure(&average_figure(), &PlotSettings::default()).unwrap();
        assert_eq!((rendered.width, rendered.height), (1800, 1200));
        assert_eq!(rendered.pixels.len(), 1800 * 1200 * 3);
        assert!(rendered.pixels.iter().any(|&p| p != 255));
    }

    #[test]
    fn saves_jpeg_with_dpi_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plot.jpeg");
        save_figure(&average_figure(), &PlotSettings::default(), &path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (1800, 1200));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(jfif_density(&bytes), Some((1, EXPORT_DPI)));
    }

    #[test]
    fn saves_png_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plot.PNG");
        let settings = PlotSettings {
            figure_size: "2,1".to_string(),
            log_scale: true,
            grid: true,
            show_x_ticks: false,
            ..PlotSettings::default()
        };
        save_figure(&average_figure(), &settings, &path).unwrap();

        assert_eq!(
            image::ImageFormat::from_path(&path).unwrap(),
            image::ImageFormat::Png
        );
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (600, 300));
    }

    #[test]
    fn oversized_figures_are_rejected() {
        for size in ["200,200", "10000000,10000000"] {
            let settings = PlotSettings {
                figure_size: size.to_string(),
                ..PlotSettings::default()
            };
            let err = render_figure(&average_figure(), &settings).unwrap_err();
            assert!(matches!(err, ExportError::TooLarge { .. }), "{size}: {err}");
        }
    }

    #[test]
    fn failed_render_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.jpeg");
        let settings = PlotSettings {
            figure_size: "300,1".to_string(),
            ..PlotSettings::default()
        };
        assert!(save_figure(&average_figure(), &settings, &path).is_err());
        assert!(!path.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_failures_are_reported() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let settings = PlotSettings {
            figure_size: "1,1".to_string(),
            ..PlotSettings::default()
        };
        let err = save_figure(&average_figure(), &settings, full).unwrap_err();
        assert!(
            matches!(err, ExportError::Io { .. } | ExportError::Image(_)),
            "{err}"
        );
    }

    #[test]
    fn buffer_len_respects_limits() {
        assert_eq!(buffer_len(1800, 1200), Some(1800 * 1200 * 3));
        assert_eq!(buffer_len(MAX_EXPORT_SIDE + 1, 1), None);
        assert_eq!(buffer_len(MAX_EXPORT_SIDE, MAX_EXPORT_SIDE), None);
    }

    #[test]
    fn axis_ranges_cover_bands() {
        let figure = Figure::Average {
            curves: vec![AverageCurve {
                label: "a".to_string(),
                mean: vec![1.0, 2.0, 3.0],
                lower: vec![0.0, 1.0, 2.0],
                upper: vec![2.0, 3.0, 4.0],
            }],
        };
        let (x_max, (lo, hi)) = axis_ranges(&figure, false);
        assert_eq!(x_max, 2.0);
        assert!(lo < 0.0 && hi > 4.0);
    }

    #[test]
    fn flat_or_empty_figures_get_a_usable_range() {
        let flat = Figure::Cell {
            cell_id: 1,
            curves: vec![CellCurve {
                label: "a".to_string(),
                values: vec![0.0; 4],
                max: 0.0,
            }],
        };
        assert_eq!(axis_ranges(&flat, false), (3.0, (-1.0, 1.0)));
        assert_eq!(axis_ranges(&flat, true), (3.0, (0.0, 1.0)));
    }
}
