use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::{PercentileRange, Variability};
use crate::data::model::DEFAULT_RESAMPLE_LENGTH;

/// Environment variable naming an optional JSON settings file.
pub const SETTINGS_ENV: &str = "RUSTY_FLUO_SETTINGS";

// ---------------------------------------------------------------------------
// Variability selector
// ---------------------------------------------------------------------------

/// The band shown around average curves, as picked in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VariabilityKind {
    #[default]
    None,
    StandardDeviation,
    StandardError,
    Percentiles,
}

impl VariabilityKind {
    pub const ALL: [VariabilityKind; 4] = [
        VariabilityKind::None,
        VariabilityKind::StandardDeviation,
        VariabilityKind::StandardError,
        VariabilityKind::Percentiles,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VariabilityKind::None => "None",
            VariabilityKind::StandardDeviation => "Standard Deviation",
            VariabilityKind::StandardError => "Standard Error",
            VariabilityKind::Percentiles => "Percentiles",
        }
    }
}

// ---------------------------------------------------------------------------
// Figure size
// ---------------------------------------------------------------------------

/// Figure dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width: f32,
    pub height: f32,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width: 6.0,
            height: 4.0,
        }
    }
}

impl FigureSize {
    /// Parse `"w,h"`; malformed or non-positive input gives 6×4.
    pub fn parse(text: &str) -> Self {
        let dims: Vec<f32> = text
            .split(',')
            .map_while(|t| t.trim().parse::<f32>().ok())
            .collect();
        match (dims.as_slice(), text.split(',').count()) {
            ([w, h], 2) if *w > 0.0 && *h > 0.0 && w.is_finite() && h.is_finite() => Self {
                width: *w,
                height: *h,
            },
            _ => Self::default(),
        }
    }

    /// Pixel dimensions at `dpi` pixels per inch.
    pub fn pixels(self, dpi: f32) -> (u32, u32) {
        (
            (self.width * dpi).round().max(1.0) as u32,
            (self.height * dpi).round().max(1.0) as u32,
        )
    }
}

// ---------------------------------------------------------------------------
// Plot settings
// ---------------------------------------------------------------------------

/// Display options edited on the plot screens.
///
/// Free-text fields are kept as typed and parsed when a plot is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    /// `"width,height"` in inches.
    pub figure_size: String,
    /// Comma separated colour names or `#rrggbb`.
    pub colors: String,
    pub show_y_ticks: bool,
    pub show_x_ticks: bool,
    pub log_scale: bool,
    pub normalize: bool,
    pub grid: bool,
    pub y_label: String,
    pub x_label: String,
    /// Empty means "use the default title of the view".
    pub title: String,
    pub variability: VariabilityKind,
    /// `"low,high"` percentiles for [`VariabilityKind::Percentiles`].
    pub percentile_range: String,
    /// Samples per resampled trace.
    pub resample_length: usize,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            figure_size: "6,4".to_string(),
            colors: "blue,red".to_string(),
            show_y_ticks: true,
            show_x_ticks: true,
            log_scale: false,
            normalize: true,
            grid: false,
            y_label: "Intensity".to_string(),
            x_label: "Distance - Normalised".to_string(),
            title: String::new(),
            variability: VariabilityKind::None,
            percentile_range: "25,75".to_string(),
            resample_length: DEFAULT_RESAMPLE_LENGTH,
        }
    }
}

impl PlotSettings {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings: PlotSettings =
            serde_json::from_str(&text).context("parsing settings JSON")?;
        Ok(settings)
    }

    /// Settings from [`SETTINGS_ENV`] if set and readable, defaults otherwise.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(SETTINGS_ENV) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded plot settings from {}", Path::new(&path).display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file: {e:#}");
                Self::default()
            }
        }
    }

    pub fn figure_size(&self) -> FigureSize {
        FigureSize::parse(&self.figure_size)
    }

    /// Resolve the selector and percentile text into a band policy.
    pub fn variability(&self) -> Variability {
        match self.variability {
            VariabilityKind::None => Variability::None,
            VariabilityKind::StandardDeviation => Variability::StandardDeviation,
            VariabilityKind::StandardError => Variability::StandardError,
            VariabilityKind::Percentiles => {
                Variability::Percentiles(PercentileRange::parse(&self.percentile_range))
            }
        }
    }

    /// The user title, or `fallback` when none was entered.
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.title.trim().is_empty() {
            fallback
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn figure_size_parses_and_falls_back() {
        assert_eq!(
            FigureSize::parse("8, 5"),
            FigureSize {
                width: 8.0,
                height: 5.0
            }
        );
        for text in ["", "8", "8,x", "8,5,3", "0,4", "-1,2"] {
            assert_eq!(FigureSize::parse(text), FigureSize::default(), "{text}");
        }
    }

    #[test]
    fn figure_size_pixels_at_300_dpi() {
        assert_eq!(FigureSize::default().pixels(300.0), (1800, 1200));
    }

    #[test]
    fn variability_resolves_percentiles() {
        let mut settings = PlotSettings {
            variability: VariabilityKind::Percentiles,
            percentile_range: "5,95".to_string(),
            ..Default::default()
        };
        assert_eq!(
            settings.variability(),
            Variability::Percentiles(PercentileRange { low: 5.0, high: 95.0 })
        );

        settings.percentile_range = "garbage".to_string();
        assert_eq!(
            settings.variability(),
            Variability::Percentiles(PercentileRange::default())
        );
    }

    #[test]
    fn empty_title_uses_fallback() {
        let mut settings = PlotSettings::default();
        assert_eq!(settings.title_or("Cell ID: 4"), "Cell ID: 4");
        settings.title = "Mine".to_string();
        assert_eq!(settings.title_or("Cell ID: 4"), "Mine");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"colors": "green", "log_scale": true}}"#).unwrap();

        let settings = PlotSettings::load(file.path()).unwrap();
        assert_eq!(settings.colors, "green");
        assert!(settings.log_scale);
        assert_eq!(settings.figure_size, "6,4");
        assert_eq!(settings.resample_length, DEFAULT_RESAMPLE_LENGTH);
    }

    #[test]
    fn unreadable_settings_are_an_error() {
        assert!(PlotSettings::load(Path::new("/nonexistent/settings.json")).is_err());
    }
}
