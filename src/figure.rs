use crate::data::aggregate::{average_curves, cell_curves, AverageCurve, CellCurve};
use crate::data::model::{CellId, Dataset};
use crate::error::AnalysisError;
use crate::settings::PlotSettings;

pub const AVERAGE_TITLE: &str = "Average Intensity Across All Cells";

/// Curves ready to draw, either on screen or into an exported image.
#[derive(Debug, Clone)]
pub enum Figure {
    Cell {
        cell_id: CellId,
        curves: Vec<CellCurve>,
    },
    Average {
        curves: Vec<AverageCurve>,
    },
}

impl Figure {
    /// One curve per dataset for `cell_id`.
    pub fn cell(
        cell_id: CellId,
        datasets: &[Dataset],
        settings: &PlotSettings,
    ) -> Result<Self, AnalysisError> {
        let curves = cell_curves(cell_id, datasets, settings.normalize)?;
        Ok(Figure::Cell { cell_id, curves })
    }

    /// Mean curve and band per dataset.
    pub fn average(datasets: &[Dataset], settings: &PlotSettings) -> Self {
        let curves = average_curves(datasets, settings.normalize, settings.variability());
        Figure::Average { curves }
    }

    pub fn title(&self, settings: &PlotSettings) -> String {
        match self {
            Figure::Cell { cell_id, .. } => settings
                .title_or(&format!("Cell ID: {cell_id}"))
                .to_string(),
            Figure::Average { .. } => settings.title_or(AVERAGE_TITLE).to_string(),
        }
    }

    /// Number of curves (one per dataset).
    pub fn len(&self) -> usize {
        match self {
            Figure::Cell { curves, .. } => curves.len(),
            Figure::Average { curves } => curves.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Map a value onto the plotted y axis. On a log axis non-positive values
/// have no position and become NaN.
pub fn y_position(value: f64, log_scale: bool) -> f64 {
    if !log_scale {
        value
    } else if value > 0.0 {
        value.log10()
    } else {
        f64::NAN
    }
}

/// Contiguous stretches of plottable points, as `(index, y)` pairs.
pub fn finite_runs(values: &[f64], log_scale: bool) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        let y = y_position(v, log_scale);
        if y.is_finite() {
            current.push((i as f64, y));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Closed outlines of the band between `lower` and `upper`, one per
/// contiguous stretch where both bounds are plottable.
pub fn band_polygons(lower: &[f64], upper: &[f64], log_scale: bool) -> Vec<Vec<(f64, f64)>> {
    let mut polygons = Vec::new();
    let mut top: Vec<(f64, f64)> = Vec::new();
    let mut bottom: Vec<(f64, f64)> = Vec::new();

    let mut flush = |top: &mut Vec<(f64, f64)>, bottom: &mut Vec<(f64, f64)>| {
        if top.len() >= 2 {
            let mut outline = std::mem::take(top);
            outline.extend(bottom.drain(..).rev());
            polygons.push(outline);
        }
        top.clear();
        bottom.clear();
    };

    for (i, (&lo, &hi)) in lower.iter().zip(upper).enumerate() {
        let (lo, hi) = (y_position(lo, log_scale), y_position(hi, log_scale));
        if lo.is_finite() && hi.is_finite() {
            top.push((i as f64, hi));
            bottom.push((i as f64, lo));
        } else {
            flush(&mut top, &mut bottom);
        }
    }
    flush(&mut top, &mut bottom);
    polygons
}

/// The band between `lower` and `upper` as one quadrilateral per step, for
/// renderers that only fill convex shapes.
pub fn band_quads(lower: &[f64], upper: &[f64], log_scale: bool) -> Vec<[[f64; 2]; 4]> {
    let lo: Vec<f64> = lower.iter().map(|&v| y_position(v, log_scale)).collect();
    let hi: Vec<f64> = upper.iter().map(|&v| y_position(v, log_scale)).collect();
    let n = lo.len().min(hi.len());
    (1..n)
        .filter(|&i| [lo[i - 1], lo[i], hi[i - 1], hi[i]].iter().all(|v| v.is_finite()))
        .map(|i| {
            let (x0, x1) = ((i - 1) as f64, i as f64);
            [[x0, hi[i - 1]], [x1, hi[i]], [x1, lo[i]], [x0, lo[i - 1]]]
        })
        .collect()
}
