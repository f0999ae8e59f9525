//! Curves derived from resampled datasets: single-cell traces and the
//! cross-cell mean with a variability band.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

use super::model::{CellId, Dataset};

// ---------------------------------------------------------------------------
// Variability band selection
// ---------------------------------------------------------------------------

/// Lower/upper percentile pair, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileRange {
    pub low: f64,
    pub high: f64,
}

impl Default for PercentileRange {
    fn default() -> Self {
        Self {
            low: 25.0,
            high: 75.0,
        }
    }
}

impl PercentileRange {
    /// Parse `"low,high"`. Anything else falls back to `25,75`.
    pub fn parse(text: &str) -> Self {
        let parts: Vec<&str> = text.split(',').collect();
        let parsed = match parts.as_slice() {
            [low, high] => low
                .trim()
                .parse::<f64>()
                .ok()
                .zip(high.trim().parse::<f64>().ok()),
            _ => None,
        };
        match parsed {
            Some((low, high)) if in_percent_range(low) && in_percent_range(high) => {
                Self { low, high }
            }
            _ => {
                log::warn!("Invalid percentile range '{text}', using 25,75");
                Self::default()
            }
        }
    }
}

fn in_percent_range(p: f64) -> bool {
    (0.0..=100.0).contains(&p)
}

/// How the spread across cells is drawn around the mean curve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Variability {
    /// Zero-width band.
    #[default]
    None,
    /// Mean ± population standard deviation.
    StandardDeviation,
    /// Mean ± standard deviation / √(number of cells).
    StandardError,
    /// Column-wise percentile interval.
    Percentiles(PercentileRange),
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Largest non-NaN value, if any.
fn nan_max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

/// Smallest non-NaN value, if any.
fn nan_min(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
}

/// Divide a curve by its maximum. A zero (or undefined) maximum leaves the
/// curve unchanged.
pub fn normalize_by_max(values: &[f64]) -> Vec<f64> {
    match nan_max(values) {
        Some(max) if max != 0.0 => values.iter().map(|v| v / max).collect(),
        _ => values.to_vec(),
    }
}

/// Map a row onto `[0, 1]` via `(x - min) / (max - min)`. Constant rows are
/// left unchanged.
pub fn normalize_min_max(values: &[f64]) -> Vec<f64> {
    match (nan_min(values), nan_max(values)) {
        (Some(min), Some(max)) if max != min => {
            let range = max - min;
            values.iter().map(|v| (v - min) / range).collect()
        }
        _ => values.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// NaN-ignoring column statistics
// ---------------------------------------------------------------------------

fn present(column: &[f64]) -> Vec<f64> {
    column.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Mean of the non-NaN values, NaN if there are none.
pub fn nan_mean(column: &[f64]) -> f64 {
    let values = present(column);
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of the non-NaN values.
pub fn nan_std(column: &[f64]) -> f64 {
    let values = present(column);
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// Percentile `p` (0–100) of the non-NaN values, interpolating linearly
/// between the two closest ranks.
pub fn nan_percentile(column: &[f64], p: f64) -> f64 {
    let mut values = present(column);
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);

    let rank = (p / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return values[lo];
    }
    values[lo] + (rank - lo as f64) * (values[hi] - values[lo])
}

/// Apply `stat` to every column of a rows × columns matrix.
fn column_wise(rows: &[Vec<f64>], len: usize, stat: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut column = Vec::with_capacity(rows.len());
    (0..len)
        .map(|j| {
            column.clear();
            column.extend(rows.iter().map(|r| r.get(j).copied().unwrap_or(f64::NAN)));
            stat(&column)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-cell curves
// ---------------------------------------------------------------------------

/// One dataset's trace for the selected cell.
#[derive(Debug, Clone)]
pub struct CellCurve {
    pub label: String,
    pub values: Vec<f64>,
    /// Maximum of `values`, shown in the legend.
    pub max: f64,
}

impl CellCurve {
    pub fn legend_label(&self) -> String {
        format!("{} (max {:.0})", self.label, self.max)
    }
}

/// The trace of cell `id` from every dataset.
///
/// The position of `id` is looked up in the first dataset and the same
/// position is used in every other dataset.
pub fn cell_curves(
    id: CellId,
    datasets: &[Dataset],
    normalize: bool,
) -> Result<Vec<CellCurve>, AnalysisError> {
    let first = datasets.first().ok_or(AnalysisError::NoDatasets)?;
    let index = first
        .position_of(id)
        .ok_or(AnalysisError::UnknownCell(id))?;

    datasets
        .iter()
        .map(|ds| {
            let trace = ds
                .traces
                .get(index)
                .ok_or_else(|| AnalysisError::MissingRow {
                    label: ds.label.clone(),
                    index,
                })?;
            let values = if normalize {
                normalize_by_max(trace)
            } else {
                trace.clone()
            };
            let max = nan_max(&values).unwrap_or(f64::NAN);
            Ok(CellCurve {
                label: ds.label.clone(),
                values,
                max,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cross-cell averages
// ---------------------------------------------------------------------------

/// Mean curve of one dataset with its variability band.
#[derive(Debug, Clone)]
pub struct AverageCurve {
    pub label: String,
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Column-wise mean and band for every dataset.
pub fn average_curves(
    datasets: &[Dataset],
    normalize: bool,
    variability: Variability,
) -> Vec<AverageCurve> {
    datasets
        .iter()
        .map(|ds| average_curve(ds, normalize, variability))
        .collect()
}

fn average_curve(ds: &Dataset, normalize: bool, variability: Variability) -> AverageCurve {
    let normalized;
    let rows: &[Vec<f64>] = if normalize {
        normalized = ds
            .traces
            .iter()
            .map(|row| normalize_min_max(row))
            .collect::<Vec<_>>();
        &normalized
    } else {
        &ds.traces
    };

    let len = ds.resample_length();
    let mean = column_wise(rows, len, nan_mean);

    let (lower, upper) = match variability {
        Variability::None => (mean.clone(), mean.clone()),
        Variability::StandardDeviation => {
            let std = column_wise(rows, len, nan_std);
            band(&mean, &std)
        }
        Variability::StandardError => {
            let sqrt_n = (rows.len() as f64).sqrt();
            let sem: Vec<f64> = column_wise(rows, len, nan_std)
                .into_iter()
                .map(|s| s / sqrt_n)
                .collect();
            band(&mean, &sem)
        }
        Variability::Percentiles(range) => (
            column_wise(rows, len, |c| nan_percentile(c, range.low)),
            column_wise(rows, len, |c| nan_percentile(c, range.high)),
        ),
    };

    AverageCurve {
        label: ds.label.clone(),
        mean,
        lower,
        upper,
    }
}

fn band(mean: &[f64], spread: &[f64]) -> (Vec<f64>, Vec<f64>) {
    mean.iter()
        .zip(spread)
        .map(|(m, s)| (m - s, m + s))
        .unzip()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn dataset(label: &str, ids: &[CellId], traces: Vec<Vec<f64>>) -> Dataset {
        Dataset {
            path: PathBuf::from(format!("run_{label}_data.tsv")),
            label: label.to_string(),
            cell_ids: ids.to_vec(),
            raw_samples: traces.first().map_or(0, Vec::len),
            traces,
            invalid_ids: 0,
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn percentile_range_parses_pairs() {
        assert_eq!(
            PercentileRange::parse(" 10, 90 "),
            PercentileRange { low: 10.0, high: 90.0 }
        );
    }

    #[test]
    fn percentile_range_falls_back() {
        for text in ["", "10", "a,b", "10,20,30", "-5,50", "10,101"] {
            assert_eq!(PercentileRange::parse(text), PercentileRange::default(), "{text}");
        }
    }

    #[test]
    fn normalize_by_max_keeps_zero_curve() {
        assert_eq!(normalize_by_max(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
        assert_close(&normalize_by_max(&[1.0, 2.0, 4.0]), &[0.25, 0.5, 1.0]);
    }

    #[test]
    fn normalize_min_max_maps_to_unit_range() {
        assert_close(&normalize_min_max(&[2.0, 4.0, 6.0]), &[0.0, 0.5, 1.0]);
        assert_eq!(normalize_min_max(&[3.0, 3.0]), vec![3.0, 3.0]);
        let with_nan = normalize_min_max(&[1.0, f64::NAN, 3.0]);
        assert_eq!(with_nan[0], 0.0);
        assert!(with_nan[1].is_nan());
        assert_eq!(with_nan[2], 1.0);
    }

    #[test]
    fn column_statistics_ignore_nan() {
        assert_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert_eq!(nan_std(&[1.0, f64::NAN, 3.0]), 1.0);
        assert!(nan_mean(&[f64::NAN]).is_nan());
        assert_eq!(nan_percentile(&[4.0, 1.0, 3.0, 2.0], 50.0), 2.5);
        assert_eq!(nan_percentile(&[4.0, 1.0, f64::NAN, 2.0], 0.0), 1.0);
        assert_eq!(nan_percentile(&[4.0, 1.0, 3.0, 2.0], 100.0), 4.0);
        assert_eq!(nan_percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 25.0), 2.0);
    }

    #[test]
    fn cell_curves_align_by_position() {
        let a = dataset("ctrl", &[7, 8], vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = dataset("ko", &[99, 100], vec![vec![5.0, 6.0], vec![0.0, 8.0]]);
        let curves = cell_curves(8, &[a, b], false).unwrap();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].label, "ctrl");
        assert_eq!(curves[0].values, vec![3.0, 4.0]);
        assert_eq!(curves[1].values, vec![0.0, 8.0]);
        assert_eq!(curves[1].max, 8.0);
    }

    #[test]
    fn cell_curves_normalize_by_max() {
        let a = dataset("ctrl", &[1, 2], vec![vec![1.0, 4.0], vec![0.0, 0.0]]);
        let curves = cell_curves(1, std::slice::from_ref(&a), true).unwrap();
        assert_close(&curves[0].values, &[0.25, 1.0]);
        assert_eq!(curves[0].max, 1.0);

        let zero = cell_curves(2, &[a], true).unwrap();
        assert_eq!(zero[0].values, vec![0.0, 0.0]);
    }

    #[test]
    fn cell_curves_report_lookup_failures() {
        let a = dataset("ctrl", &[1, 2], vec![vec![1.0], vec![2.0]]);
        let b = dataset("ko", &[1], vec![vec![1.0]]);
        assert!(matches!(
            cell_curves(3, std::slice::from_ref(&a), false),
            Err(AnalysisError::UnknownCell(3))
        ));
        assert!(matches!(
            cell_curves(2, &[a, b], false),
            Err(AnalysisError::MissingRow { index: 1, .. })
        ));
        assert!(matches!(cell_curves(1, &[], false), Err(AnalysisError::NoDatasets)));
    }

    #[test]
    fn identical_rows_give_zero_width_bands() {
        let row = vec![1.0, 5.0, 2.0];
        let ds = dataset("ctrl", &[1, 2], vec![row.clone(), row.clone()]);
        for variability in [
            Variability::None,
            Variability::StandardDeviation,
            Variability::StandardError,
            Variability::Percentiles(PercentileRange::default()),
        ] {
            let avg = &average_curves(std::slice::from_ref(&ds), false, variability)[0];
            assert_close(&avg.mean, &row);
            assert_close(&avg.lower, &row);
            assert_close(&avg.upper, &row);
        }
    }

    #[test]
    fn standard_deviation_and_error_bands() {
        let ds = dataset("ctrl", &[1, 2], vec![vec![0.0, 2.0], vec![2.0, 6.0]]);
        let sd = &average_curves(std::slice::from_ref(&ds), false, Variability::StandardDeviation)[0];
        assert_close(&sd.mean, &[1.0, 4.0]);
        assert_close(&sd.lower, &[0.0, 2.0]);
        assert_close(&sd.upper, &[2.0, 6.0]);

        let se = &average_curves(&[ds], false, Variability::StandardError)[0];
        let s = 2f64.sqrt();
        assert_close(&se.lower, &[1.0 - 1.0 / s, 4.0 - 2.0 / s]);
        assert_close(&se.upper, &[1.0 + 1.0 / s, 4.0 + 2.0 / s]);
    }

    #[test]
    fn full_percentile_range_is_min_max() {
        let ds = dataset(
            "ctrl",
            &[1, 2, 3],
            vec![vec![3.0, -1.0], vec![1.0, 7.0], vec![2.0, 0.5]],
        );
        let range = PercentileRange { low: 0.0, high: 100.0 };
        let avg = &average_curves(&[ds], false, Variability::Percentiles(range))[0];
        assert_eq!(avg.lower, vec![1.0, -1.0]);
        assert_eq!(avg.upper, vec![3.0, 7.0]);
    }

    #[test]
    fn averages_normalize_each_row_first() {
        let ds = dataset("ctrl", &[1, 2], vec![vec![0.0, 10.0], vec![5.0, 7.0]]);
        let avg = &average_curves(&[ds], true, Variability::None)[0];
        assert_close(&avg.mean, &[0.0, 1.0]);
    }

    #[test]
    fn one_average_per_dataset() {
        let a = dataset("ctrl", &[1], vec![vec![1.0, 2.0]]);
        let b = dataset("ko", &[1], vec![vec![3.0, 4.0]]);
        let curves = average_curves(&[a, b], false, Variability::None);
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[1].label, "ko");
        assert_eq!(curves[1].mean, vec![3.0, 4.0]);
    }
}
