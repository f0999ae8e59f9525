//! Resampling of variable-length traces onto a fixed-length `[0, 1]` axis.
//!
//! Cells stop recording at different times; the unrecorded tail of each trace
//! is zero-padded in the input file. Every trace is cut at its last non-zero
//! sample and stretched over a normalised timeline so that equivalent phases
//! line up across cells.

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Number of leading samples before the trailing zero padding.
///
/// An all-zero (or empty) row has an effective length of 1.
pub fn effective_length(row: &[f64]) -> usize {
    row.iter().rposition(|&v| v != 0.0).map_or(1, |last| last + 1)
}

/// `n` evenly spaced points covering `[0, 1]`, both ends included.
pub fn linspace(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { 1.0 } else { i as f64 / last })
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Piecewise-linear interpolant
// ---------------------------------------------------------------------------

/// Piecewise-linear function through a set of knots.
///
/// Points left of the first knot or right of the last one are extrapolated
/// from the outermost segment.
#[derive(Debug, Clone)]
pub struct LinearInterpolator<'a> {
    xs: &'a [f64],
    ys: &'a [f64],
}

impl<'a> LinearInterpolator<'a> {
    /// Build an interpolant. Needs at least two knots, `xs` strictly
    /// increasing and the same length as `ys`.
    pub fn new(xs: &'a [f64], ys: &'a [f64]) -> Option<Self> {
        if xs.len() < 2 || xs.len() != ys.len() {
            return None;
        }
        if xs.windows(2).any(|w| !(w[0] < w[1])) {
            return None;
        }
        Some(Self { xs, ys })
    }

    /// Evaluate at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // Index of the segment [xs[i], xs[i + 1]] used for x, clamped so the
        // outer segments also serve extrapolation.
        let upper = self.xs.partition_point(|&k| k <= x);
        let i = upper.saturating_sub(1).min(n - 2);

        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}

// ---------------------------------------------------------------------------
// Trace resampling
// ---------------------------------------------------------------------------

/// Resample one raw trace to exactly `target_len` samples.
pub fn resample_trace(row: &[f64], target_len: usize) -> Vec<f64> {
    let m_sample = effective_length(row);
    if m_sample < 2 {
        let first = row.first().copied().unwrap_or(f64::NAN);
        return vec![first; target_len];
    }

    let x_source = linspace(m_sample);
    let x_target = linspace(target_len);
    match LinearInterpolator::new(&x_source, &row[..m_sample]) {
        Some(f) => x_target.iter().map(|&x| f.eval(x)).collect(),
        None => vec![row[0]; target_len],
    }
}

/// Resample every row of a cells × time matrix.
pub fn resample_traces(rows: &[Vec<f64>], target_len: usize) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| resample_trace(row, target_len))
        .collect()
}
