use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Cell identifiers
// ---------------------------------------------------------------------------

/// Integer key of one cell, taken from the header row of a recording.
pub type CellId = i64;

/// Substituted for header tokens that are not numbers.
pub const INVALID_CELL_ID: CellId = -1;

/// Number of samples every trace is resampled to unless configured otherwise.
pub const DEFAULT_RESAMPLE_LENGTH: usize = 1000;

// ---------------------------------------------------------------------------
// Recording – one parsed input file
// ---------------------------------------------------------------------------

/// A recording file as read from disk, before resampling.
#[derive(Debug, Clone)]
pub struct Recording {
    pub path: PathBuf,
    /// Label derived from the file name.
    pub label: String,
    /// One identifier per cell, in column order of the source file.
    pub cell_ids: Vec<CellId>,
    /// Raw traces (cells × time). Trailing zeros mean "no data".
    pub traces: Vec<Vec<f64>>,
    /// How many header tokens were replaced by [`INVALID_CELL_ID`].
    pub invalid_ids: usize,
}

impl Recording {
    /// Number of time samples per raw trace.
    pub fn sample_count(&self) -> usize {
        self.traces.first().map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Dataset – a recording resampled onto the common time axis
// ---------------------------------------------------------------------------

/// One loaded file with every trace resampled to the same length.
///
/// Datasets are never modified after loading; a new load replaces them.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub label: String,
    pub cell_ids: Vec<CellId>,
    /// Resampled traces (cells × resample length).
    pub traces: Vec<Vec<f64>>,
    /// Length of the raw traces before resampling.
    pub raw_samples: usize,
    pub invalid_ids: usize,
}

impl Dataset {
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether the dataset holds no cells.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Length of every resampled trace.
    pub fn resample_length(&self) -> usize {
        self.traces.first().map_or(0, Vec::len)
    }

    /// Position of the first cell carrying `id`.
    pub fn position_of(&self, id: CellId) -> Option<usize> {
        self.cell_ids.iter().position(|&c| c == id)
    }

    /// Short description for status lines, e.g. `ctrl: 40 cells, 300 → 1000 samples`.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} cells, {} → {} samples",
            self.label,
            self.len(),
            self.raw_samples,
            self.resample_length()
        )
    }
}
