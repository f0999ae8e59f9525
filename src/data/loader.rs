use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;

use super::model::{CellId, Dataset, Recording, INVALID_CELL_ID};
use super::resample::resample_traces;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every file and resample it to `n_resample` samples per trace.
///
/// Stops at the first file that fails to load.
pub fn load_datasets<P: AsRef<Path>>(
    paths: &[P],
    n_resample: usize,
) -> Result<Vec<Dataset>, LoadError> {
    paths
        .iter()
        .map(|p| load_dataset(p.as_ref(), n_resample))
        .collect()
}

/// Load one recording and resample its traces.
pub fn load_dataset(path: &Path, n_resample: usize) -> Result<Dataset, LoadError> {
    let recording = load_recording(path)?;
    let traces = resample_traces(&recording.traces, n_resample);
    log::info!(
        "Loaded '{}' from {}: {} cells × {} samples, resampled to {}",
        recording.label,
        path.display(),
        recording.cell_ids.len(),
        recording.sample_count(),
        n_resample
    );
    Ok(Dataset {
        raw_samples: recording.sample_count(),
        path: recording.path,
        label: recording.label,
        cell_ids: recording.cell_ids,
        traces,
        invalid_ids: recording.invalid_ids,
    })
}

/// Read a tab-separated recording file without resampling.
pub fn load_recording(path: &Path) -> Result<Recording, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_recording(file, path)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// File layout (tab separated, no header semantics):
///
/// ```text
/// 12    13    14        <- one cell identifier per column
/// 0.51  0.80  0.33      <- one sample per cell, one row per time step
/// 0.62  0.00  0.35
/// ...
/// ```
///
/// Columns are transposed so that every output trace is one cell.
/// `path` is only used for the label and error messages.
pub fn parse_recording<R: Read>(reader: R, path: &Path) -> Result<Recording, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(false)
        .from_reader(reader);

    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(csv_err)?,
        None => {
            return Err(LoadError::Empty {
                path: path.to_path_buf(),
            })
        }
    };

    let (cell_ids, invalid_ids) = parse_cell_ids(header.iter());
    if invalid_ids > 0 {
        log::warn!(
            "{}: {invalid_ids} cell ID(s) could not be converted to int, replaced with {INVALID_CELL_ID}",
            path.display()
        );
    }

    let mut traces: Vec<Vec<f64>> = vec![Vec::new(); cell_ids.len()];
    for (row_offset, result) in records.enumerate() {
        let record = result.map_err(csv_err)?;
        let row = row_offset + 1;
        for (column, token) in record.iter().enumerate() {
            let value = parse_sample(token).ok_or_else(|| LoadError::InvalidSample {
                path: path.to_path_buf(),
                row,
                column,
                value: token.to_string(),
            })?;
            traces[column].push(value);
        }
    }

    if traces.first().map_or(true, Vec::is_empty) {
        return Err(LoadError::NoSamples {
            path: path.to_path_buf(),
        });
    }

    Ok(Recording {
        path: path.to_path_buf(),
        label: label_from_path(path),
        cell_ids,
        traces,
        invalid_ids,
    })
}

/// Parse header tokens into identifiers, returning how many were invalid.
///
/// Numeric tokens are truncated toward zero (`"12.0"` → 12). Anything else,
/// including non-finite numbers, becomes [`INVALID_CELL_ID`].
pub fn parse_cell_ids<'a, I>(tokens: I) -> (Vec<CellId>, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut invalid = 0;
    let ids = tokens
        .into_iter()
        .map(|tok| match tok.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v.trunc() as CellId,
            _ => {
                invalid += 1;
                INVALID_CELL_ID
            }
        })
        .collect();
    (ids, invalid)
}

/// An empty field is a missing value (NaN); other tokens must be numbers.
fn parse_sample(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return Some(f64::NAN);
    }
    token.parse::<f64>().ok()
}

/// Dataset label: the second-to-last `_`-separated part of the file name.
///
/// `exp1_run2_control_data.tsv` → `control`. Names without an underscore
/// fall back to the file stem.
pub fn label_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() >= 2 {
        return parts[parts.len() - 2].to_string();
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Recording, LoadError> {
        parse_recording(text.as_bytes(), Path::new("exp1_run2_control_data.tsv"))
    }

    #[test]
    fn label_is_second_to_last_token() {
        assert_eq!(label_from_path(Path::new("exp1_run2_control_data.tsv")), "control");
        assert_eq!(label_from_path(Path::new("a_b_LABEL_c.ext")), "LABEL");
        assert_eq!(label_from_path(Path::new("/tmp/x_y/cells_KO_2.tsv")), "KO");
    }

    #[test]
    fn label_without_underscore_uses_stem() {
        assert_eq!(label_from_path(Path::new("/data/recording.tsv")), "recording");
    }

    #[test]
    fn transposes_rows_into_cells() {
        let rec = parse("1\t2\t3\n0.5\t1.5\t2.5\n0.6\t0\t2.6\n").unwrap();
        assert_eq!(rec.cell_ids, vec![1, 2, 3]);
        assert_eq!(rec.label, "control");
        assert_eq!(rec.sample_count(), 2);
        assert_eq!(rec.traces[0], vec![0.5, 0.6]);
        assert_eq!(rec.traces[1], vec![1.5, 0.0]);
        assert_eq!(rec.traces[2], vec![2.5, 2.6]);
        assert_eq!(rec.invalid_ids, 0);
    }

    #[test]
    fn malformed_ids_become_sentinel() {
        let rec = parse("1\tx\t3\n1\t2\t3\n").unwrap();
        assert_eq!(rec.cell_ids, vec![1, -1, 3]);
        assert_eq!(rec.invalid_ids, 1);
    }

    #[test]
    fn float_ids_are_truncated() {
        let (ids, invalid) = parse_cell_ids(["12.0", " 7 ", "nan", "", "inf"]);
        assert_eq!(ids, vec![12, 7, -1, -1, -1]);
        assert_eq!(invalid, 3);
    }

    #[test]
    fn non_numeric_sample_is_an_error() {
        let err = parse("1\t2\n0.5\tabc\n").unwrap_err();
        match err {
            LoadError::InvalidSample { row, column, value, .. } => {
                assert_eq!((row, column), (1, 1));
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ragged_rows_are_an_error() {
        assert!(matches!(
            parse("1\t2\n0.5\t1.0\n0.5\n").unwrap_err(),
            LoadError::Csv { .. }
        ));
    }

    #[test]
    fn empty_field_is_missing_value() {
        let rec = parse("1\t2\n0.5\t\n").unwrap();
        assert!(rec.traces[1][0].is_nan());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse("").unwrap_err(), LoadError::Empty { .. }));
        assert!(matches!(parse("1\t2\n").unwrap_err(), LoadError::NoSamples { .. }));
    }
}
