use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::CellId;

/// Failure to read one recording file. Fatal to that load only.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed recording {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{}: row {row}, column {column}: '{value}' is not a number", path.display())]
    InvalidSample {
        path: PathBuf,
        row: usize,
        column: usize,
        value: String,
    },
    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },
    #[error("{} has a header row but no samples", path.display())]
    NoSamples { path: PathBuf },
}

/// Failure to build curves from loaded datasets.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no datasets loaded")]
    NoDatasets,
    #[error("cell ID {0} not found in the first dataset")]
    UnknownCell(CellId),
    #[error("dataset '{label}' has no cell at position {index}")]
    MissingRow { label: String, index: usize },
}

/// Failure to render or write an exported figure.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("figure of {width}×{height} pixels is too large to export")]
    TooLarge { width: u32, height: u32 },
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ExportError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ExportError::Plot(format!("{value:?}"))
    }
}
