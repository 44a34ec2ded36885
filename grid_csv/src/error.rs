//! Closed set of failure variants for CSV ingestion: a `thiserror`-derived
//! error enum in the same shape as `grid_core::error::GridError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvLoadError {
    #[error("I/O error reading CSV: {0}")]
    Io(std::io::Error),
    #[error("CSV parse error: {0}")]
    Parse(csv::Error),
    #[error("CSV parse error at line {line}: {source}")]
    ParseAtLine { line: usize, source: csv::Error },
    #[error("file is empty")]
    Empty,
    #[error("could not determine column separator")]
    UnknownSeparator,
}
