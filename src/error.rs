//! Error types for loading and analysing trip tables.

use thiserror::Error;

/// Failures while reading a trip table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Recoverable outcomes of an analysis that has nothing to show.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("no data for selection: {0}")]
    EmptySelection(String),
    #[error("undefined: no fuel cost recorded")]
    NoFuelCost,
    #[error("row {index} out of range, selection has {len} trips")]
    RowOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
