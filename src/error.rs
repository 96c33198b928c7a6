//! Error types for the report pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the parsing/normalization pipeline.
///
/// Row-level defects (bad percentages, short rows) are not errors; those
/// rows are dropped and logged. An error here means a whole file or the
/// whole request could not proceed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// None of the candidate encodings could decode the file.
    #[error("no known encoding could decode the file")]
    NoValidEncoding,

    /// The file decoded but produced no usable table data.
    #[error("no table data found: {0}")]
    NoData(String),

    /// The upload had an extension the pipeline does not handle.
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("excel export error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}
