//! Error types for the extraction crate.

use grib2_parser::Grib2Error;
use hrrr_common::HrrrError;
use thiserror::Error;

use crate::version::FormatVersion;

/// Errors that can occur while extracting a run.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The manifest for a file returned 404.
    #[error("File not available: {url}")]
    Unavailable { url: String },

    #[error("Network failure for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Byte-range fetch {range} of {url} failed: {message}")]
    RangeFetch {
        url: String,
        range: String,
        message: String,
    },

    #[error(
        "Unknown format version for {url}: forecast hour {forecast_hour:02} with {message_count} messages"
    )]
    UnknownFormatVersion {
        url: String,
        forecast_hour: u32,
        message_count: usize,
    },

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("No catalog column for format version {0}")]
    NoCatalogColumn(FormatVersion),

    #[error("Malformed manifest line {line}: {reason}")]
    ManifestParse { line: usize, reason: String },

    #[error("Message {ordinal} not listed in manifest of {url}")]
    MissingOrdinal { url: String, ordinal: u32 },

    #[error("Failed to decode message from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: Grib2Error,
    },

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    /// A column's plan names a read that was never fetched.
    #[error("Value not fetched: {0}")]
    MissingRead(String),

    #[error("Invalid run: {0}")]
    InvalidRun(String),

    #[error("Failed to publish {key}: {message}")]
    Publish { key: String, message: String },

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Whether the run should be reported as skipped rather than failed.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ExtractError::Unavailable { .. } | ExtractError::UnknownFormatVersion { .. }
        )
    }
}

impl From<HrrrError> for ExtractError {
    fn from(err: HrrrError) -> Self {
        match err {
            HrrrError::InvalidRun(msg) | HrrrError::InvalidTime(msg) => {
                ExtractError::InvalidRun(msg)
            }
            HrrrError::StorageError(msg) => ExtractError::Storage(msg),
        }
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
