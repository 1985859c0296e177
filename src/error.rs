//! Error types for every stage of an ingestion run.
//!
//! Each stage has its own enum so callers can decide what is fatal:
//! acquisition and storage failures abort a run, parse failures only
//! drop the offending record.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The acquisition collaborator could not produce records.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("listing {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid listing url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode records: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single raw record could not be turned into an entry.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("record has an empty title")]
    MissingTitle,

    #[error("record has an empty link")]
    MissingLink,

    #[error("timestamp {raw:?} does not match {format}: {source}")]
    Timestamp {
        raw: String,
        format: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

/// Creating or appending to an archive resource failed.
#[derive(Debug, Error)]
#[error("{op} failed for {path}: {source}")]
pub struct StorageError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl StorageError {
    pub fn new(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid UTC offset {0:?}, expected +HH:MM or -HH:MM")]
    UtcOffset(String),

    #[error("invalid date format {0:?}")]
    DateFormat(String),

    #[error("similarity threshold {0} is outside [0, 1]")]
    Threshold(f64),
}

/// Outcome of a failed ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("acquisition from {source_name} failed: {error}")]
    Acquisition {
        source_name: String,
        #[source]
        error: AcquisitionError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Short machine-friendly label for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Acquisition { .. } => "acquisition",
            Self::Storage(_) => "storage",
        }
    }
}
