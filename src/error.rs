//! Error types for loading exports, managing report lifecycles and
//! writing rendered reports.
//!
//! Aggregation itself never fails; these errors surface from the layers
//! around it.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while discovering or loading export files.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read from disk.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid JSON for the expected record type.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Walking an input directory failed.
    #[error("Failed to scan directory {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The input directory does not exist or is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Failure of a report lifecycle transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Submitted reports are final and cannot be submitted again.
    #[error("{kind} report for {period} has already been submitted")]
    AlreadySubmitted { kind: &'static str, period: String },
}

/// Failure while rendering or writing a statistics report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The report could not be serialized to JSON.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The rendered report could not be written.
    #[error("Failed to write report to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
