//! Error types for history-log conversion.
//!
//! `HistError` covers the fatal failures: configuration problems found
//! before decoding starts (unreadable code tables, unsupported input
//! compression) and I/O or serialization failures on the output stream.
//! Per-line decode failures are deliberately *not* represented here; they
//! are counted and skipped by the driver (see [`crate::decode::LineError`]).

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HistError>;

/// A fatal conversion error.
#[derive(Debug, Error)]
pub enum HistError {
    /// I/O failure on an input or output stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized to JSON.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A code-table file contained a line without a `TAG|value|` shape.
    #[error("malformed code table entry at {}:{line}", path.display())]
    CodeTable { path: PathBuf, line: usize },

    /// The input file uses a compression scheme we cannot stream.
    #[error("unsupported compression for {}: only gzip is handled, uncompress .Z files first", .0.display())]
    UnsupportedCompression(PathBuf),
}
