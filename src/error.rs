//! Error types for Bodylog

use thiserror::Error;

/// Errors surfaced by the persistence boundary.
///
/// Classification, parsing and query logic is total: malformed fields and
/// unparseable timestamps are encoded as absent/excluded values, never as
/// errors. Only reading and writing the backing store can fail.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
