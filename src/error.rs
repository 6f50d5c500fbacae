//! Error types for okapi-search.

use std::fmt;

/// Errors that can occur while building an index or serving a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// `build` was called with zero documents.
    InvalidCorpus,
    /// A build input was neither plain text nor a document record.
    InvalidDocument(String),
    /// `limit` was less than 1.
    InvalidLimit,
    /// A filter referenced a field that was not declared in `indexFields`.
    UnknownField {
        requested: Vec<String>,
        known: Vec<String>,
    },
    /// The index handle has already been disposed.
    Disposed,
    /// The operation was interrupted by a concurrent `dispose`.
    Cancelled,
    /// Spawn, handshake, or reply exceeded its wall-clock budget.
    WorkerTimeout(String),
    /// A scoring error propagated across the worker boundary.
    Internal(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidCorpus => write!(f, "corpus is empty"),
            SearchError::InvalidDocument(msg) => write!(f, "invalid document: {}", msg),
            SearchError::InvalidLimit => write!(f, "limit must be >= 1"),
            SearchError::UnknownField { requested, known } => write!(
                f,
                "unknown filter field(s) {:?}; indexed fields are {:?}",
                requested, known
            ),
            SearchError::Disposed => write!(f, "index has been disposed"),
            SearchError::Cancelled => write!(f, "operation cancelled by dispose"),
            SearchError::WorkerTimeout(stage) => write!(f, "worker timed out during {}", stage),
            SearchError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for SearchError {}
