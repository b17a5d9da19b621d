//! Crate error type.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RecError>;

/// Errors surfaced by the store, the engine, persistence and evaluation.
#[derive(Debug, Error)]
pub enum RecError {
    /// Query or connection failure against the interaction graph store.
    #[error("graph store error during {stage}: {source}")]
    DataAccess {
        /// Operation that was running when the store failed.
        stage: &'static str,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// The store file does not exist.
    #[error("graph store not found: {}", .0.display())]
    StoreNotFound(PathBuf),
    /// A row in an input file could not be coerced to identifiers.
    #[error("{}:{line}: {message}", .path.display())]
    MalformedInput {
        /// File containing the offending row.
        path: PathBuf,
        /// 1-based line number of the row (header is line 1).
        line: u64,
        /// What was wrong with the row.
        message: String,
    },
    /// Precision, recall or F1 are undefined for the given inputs.
    #[error("cannot compute metrics: {0}")]
    DegenerateMetric(DegenerateMetric),
    /// Invalid engine or CLI configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The run exceeded its deadline; partial results were discarded.
    #[error("{stage} exceeded the run timeout after {elapsed:.2?}")]
    Timeout {
        /// Stage that observed the expired deadline.
        stage: &'static str,
        /// Time spent since the run started.
        elapsed: Duration,
    },
    /// File I/O failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// CSV reader or writer failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// JSON encoding or decoding failure of persisted results.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Persisted results were written by an unknown format version.
    #[error("unsupported saved records format version {0}")]
    UnsupportedFormat(u32),
}

impl RecError {
    pub(crate) fn data_access(stage: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| RecError::DataAccess { stage, source }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RecError::Io { path, source }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        RecError::MalformedInput {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Reasons why evaluation metrics are undefined.
///
/// Each variant carries the pooled counts so callers can still report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateMetric {
    /// No recommendations were produced for any user.
    NoPredictions {
        /// Number of users present in the recommendation set.
        users: usize,
    },
    /// The evaluated users have no ground-truth check-ins.
    NoGroundTruth {
        /// Total recommended places.
        pred_count: usize,
    },
    /// No recommended place was in the ground truth, so F1 is undefined.
    NoHits {
        /// Total recommended places.
        pred_count: usize,
        /// Total ground-truth places of evaluated users.
        actual_count: usize,
    },
}

impl fmt::Display for DegenerateMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateMetric::NoPredictions { users } => {
                write!(f, "no predictions across {users} users (precision undefined)")
            }
            DegenerateMetric::NoGroundTruth { pred_count } => write!(
                f,
                "no ground truth for evaluated users ({pred_count} predictions, recall undefined)"
            ),
            DegenerateMetric::NoHits {
                pred_count,
                actual_count,
            } => write!(
                f,
                "no hits among {pred_count} predictions and {actual_count} actual check-ins (F1 undefined)"
            ),
        }
    }
}

impl From<DegenerateMetric> for RecError {
    fn from(value: DegenerateMetric) -> Self {
        RecError::DegenerateMetric(value)
    }
}
