//! Engine and store configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RecError, Result};

/// Default number of neighbours kept per user.
pub const DEFAULT_NEIGHBOURHOOD_SIZE: usize = 100;
/// Default number of recommendations kept per user.
pub const DEFAULT_NUM_RECORDS: usize = 10;
/// Default minimum number of users before work is spread across threads.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;

/// What to do with users that have fewer qualifying neighbours than requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeighbourhoodPolicy {
    /// Users without exactly `neighbourhood_size` neighbours are excluded.
    #[default]
    Strict,
    /// Users keep up to `neighbourhood_size` neighbours (at least one).
    UpTo,
}

impl NeighbourhoodPolicy {
    /// Stable lowercase name used in persisted results and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            NeighbourhoodPolicy::Strict => "strict",
            NeighbourhoodPolicy::UpTo => "up-to",
        }
    }
}

/// Parameters of a recommendation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Neighbours kept per user (K).
    pub neighbourhood_size: usize,
    /// Recommendations kept per user (N).
    pub num_records: usize,
    /// Handling of users with partial neighbourhoods.
    pub policy: NeighbourhoodPolicy,
    /// Minimum user count before per-user work runs in parallel.
    pub parallel_threshold: usize,
    /// Dedicated worker pool size (None = rayon global pool).
    pub thread_pool_size: Option<usize>,
    /// Abort the run once this much time has elapsed (None = no limit).
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neighbourhood_size: DEFAULT_NEIGHBOURHOOD_SIZE,
            num_records: DEFAULT_NUM_RECORDS,
            policy: NeighbourhoodPolicy::Strict,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            thread_pool_size: None,
            timeout: None,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with the given K and N and defaults otherwise.
    pub fn new(neighbourhood_size: usize, num_records: usize) -> Self {
        Self {
            neighbourhood_size,
            num_records,
            ..Self::default()
        }
    }

    /// Sets the neighbourhood policy.
    pub fn policy(mut self, policy: NeighbourhoodPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the run timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the dedicated worker pool size.
    pub fn thread_pool_size(mut self, threads: usize) -> Self {
        self.thread_pool_size = Some(threads);
        self
    }

    /// Sets the minimum user count for parallel execution.
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Rejects non-positive sizes, empty pools and zero timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.neighbourhood_size == 0 {
            return Err(RecError::Configuration(
                "neighbourhood size must be positive".into(),
            ));
        }
        if self.num_records == 0 {
            return Err(RecError::Configuration(
                "number of records must be positive".into(),
            ));
        }
        if self.thread_pool_size == Some(0) {
            return Err(RecError::Configuration(
                "thread pool size must be positive".into(),
            ));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(RecError::Configuration("timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Location of the interaction graph store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
}

impl StoreConfig {
    /// Creates a store configuration for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}
