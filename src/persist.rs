//! Saved recommendation results.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, NeighbourhoodPolicy};
use crate::error::{RecError, Result};
use crate::model::RecommendationSet;

/// Version written into every saved results file.
pub const FORMAT_VERSION: u32 = 1;

/// A recommendation set together with the parameters that produced it.
///
/// Stored as JSON; user ids become object keys, place lists keep their order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecords {
    /// File format version.
    pub format_version: u32,
    /// Neighbourhood size used for the run.
    pub neighbourhood_size: usize,
    /// Maximum recommendations per user used for the run.
    pub num_records: usize,
    /// Neighbourhood policy used for the run.
    pub policy: NeighbourhoodPolicy,
    /// Ranked places per user.
    pub records: RecommendationSet,
}

impl SavedRecords {
    /// Wraps `records` produced under `config`.
    pub fn new(config: &EngineConfig, records: RecommendationSet) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            neighbourhood_size: config.neighbourhood_size,
            num_records: config.num_records,
            policy: config.policy,
            records,
        }
    }

    /// Writes the results to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(self)?;
        fs::write(path, bytes).map_err(RecError::io(path))
    }

    /// Reads results written by [`SavedRecords::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(RecError::io(path))?;
        let saved: SavedRecords = serde_json::from_slice(&bytes)?;
        if saved.format_version != FORMAT_VERSION {
            return Err(RecError::UnsupportedFormat(saved.format_version));
        }
        Ok(saved)
    }
}
