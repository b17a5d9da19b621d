use placerec::NeighbourhoodPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Defaults read from the optional TOML config file.
///
/// ```toml
/// log_level = "info"
///
/// [store]
/// path = "/data/checkins.db"
///
/// [engine]
/// neighbourhood_size = 100
/// num_records = 10
/// policy = "strict"
/// threads = 8
/// timeout_secs = 600
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    pub neighbourhood_size: Option<usize>,
    pub num_records: Option<usize>,
    pub policy: Option<NeighbourhoodPolicy>,
    pub parallel_threshold: Option<usize>,
    pub threads: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Reads `explicit` if given (it must exist), else the default location if
    /// present, else empty defaults.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Missing { path });
                }
                read_file(&path)
            }
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}

fn read_file(path: &Path) -> Result<CliConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .path.display())]
    Missing { path: PathBuf },
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("placerec").join("config.toml"))
}
