use std::fs;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::info;

use crate::error::{RecError, Result};
use crate::model::{Checkin, PlaceId, UserId};
use crate::store::{GraphStore, SqliteStore};
use crate::tsv::{read_checkins, PairColumns};

/// Label written for user nodes.
pub const USER_LABEL: &str = "User";
/// Label written for place nodes.
pub const PLACE_LABEL: &str = "Place";
/// Relationship type written for check-ins.
pub const CHECKED_IN: &str = "CHECKED_IN";

/// Configuration for loading raw check-ins into a store.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Tab-separated check-in file with a header row.
    pub input: PathBuf,
    /// Path to the store database file.
    pub store_path: PathBuf,
    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,
    /// Header of the user id column.
    pub user_column: String,
    /// Header of the place id column.
    pub place_column: String,
}

/// Summary statistics from an import operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    /// Data rows read from the input file.
    pub rows_read: u64,
    /// New CHECKED_IN edges written (duplicates excluded).
    pub checkins_imported: u64,
}

/// Configuration for exporting the interaction graph as typed tables.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Path to the store database file.
    pub store_path: PathBuf,
    /// Directory receiving `users.csv`, `places.csv` and `checkins.csv`.
    pub out_dir: PathBuf,
}

/// Summary statistics from an export operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExportSummary {
    /// User rows written.
    pub users_exported: u64,
    /// Place rows written.
    pub places_exported: u64,
    /// Check-in rows written.
    pub checkins_exported: u64,
}

/// Loads a raw check-in file into the SQLite store.
///
/// Every row is validated before anything is written, so a malformed row
/// leaves the store untouched. All rows go in one transaction, so a store
/// failure part-way through also leaves it untouched. Duplicate check-ins
/// collapse to one edge.
pub fn run_import(cfg: &ImportConfig) -> Result<ImportSummary> {
    let columns = PairColumns::Named {
        user: cfg.user_column.clone(),
        place: cfg.place_column.clone(),
    };
    let checkins = read_checkins(&cfg.input, &columns)?;

    if cfg.create_if_missing {
        if let Some(parent) = cfg.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(RecError::io(parent))?;
        }
    }
    let mut store = SqliteStore::open_writable(&cfg.store_path, cfg.create_if_missing)?;

    let counts = store.insert_checkins(checkins)?;
    let summary = ImportSummary {
        rows_read: counts.rows,
        checkins_imported: counts.inserted,
    };
    info!(
        input = %cfg.input.display(),
        rows = summary.rows_read,
        imported = summary.checkins_imported,
        "import finished"
    );
    Ok(summary)
}

/// Writes user nodes, place nodes and CHECKED_IN edges as bulk-import CSV tables.
pub fn run_export(cfg: &ExportConfig) -> Result<ExportSummary> {
    let store = SqliteStore::open_read_only(&cfg.store_path)?;
    fs::create_dir_all(&cfg.out_dir).map_err(RecError::io(&cfg.out_dir))?;
    export_tables(&store, &cfg.out_dir)
}

/// Writes the typed tables for any store into `out_dir`.
pub fn export_tables<S: GraphStore + ?Sized>(store: &S, out_dir: &Path) -> Result<ExportSummary> {
    let checkins = store.checkins()?;

    let mut users: Vec<UserId> = checkins.iter().map(|c| c.user).collect();
    users.sort_unstable();
    users.dedup();
    let mut places: Vec<PlaceId> = checkins.iter().map(|c| c.place).collect();
    places.sort_unstable();
    places.dedup();

    let summary = ExportSummary {
        users_exported: export_nodes(
            &out_dir.join("users.csv"),
            "userId:ID(User-ID)",
            USER_LABEL,
            &users,
        )?,
        places_exported: export_nodes(
            &out_dir.join("places.csv"),
            "placeId:ID(Place-ID)",
            PLACE_LABEL,
            &places,
        )?,
        checkins_exported: export_edges(&out_dir.join("checkins.csv"), &checkins)?,
    };
    info!(
        out_dir = %out_dir.display(),
        users = summary.users_exported,
        places = summary.places_exported,
        checkins = summary.checkins_exported,
        "export finished"
    );
    Ok(summary)
}

fn export_nodes(path: &Path, id_header: &str, label: &str, ids: &[i64]) -> Result<u64> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record([id_header, ":LABEL"])?;
    for id in ids {
        writer.write_record([id.to_string().as_str(), label])?;
    }
    writer.flush().map_err(RecError::io(path))?;
    Ok(ids.len() as u64)
}

fn export_edges(path: &Path, checkins: &[Checkin]) -> Result<u64> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record([":START_ID(User-ID)", ":END_ID(Place-ID)", ":TYPE"])?;
    for checkin in checkins {
        writer.write_record([
            checkin.user.to_string().as_str(),
            checkin.place.to_string().as_str(),
            CHECKED_IN,
        ])?;
    }
    writer.flush().map_err(RecError::io(path))?;
    Ok(checkins.len() as u64)
}
