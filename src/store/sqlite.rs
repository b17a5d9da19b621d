use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use super::{GraphStore, StoreCounts};
use crate::error::{RecError, Result};
use crate::model::Checkin;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY
    );
    CREATE TABLE IF NOT EXISTS places (
        place_id INTEGER PRIMARY KEY
    );
    CREATE TABLE IF NOT EXISTS checked_in (
        user_id INTEGER NOT NULL REFERENCES users (user_id),
        place_id INTEGER NOT NULL REFERENCES places (place_id),
        PRIMARY KEY (user_id, place_id)
    ) WITHOUT ROWID;
    CREATE INDEX IF NOT EXISTS idx_checked_in_place ON checked_in (place_id, user_id);
";

/// Rows read and edges created by [`SqliteStore::insert_checkins`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    /// Check-in rows offered.
    pub rows: u64,
    /// New CHECKED_IN edges (duplicates excluded).
    pub inserted: u64,
}

/// Interaction graph kept in a SQLite file.
///
/// Users and places are tables keyed by their ids; CHECKED_IN is a table keyed
/// by `(user_id, place_id)`, so repeated visits collapse to one edge.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Opens an existing store without write access.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RecError::StoreNotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(RecError::data_access("open store"))?;
        conn.query_row("SELECT COUNT(*) FROM checked_in LIMIT 1", [], |_| Ok(()))
            .map_err(RecError::data_access("schema check"))?;
        debug!(path = %path.display(), "opened graph store read-only");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Opens a store for writing, creating the file and schema when allowed.
    pub fn open_writable(path: impl AsRef<Path>, create_if_missing: bool) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() && !create_if_missing {
            return Err(RecError::StoreNotFound(path.to_path_buf()));
        }
        let conn = Connection::open(path).map_err(RecError::data_access("open store"))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(RecError::data_access("configure store"))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(RecError::data_access("configure store"))?;
        conn.execute_batch(SCHEMA)
            .map_err(RecError::data_access("create schema"))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts check-ins with their user and place nodes in one transaction.
    pub fn insert_checkins<I>(&mut self, checkins: I) -> Result<ImportCounts>
    where
        I: IntoIterator<Item = Checkin>,
    {
        let tx = self
            .conn
            .transaction()
            .map_err(RecError::data_access("begin import"))?;
        let mut counts = ImportCounts::default();
        {
            let mut insert_user = tx
                .prepare_cached("INSERT OR IGNORE INTO users (user_id) VALUES (?1)")
                .map_err(RecError::data_access("prepare import"))?;
            let mut insert_place = tx
                .prepare_cached("INSERT OR IGNORE INTO places (place_id) VALUES (?1)")
                .map_err(RecError::data_access("prepare import"))?;
            let mut insert_edge = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO checked_in (user_id, place_id) VALUES (?1, ?2)",
                )
                .map_err(RecError::data_access("prepare import"))?;

            for checkin in checkins {
                counts.rows += 1;
                insert_user
                    .execute(params![checkin.user])
                    .map_err(RecError::data_access("insert user"))?;
                insert_place
                    .execute(params![checkin.place])
                    .map_err(RecError::data_access("insert place"))?;
                let changed = insert_edge
                    .execute(params![checkin.user, checkin.place])
                    .map_err(RecError::data_access("insert check-in"))?;
                counts.inserted += changed as u64;
            }
        }
        tx.commit().map_err(RecError::data_access("commit import"))?;
        info!(
            rows = counts.rows,
            inserted = counts.inserted,
            path = %self.path.display(),
            "imported check-ins"
        );
        Ok(counts)
    }

    fn count(&self, table: &'static str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(RecError::data_access("count rows"))?;
        Ok(count as u64)
    }
}

impl GraphStore for SqliteStore {
    fn checkins(&self) -> Result<Vec<Checkin>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, place_id FROM checked_in ORDER BY user_id, place_id")
            .map_err(RecError::data_access("load check-ins"))?;
        let rows = stmt
            .query_map([], |row| Ok(Checkin::new(row.get(0)?, row.get(1)?)))
            .map_err(RecError::data_access("load check-ins"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RecError::data_access("load check-ins"))
    }

    fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            users: self.count("users")?,
            places: self.count("places")?,
            checkins: self.count("checked_in")?,
        })
    }
}
