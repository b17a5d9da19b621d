//! Tab-separated `(user, place)` readers shared by import and evaluation.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{RecError, Result};
use crate::model::{coerce_id, Checkin};

/// Which columns of a header-led file carry the user and place ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairColumns {
    /// First two columns, whatever the header says.
    Positional,
    /// Columns located by header name (ASCII case-insensitive).
    Named {
        /// Header of the user id column.
        user: String,
        /// Header of the place id column.
        place: String,
    },
}

/// Reads every data row of a tab-separated file as a check-in.
///
/// The first line is a header. Rows whose ids cannot be coerced to integers
/// fail the whole read with the offending 1-based line number.
pub fn read_checkins(path: &Path, columns: &PairColumns) -> Result<Vec<Checkin>> {
    let file = File::open(path).map_err(RecError::io(path))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    let headers = reader.headers()?.clone();
    let (user_idx, place_idx) = match columns {
        PairColumns::Positional => (0, 1),
        PairColumns::Named { user, place } => (
            find_column(path, &headers, user)?,
            find_column(path, &headers, place)?,
        ),
    };

    let mut checkins = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        let user = parse_field(path, line, &record, user_idx, "user id")?;
        let place = parse_field(path, line, &record, place_idx, "place id")?;
        checkins.push(Checkin::new(user, place));
    }
    Ok(checkins)
}

fn parse_field(
    path: &Path,
    line: u64,
    record: &StringRecord,
    index: usize,
    what: &str,
) -> Result<i64> {
    let raw = record
        .get(index)
        .ok_or_else(|| RecError::malformed(path, line, format!("missing {what} column")))?;
    coerce_id(raw)
        .ok_or_else(|| RecError::malformed(path, line, format!("{what} '{raw}' is not an integer")))
}

fn find_column(path: &Path, headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| RecError::malformed(path, 1, format!("column '{name}' not found in header")))
}
