#![forbid(unsafe_code)]

//! Command-line support: moving check-in data in and out of the store.

/// Raw check-in import and typed table export.
///
/// Import reads a tab-separated check-in file into the SQLite store; export
/// writes user, place and CHECKED_IN tables in bulk-import CSV layout.
pub mod import_export;
