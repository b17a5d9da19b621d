#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use placerec::{
    cli::import_export::{export_tables, run_import, ImportConfig},
    store::{GraphStore, MemoryStore, SqliteStore, StoreCounts},
    Checkin, EngineConfig, RecError, Recommender,
};
use tempfile::TempDir;

fn seeded_store(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("checkins.db");
    let mut store = SqliteStore::open_writable(&path, true).expect("create store");
    store
        .insert_checkins(
            [(1, 100), (1, 200), (2, 100), (2, 200), (2, 300), (3, 300)]
                .into_iter()
                .map(|(u, p)| Checkin::new(u, p)),
        )
        .expect("seed");
    path
}

fn write_tsv(path: &Path, rows: &[&str]) {
    fs::write(path, rows.join("\n") + "\n").expect("write tsv");
}

#[test]
fn read_only_store_matches_memory_store() {
    let dir = TempDir::new().expect("tempdir");
    let path = seeded_store(&dir);

    let sqlite = SqliteStore::open_read_only(&path).expect("open read-only");
    let memory = MemoryStore::from_pairs(&[
        (1, 100),
        (1, 200),
        (2, 100),
        (2, 200),
        (2, 300),
        (3, 300),
    ]);
    assert_eq!(sqlite.checkins().expect("sqlite"), memory.checkins().expect("memory"));

    let engine = Recommender::new(EngineConfig::new(1, 2)).expect("config");
    assert_eq!(
        engine.recommend(&sqlite).expect("sqlite run"),
        engine.recommend(&memory).expect("memory run"),
    );
}

#[test]
fn repeated_inserts_are_deduplicated() {
    let dir = TempDir::new().expect("tempdir");
    let path = seeded_store(&dir);

    let mut store = SqliteStore::open_writable(&path, false).expect("reopen");
    let counts = store
        .insert_checkins([Checkin::new(1, 100), Checkin::new(4, 100)])
        .expect("insert");
    assert_eq!(counts.rows, 2);
    assert_eq!(counts.inserted, 1);
    assert_eq!(
        store.counts().expect("counts"),
        StoreCounts {
            users: 4,
            places: 3,
            checkins: 7,
        }
    );
}

#[test]
fn missing_store_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.db");
    assert!(matches!(
        SqliteStore::open_read_only(&missing),
        Err(RecError::StoreNotFound(p)) if p == missing
    ));
    assert!(matches!(
        SqliteStore::open_writable(&missing, false),
        Err(RecError::StoreNotFound(_))
    ));
    assert!(!missing.exists());
}

#[test]
fn file_without_schema_is_a_data_access_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("garbage.db");
    fs::write(&path, b"this is not a database").expect("write");
    assert!(matches!(
        SqliteStore::open_read_only(&path),
        Err(RecError::DataAccess { .. })
    ));
}

#[test]
fn import_then_export_round_trips_through_store() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("checkins.tsv");
    write_tsv(
        &input,
        &[
            "userID\tplaceID\trating",
            "7\t70\t2",
            "7\t71\t1",
            "8\t70\t0",
            "8\t70\t2",
        ],
    );
    let store_path = dir.path().join("nested/store.db");
    let summary = run_import(&ImportConfig {
        input,
        store_path: store_path.clone(),
        create_if_missing: true,
        user_column: "userID".into(),
        place_column: "placeID".into(),
    })
    .expect("import");
    assert_eq!(summary.rows_read, 4);
    assert_eq!(summary.checkins_imported, 3);

    let out_dir = dir.path().join("export");
    fs::create_dir_all(&out_dir).expect("out dir");
    let store = SqliteStore::open_read_only(&store_path).expect("open");
    let exported = export_tables(&store, &out_dir).expect("export");
    assert_eq!(exported.users_exported, 2);
    assert_eq!(exported.places_exported, 2);
    assert_eq!(exported.checkins_exported, 3);

    let mut reader = csv::Reader::from_path(out_dir.join("checkins.csv")).expect("csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![":START_ID(User-ID)", ":END_ID(Place-ID)", ":TYPE"]
    );
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.expect("row").iter().map(str::to_string).collect())
        .collect();
    assert_eq!(rows[0], vec!["7", "70", "CHECKED_IN"]);
    assert_eq!(rows.len(), 3);
}

#[test]
fn malformed_import_leaves_no_store_behind() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("checkins.tsv");
    write_tsv(&input, &["userID\tplaceID", "1\t10", "2\tnope"]);
    let store_path = dir.path().join("store.db");
    let err = run_import(&ImportConfig {
        input,
        store_path: store_path.clone(),
        create_if_missing: true,
        user_column: "userID".into(),
        place_column: "placeID".into(),
    })
    .unwrap_err();
    assert!(matches!(err, RecError::MalformedInput { line: 3, .. }), "{err}");
    assert!(!store_path.exists());
}
