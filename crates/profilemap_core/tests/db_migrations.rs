use profilemap_core::db::migrations::latest_version;
use profilemap_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "profiles");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profilemap.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "profiles");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn casefold_function_is_registered_on_open() {
    let conn = open_db_in_memory().unwrap();
    let folded: String = conn
        .query_row("SELECT casefold('ÉCOLE Main');", [], |row| row.get(0))
        .unwrap();
    assert_eq!(folded, "école main");
}

#[test]
fn schema_rejects_blank_required_text_and_empty_image_url() {
    let conn = open_db_in_memory().unwrap();

    let blank_name = conn.execute(
        "INSERT INTO profiles (id, name, description, address, latitude, longitude, image_url, created_at, updated_at)
         VALUES ('a', '  ', 'd', 'a', 0, 0, NULL, 1, 1);",
        [],
    );
    assert!(blank_name.is_err());

    let empty_image = conn.execute(
        "INSERT INTO profiles (id, name, description, address, latitude, longitude, image_url, created_at, updated_at)
         VALUES ('b', 'n', 'd', 'a', 0, 0, '', 1, 1);",
        [],
    );
    assert!(empty_image.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
