use classjournal_core::catalog::{verify_connection, CatalogError};
use classjournal_core::db::migrations::latest_version;
use classjournal_core::db::open_db_in_memory;
use classjournal_core::{RepoError, SqliteRecordRepository};
use rusqlite::Connection;

#[test]
fn migrated_connection_passes_verification() {
    let conn = open_db_in_memory().unwrap();
    verify_connection(&conn).unwrap();
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();

    let err = verify_connection(&conn).unwrap_err();
    match err {
        CatalogError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn connection_with_missing_table_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE journal_entry;").unwrap();

    let err = verify_connection(&conn).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::MissingRequiredTable("journal_entry")
    ));
}

#[test]
fn connection_with_missing_column_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("ALTER TABLE teacher DROP COLUMN email;")
        .unwrap();

    let err = verify_connection(&conn).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::MissingRequiredColumn {
            table: "teacher",
            column: "email"
        }
    ));
}

#[test]
fn connection_without_declared_fk_edge_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "DROP TABLE student;
         CREATE TABLE student (
             student_id  INTEGER PRIMARY KEY,
             guardian_id INTEGER,
             first_name  TEXT NOT NULL,
             last_name   TEXT NOT NULL,
             birth_date  TEXT NOT NULL,
             class       TEXT NOT NULL,
             email       TEXT NOT NULL
         );",
    )
    .unwrap();

    let err = verify_connection(&conn).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::MissingForeignKey {
            child_table: "student",
            child_column: "guardian_id"
        }
    ));
}

#[test]
fn repository_construction_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteRecordRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::Catalog(CatalogError::UninitializedConnection { .. })
    ));
}
