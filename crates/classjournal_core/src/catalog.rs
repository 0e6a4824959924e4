//! Schema catalog: the single source of truth for structural metadata.
//!
//! # Responsibility
//! - Describe the five journal tables (columns, primary keys, FK edges) as an
//!   immutable compile-time declaration.
//! - Answer "which foreign keys reference this table" queries for the
//!   integrity guard and the generator.
//! - Verify that a live connection actually carries the declared schema.
//!
//! # Invariants
//! - Table and FK edge ordering is fixed: tables in dependency order, FK
//!   edges lexical by (child table, child column). Every component that
//!   iterates edges inherits this order as its deterministic tie-break.
//! - Catalog queries never touch row data, only metadata.

use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors from catalog lookups and live-schema verification.
#[derive(Debug)]
pub enum CatalogError {
    /// Requested table is outside the allow-listed schema.
    UnknownTable(String),
    /// Requested column does not exist in an allow-listed table.
    UnknownColumn { table: String, column: String },
    /// Live connection has not been migrated to the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Live connection is missing a declared table.
    MissingRequiredTable(&'static str),
    /// Live connection is missing a declared column.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Live connection is missing a declared FK edge.
    MissingForeignKey {
        child_table: &'static str,
        child_column: &'static str,
    },
    /// Underlying SQLite error while reading metadata.
    Db(DbError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTable(table) => write!(f, "unknown table `{table}`"),
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` in table `{table}`")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "live schema is missing table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "live schema is missing column `{column}` in table `{table}`")
            }
            Self::MissingForeignKey {
                child_table,
                child_column,
            } => write!(
                f,
                "live schema is missing foreign key `{child_table}.{child_column}`"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Semantic column type used for update type-checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Integer-affinity column (ids, grades).
    Integer,
    /// Free or format-constrained text.
    Text,
    /// Calendar date stored as `YYYY-MM-DD` text.
    Date,
}

/// One column of an allow-listed table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

/// One foreign-key edge: `child_table.child_column` references
/// `parent_table`'s primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FkEdge {
    pub child_table: &'static str,
    pub child_column: &'static str,
    pub parent_table: &'static str,
}

/// One allow-listed table with its fixed column set.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }
}

const GUARDIAN_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: "guardian_id", ty: ColumnType::Integer, nullable: false },
    ColumnDef { name: "first_name", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "last_name", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "phone", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "email", ty: ColumnType::Text, nullable: false },
];

const TEACHER_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: "teacher_id", ty: ColumnType::Integer, nullable: false },
    ColumnDef { name: "first_name", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "last_name", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "email", ty: ColumnType::Text, nullable: false },
];

const SUBJECT_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: "subject_id", ty: ColumnType::Integer, nullable: false },
    ColumnDef { name: "name", ty: ColumnType::Text, nullable: false },
];

const STUDENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: "student_id", ty: ColumnType::Integer, nullable: false },
    ColumnDef { name: "guardian_id", ty: ColumnType::Integer, nullable: true },
    ColumnDef { name: "first_name", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "last_name", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "birth_date", ty: ColumnType::Date, nullable: false },
    ColumnDef { name: "class", ty: ColumnType::Text, nullable: false },
    ColumnDef { name: "email", ty: ColumnType::Text, nullable: false },
];

const JOURNAL_ENTRY_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: "entry_id", ty: ColumnType::Integer, nullable: false },
    ColumnDef { name: "student_id", ty: ColumnType::Integer, nullable: false },
    ColumnDef { name: "teacher_id", ty: ColumnType::Integer, nullable: true },
    ColumnDef { name: "subject_id", ty: ColumnType::Integer, nullable: true },
    ColumnDef { name: "entry_date", ty: ColumnType::Date, nullable: false },
    ColumnDef { name: "grade", ty: ColumnType::Integer, nullable: true },
    ColumnDef { name: "attendance_status", ty: ColumnType::Text, nullable: false },
];

const TABLES: &[TableDef] = &[
    TableDef { name: "guardian", primary_key: "guardian_id", columns: GUARDIAN_COLUMNS },
    TableDef { name: "teacher", primary_key: "teacher_id", columns: TEACHER_COLUMNS },
    TableDef { name: "subject", primary_key: "subject_id", columns: SUBJECT_COLUMNS },
    TableDef { name: "student", primary_key: "student_id", columns: STUDENT_COLUMNS },
    TableDef { name: "journal_entry", primary_key: "entry_id", columns: JOURNAL_ENTRY_COLUMNS },
];

// Kept in lexical (child_table, child_column) order; `referencing_fks`
// preserves this order, which is the tie-break for all edge iteration.
const FK_EDGES: &[FkEdge] = &[
    FkEdge { child_table: "journal_entry", child_column: "student_id", parent_table: "student" },
    FkEdge { child_table: "journal_entry", child_column: "subject_id", parent_table: "subject" },
    FkEdge { child_table: "journal_entry", child_column: "teacher_id", parent_table: "teacher" },
    FkEdge { child_table: "student", child_column: "guardian_id", parent_table: "guardian" },
];

/// Returns the allow-listed tables in fixed dependency order.
pub fn tables() -> &'static [TableDef] {
    TABLES
}

/// Looks up an allow-listed table by name.
pub fn table(name: &str) -> CatalogResult<&'static TableDef> {
    TABLES
        .iter()
        .find(|table| table.name == name)
        .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
}

/// Looks up a column in an allow-listed table.
pub fn column(table_name: &str, column_name: &str) -> CatalogResult<&'static ColumnDef> {
    let table = table(table_name)?;
    table
        .column(column_name)
        .ok_or_else(|| CatalogError::UnknownColumn {
            table: table_name.to_string(),
            column: column_name.to_string(),
        })
}

/// Returns every FK edge whose target is `parent`'s primary key, in the
/// catalog's stable lexical order.
pub fn referencing_fks(parent: &str) -> CatalogResult<Vec<FkEdge>> {
    let parent = table(parent)?;
    Ok(FK_EDGES
        .iter()
        .copied()
        .filter(|edge| edge.parent_table == parent.name)
        .collect())
}

/// Verifies that a live connection carries the declared schema.
///
/// Checks, in order: migration version, table presence, column presence, and
/// FK edge presence (via `PRAGMA foreign_key_list`). Read-only.
pub fn verify_connection(conn: &Connection) -> CatalogResult<()> {
    let expected = crate::db::migrations::latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(CatalogError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    for table in TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table.name],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(CatalogError::MissingRequiredTable(table.name));
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\");", table.name))?;
        let mut live_columns = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            live_columns.push(row.get::<_, String>("name")?);
        }
        for column in table.columns {
            if !live_columns.iter().any(|name| name == column.name) {
                return Err(CatalogError::MissingRequiredColumn {
                    table: table.name,
                    column: column.name,
                });
            }
        }
    }

    for edge in FK_EDGES {
        let mut stmt =
            conn.prepare(&format!("PRAGMA foreign_key_list(\"{}\");", edge.child_table))?;
        let mut found = false;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let parent: String = row.get("table")?;
            let from: String = row.get("from")?;
            if parent == edge.parent_table && from == edge.child_column {
                found = true;
                break;
            }
        }
        if !found {
            return Err(CatalogError::MissingForeignKey {
                child_table: edge.child_table,
                child_column: edge.child_column,
            });
        }
    }

    Ok(())
}
