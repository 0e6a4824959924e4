//! Persistence boundary: shared error taxonomy and dynamic row support.
//!
//! # Responsibility
//! - Define the closed error set every fallible storage operation returns.
//! - Translate SQLite constraint codes into that set instead of leaking raw
//!   driver errors.
//! - Provide a column-name/value row shape for table-generic reads.
//!
//! # Invariants
//! - No catch-all error variant: every failure is one of the kinds below.
//! - Constraint translation covers primary-key and foreign-key rejections;
//!   anything else stays a `Db` error with its original detail.

use crate::catalog::{CatalogError, ColumnType};
use crate::db::DbError;
use crate::model::validate::RuleViolation;
use rusqlite::types::Value;
use rusqlite::Row;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod record_repo;
pub mod reports;

pub type RepoResult<T> = Result<T, RepoError>;

/// Per-table row counts, ordered by table name. Used both for impact
/// previews and for `ChildRowsExist` detail.
pub type ImpactCounts = BTreeMap<&'static str, u64>;

/// Closed error set for all journal storage operations.
#[derive(Debug)]
pub enum RepoError {
    /// Table/column outside the allow-listed schema, or live-schema mismatch.
    Catalog(CatalogError),
    /// A domain rule was violated before storage was touched.
    Validation(RuleViolation),
    /// An update value does not match the column's declared type.
    ColumnTypeMismatch {
        table: &'static str,
        column: &'static str,
        expected: ColumnType,
    },
    /// An update tried to store NULL into a non-nullable column.
    ColumnNotNullable {
        table: &'static str,
        column: &'static str,
    },
    /// Storage rejected a duplicate primary key.
    UniqueKeyViolation(String),
    /// Storage rejected a dangling reference (pre-check skipped or raced).
    ForeignKeyViolation(String),
    /// A guarded delete was blocked; carries the nonzero child counts.
    ChildRowsExist(ImpactCounts),
    /// Bulk generation refused because a required parent table is empty.
    MissingPrerequisiteData(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ColumnTypeMismatch {
                table,
                column,
                expected,
            } => write!(
                f,
                "value for `{table}.{column}` does not match declared type {expected:?}"
            ),
            Self::ColumnNotNullable { table, column } => {
                write!(f, "column `{table}.{column}` is not nullable")
            }
            Self::UniqueKeyViolation(detail) => write!(f, "duplicate key: {detail}"),
            Self::ForeignKeyViolation(detail) => write!(f, "dangling reference: {detail}"),
            Self::ChildRowsExist(counts) => {
                write!(f, "child rows exist:")?;
                for (table, count) in counts {
                    write!(f, " {table}={count}")?;
                }
                Ok(())
            }
            Self::MissingPrerequisiteData(table) => {
                write!(f, "cannot generate: required parent table `{table}` is empty")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CatalogError> for RepoError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<RuleViolation> for RepoError {
    fn from(value: RuleViolation) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        translate_sqlite_error(value)
    }
}

/// Maps SQLite constraint rejections into the closed taxonomy; everything
/// else stays a `Db` error.
fn translate_sqlite_error(err: rusqlite::Error) -> RepoError {
    if let rusqlite::Error::SqliteFailure(code, message) = &err {
        let detail = message
            .clone()
            .unwrap_or_else(|| format!("constraint code {}", code.extended_code));
        match code.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return RepoError::UniqueKeyViolation(detail);
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return RepoError::ForeignKeyViolation(detail);
            }
            _ => {}
        }
    }
    RepoError::Db(DbError::Sqlite(err))
}

/// One row of an arbitrary allow-listed table, as ordered column/value pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub values: Vec<(String, Value)>,
}

impl TableRow {
    /// Builds a row snapshot from a rusqlite result row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let stmt = row.as_ref();
        let mut values = Vec::with_capacity(stmt.column_count());
        for index in 0..stmt.column_count() {
            let name = stmt.column_name(index)?.to_string();
            let value: Value = row.get_ref(index)?.into();
            values.push((name, value));
        }
        Ok(Self { values })
    }

    /// Returns the value for a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns an integer column value, if present and integer-typed.
    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.get(column) {
            Some(Value::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// Returns a text column value, if present and text-typed.
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(Value::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}
