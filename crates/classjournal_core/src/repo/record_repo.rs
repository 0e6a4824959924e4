//! Record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the CRUD boundary over the five journal tables.
//! - Run domain validation and FK pre-checks before any mutating statement.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Insert paths validate formats and coupling rules first, then check FK
//!   targets with `row_exists`, then issue the statement.
//! - `update_by_pk` only accepts columns the catalog knows, with values that
//!   match the declared column types.

use crate::catalog::{self, ColumnType};
use crate::model::validate::{
    check_attendance_grade, check_class_label, check_date, check_email, check_phone, RuleViolation,
};
use crate::model::{Guardian, JournalEntry, RecordId, Student, Subject, Teacher};
use crate::repo::{RepoError, RepoResult, TableRow};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

/// Repository interface for journal record CRUD operations.
pub trait RecordRepository {
    fn insert_guardian(&self, guardian: &Guardian) -> RepoResult<RecordId>;
    fn insert_teacher(&self, teacher: &Teacher) -> RepoResult<RecordId>;
    fn insert_subject(&self, subject: &Subject) -> RepoResult<RecordId>;
    fn insert_student(&self, student: &Student) -> RepoResult<RecordId>;
    fn insert_journal_entry(&self, entry: &JournalEntry) -> RepoResult<RecordId>;
    fn row_exists(&self, table: &str, key: RecordId) -> RepoResult<bool>;
    fn count_rows(&self, table: &str) -> RepoResult<u64>;
    fn list_rows(&self, table: &str, limit: u32) -> RepoResult<Vec<TableRow>>;
    fn select_by_pk(&self, table: &str, key: RecordId) -> RepoResult<Option<TableRow>>;
    /// Column-level update checked against catalog metadata: column names,
    /// value types, nullability, and calendar-valid dates. Cross-column
    /// domain rules (grade range, attendance/grade coupling) are enforced on
    /// insert only and are not re-validated here.
    fn update_by_pk(
        &self,
        table: &str,
        key: RecordId,
        updates: &[(&str, Value)],
    ) -> RepoResult<Option<TableRow>>;
}

/// SQLite-backed record repository over the shared connection.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Wraps a connection after verifying it carries the journal schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        catalog::verify_connection(conn)?;
        Ok(Self { conn })
    }

    fn require_reference(
        &self,
        table: &'static str,
        key: Option<RecordId>,
    ) -> RepoResult<()> {
        if let Some(key) = key {
            if !self.row_exists(table, key)? {
                return Err(RuleViolation::MissingReference { table, key }.into());
            }
        }
        Ok(())
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn insert_guardian(&self, guardian: &Guardian) -> RepoResult<RecordId> {
        check_phone(&guardian.phone)?;
        check_email(&guardian.email)?;

        self.conn.execute(
            "INSERT INTO guardian (guardian_id, first_name, last_name, phone, email)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                guardian.guardian_id,
                guardian.first_name,
                guardian.last_name,
                guardian.phone,
                guardian.email,
            ],
        )?;
        Ok(guardian.guardian_id)
    }

    fn insert_teacher(&self, teacher: &Teacher) -> RepoResult<RecordId> {
        check_email(&teacher.email)?;

        self.conn.execute(
            "INSERT INTO teacher (teacher_id, first_name, last_name, email)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                teacher.teacher_id,
                teacher.first_name,
                teacher.last_name,
                teacher.email,
            ],
        )?;
        Ok(teacher.teacher_id)
    }

    fn insert_subject(&self, subject: &Subject) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO subject (subject_id, name) VALUES (?1, ?2);",
            params![subject.subject_id, subject.name],
        )?;
        Ok(subject.subject_id)
    }

    fn insert_student(&self, student: &Student) -> RepoResult<RecordId> {
        check_date(&student.birth_date)?;
        check_class_label(&student.class)?;
        check_email(&student.email)?;
        self.require_reference("guardian", student.guardian_id)?;

        self.conn.execute(
            "INSERT INTO student (
                student_id,
                guardian_id,
                first_name,
                last_name,
                birth_date,
                class,
                email
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                student.student_id,
                student.guardian_id,
                student.first_name,
                student.last_name,
                student.birth_date,
                student.class,
                student.email,
            ],
        )?;
        Ok(student.student_id)
    }

    fn insert_journal_entry(&self, entry: &JournalEntry) -> RepoResult<RecordId> {
        check_date(&entry.entry_date)?;
        check_attendance_grade(entry.attendance_status, entry.grade)?;
        self.require_reference("student", Some(entry.student_id))?;
        self.require_reference("teacher", entry.teacher_id)?;
        self.require_reference("subject", entry.subject_id)?;

        self.conn.execute(
            "INSERT INTO journal_entry (
                entry_id,
                student_id,
                teacher_id,
                subject_id,
                entry_date,
                grade,
                attendance_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                entry.entry_id,
                entry.student_id,
                entry.teacher_id,
                entry.subject_id,
                entry.entry_date,
                entry.grade,
                entry.attendance_status.as_db(),
            ],
        )?;
        Ok(entry.entry_id)
    }

    fn row_exists(&self, table: &str, key: RecordId) -> RepoResult<bool> {
        let table = catalog::table(table)?;
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE \"{}\" = ?1);",
                table.name, table.primary_key
            ),
            [key],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    fn count_rows(&self, table: &str) -> RepoResult<u64> {
        let table = catalog::table(table)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\";", table.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn list_rows(&self, table: &str, limit: u32) -> RepoResult<Vec<TableRow>> {
        let table = catalog::table(table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM \"{}\" ORDER BY \"{}\" ASC LIMIT ?1;",
            table.name, table.primary_key
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(TableRow::from_row(row)?);
        }
        Ok(result)
    }

    fn select_by_pk(&self, table: &str, key: RecordId) -> RepoResult<Option<TableRow>> {
        let table = catalog::table(table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM \"{}\" WHERE \"{}\" = ?1;",
            table.name, table.primary_key
        ))?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(TableRow::from_row(row)?));
        }
        Ok(None)
    }

    fn update_by_pk(
        &self,
        table: &str,
        key: RecordId,
        updates: &[(&str, Value)],
    ) -> RepoResult<Option<TableRow>> {
        let table = catalog::table(table)?;
        if updates.is_empty() {
            return Ok(None);
        }

        let mut set_parts = Vec::with_capacity(updates.len());
        let mut bind_values = Vec::with_capacity(updates.len() + 1);
        for (index, (column_name, value)) in updates.iter().enumerate() {
            let column = catalog::column(table.name, column_name)?;
            check_update_value(table.name, column.name, column.ty, column.nullable, value)?;
            set_parts.push(format!("\"{}\" = ?{}", column.name, index + 1));
            bind_values.push(value.clone());
        }
        bind_values.push(Value::Integer(key));

        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"{}\" = ?{} RETURNING *;",
            table.name,
            set_parts.join(", "),
            table.primary_key,
            bind_values.len()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(TableRow::from_row(row)?));
        }
        Ok(None)
    }
}

/// Type-checks one update value against catalog column metadata. Date columns
/// additionally require calendar-valid text.
fn check_update_value(
    table: &'static str,
    column: &'static str,
    ty: ColumnType,
    nullable: bool,
    value: &Value,
) -> RepoResult<()> {
    match value {
        Value::Null if nullable => Ok(()),
        Value::Null => Err(RepoError::ColumnNotNullable { table, column }),
        Value::Integer(_) if ty == ColumnType::Integer => Ok(()),
        Value::Text(text) if ty == ColumnType::Date => {
            check_date(text)?;
            Ok(())
        }
        Value::Text(_) if ty == ColumnType::Text => Ok(()),
        _ => Err(RepoError::ColumnTypeMismatch {
            table,
            column,
            expected: ty,
        }),
    }
}
