//! Journal use-case service.
//!
//! # Responsibility
//! - Tie catalog, validation, guard and generator together behind one facade
//!   a presentation layer can call.
//! - Delegate persistence; no business logic of its own.
//!
//! # Invariants
//! - Service APIs never bypass repository validation or guard contracts.
//! - The service owns no connection; it borrows the process-wide one.

use crate::catalog::{self, TableDef};
use crate::generate::{BulkGenerator, GeneratorConfig};
use crate::guard::{DeleteOutcome, IntegrityGuard, CHILD_EXAMPLE_LIMIT};
use crate::model::{Guardian, JournalEntry, RecordId, Student, Subject, Teacher};
use crate::repo::record_repo::{RecordRepository, SqliteRecordRepository};
use crate::repo::reports::{
    attendance_by_class, subject_averages_for_class, teacher_marks_between, AttendanceTally,
    SubjectAverage, TeacherMarks,
};
use crate::repo::{ImpactCounts, RepoResult, TableRow};
use rusqlite::types::Value;
use rusqlite::Connection;

/// Diagnostic sample of child rows blocking a delete, one entry per child
/// table. Only the first FK column per child table is sampled; rows blocked
/// through a second FK column into the same child table are not shown. Known
/// limitation, kept as documented behavior.
#[derive(Debug)]
pub struct BlockingExamples {
    pub child_table: &'static str,
    pub rows: Vec<TableRow>,
}

/// Facade composing the repository, the integrity guard and the bulk
/// generator over one shared connection.
pub struct JournalService<'conn> {
    conn: &'conn Connection,
    records: SqliteRecordRepository<'conn>,
    guard: IntegrityGuard<'conn>,
    generator: BulkGenerator<'conn>,
}

impl<'conn> JournalService<'conn> {
    /// Builds the service, verifying the connection schema once per component.
    pub fn try_new(conn: &'conn Connection, config: GeneratorConfig) -> RepoResult<Self> {
        Ok(Self {
            conn,
            records: SqliteRecordRepository::try_new(conn)?,
            guard: IntegrityGuard::try_new(conn)?,
            generator: BulkGenerator::try_new(conn, config)?,
        })
    }

    /// The allow-listed tables, in catalog order.
    pub fn tables(&self) -> &'static [TableDef] {
        catalog::tables()
    }

    /// Column metadata for one allow-listed table.
    pub fn columns(&self, table: &str) -> RepoResult<&'static TableDef> {
        Ok(catalog::table(table)?)
    }

    pub fn insert_guardian(&self, guardian: &Guardian) -> RepoResult<RecordId> {
        self.records.insert_guardian(guardian)
    }

    pub fn insert_teacher(&self, teacher: &Teacher) -> RepoResult<RecordId> {
        self.records.insert_teacher(teacher)
    }

    pub fn insert_subject(&self, subject: &Subject) -> RepoResult<RecordId> {
        self.records.insert_subject(subject)
    }

    pub fn insert_student(&self, student: &Student) -> RepoResult<RecordId> {
        self.records.insert_student(student)
    }

    pub fn insert_journal_entry(&self, entry: &JournalEntry) -> RepoResult<RecordId> {
        self.records.insert_journal_entry(entry)
    }

    pub fn list_rows(&self, table: &str, limit: u32) -> RepoResult<Vec<TableRow>> {
        self.records.list_rows(table, limit)
    }

    pub fn select_by_pk(&self, table: &str, key: RecordId) -> RepoResult<Option<TableRow>> {
        self.records.select_by_pk(table, key)
    }

    pub fn count_rows(&self, table: &str) -> RepoResult<u64> {
        self.records.count_rows(table)
    }

    /// Column-level update; names and value types are checked against the
    /// catalog before the statement is issued.
    pub fn update_by_pk(
        &self,
        table: &str,
        key: RecordId,
        updates: &[(&str, Value)],
    ) -> RepoResult<Option<TableRow>> {
        self.records.update_by_pk(table, key, updates)
    }

    /// Impact map for deleting one row; see `IntegrityGuard::preview_impact`.
    pub fn preview_impact(&self, table: &str, key: RecordId) -> RepoResult<ImpactCounts> {
        self.guard.preview_impact(table, key)
    }

    /// Guarded single-row delete; see `IntegrityGuard::delete_by_key`.
    pub fn delete_by_key(&self, table: &str, key: RecordId) -> RepoResult<DeleteOutcome> {
        self.guard.delete_by_key(table, key)
    }

    /// Guarded whole-table delete; see `IntegrityGuard::delete_all`.
    pub fn delete_all(&self, table: &str) -> RepoResult<u64> {
        self.guard.delete_all(table)
    }

    /// Samples blocking child rows after a refused delete, up to 10 per child
    /// table, using the first FK column the catalog reports per child table.
    pub fn blocking_examples(&self, parent_table: &str) -> RepoResult<Vec<BlockingExamples>> {
        let mut sampled: Vec<BlockingExamples> = Vec::new();
        for edge in catalog::referencing_fks(parent_table)? {
            if sampled
                .iter()
                .any(|example| example.child_table == edge.child_table)
            {
                continue;
            }
            let rows = self.guard.child_examples(
                edge.child_table,
                edge.child_column,
                parent_table,
                CHILD_EXAMPLE_LIMIT,
            )?;
            if !rows.is_empty() {
                sampled.push(BlockingExamples {
                    child_table: edge.child_table,
                    rows,
                });
            }
        }
        Ok(sampled)
    }

    /// Bulk-generates synthetic rows; see `BulkGenerator::generate`.
    pub fn generate(&self, table: &str, n: u32) -> RepoResult<u64> {
        self.generator.generate(table, n)
    }

    pub fn subject_averages_for_class(&self, class: &str) -> RepoResult<Vec<SubjectAverage>> {
        subject_averages_for_class(self.conn, class)
    }

    pub fn teacher_marks_between(
        &self,
        date_from: &str,
        date_to: &str,
    ) -> RepoResult<Vec<TeacherMarks>> {
        teacher_marks_between(self.conn, date_from, date_to)
    }

    pub fn attendance_by_class(&self, subject_name: &str) -> RepoResult<Vec<AttendanceTally>> {
        attendance_by_class(self.conn, subject_name)
    }
}
