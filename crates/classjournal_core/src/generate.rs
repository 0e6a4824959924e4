//! Set-based synthetic data generator.
//!
//! # Responsibility
//! - Populate any journal table with n synthetic rows in one batch statement,
//!   continuing primary keys from the current maximum.
//! - Sample parent keys uniformly with replacement through ordinal joins into
//!   row-numbered parent views, never via per-row existence checks.
//!
//! # Invariants
//! - Every generated FK value references a parent row that exists at commit
//!   time (single-connection scope; no cross-session coordination).
//! - Each `generate` call is one transaction; journal generation runs its two
//!   phases inside that same transaction and rolls back as a unit.
//! - `n = 0` is a no-op.

use crate::catalog;
use crate::model::RecordId;
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Tunables for synthesized field content.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    /// Probability that a generated class label carries a letter suffix
    /// (e.g. `10A` instead of `10`). Clamped to `[0,1]`.
    pub class_letter_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            class_letter_probability: 0.25,
        }
    }
}

/// Bulk generator over the shared connection.
pub struct BulkGenerator<'conn> {
    conn: &'conn Connection,
    config: GeneratorConfig,
}

impl<'conn> BulkGenerator<'conn> {
    /// Wraps a connection after verifying it carries the journal schema.
    pub fn try_new(conn: &'conn Connection, config: GeneratorConfig) -> RepoResult<Self> {
        catalog::verify_connection(conn)?;
        Ok(Self { conn, config })
    }

    /// Generates `n` synthetic rows for an allow-listed table.
    ///
    /// Returns the number of inserted rows. Fails with
    /// `MissingPrerequisiteData` when a required parent table is empty.
    pub fn generate(&self, table: &str, n: u32) -> RepoResult<u64> {
        let table = catalog::table(table)?;
        if n == 0 {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = match table.name {
            "guardian" => generate_guardians(&tx, n)?,
            "teacher" => generate_teachers(&tx, n)?,
            "subject" => generate_subjects(&tx, n)?,
            "student" => generate_students(&tx, n, self.letter_suffix_pct())?,
            "journal_entry" => generate_journal_entries(&tx, n)?,
            _ => unreachable!("catalog allow-list is exhaustive"),
        };
        tx.commit()?;

        info!(
            "event=generate module=generate status=ok table={} requested={n} inserted={inserted}",
            table.name
        );
        Ok(inserted)
    }

    fn letter_suffix_pct(&self) -> i64 {
        (self.config.class_letter_probability.clamp(0.0, 1.0) * 100.0).round() as i64
    }
}

fn require_rows(tx: &Transaction<'_>, table: &'static str) -> RepoResult<()> {
    let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM \"{table}\";"), [], |row| {
        row.get(0)
    })?;
    if count == 0 {
        return Err(RepoError::MissingPrerequisiteData(table));
    }
    Ok(())
}

fn current_max(tx: &Transaction<'_>, table: &str, pk: &str) -> RepoResult<RecordId> {
    let max: i64 = tx.query_row(
        &format!("SELECT COALESCE(MAX(\"{pk}\"), 0) FROM \"{table}\";"),
        [],
        |row| row.get(0),
    )?;
    Ok(max)
}

fn generate_guardians(tx: &Transaction<'_>, n: u32) -> RepoResult<u64> {
    let inserted = tx.execute(
        "WITH RECURSIVE
         maxv(m) AS (SELECT COALESCE(MAX(guardian_id), 0) FROM guardian),
         seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < ?1)
         INSERT INTO guardian (guardian_id, first_name, last_name, phone, email)
         SELECT
           maxv.m + seq.i,
           lower(hex(randomblob(4))),
           lower(hex(randomblob(4))),
           '+380' || (100000000 + abs(random() % 900000000)),
           lower(hex(randomblob(4))) || '@example.com'
         FROM maxv, seq;",
        [i64::from(n)],
    )?;
    Ok(inserted as u64)
}

fn generate_teachers(tx: &Transaction<'_>, n: u32) -> RepoResult<u64> {
    let inserted = tx.execute(
        "WITH RECURSIVE
         maxv(m) AS (SELECT COALESCE(MAX(teacher_id), 0) FROM teacher),
         seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < ?1)
         INSERT INTO teacher (teacher_id, first_name, last_name, email)
         SELECT
           maxv.m + seq.i,
           lower(hex(randomblob(4))),
           lower(hex(randomblob(4))),
           lower(hex(randomblob(4))) || '@example.com'
         FROM maxv, seq;",
        [i64::from(n)],
    )?;
    Ok(inserted as u64)
}

fn generate_subjects(tx: &Transaction<'_>, n: u32) -> RepoResult<u64> {
    let inserted = tx.execute(
        "WITH RECURSIVE
         maxv(m) AS (SELECT COALESCE(MAX(subject_id), 0) FROM subject),
         seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < ?1)
         INSERT INTO subject (subject_id, name)
         SELECT maxv.m + seq.i, lower(hex(randomblob(5)))
         FROM maxv, seq;",
        [i64::from(n)],
    )?;
    Ok(inserted as u64)
}

/// Students sample a guardian uniformly with replacement: each new row draws
/// a random ordinal into a row-numbered view of `guardian`.
fn generate_students(tx: &Transaction<'_>, n: u32, letter_pct: i64) -> RepoResult<u64> {
    require_rows(tx, "guardian")?;

    let inserted = tx.execute(
        "WITH RECURSIVE
         maxv(m) AS (SELECT COALESCE(MAX(student_id), 0) FROM student),
         pcount(c) AS (SELECT COUNT(*) FROM guardian),
         parents(idx, guardian_id) AS (
           SELECT ROW_NUMBER() OVER (ORDER BY guardian_id), guardian_id FROM guardian
         ),
         seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < ?1),
         gens(new_id, pidx, fn, ln, bd, cls, em) AS (
           SELECT
             maxv.m + seq.i,
             1 + abs(random() % pcount.c),
             lower(hex(randomblob(3))),
             lower(hex(randomblob(3))),
             date('2005-01-01', '+' || abs(random() % 4000) || ' days'),
             CAST(1 + abs(random() % 11) AS TEXT)
               || CASE WHEN abs(random() % 100) < ?2
                       THEN char(65 + abs(random() % 2))
                       ELSE '' END,
             lower(hex(randomblob(3))) || '@example.com'
           FROM maxv, pcount, seq
         )
         INSERT INTO student (
           student_id, guardian_id, first_name, last_name, birth_date, class, email
         )
         SELECT g.new_id, p.guardian_id, g.fn, g.ln, g.bd, g.cls, g.em
         FROM gens g
         JOIN parents p ON p.idx = g.pidx;",
        [i64::from(n), letter_pct],
    )?;
    Ok(inserted as u64)
}

/// Two-phase journal generation inside the caller's transaction.
///
/// Phase 1 bulk-inserts `n` rows with provisional `present` status and an
/// in-range grade; phase 2 bulk-updates exactly the new key range to a random
/// status, nulling the grade where the status became `absent`. A failure in
/// either phase rolls back both.
fn generate_journal_entries(tx: &Transaction<'_>, n: u32) -> RepoResult<u64> {
    require_rows(tx, "student")?;
    require_rows(tx, "teacher")?;
    require_rows(tx, "subject")?;

    let old_max = current_max(tx, "journal_entry", "entry_id")?;

    let inserted = tx.execute(
        "WITH RECURSIVE
         maxv(m) AS (SELECT COALESCE(MAX(entry_id), 0) FROM journal_entry),
         scount(c) AS (SELECT COUNT(*) FROM student),
         tcount(c) AS (SELECT COUNT(*) FROM teacher),
         bcount(c) AS (SELECT COUNT(*) FROM subject),
         students(idx, student_id) AS (
           SELECT ROW_NUMBER() OVER (ORDER BY student_id), student_id FROM student
         ),
         teachers(idx, teacher_id) AS (
           SELECT ROW_NUMBER() OVER (ORDER BY teacher_id), teacher_id FROM teacher
         ),
         subjects(idx, subject_id) AS (
           SELECT ROW_NUMBER() OVER (ORDER BY subject_id), subject_id FROM subject
         ),
         seq(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM seq WHERE i < ?1),
         gens(new_id, s_idx, t_idx, b_idx, ed, gr) AS (
           SELECT
             maxv.m + seq.i,
             1 + abs(random() % scount.c),
             1 + abs(random() % tcount.c),
             1 + abs(random() % bcount.c),
             date('2020-01-01', '+' || abs(random() % 2000) || ' days'),
             1 + abs(random() % 12)
           FROM maxv, scount, tcount, bcount, seq
         )
         INSERT INTO journal_entry (
           entry_id, student_id, teacher_id, subject_id, entry_date, grade, attendance_status
         )
         SELECT g.new_id, s.student_id, t.teacher_id, b.subject_id, g.ed, g.gr, 'present'
         FROM gens g
         JOIN students s ON s.idx = g.s_idx
         JOIN teachers t ON t.idx = g.t_idx
         JOIN subjects b ON b.idx = g.b_idx;",
        [i64::from(n)],
    )?;

    // Two statements: a shared random expression would be re-evaluated per
    // reference, decoupling status from grade. Status first, then null the
    // grade wherever the row became an absence.
    tx.execute(
        "UPDATE journal_entry
         SET attendance_status = CASE abs(random() % 3)
               WHEN 0 THEN 'present'
               WHEN 1 THEN 'absent'
               ELSE 'late'
             END
         WHERE entry_id > ?1;",
        [old_max],
    )?;
    tx.execute(
        "UPDATE journal_entry
         SET grade = NULL
         WHERE entry_id > ?1 AND attendance_status = 'absent';",
        [old_max],
    )?;

    Ok(inserted as u64)
}
