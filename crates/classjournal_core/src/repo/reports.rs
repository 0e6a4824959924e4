//! Read-only analytic queries over the journal.
//!
//! # Responsibility
//! - Answer the cross-table reporting questions the journal supports:
//!   per-subject averages for a class, per-teacher mark counts for a period,
//!   attendance distribution for a subject.
//!
//! # Invariants
//! - Queries never mutate; `grade` NULLs (absences) are excluded from
//!   averages by SQL semantics.

use crate::model::validate::check_date;
use crate::model::AttendanceStatus;
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Average grade and mark count for one subject within a class.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectAverage {
    pub subject: String,
    pub marks_count: u64,
    /// `None` when every entry for the subject is an absence.
    pub avg_grade: Option<f64>,
}

/// Mark count attributed to one teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherMarks {
    pub teacher: String,
    pub marks_count: u64,
}

/// Attendance tally for one class/status pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceTally {
    pub class: String,
    pub status: AttendanceStatus,
    pub count: u64,
}

/// Per-subject average grades for one class, best average first.
pub fn subject_averages_for_class(
    conn: &Connection,
    class: &str,
) -> RepoResult<Vec<SubjectAverage>> {
    let mut stmt = conn.prepare(
        "SELECT b.name AS subject, COUNT(j.entry_id) AS marks_count, AVG(j.grade) AS avg_grade
         FROM journal_entry j
         JOIN subject b ON j.subject_id = b.subject_id
         JOIN student s ON j.student_id = s.student_id
         WHERE s.class = ?1
         GROUP BY b.name
         ORDER BY avg_grade DESC;",
    )?;
    let mut rows = stmt.query([class])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(SubjectAverage {
            subject: row.get("subject")?,
            marks_count: row.get::<_, i64>("marks_count")? as u64,
            avg_grade: row.get("avg_grade")?,
        });
    }
    Ok(result)
}

/// Mark counts per teacher over an inclusive date range, busiest first,
/// capped at 50 teachers.
pub fn teacher_marks_between(
    conn: &Connection,
    date_from: &str,
    date_to: &str,
) -> RepoResult<Vec<TeacherMarks>> {
    check_date(date_from)?;
    check_date(date_to)?;

    let mut stmt = conn.prepare(
        "SELECT t.first_name || ' ' || t.last_name AS teacher,
                COUNT(j.entry_id) AS marks_count
         FROM journal_entry j
         JOIN teacher t ON j.teacher_id = t.teacher_id
         WHERE j.entry_date BETWEEN ?1 AND ?2
         GROUP BY teacher
         ORDER BY marks_count DESC
         LIMIT 50;",
    )?;
    let mut rows = stmt.query([date_from, date_to])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(TeacherMarks {
            teacher: row.get("teacher")?,
            marks_count: row.get::<_, i64>("marks_count")? as u64,
        });
    }
    Ok(result)
}

/// Attendance distribution per class for one subject, ordered by class.
pub fn attendance_by_class(
    conn: &Connection,
    subject_name: &str,
) -> RepoResult<Vec<AttendanceTally>> {
    let mut stmt = conn.prepare(
        "SELECT s.class AS class, j.attendance_status AS status, COUNT(*) AS cnt
         FROM journal_entry j
         JOIN student s ON j.student_id = s.student_id
         JOIN subject b ON j.subject_id = b.subject_id
         WHERE b.name = ?1
         GROUP BY s.class, j.attendance_status
         ORDER BY s.class;",
    )?;
    let mut rows = stmt.query([subject_name])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let status_text: String = row.get("status")?;
        let status = AttendanceStatus::parse(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid attendance status `{status_text}` in journal_entry.attendance_status"
            ))
        })?;
        result.push(AttendanceTally {
            class: row.get("class")?,
            status,
            count: row.get::<_, i64>("cnt")? as u64,
        });
    }
    Ok(result)
}
