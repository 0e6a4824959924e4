//! Journal domain models.
//!
//! # Responsibility
//! - Define the five entity records with caller-supplied primary keys.
//! - Define attendance status and its storage encoding.
//!
//! # Invariants
//! - Primary keys are provided by the caller and never minted here.
//! - `AttendanceStatus` covers exactly the three allowed statuses.

use serde::{Deserialize, Serialize};

pub mod validate;

/// Caller-supplied primary key. Kept as a type alias to make semantic intent
/// explicit in signatures.
pub type RecordId = i64;

/// Attendance outcome recorded with a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Student attended the lesson.
    Present,
    /// Student was missing; no grade may accompany this status.
    Absent,
    /// Student arrived late but attended.
    Late,
}

impl AttendanceStatus {
    /// Storage encoding used in `journal_entry.attendance_status`.
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }

    /// Parses the storage encoding; `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            _ => None,
        }
    }
}

/// Guardian (parent) record. Referenced by `Student.guardian_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub guardian_id: RecordId,
    pub first_name: String,
    pub last_name: String,
    /// `+380` followed by nine digits.
    pub phone: String,
    pub email: String,
}

/// Teacher record. Referenced by `JournalEntry.teacher_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Subject record. Referenced by `JournalEntry.subject_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: RecordId,
    pub name: String,
}

/// Student record with an optional back reference to a guardian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: RecordId,
    /// Optional; when set it must reference an existing guardian.
    pub guardian_id: Option<RecordId>,
    pub first_name: String,
    pub last_name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub birth_date: String,
    /// Class label, e.g. `10A` or `7-`.
    pub class: String,
    pub email: String,
}

/// One attendance/grade journal row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: RecordId,
    /// Required; must reference an existing student.
    pub student_id: RecordId,
    pub teacher_id: Option<RecordId>,
    pub subject_id: Option<RecordId>,
    /// Calendar date, `YYYY-MM-DD`.
    pub entry_date: String,
    /// Required and in `[1,12]` for present/late, forbidden for absent.
    pub grade: Option<i64>,
    pub attendance_status: AttendanceStatus,
}
