//! Domain validation rules.
//!
//! # Responsibility
//! - Encode the journal's format and coupling constraints as pure functions.
//! - Give the CRUD boundary precise, structured rule failures before any
//!   storage round trip.
//!
//! # Invariants
//! - No function here touches storage or mutates anything.
//! - Grade bounds are `1..=12`; `absent` excludes a grade, `present`/`late`
//!   require one.

use crate::model::AttendanceStatus;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const GRADE_MIN: i64 = 1;
pub const GRADE_MAX: i64 = 12;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern is valid")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+380[0-9]{9}$").expect("phone pattern is valid"));

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,2}[A-Za-z-]?$").expect("class pattern is valid"));

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("date pattern is valid"));

/// One violated domain rule, with the offending value where useful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// Email does not match `local@domain.tld`.
    InvalidEmail(String),
    /// Phone is not `+380` followed by nine digits.
    InvalidPhone(String),
    /// Class label is not 1-2 digits with an optional letter or hyphen.
    InvalidClassLabel(String),
    /// Date is not a calendar-valid `YYYY-MM-DD`.
    InvalidDate(String),
    /// Grade outside `[1,12]`.
    GradeOutOfRange(i64),
    /// `absent` entries must not carry a grade.
    GradeForbiddenForAbsent,
    /// `present`/`late` entries must carry a grade.
    GradeRequired(AttendanceStatus),
    /// A non-null FK value points at a missing parent row.
    MissingReference {
        table: &'static str,
        key: i64,
    },
}

impl Display for RuleViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::InvalidPhone(value) => {
                write!(f, "invalid phone `{value}`; expected +380 and nine digits")
            }
            Self::InvalidClassLabel(value) => write!(f, "invalid class label `{value}`"),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::GradeOutOfRange(grade) => write!(
                f,
                "grade {grade} outside allowed range {GRADE_MIN}..{GRADE_MAX}"
            ),
            Self::GradeForbiddenForAbsent => {
                write!(f, "grade must be empty when attendance is `absent`")
            }
            Self::GradeRequired(status) => write!(
                f,
                "grade is required when attendance is `{}`",
                status.as_db()
            ),
            Self::MissingReference { table, key } => {
                write!(f, "no `{table}` row with key {key}")
            }
        }
    }
}

impl Error for RuleViolation {}

/// Checks `local@domain.tld`, case-insensitive.
pub fn check_email(value: &str) -> Result<(), RuleViolation> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(RuleViolation::InvalidEmail(value.to_string()))
    }
}

/// Checks the `+380XXXXXXXXX` national phone format.
pub fn check_phone(value: &str) -> Result<(), RuleViolation> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(RuleViolation::InvalidPhone(value.to_string()))
    }
}

/// Checks a class label such as `10A`, `7` or `9-`.
pub fn check_class_label(value: &str) -> Result<(), RuleViolation> {
    if CLASS_RE.is_match(value) {
        Ok(())
    } else {
        Err(RuleViolation::InvalidClassLabel(value.to_string()))
    }
}

/// Checks `YYYY-MM-DD` shape and calendar validity (month/day ranges, leap
/// years).
pub fn check_date(value: &str) -> Result<(), RuleViolation> {
    let invalid = || RuleViolation::InvalidDate(value.to_string());
    let captures = DATE_RE.captures(value).ok_or_else(invalid)?;
    let year: i32 = captures[1].parse().map_err(|_| invalid())?;
    let month: u32 = captures[2].parse().map_err(|_| invalid())?;
    let day: u32 = captures[3].parse().map_err(|_| invalid())?;

    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }
    Ok(())
}

/// Checks the `[1,12]` grade range.
pub fn check_grade(grade: i64) -> Result<(), RuleViolation> {
    if (GRADE_MIN..=GRADE_MAX).contains(&grade) {
        Ok(())
    } else {
        Err(RuleViolation::GradeOutOfRange(grade))
    }
}

/// Checks the attendance/grade coupling rule: `absent` forbids a grade,
/// `present`/`late` require one in range.
pub fn check_attendance_grade(
    status: AttendanceStatus,
    grade: Option<i64>,
) -> Result<(), RuleViolation> {
    match (status, grade) {
        (AttendanceStatus::Absent, Some(_)) => Err(RuleViolation::GradeForbiddenForAbsent),
        (AttendanceStatus::Absent, None) => Ok(()),
        (_, None) => Err(RuleViolation::GradeRequired(status)),
        (_, Some(grade)) => check_grade(grade),
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
