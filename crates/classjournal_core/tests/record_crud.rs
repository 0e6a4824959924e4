use classjournal_core::db::open_db_in_memory;
use classjournal_core::{
    AttendanceStatus, CatalogError, Guardian, JournalEntry, RecordRepository, RepoError,
    RuleViolation, SqliteRecordRepository, Student, Subject, Teacher,
};
use rusqlite::types::Value;

#[test]
fn insert_and_select_guardian_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let id = repo.insert_guardian(&guardian(1)).unwrap();
    assert_eq!(id, 1);

    let row = repo.select_by_pk("guardian", 1).unwrap().unwrap();
    assert_eq!(row.integer("guardian_id"), Some(1));
    assert_eq!(row.text("phone"), Some("+380501234567"));
    assert!(repo.row_exists("guardian", 1).unwrap());
    assert!(!repo.row_exists("guardian", 2).unwrap());
}

#[test]
fn guardian_format_rules_are_checked_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let mut bad_phone = guardian(1);
    bad_phone.phone = "0501234567".to_string();
    assert!(matches!(
        repo.insert_guardian(&bad_phone).unwrap_err(),
        RepoError::Validation(RuleViolation::InvalidPhone(_))
    ));

    let mut bad_email = guardian(1);
    bad_email.email = "not-an-email".to_string();
    assert!(matches!(
        repo.insert_guardian(&bad_email).unwrap_err(),
        RepoError::Validation(RuleViolation::InvalidEmail(_))
    ));

    assert_eq!(repo.count_rows("guardian").unwrap(), 0);
}

#[test]
fn duplicate_primary_key_is_a_unique_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    repo.insert_guardian(&guardian(1)).unwrap();
    let err = repo.insert_guardian(&guardian(1)).unwrap_err();
    assert!(matches!(err, RepoError::UniqueKeyViolation(_)));
}

#[test]
fn student_insert_requires_existing_guardian_when_referenced() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let err = repo.insert_student(&student(10, Some(1))).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RuleViolation::MissingReference {
            table: "guardian",
            key: 1
        })
    ));

    repo.insert_guardian(&guardian(1)).unwrap();
    repo.insert_student(&student(10, Some(1))).unwrap();

    // A student without a guardian is valid: the FK is optional.
    repo.insert_student(&student(11, None)).unwrap();
    assert_eq!(repo.count_rows("student").unwrap(), 2);
}

#[test]
fn journal_insert_enforces_attendance_grade_coupling() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();
    seed_parents(&repo);

    // Absent with no grade succeeds.
    repo.insert_journal_entry(&entry(1, 5, AttendanceStatus::Absent, None))
        .unwrap();

    // The identical insert with a grade fails.
    let err = repo
        .insert_journal_entry(&entry(2, 5, AttendanceStatus::Absent, Some(7)))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RuleViolation::GradeForbiddenForAbsent)
    ));

    // Present without a grade fails.
    let err = repo
        .insert_journal_entry(&entry(2, 5, AttendanceStatus::Present, None))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RuleViolation::GradeRequired(AttendanceStatus::Present))
    ));

    // Grade outside [1,12] fails.
    let err = repo
        .insert_journal_entry(&entry(2, 5, AttendanceStatus::Late, Some(13)))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RuleViolation::GradeOutOfRange(13))
    ));

    repo.insert_journal_entry(&entry(2, 5, AttendanceStatus::Late, Some(12)))
        .unwrap();
    assert_eq!(repo.count_rows("journal_entry").unwrap(), 2);
}

#[test]
fn journal_insert_requires_existing_student() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let err = repo
        .insert_journal_entry(&entry(1, 99, AttendanceStatus::Absent, None))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RuleViolation::MissingReference {
            table: "student",
            key: 99
        })
    ));
}

#[test]
fn list_rows_is_ordered_by_primary_key_and_bounded() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    for id in [3, 1, 2] {
        repo.insert_subject(&Subject {
            subject_id: id,
            name: format!("subject-{id}"),
        })
        .unwrap();
    }

    let rows = repo.list_rows("subject", 2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].integer("subject_id"), Some(1));
    assert_eq!(rows[1].integer("subject_id"), Some(2));
}

#[test]
fn update_by_pk_changes_checked_columns_and_returns_the_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();
    repo.insert_guardian(&guardian(1)).unwrap();

    let updated = repo
        .update_by_pk(
            "guardian",
            1,
            &[("first_name", Value::Text("Oksana".to_string()))],
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.text("first_name"), Some("Oksana"));

    // Missing key yields no row, not an error.
    let missing = repo
        .update_by_pk(
            "guardian",
            2,
            &[("first_name", Value::Text("Nobody".to_string()))],
        )
        .unwrap();
    assert!(missing.is_none());

    // Empty update set is a no-op.
    assert!(repo.update_by_pk("guardian", 1, &[]).unwrap().is_none());
}

#[test]
fn update_by_pk_rejects_unknown_names_and_bad_types() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();
    repo.insert_guardian(&guardian(1)).unwrap();
    repo.insert_student(&student(10, Some(1))).unwrap();

    let err = repo
        .update_by_pk("students", 10, &[("class", Value::Text("9".into()))])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Catalog(CatalogError::UnknownTable(_))
    ));

    let err = repo
        .update_by_pk("student", 10, &[("classroom", Value::Text("9".into()))])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Catalog(CatalogError::UnknownColumn { .. })
    ));

    let err = repo
        .update_by_pk("student", 10, &[("guardian_id", Value::Text("1".into()))])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ColumnTypeMismatch {
            table: "student",
            column: "guardian_id",
            ..
        }
    ));

    let err = repo
        .update_by_pk("student", 10, &[("first_name", Value::Null)])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ColumnNotNullable {
            table: "student",
            column: "first_name"
        }
    ));

    let err = repo
        .update_by_pk("student", 10, &[("birth_date", Value::Text("soon".into()))])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RuleViolation::InvalidDate(_))
    ));
}

#[test]
fn update_to_dangling_fk_is_caught_by_the_storage_engine() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();
    repo.insert_guardian(&guardian(1)).unwrap();
    repo.insert_student(&student(10, Some(1))).unwrap();

    let err = repo
        .update_by_pk("student", 10, &[("guardian_id", Value::Integer(42))])
        .unwrap_err();
    assert!(matches!(err, RepoError::ForeignKeyViolation(_)));
}

#[test]
fn update_by_pk_checks_types_but_not_cross_column_rules() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();
    seed_parents(&repo);
    repo.insert_journal_entry(&entry(1, 5, AttendanceStatus::Present, Some(8)))
        .unwrap();

    // Type-valid values pass even when they fall outside insert-time domain
    // rules; updates re-check column metadata only.
    let updated = repo
        .update_by_pk("journal_entry", 1, &[("grade", Value::Integer(99))])
        .unwrap()
        .unwrap();
    assert_eq!(updated.integer("grade"), Some(99));

    let updated = repo
        .update_by_pk(
            "journal_entry",
            1,
            &[("attendance_status", Value::Text("absent".into()))],
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.text("attendance_status"), Some("absent"));
    assert_eq!(updated.integer("grade"), Some(99));
}

fn guardian(id: i64) -> Guardian {
    Guardian {
        guardian_id: id,
        first_name: "Olena".to_string(),
        last_name: "Shevchenko".to_string(),
        phone: "+380501234567".to_string(),
        email: format!("guardian{id}@example.com"),
    }
}

fn student(id: i64, guardian_id: Option<i64>) -> Student {
    Student {
        student_id: id,
        guardian_id,
        first_name: "Taras".to_string(),
        last_name: "Shevchenko".to_string(),
        birth_date: "2010-03-09".to_string(),
        class: "10A".to_string(),
        email: format!("student{id}@example.com"),
    }
}

fn entry(id: i64, student_id: i64, status: AttendanceStatus, grade: Option<i64>) -> JournalEntry {
    JournalEntry {
        entry_id: id,
        student_id,
        teacher_id: Some(1),
        subject_id: Some(1),
        entry_date: "2024-09-02".to_string(),
        grade,
        attendance_status: status,
    }
}

fn seed_parents(repo: &SqliteRecordRepository<'_>) {
    repo.insert_guardian(&guardian(1)).unwrap();
    repo.insert_student(&student(5, Some(1))).unwrap();
    repo.insert_teacher(&Teacher {
        teacher_id: 1,
        first_name: "Iryna".to_string(),
        last_name: "Koval".to_string(),
        email: "iryna.koval@school.ua".to_string(),
    })
    .unwrap();
    repo.insert_subject(&Subject {
        subject_id: 1,
        name: "Mathematics".to_string(),
    })
    .unwrap();
}
