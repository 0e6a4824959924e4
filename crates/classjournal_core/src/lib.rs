//! Core domain logic for the class journal.
//! This crate is the single source of truth for referential-integrity and
//! generation invariants; presentation layers stay thin on top of it.

pub mod catalog;
pub mod db;
pub mod generate;
pub mod guard;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use catalog::{CatalogError, ColumnDef, ColumnType, FkEdge, TableDef};
pub use generate::{BulkGenerator, GeneratorConfig};
pub use guard::{DeleteOutcome, IntegrityGuard};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::validate::RuleViolation;
pub use model::{
    AttendanceStatus, Guardian, JournalEntry, RecordId, Student, Subject, Teacher,
};
pub use repo::record_repo::{RecordRepository, SqliteRecordRepository};
pub use repo::{ImpactCounts, RepoError, RepoResult, TableRow};
pub use service::JournalService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
