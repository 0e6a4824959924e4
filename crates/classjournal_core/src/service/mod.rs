//! Use-case services for core callers.

pub mod journal_service;

pub use journal_service::{BlockingExamples, JournalService};
