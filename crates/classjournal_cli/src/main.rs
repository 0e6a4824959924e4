//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `classjournal_core` wiring.
//! - Keep output deterministic for quick local sanity checks.

use classjournal_core::db::open_db_in_memory;
use classjournal_core::{GeneratorConfig, JournalService};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let service = JournalService::try_new(&conn, GeneratorConfig::default())?;

    println!("classjournal_core version={}", classjournal_core::core_version());
    for table in service.tables() {
        println!(
            "table={} pk={} columns={}",
            table.name,
            table.primary_key,
            table.columns.len()
        );
    }
    Ok(())
}
