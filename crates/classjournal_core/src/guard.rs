//! Referential-integrity guard for destructive operations.
//!
//! # Responsibility
//! - Compute per-table child-row impact for a candidate parent row or a whole
//!   table, driven by the catalog's FK edges.
//! - Enforce the all-or-nothing delete contract: any child reference blocks
//!   the whole operation, with zero mutations.
//!
//! # Invariants
//! - Impact check and delete always share one transaction; a child row cannot
//!   slip in between them on this connection.
//! - Only direct FK edges are considered, never transitive descendants.
//! - Edge iteration follows the catalog's lexical order.

use crate::catalog::{self, TableDef};
use crate::model::RecordId;
use crate::repo::{ImpactCounts, RepoError, RepoResult, TableRow};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Default bound for diagnostic child-row samples.
pub const CHILD_EXAMPLE_LIMIT: u32 = 10;

/// Outcome of a guarded single-row delete.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// No row with the given key existed; nothing was touched.
    NoOp,
    /// The row was deleted. `counts` is the full impact map: the parent table
    /// at 1, every child table at 0.
    Applied { row: TableRow, counts: ImpactCounts },
}

/// Guard over the shared connection. Blocked operations surface as
/// `RepoError::ChildRowsExist` and mutate nothing.
pub struct IntegrityGuard<'conn> {
    conn: &'conn Connection,
}

impl<'conn> IntegrityGuard<'conn> {
    /// Wraps a connection after verifying it carries the journal schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        catalog::verify_connection(conn)?;
        Ok(Self { conn })
    }

    /// Computes the impact map for deleting one row: the table itself (0 or
    /// 1) plus one count per FK edge the catalog reports.
    ///
    /// Runs inside a single read transaction so the map is one consistent
    /// snapshot; two calls with no intervening writes return identical maps.
    pub fn preview_impact(&self, table: &str, key: RecordId) -> RepoResult<ImpactCounts> {
        let table = catalog::table(table)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let counts = impact_counts(&tx, table, key)?;
        drop(tx); // read-only; rollback on drop
        Ok(counts)
    }

    /// Deletes one row by primary key unless child rows reference it.
    ///
    /// - Missing row: `DeleteOutcome::NoOp`, no error.
    /// - Any child count > 0: `RepoError::ChildRowsExist` carrying exactly
    ///   the nonzero child tables; zero mutations anywhere.
    /// - Otherwise the row is deleted and returned with the impact map.
    pub fn delete_by_key(&self, table: &str, key: RecordId) -> RepoResult<DeleteOutcome> {
        let table = catalog::table(table)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let counts = impact_counts(&tx, table, key)?;
        if counts.get(table.name).copied().unwrap_or(0) == 0 {
            info!(
                "event=delete_by_key module=guard status=noop table={} key={key}",
                table.name
            );
            return Ok(DeleteOutcome::NoOp);
        }

        let blocking: ImpactCounts = counts
            .iter()
            .filter(|&(&name, &count)| name != table.name && count > 0)
            .map(|(&name, &count)| (name, count))
            .collect();
        if !blocking.is_empty() {
            warn!(
                "event=delete_by_key module=guard status=blocked table={} key={key} children={}",
                table.name,
                blocking.len()
            );
            return Err(RepoError::ChildRowsExist(blocking));
        }

        let row = {
            let mut stmt = tx.prepare(&format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = ?1 RETURNING *;",
                table.name, table.primary_key
            ))?;
            let mut rows = stmt.query([key])?;
            match rows.next()? {
                Some(row) => TableRow::from_row(row)?,
                // Unreachable inside the transaction: the count above saw it.
                None => {
                    return Err(RepoError::InvalidData(format!(
                        "row {key} vanished from `{}` mid-transaction",
                        table.name
                    )));
                }
            }
        };
        tx.commit()?;

        info!(
            "event=delete_by_key module=guard status=ok table={} key={key}",
            table.name
        );
        Ok(DeleteOutcome::Applied { row, counts })
    }

    /// Deletes every row of a table unless any child table still references
    /// one of them. Child matching is one set-based join per FK edge, not a
    /// per-row loop. Returns the number of deleted rows.
    pub fn delete_all(&self, table: &str) -> RepoResult<u64> {
        let table = catalog::table(table)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mut blocking = ImpactCounts::new();
        for edge in catalog::referencing_fks(table.name)? {
            let count: i64 = tx.query_row(
                &format!(
                    "SELECT COUNT(*) FROM \"{child}\"
                     WHERE \"{col}\" IS NOT NULL
                       AND \"{col}\" IN (SELECT \"{pk}\" FROM \"{parent}\");",
                    child = edge.child_table,
                    col = edge.child_column,
                    pk = table.primary_key,
                    parent = table.name
                ),
                [],
                |row| row.get(0),
            )?;
            if count > 0 {
                blocking.insert(edge.child_table, count as u64);
            }
        }
        if !blocking.is_empty() {
            warn!(
                "event=delete_all module=guard status=blocked table={} children={}",
                table.name,
                blocking.len()
            );
            return Err(RepoError::ChildRowsExist(blocking));
        }

        let deleted = tx.execute(&format!("DELETE FROM \"{}\";", table.name), [])?;
        tx.commit()?;

        info!(
            "event=delete_all module=guard status=ok table={} deleted={deleted}",
            table.name
        );
        Ok(deleted as u64)
    }

    /// Returns up to `limit` child rows whose FK column references any
    /// existing parent row. Diagnostic helper for blocked deletes.
    pub fn child_examples(
        &self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        limit: u32,
    ) -> RepoResult<Vec<TableRow>> {
        let child = catalog::table(child_table)?;
        catalog::column(child.name, child_column)?;
        let parent = catalog::table(parent_table)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT c.* FROM \"{child}\" c
             JOIN \"{parent}\" p ON c.\"{col}\" = p.\"{pk}\"
             LIMIT ?1;",
            child = child.name,
            parent = parent.name,
            col = child_column,
            pk = parent.primary_key
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(TableRow::from_row(row)?);
        }
        Ok(result)
    }
}

/// Impact map inside an open transaction: parent existence plus one count per
/// FK edge, in catalog order.
fn impact_counts(
    tx: &Transaction<'_>,
    table: &'static TableDef,
    key: RecordId,
) -> RepoResult<ImpactCounts> {
    let mut counts = ImpactCounts::new();

    let parent: i64 = tx.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE \"{}\" = ?1);",
            table.name, table.primary_key
        ),
        [key],
        |row| row.get(0),
    )?;
    counts.insert(table.name, parent as u64);

    for edge in catalog::referencing_fks(table.name)? {
        let count: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM \"{}\" WHERE \"{}\" = ?1;",
                edge.child_table, edge.child_column
            ),
            [key],
            |row| row.get(0),
        )?;
        counts.insert(edge.child_table, count as u64);
    }

    Ok(counts)
}
