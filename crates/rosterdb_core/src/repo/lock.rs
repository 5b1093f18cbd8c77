//! Pessimistic write locking for locking reads.
//!
//! SQLite locks the whole database, not rows. A locking read takes the
//! writer lock by rewriting one column of every selected row to itself; other
//! connections can still read but block on writes until the transaction ends.

use super::error::{RepoError, RepoResult};
use super::store::execute;
use crate::query::{Field, Predicate, QueryPlan, Statement, TableSource};
use log::{debug, warn};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockMode {
    #[default]
    None,
    PessimisticWrite,
}

/// # Errors
/// - `TransactionRequired` when the connection is in autocommit mode.
/// - `LockConflict` when another connection holds the writer lock past the
///   busy timeout.
pub(crate) fn acquire_write_lock<F: Field>(
    conn: &Connection,
    source: &TableSource,
    predicate: &Predicate<F>,
    touch_column: &str,
) -> RepoResult<usize> {
    if conn.is_autocommit() {
        return Err(RepoError::TransactionRequired);
    }

    let matching = QueryPlan::new(source, predicate).matching_ids();
    let statement = Statement {
        sql: format!(
            "UPDATE {table} SET {touch_column} = {touch_column} WHERE {id} IN ({ids})",
            table = source.table,
            id = source.id_column,
            ids = matching.sql
        ),
        params: matching.params,
    };

    match execute(conn, &statement) {
        Ok(locked) => {
            debug!(
                "event=lock_acquire module=repo status=ok table={} mode=pessimistic_write rows={}",
                source.table, locked
            );
            Ok(locked)
        }
        Err(err) => {
            warn!(
                "event=lock_acquire module=repo status=error table={} mode=pessimistic_write error={}",
                source.table, err
            );
            Err(err)
        }
    }
}
