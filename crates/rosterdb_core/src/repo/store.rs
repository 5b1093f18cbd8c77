//! Statement execution helpers shared by the SQLite repositories.

use super::error::{RepoError, RepoResult};
use crate::query::Statement;
use log::warn;
use rusqlite::{params_from_iter, Connection, Row};

/// Epoch milliseconds in SQL, used for audit columns.
pub(crate) const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

/// Column list plus the row decoder that reads it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowShape<T> {
    pub columns: &'static str,
    /// Whether the column list reads through the entity's join.
    pub joined: bool,
    pub decode: fn(&Row<'_>) -> RepoResult<T>,
}

pub(crate) fn query_rows<T>(
    conn: &Connection,
    statement: &Statement,
    mut decode: impl FnMut(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(&statement.sql)?;
    let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
    let mut items = Vec::new();

    while let Some(row) = rows.next()? {
        items.push(decode(row)?);
    }

    Ok(items)
}

pub(crate) fn query_count(conn: &Connection, statement: &Statement) -> RepoResult<u64> {
    let count: i64 = conn.query_row(
        &statement.sql,
        params_from_iter(statement.params.iter()),
        |row| row.get(0),
    )?;
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
}

pub(crate) fn execute(conn: &Connection, statement: &Statement) -> RepoResult<usize> {
    Ok(conn.execute(&statement.sql, params_from_iter(statement.params.iter()))?)
}

/// Runs `body` inside a named savepoint; rolls back everything on error.
///
/// Opens (and commits) a transaction of its own when the connection is in
/// autocommit mode.
pub(crate) fn with_savepoint<T>(
    conn: &Connection,
    name: &str,
    body: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    conn.execute_batch(&format!("SAVEPOINT {name};"))?;
    match body() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE SAVEPOINT {name};"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.execute_batch(&format!(
                "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name};"
            )) {
                warn!(
                    "event=savepoint_rollback module=repo status=error savepoint={} error={}",
                    name, rollback_err
                );
            }
            Err(err)
        }
    }
}
