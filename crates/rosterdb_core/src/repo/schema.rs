//! Connection readiness checks shared by SQLite repositories.

use super::error::{RepoError, RepoResult};
use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RequiredTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub(crate) const TEAM_TABLE: RequiredTable = RequiredTable {
    name: "team",
    columns: &["team_id", "name"],
};

pub(crate) const MEMBER_TABLE: RequiredTable = RequiredTable {
    name: "member",
    columns: &[
        "member_id",
        "username",
        "age",
        "team_id",
        "created_at",
        "updated_at",
    ],
};

/// Rejects connections that were not opened through `db::open_*`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[RequiredTable],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        let present = table_columns(conn, table.name)?;
        if let Some(column) = table
            .columns
            .iter()
            .copied()
            .find(|column| !present.iter().any(|name| name.as_str() == *column))
        {
            return Err(RepoError::MissingRequiredColumn {
                table: table.name,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}
