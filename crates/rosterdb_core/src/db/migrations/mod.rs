//! Ordered schema steps for the roster tables.
//!
//! A run either commits every pending step or none of them. Each committed
//! step is recorded in `PRAGMA user_version`, so a fully migrated file is left
//! untouched on reopen.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        sql: include_str!("0001_member_team.sql"),
    },
    SchemaStep {
        version: 2,
        sql: include_str!("0002_audit_columns.sql"),
    },
];

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` for files written by a newer build.
/// - `Migration` naming the first failing step; earlier steps are rolled back too.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = current_user_version(conn)?;
    let target = latest_version();

    match from.cmp(&target) {
        std::cmp::Ordering::Greater => {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: from,
                latest_supported: target,
            })
        }
        std::cmp::Ordering::Equal => return Ok(()),
        std::cmp::Ordering::Less => {}
    }

    let tx = conn.transaction()?;
    let pending = SCHEMA_STEPS.iter().filter(|step| step.version > from);
    for step in pending {
        if let Err(source) = run_step(&tx, step) {
            error!(
                "event=db_migrate module=db status=error version={} error={}",
                step.version, source
            );
            return Err(DbError::Migration {
                version: step.version,
                source,
            });
        }
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from} to_version={target}");
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> rusqlite::Result<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)
}

/// Schema version recorded in the database file (0 for a fresh one).
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
