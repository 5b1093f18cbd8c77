//! Connection setup for roster databases.
//!
//! Every connection handed out here has `foreign_keys=ON`, a busy timeout, and
//! the schema at [`latest_version`](super::migrations::latest_version).

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::{DatabaseTarget, RosterConfig, DEFAULT_BUSY_TIMEOUT_MS};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const MEMORY_TARGET: &str = ":memory:";

/// Opens (or creates) the roster database file at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let config = RosterConfig {
        database: DatabaseTarget::File(path.as_ref().to_path_buf()),
        busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        ..RosterConfig::default()
    };
    open_db_with(&config)
}

/// Opens a private in-memory roster database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_db_with(&RosterConfig::default())
}

/// Opens the database described by `config`.
///
/// Logs `db_open` start/ok/error events with the elapsed time.
pub fn open_db_with(config: &RosterConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    let target = match &config.database {
        DatabaseTarget::Memory => MEMORY_TARGET.to_string(),
        DatabaseTarget::File(path) => path.display().to_string(),
    };
    info!("event=db_open module=db status=start target={target}");

    let result = connect(&config.database)
        .map_err(|source| DbError::Open {
            target: target.clone(),
            source,
        })
        .and_then(|mut conn| {
            prepare(&mut conn, config.busy_timeout())?;
            Ok(conn)
        });

    let elapsed_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok target={target} duration_ms={elapsed_ms} busy_timeout_ms={}",
            config.busy_timeout_ms
        ),
        Err(err) => error!(
            "event=db_open module=db status=error target={target} duration_ms={elapsed_ms} error={err}"
        ),
    }
    result
}

fn connect(database: &DatabaseTarget) -> rusqlite::Result<Connection> {
    match database {
        DatabaseTarget::Memory => Connection::open_in_memory(),
        DatabaseTarget::File(path) => Connection::open(path),
    }
}

fn prepare(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)
}
