//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured roster database and print one member page as JSON.
//! - Seed demo members into an empty database so the output is never blank.
//!
//! Configuration comes from `ROSTERDB_*` environment variables. An optional
//! first argument selects the page index; `--version` prints the core
//! linkage line and exits.

use log::{error, info};
use rosterdb_core::{
    core_version, init_logging, open_db_with, ping, CrudRepository, RosterConfig, RosterService,
    SqliteMemberRepository, SqliteTeamRepository,
};
use std::process::ExitCode;

const DEMO_MEMBER_COUNT: usize = 100;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={}", message);
            eprintln!("rosterdb: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--version") {
        println!("rosterdb_core ping={} version={}", ping(), core_version());
        return Ok(());
    }

    let config = RosterConfig::from_env().map_err(|err| err.to_string())?;
    if config.log_dir.is_some() {
        init_logging(&config)?;
    }

    info!(
        "event=cli_start module=cli status=ok core_ping={} core_version={}",
        ping(),
        core_version()
    );

    let page = match arg {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| format!("page index must be an integer, got `{raw}`"))?,
        None => 0,
    };

    let conn = open_db_with(&config).map_err(|err| err.to_string())?;
    let members = SqliteMemberRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let teams = SqliteTeamRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = RosterService::new(members, teams).with_page_size(config.default_page_size);

    if service.members().count().map_err(|err| err.to_string())? == 0 {
        service
            .seed_members(DEMO_MEMBER_COUNT)
            .map_err(|err| err.to_string())?;
    }

    let listing = service.list_members(page).map_err(|err| err.to_string())?;
    let json = serde_json::to_string_pretty(&listing).map_err(|err| err.to_string())?;
    println!("{json}");

    info!(
        "event=cli_run module=cli status=ok page={} returned={} total={}",
        listing.number,
        listing.content.len(),
        listing.total_elements
    );
    Ok(())
}
