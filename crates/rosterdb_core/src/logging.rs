//! Rolling file logs for the roster store.
//!
//! # Responsibility
//! - Start one `flexi_logger` file writer per process from [`RosterConfig`].
//! - Keep events metadata-only: ids, counts, durations. Usernames never appear.
//!
//! # Invariants
//! - Calling [`init_logging`] again with the same level and directory is a no-op.
//! - A second call asking for another level or directory fails instead of
//!   silently keeping the first writer.

use crate::config::RosterConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{info, LevelFilter};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_BASENAME: &str = "rosterdb";

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    level: LevelFilter,
    dir: PathBuf,
    _handle: LoggerHandle,
}

/// Starts file logging in `config.log_dir` at `config.log_level`.
///
/// # Errors
/// Returns a readable message when the directory is missing or relative, the
/// level is unknown, the writer cannot start, or a different logger is active.
pub fn init_logging(config: &RosterConfig) -> Result<(), String> {
    let level = parse_level(&config.log_level)?;
    let dir = config
        .log_dir
        .as_deref()
        .ok_or_else(|| "log_dir is not configured".to_string())
        .and_then(absolute_dir)?;

    let active = ACTIVE.get_or_try_init(|| start(config, level, &dir))?;
    if active.dir != dir || active.level != level {
        return Err(format!(
            "roster logging already writes {} to `{}`; cannot switch to {} in `{}`",
            active.level,
            active.dir.display(),
            level,
            dir.display()
        ));
    }
    Ok(())
}

/// Level and directory of the active logger, if any.
pub fn logging_status() -> Option<(LevelFilter, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

pub fn default_log_level() -> &'static str {
    match cfg!(debug_assertions) {
        true => "debug",
        false => "info",
    }
}

fn start(config: &RosterConfig, level: LevelFilter, dir: &Path) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;

    let files = FileSpec::default().directory(dir).basename(LOG_BASENAME);
    let spec = LogSpecification::builder().default(level).build();
    let handle = Logger::with(spec)
        .log_to_file(files)
        .rotate(
            Criterion::Size(config.log_max_file_bytes),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.log_max_files),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("cannot start roster logger: {err}"))?;

    info!(
        "event=logging_init module=core status=ok level={level} log_dir={} version={}",
        dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::Warn);
    }
    LevelFilter::from_str(raw).map_err(|_| {
        format!("unknown log level `{raw}`; use off, error, warn, info, debug or trace")
    })
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, String> {
    if dir.as_os_str().is_empty() || !dir.is_absolute() {
        return Err(format!(
            "log_dir must be a non-empty absolute path, got `{}`",
            dir.display()
        ));
    }
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{absolute_dir, init_logging, logging_status, parse_level};
    use crate::config::RosterConfig;
    use log::LevelFilter;
    use std::path::Path;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("INFO").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level(" warning ").unwrap(), LevelFilter::Warn);
        assert!(parse_level("verbose").unwrap_err().contains("verbose"));
    }

    #[test]
    fn relative_and_empty_dirs_are_rejected() {
        assert!(absolute_dir(Path::new("logs/dev"))
            .unwrap_err()
            .contains("absolute"));
        assert!(absolute_dir(Path::new("")).is_err());
    }

    #[test]
    fn missing_log_dir_is_reported() {
        let err = init_logging(&RosterConfig::default()).unwrap_err();
        assert!(err.contains("not configured"));
    }

    #[test]
    fn repeated_init_is_accepted_and_changes_are_refused() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let config = RosterConfig {
            log_level: "info".to_string(),
            log_dir: Some(first.path().join("logs")),
            ..RosterConfig::default()
        };

        init_logging(&config).unwrap();
        init_logging(&config).unwrap();

        let louder = RosterConfig {
            log_level: "debug".to_string(),
            ..config.clone()
        };
        assert!(init_logging(&louder).unwrap_err().contains("cannot switch"));

        let elsewhere = RosterConfig {
            log_dir: Some(second.path().join("logs")),
            ..config.clone()
        };
        assert!(init_logging(&elsewhere).unwrap_err().contains("cannot switch"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, LevelFilter::Info);
        assert_eq!(Some(dir), config.log_dir);
    }
}
