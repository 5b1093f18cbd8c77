//! Generic data-access layer for a member/team roster on SQLite.
//!
//! Entity store, query dispatch, paging and bulk mutation live in `repo`
//! and `query`; `db` owns connection bootstrap and schema migrations.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DatabaseTarget, RosterConfig};
pub use db::{open_db, open_db_in_memory, open_db_with, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::member::{Member, MemberId, MemberWithTeam};
pub use model::projection::{
    MemberDto, MemberProjection, NestedProjection, TeamInfo, UsernameOnly, UsernameOnlyDto,
};
pub use model::team::{Team, TeamId};
pub use model::ModelValidationError;
pub use query::{
    Direction, FieldValue, MemberField, Operator, Predicate, QueryArg, Sort, TeamField,
};
pub use repo::{
    BulkUpdateResult, CacheSync, CrudRepository, LockMode, MemberRepository, Page, PageRequest,
    Projection, QueryOutcome, QueryRepository, RepoError, RepoResult, Slice,
    SqliteMemberRepository, SqliteTeamRepository, TeamRepository, UpdateExpr,
};
pub use service::roster_service::RosterService;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
