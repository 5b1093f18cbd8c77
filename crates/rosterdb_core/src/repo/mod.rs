//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define generic entity store and query contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Page results, apply bulk updates and take pessimistic locks.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidPage`,
//!   `ConstraintViolation`, `LockConflict`) in addition to DB transport
//!   errors.
//! - Repositories only accept fully migrated connections.

pub mod bulk;
pub mod context;
pub mod crud;
pub mod error;
pub mod lock;
pub mod member_repo;
pub mod page;
pub mod projection;
mod schema;
mod store;
pub mod team_repo;

pub use bulk::{BulkUpdateResult, CacheSync, UpdateExpr};
pub use context::PersistenceContext;
pub use crud::{CrudRepository, QueryOutcome, QueryRepository};
pub use error::{RepoError, RepoResult};
pub use lock::LockMode;
pub use member_repo::{MemberRepository, SqliteMemberRepository};
pub use page::{Page, PageRequest, Slice};
pub use projection::Projection;
pub use team_repo::{SqliteTeamRepository, TeamRepository};
