//! Repository error taxonomy.

use crate::db::DbError;
use crate::model::ModelValidationError;
use crate::query::DeriveError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Target record does not exist; `id` is `None` for never-saved records.
    NotFound {
        entity: &'static str,
        id: Option<i64>,
    },
    InvalidPage {
        page: i64,
        size: i64,
    },
    /// Uniqueness, check or foreign-key constraint rejected by storage.
    ConstraintViolation(String),
    InvalidQuery(String),
    IncorrectResultSize {
        expected: u64,
        actual: u64,
    },
    /// Locking reads must run inside an open transaction.
    TransactionRequired,
    /// Another connection holds the write lock past the busy timeout.
    LockConflict(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id: Some(id) } => write!(f, "{entity} not found: {id}"),
            Self::NotFound { entity, id: None } => write!(f, "{entity} not found: record was never saved"),
            Self::InvalidPage { page, size } => write!(
                f,
                "invalid page request: page={page} size={size}; page must be >= 0 and size >= 1"
            ),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::IncorrectResultSize { expected, actual } => write!(
                f,
                "incorrect result size: expected at most {expected}, got {actual}"
            ),
            Self::TransactionRequired => {
                write!(f, "pessimistic locking requires an open transaction")
            }
            Self::LockConflict(message) => write!(f, "lock conflict: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        let code = match &value {
            rusqlite::Error::SqliteFailure(err, _) => Some(err.code),
            _ => None,
        };
        match code {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(value.to_string()),
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::LockConflict(value.to_string())
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<DeriveError> for RepoError {
    fn from(value: DeriveError) -> Self {
        Self::InvalidQuery(value.to_string())
    }
}
