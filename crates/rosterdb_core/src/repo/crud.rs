//! Generic repository contracts.

use super::error::RepoResult;
use super::page::{Page, PageRequest, Slice};
use crate::query::{Field, Predicate, Sort};

/// Entity store contract shared by all repositories.
pub trait CrudRepository {
    type Entity;
    type Id: Copy;

    /// Inserts when the record has no id, otherwise updates the existing row.
    ///
    /// # Errors
    /// - `Validation` before any SQL runs.
    /// - `NotFound` when updating an id that has no row.
    fn save(&self, entity: &Self::Entity) -> RepoResult<Self::Entity>;
    fn find_by_id(&self, id: Self::Id) -> RepoResult<Option<Self::Entity>>;
    /// All rows in id order.
    fn find_all(&self) -> RepoResult<Vec<Self::Entity>>;
    fn delete(&self, entity: &Self::Entity) -> RepoResult<()>;
    fn delete_by_id(&self, id: Self::Id) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;
    fn exists_by_id(&self, id: Self::Id) -> RepoResult<bool>;
}

/// Predicate, sort and paging queries.
pub trait QueryRepository: CrudRepository {
    type Field: Field;

    fn find(
        &self,
        predicate: &Predicate<Self::Field>,
        sort: &Sort<Self::Field>,
    ) -> RepoResult<Vec<Self::Entity>>;

    /// At most one matching record.
    ///
    /// # Errors
    /// - `IncorrectResultSize` when more than one row matches.
    fn find_one(&self, predicate: &Predicate<Self::Field>) -> RepoResult<Option<Self::Entity>>;

    fn count_where(&self, predicate: &Predicate<Self::Field>) -> RepoResult<u64>;

    fn find_page(
        &self,
        predicate: &Predicate<Self::Field>,
        request: &PageRequest<Self::Field>,
    ) -> RepoResult<Page<Self::Entity>>;

    fn find_slice(
        &self,
        predicate: &Predicate<Self::Field>,
        request: &PageRequest<Self::Field>,
    ) -> RepoResult<Slice<Self::Entity>>;
}

/// Result of a named or derived query, shaped by its subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome<T> {
    Rows(Vec<T>),
    Count(u64),
    Exists(bool),
}

impl<T> QueryOutcome<T> {
    pub fn into_rows(self) -> Option<Vec<T>> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn exists(&self) -> Option<bool> {
        match self {
            Self::Exists(exists) => Some(*exists),
            _ => None,
        }
    }
}
