//! Page and slice results.
//!
//! # Invariants
//! - `PageRequest` always has `page >= 0` and `size >= 1`.
//! - `total_pages = ceil(total_elements / size)`.
//! - `has_next = (number + 1) * size < total_elements`.
//! - The count statement is skipped when the fetched content already
//!   determines the total.

use super::error::{RepoError, RepoResult};
use super::store::{query_count, query_rows, RowShape};
use crate::query::{Field, Predicate, QueryPlan, Sort, TableSource};
use log::debug;
use rusqlite::Connection;
use serde::Serialize;
use std::time::Instant;

/// Zero-based page index, page size and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<F> {
    page: u64,
    size: u64,
    sort: Sort<F>,
}

impl<F: Field> PageRequest<F> {
    /// # Errors
    /// - `InvalidPage` when `page < 0` or `size < 1`.
    pub fn of(page: i64, size: i64) -> RepoResult<Self> {
        Self::sorted(page, size, Sort::unsorted())
    }

    pub fn sorted(page: i64, size: i64, sort: Sort<F>) -> RepoResult<Self> {
        let invalid = || RepoError::InvalidPage { page, size };
        let page_index = u64::try_from(page).map_err(|_| invalid())?;
        let page_size = u64::try_from(size).map_err(|_| invalid())?;
        if page_size == 0 {
            return Err(invalid());
        }
        Ok(Self {
            page: page_index,
            size: page_size,
            sort,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort(&self) -> &Sort<F> {
        &self.sort
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    pub fn first(&self) -> Self {
        Self {
            page: 0,
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// One page of results plus total-count metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub is_first: bool,
    pub is_last: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, number: u64, size: u64, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size)
        };
        let has_next = number.saturating_add(1).saturating_mul(size) < total_elements;
        Self {
            content,
            number,
            size,
            total_elements,
            total_pages,
            is_first: number == 0,
            is_last: !has_next,
            has_next,
        }
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    /// Converts the content, keeping all paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            is_first: self.is_first,
            is_last: self.is_last,
            has_next: self.has_next,
        }
    }
}

/// A page without total count; `has_next` comes from an extra probed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub is_first: bool,
    pub has_next: bool,
}

impl<T> Slice<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            is_first: self.is_first,
            has_next: self.has_next,
        }
    }
}

pub(crate) fn fetch_page<F: Field, T>(
    conn: &Connection,
    source: &TableSource,
    predicate: &Predicate<F>,
    request: &PageRequest<F>,
    shape: &RowShape<T>,
) -> RepoResult<Page<T>> {
    let started_at = Instant::now();
    let mut plan = QueryPlan::new(source, predicate)
        .sorted(request.sort())
        .window(request.size(), request.offset());
    if shape.joined {
        plan = plan.joined();
    }

    let content = query_rows(conn, &plan.select(shape.columns), shape.decode)?;
    let (total, counted) = match known_total(request, content.len()) {
        Some(total) => (total, false),
        None => (query_count(conn, &plan.count())?, true),
    };

    debug!(
        "event=page_fetch module=repo status=ok table={} page={} size={} returned={} total={} count_query={} duration_ms={}",
        source.table,
        request.page(),
        request.size(),
        content.len(),
        total,
        counted,
        started_at.elapsed().as_millis()
    );

    Ok(Page::new(content, request.page(), request.size(), total))
}

pub(crate) fn fetch_slice<F: Field, T>(
    conn: &Connection,
    source: &TableSource,
    predicate: &Predicate<F>,
    request: &PageRequest<F>,
    shape: &RowShape<T>,
) -> RepoResult<Slice<T>> {
    let mut plan = QueryPlan::new(source, predicate)
        .sorted(request.sort())
        .window(request.size().saturating_add(1), request.offset());
    if shape.joined {
        plan = plan.joined();
    }

    let mut content = query_rows(conn, &plan.select(shape.columns), shape.decode)?;
    let limit = usize::try_from(request.size()).unwrap_or(usize::MAX);
    let has_next = content.len() > limit;
    content.truncate(limit);

    debug!(
        "event=slice_fetch module=repo status=ok table={} page={} size={} returned={} has_next={}",
        source.table,
        request.page(),
        request.size(),
        content.len(),
        has_next
    );

    Ok(Slice {
        content,
        number: request.page(),
        size: request.size(),
        is_first: request.page() == 0,
        has_next,
    })
}

/// Total implied by the fetched page alone, when it can be known.
fn known_total<F: Field>(request: &PageRequest<F>, returned: usize) -> Option<u64> {
    let returned = u64::try_from(returned).ok()?;
    if request.offset() == 0 {
        return (returned < request.size()).then_some(returned);
    }
    if returned != 0 && returned < request.size() {
        return Some(request.offset() + returned);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{known_total, Page, PageRequest};
    use crate::query::{MemberField, Sort};
    use crate::repo::error::RepoError;

    #[test]
    fn page_request_rejects_negative_page_and_empty_size() {
        assert!(matches!(
            PageRequest::<MemberField>::of(-1, 3),
            Err(RepoError::InvalidPage { page: -1, size: 3 })
        ));
        assert!(matches!(
            PageRequest::<MemberField>::of(0, 0),
            Err(RepoError::InvalidPage { page: 0, size: 0 })
        ));
        assert!(PageRequest::<MemberField>::of(0, -5).is_err());

        let request = PageRequest::sorted(2, 3, Sort::desc(MemberField::Username)).unwrap();
        assert_eq!(request.offset(), 6);
        assert_eq!(request.next().page(), 3);
        assert_eq!(request.first().page(), 0);
    }

    #[test]
    fn page_metadata_follows_totals() {
        let first: Page<i32> = Page::new(vec![1, 2, 3], 0, 3, 6);
        assert_eq!(first.total_pages, 2);
        assert!(first.is_first);
        assert!(first.has_next);
        assert!(!first.is_last);

        let last: Page<i32> = Page::new(vec![4, 5, 6], 1, 3, 6);
        assert!(!last.has_next);
        assert!(last.is_last);
        assert!(last.has_previous());

        let partial: Page<i32> = Page::new(vec![1], 0, 3, 7);
        assert_eq!(partial.total_pages, 3);

        let empty: Page<i32> = Page::new(Vec::new(), 0, 3, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 1, 2, 5).map(|value| value * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
    }

    #[test]
    fn total_is_known_only_from_short_pages() {
        let first = PageRequest::<MemberField>::of(0, 3).unwrap();
        assert_eq!(known_total(&first, 2), Some(2));
        assert_eq!(known_total(&first, 0), Some(0));
        assert_eq!(known_total(&first, 3), None);

        let third = PageRequest::<MemberField>::of(2, 3).unwrap();
        assert_eq!(known_total(&third, 1), Some(7));
        assert_eq!(known_total(&third, 0), None);
        assert_eq!(known_total(&third, 3), None);
    }
}
