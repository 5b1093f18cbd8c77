//! Predicate-driven bulk updates.
//!
//! # Invariants
//! - One `UPDATE` statement per call, inside a savepoint: all matching rows
//!   change or none do.
//! - Only writable columns can be assigned, and only with values their
//!   records can read back; increments are range-checked against the
//!   matching rows before the `UPDATE` runs.
//! - Cached copies are never touched here; callers reconcile them through
//!   `CacheSync` using the returned `affected_ids`.

use super::error::{RepoError, RepoResult};
use super::store::{execute, query_count, query_rows, with_savepoint, NOW_MS_SQL};
use crate::model::ModelValidationError;
use crate::query::{
    ColumnKind, Field, FieldValue, Predicate, QueryPlan, Statement, TableSource,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::time::Instant;

/// One assignment in the `SET` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateExpr<F> {
    Set(F, FieldValue),
    Increment(F, i64),
}

impl<F: Field> UpdateExpr<F> {
    pub fn set(field: F, value: impl Into<FieldValue>) -> Self {
        Self::Set(field, value.into())
    }

    pub fn increment(field: F, delta: i64) -> Self {
        Self::Increment(field, delta)
    }

    pub fn field(&self) -> F {
        match self {
            Self::Set(field, _) | Self::Increment(field, _) => *field,
        }
    }
}

/// What to do with the persistence context after a bulk update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSync {
    /// Leave cached copies as they are. They may now be stale.
    Keep,
    /// Drop cached copies of the updated rows.
    EvictAffected,
    /// Drop every cached copy.
    ClearAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdateResult {
    pub affected: usize,
    /// Ids of the updated rows in ascending order.
    pub affected_ids: Vec<i64>,
}

pub(crate) fn execute_bulk_update<F: Field>(
    conn: &Connection,
    source: &TableSource,
    predicate: &Predicate<F>,
    updates: &[UpdateExpr<F>],
    touch_column: Option<&str>,
) -> RepoResult<BulkUpdateResult> {
    let started_at = Instant::now();
    if updates.is_empty() {
        return Err(RepoError::InvalidQuery(
            "bulk update needs at least one assignment".to_string(),
        ));
    }

    let mut assignments = Vec::with_capacity(updates.len() + 1);
    let mut params = Vec::with_capacity(updates.len());
    let mut increments = Vec::new();
    for update in updates {
        let (column, kind) = writable(update.field())?;
        check_update(update, kind)?;
        if let (UpdateExpr::Increment(field, delta), ColumnKind::BoundedInteger { min, max }) =
            (update, kind)
        {
            increments.push((field.property(), column, *delta, min, max));
        }
        match update {
            UpdateExpr::Set(_, value) => {
                assignments.push(format!("{column} = ?"));
                params.push(value.to_sql());
            }
            UpdateExpr::Increment(_, delta) => {
                assignments.push(format!("{column} = {column} + ?"));
                params.push(Value::Integer(*delta));
            }
        }
    }
    if let Some(column) = touch_column {
        assignments.push(format!("{column} = {NOW_MS_SQL}"));
    }

    let matching = QueryPlan::new(source, predicate).matching_ids();
    params.extend(matching.params.iter().cloned());
    let update = Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} IN ({})",
            source.table,
            assignments.join(", "),
            source.id_column,
            matching.sql
        ),
        params,
    };

    let result = with_savepoint(conn, "bulk_update", || {
        for &(property, column, delta, min, max) in &increments {
            let mut params = matching.params.clone();
            params.extend([Value::Integer(delta), Value::Integer(min), Value::Integer(max)]);
            let overflow = Statement {
                sql: format!(
                    "SELECT COUNT(*) FROM {} WHERE {} IN ({}) AND ({column} + ?) NOT BETWEEN ? AND ?",
                    source.table, source.id_column, matching.sql
                ),
                params,
            };
            if query_count(conn, &overflow)? > 0 {
                return Err(RepoError::Validation(
                    ModelValidationError::InvalidFieldValue {
                        field: property,
                        reason: "increment leaves the allowed range",
                    },
                ));
            }
        }
        let affected_ids = query_rows(conn, &matching, |row| Ok(row.get::<_, i64>(0)?))?;
        let affected = execute(conn, &update)?;
        Ok(BulkUpdateResult {
            affected,
            affected_ids,
        })
    })?;

    debug!(
        "event=bulk_update module=repo status=ok table={} assignments={} affected={} duration_ms={}",
        source.table,
        updates.len(),
        result.affected,
        started_at.elapsed().as_millis()
    );

    Ok(result)
}

fn writable<F: Field>(field: F) -> RepoResult<(&'static str, ColumnKind)> {
    match (field.column(), field.kind()) {
        (Some(column), Some(kind)) => Ok((column, kind)),
        _ => Err(RepoError::InvalidQuery(format!(
            "field `{}` is not writable",
            field.property()
        ))),
    }
}

/// Rejects assignments whose result could not be read back as a record.
fn check_update<F: Field>(update: &UpdateExpr<F>, kind: ColumnKind) -> RepoResult<()> {
    let property = update.field().property();
    match (update, kind) {
        (UpdateExpr::Set(_, value), kind) => Ok(kind.check(property, value)?),
        (UpdateExpr::Increment(_, delta), ColumnKind::BoundedInteger { min, max })
            if delta.checked_abs().is_some_and(|step| step <= max - min) =>
        {
            Ok(())
        }
        (UpdateExpr::Increment(..), ColumnKind::BoundedInteger { .. }) => {
            Err(RepoError::Validation(ModelValidationError::InvalidFieldValue {
                field: property,
                reason: "increment exceeds the allowed range",
            }))
        }
        (UpdateExpr::Increment(..), _) => Err(RepoError::InvalidQuery(format!(
            "field `{property}` cannot be incremented"
        ))),
    }
}
