//! Execution plans: a predicate, ordering and window compiled to SQL.
//!
//! # Invariants
//! - Select statements always end with a deterministic `ORDER BY` whose last
//!   key is the entity id.
//! - Count statements never carry `ORDER BY` and only join when a condition
//!   reads through the relationship.

use super::field::Field;
use super::predicate::Predicate;
use super::sort::Sort;
use rusqlite::types::Value;

/// Entity table plus the optional join needed by relationship fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSource {
    pub table: &'static str,
    pub alias: &'static str,
    pub id_column: &'static str,
    pub join: Option<&'static str>,
}

impl TableSource {
    pub fn id_expr(&self) -> String {
        format!("{}.{}", self.alias, self.id_column)
    }

    fn from_clause(&self, joined: bool) -> String {
        match (joined, self.join) {
            (true, Some(join)) => format!("{} {} {}", self.table, self.alias, join),
            _ => format!("{} {}", self.table, self.alias),
        }
    }
}

pub const MEMBER_SOURCE: TableSource = TableSource {
    table: "member",
    alias: "m",
    id_column: "member_id",
    join: Some("LEFT JOIN team t ON t.team_id = m.team_id"),
};

pub const TEAM_SOURCE: TableSource = TableSource {
    table: "team",
    alias: "t",
    id_column: "team_id",
    join: None,
};

/// SQL text with positional parameters in bind order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct QueryPlan<'a, F> {
    source: &'a TableSource,
    predicate: &'a Predicate<F>,
    sort: Option<&'a Sort<F>>,
    window: Option<Window>,
    force_join: bool,
}

impl<'a, F: Field> QueryPlan<'a, F> {
    pub fn new(source: &'a TableSource, predicate: &'a Predicate<F>) -> Self {
        Self {
            source,
            predicate,
            sort: None,
            window: None,
            force_join: false,
        }
    }

    pub fn sorted(mut self, sort: &'a Sort<F>) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn window(mut self, limit: u64, offset: u64) -> Self {
        self.window = Some(Window { limit, offset });
        self
    }

    /// Always join, for column lists that read relationship columns.
    pub fn joined(mut self) -> Self {
        self.force_join = true;
        self
    }

    pub fn predicate(&self) -> &'a Predicate<F> {
        self.predicate
    }

    pub fn select(&self, columns: &str) -> Statement {
        let joined = self.force_join
            || self.predicate.requires_join()
            || self.sort.is_some_and(Sort::requires_join);
        let clause = self.predicate.to_where();
        let id_expr = self.source.id_expr();

        let mut sql = format!(
            "SELECT {columns} FROM {}{}",
            self.source.from_clause(joined),
            clause.sql
        );
        match self.sort {
            Some(sort) => sql.push_str(&sort.to_order_by(&id_expr)),
            None => sql.push_str(&Sort::<F>::unsorted().to_order_by(&id_expr)),
        }

        let mut params = clause.params;
        if let Some(window) = self.window {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(to_sql_int(window.limit)));
            params.push(Value::Integer(to_sql_int(window.offset)));
        }

        Statement { sql, params }
    }

    pub fn count(&self) -> Statement {
        let clause = self.predicate.to_where();
        Statement {
            sql: format!(
                "SELECT COUNT(*) FROM {}{}",
                self.source.from_clause(self.predicate.requires_join()),
                clause.sql
            ),
            params: clause.params,
        }
    }

    /// Ids of matching rows in ascending order, usable as a sub-select.
    pub fn matching_ids(&self) -> Statement {
        let clause = self.predicate.to_where();
        let id_expr = self.source.id_expr();
        Statement {
            sql: format!(
                "SELECT {id_expr} FROM {}{} ORDER BY {id_expr} ASC",
                self.source.from_clause(self.predicate.requires_join()),
                clause.sql
            ),
            params: clause.params,
        }
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{QueryPlan, MEMBER_SOURCE, TEAM_SOURCE};
    use crate::query::field::{MemberField, TeamField};
    use crate::query::predicate::Predicate;
    use crate::query::sort::Sort;
    use rusqlite::types::Value;

    #[test]
    fn select_without_relationship_fields_skips_join() {
        let predicate = Predicate::all().eq(MemberField::Age, 10);
        let sort = Sort::desc(MemberField::Username);
        let statement = QueryPlan::new(&MEMBER_SOURCE, &predicate)
            .sorted(&sort)
            .window(3, 6)
            .select("m.member_id");

        assert_eq!(
            statement.sql,
            "SELECT m.member_id FROM member m WHERE m.age = ? \
             ORDER BY m.username DESC, m.member_id ASC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            statement.params,
            vec![Value::Integer(10), Value::Integer(3), Value::Integer(6)]
        );
    }

    #[test]
    fn count_ignores_sort_and_joins_only_for_predicate() {
        let predicate = Predicate::all().eq(MemberField::Age, 10);
        let sort = Sort::asc(MemberField::TeamName);
        let plan = QueryPlan::new(&MEMBER_SOURCE, &predicate).sorted(&sort);

        assert!(plan.select("m.member_id").sql.contains("LEFT JOIN team t"));
        assert_eq!(
            plan.count().sql,
            "SELECT COUNT(*) FROM member m WHERE m.age = ?"
        );

        let by_team = Predicate::all().eq(MemberField::TeamName, "teamA");
        let count = QueryPlan::new(&MEMBER_SOURCE, &by_team).count();
        assert!(count.sql.contains("LEFT JOIN team t ON t.team_id = m.team_id"));
    }

    #[test]
    fn matching_ids_selects_id_expression() {
        let predicate = Predicate::all().eq(TeamField::Name, "teamA");
        let statement = QueryPlan::new(&TEAM_SOURCE, &predicate).matching_ids();
        assert_eq!(
            statement.sql,
            "SELECT t.team_id FROM team t WHERE t.name = ? ORDER BY t.team_id ASC"
        );
    }
}
