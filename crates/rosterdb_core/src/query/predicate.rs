//! Conjunctive predicates over typed fields.
//!
//! A predicate is a flat list of conditions joined by `AND`. Clause order
//! never changes the matched set, only the generated SQL text.

use super::field::Field;
use super::value::FieldValue;
use rusqlite::types::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Eq(FieldValue),
    Gt(FieldValue),
    Ge(FieldValue),
    Lt(FieldValue),
    Le(FieldValue),
    /// Matches nothing when the set is empty.
    In(Vec<FieldValue>),
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition<F> {
    pub field: F,
    pub op: Operator,
}

/// Rendered `WHERE` fragment plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// Empty when the predicate matches every row; otherwise ` WHERE ...`.
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate<F> {
    conditions: Vec<Condition<F>>,
}

impl<F: Field> Default for Predicate<F> {
    fn default() -> Self {
        Self::all()
    }
}

impl<F: Field> Predicate<F> {
    /// Predicate without conditions; matches every record.
    pub fn all() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    pub fn with(mut self, field: F, op: Operator) -> Self {
        self.conditions.push(Condition { field, op });
        self
    }

    pub fn eq(self, field: F, value: impl Into<FieldValue>) -> Self {
        self.with(field, Operator::Eq(value.into()))
    }

    pub fn gt(self, field: F, value: impl Into<FieldValue>) -> Self {
        self.with(field, Operator::Gt(value.into()))
    }

    pub fn ge(self, field: F, value: impl Into<FieldValue>) -> Self {
        self.with(field, Operator::Ge(value.into()))
    }

    pub fn lt(self, field: F, value: impl Into<FieldValue>) -> Self {
        self.with(field, Operator::Lt(value.into()))
    }

    pub fn le(self, field: F, value: impl Into<FieldValue>) -> Self {
        self.with(field, Operator::Le(value.into()))
    }

    pub fn is_in<T: Into<FieldValue>>(self, field: F, values: impl IntoIterator<Item = T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.with(field, Operator::In(values))
    }

    pub fn is_null(self, field: F) -> Self {
        self.with(field, Operator::IsNull)
    }

    pub fn is_not_null(self, field: F) -> Self {
        self.with(field, Operator::IsNotNull)
    }

    /// Conjunction of `self` and `other`.
    pub fn and(mut self, other: Predicate<F>) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn conditions(&self) -> &[Condition<F>] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn requires_join(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.field.requires_join())
    }

    pub(crate) fn to_where(&self) -> WhereClause {
        if self.conditions.is_empty() {
            return WhereClause {
                sql: String::new(),
                params: Vec::new(),
            };
        }

        let mut params = Vec::new();
        let rendered: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| render_condition(condition, &mut params))
            .collect();

        WhereClause {
            sql: format!(" WHERE {}", rendered.join(" AND ")),
            params,
        }
    }
}

fn render_condition<F: Field>(condition: &Condition<F>, params: &mut Vec<Value>) -> String {
    let expr = condition.field.expr();

    match &condition.op {
        Operator::Eq(value) if value.is_null() => format!("{expr} IS NULL"),
        Operator::Eq(value) => bind(expr, "=", value, params),
        Operator::Gt(value) => bind(expr, ">", value, params),
        Operator::Ge(value) => bind(expr, ">=", value, params),
        Operator::Lt(value) => bind(expr, "<", value, params),
        Operator::Le(value) => bind(expr, "<=", value, params),
        Operator::In(values) if values.is_empty() => "0 = 1".to_string(),
        Operator::In(values) => {
            params.extend(values.iter().map(FieldValue::to_sql));
            let placeholders = vec!["?"; values.len()].join(", ");
            format!("{expr} IN ({placeholders})")
        }
        Operator::IsNull => format!("{expr} IS NULL"),
        Operator::IsNotNull => format!("{expr} IS NOT NULL"),
    }
}

fn bind(expr: &str, symbol: &str, value: &FieldValue, params: &mut Vec<Value>) -> String {
    params.push(value.to_sql());
    format!("{expr} {symbol} ?")
}
