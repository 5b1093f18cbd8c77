//! Typed values bound into predicates, updates and query arguments.

use rusqlite::types::Value;

/// A scalar bound to one SQL placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub(crate) fn to_sql(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(value) => Value::Integer(*value),
            Self::Text(value) => Value::Text(value.clone()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One positional argument for a named or derived query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    Value(FieldValue),
    /// Collection argument, consumed by `In` conditions.
    List(Vec<FieldValue>),
}

impl QueryArg {
    pub fn list<T: Into<FieldValue>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<FieldValue> for QueryArg {
    fn from(value: FieldValue) -> Self {
        Self::Value(value)
    }
}

impl From<i64> for QueryArg {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for QueryArg {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for QueryArg {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for QueryArg {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<Vec<&str>> for QueryArg {
    fn from(values: Vec<&str>) -> Self {
        Self::list(values)
    }
}

impl From<Vec<String>> for QueryArg {
    fn from(values: Vec<String>) -> Self {
        Self::list(values)
    }
}

impl From<Vec<i64>> for QueryArg {
    fn from(values: Vec<i64>) -> Self {
        Self::list(values)
    }
}
