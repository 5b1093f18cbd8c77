//! Query derivation from method-style names.
//!
//! Grammar:
//! `(find|read|get|query|count|exists)(First|Top<n>)?<Subject>?By<Criteria>(OrderBy<Orders>)?`
//!
//! - `Criteria` is one or more `<Property><Operator>` parts joined by `And`.
//! - `Operator` is empty, `Is`, `Equals`, `GreaterThan`, `GreaterThanEqual`,
//!   `LessThan`, `LessThanEqual`, `In`, `IsNull`, `Null`, `IsNotNull`, `NotNull`.
//! - `Orders` is one or more `<Property>(Asc|Desc)?`.
//!
//! Names are split into camel-case words, so a property such as `Order` or
//! `Description` never collides with the `Or`/`Desc` keywords.

use super::field::Field;
use super::predicate::{Operator, Predicate};
use super::sort::{Direction, Sort};
use super::value::QueryArg;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static QUERY_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(find|read|get|query|count|exists)(First|Top\d*)?([A-Z][A-Za-z0-9]*?)??By([A-Z][A-Za-z0-9]*)$")
        .expect("valid query name regex")
});
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z0-9]*").expect("valid camel-case word regex"));

const OPERATOR_SUFFIXES: &[(&[&str], OperatorKind)] = &[
    (&["Is", "Not", "Null"], OperatorKind::IsNotNull),
    (&["Greater", "Than", "Equal"], OperatorKind::Ge),
    (&["Less", "Than", "Equal"], OperatorKind::Le),
    (&["Greater", "Than"], OperatorKind::Gt),
    (&["Less", "Than"], OperatorKind::Lt),
    (&["Not", "Null"], OperatorKind::IsNotNull),
    (&["Is", "Null"], OperatorKind::IsNull),
    (&["Null"], OperatorKind::IsNull),
    (&["In"], OperatorKind::In),
    (&["Equals"], OperatorKind::Eq),
    (&["Is"], OperatorKind::Eq),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    UnrecognizedName(String),
    UnsupportedKeyword {
        name: String,
        keyword: &'static str,
    },
    MissingProperty {
        name: String,
    },
    UnknownProperty {
        name: String,
        property: String,
    },
    ArgumentCount {
        expected: usize,
        actual: usize,
    },
    ArgumentKind {
        property: &'static str,
        expected: &'static str,
    },
}

impl Display for DeriveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedName(name) => {
                write!(f, "`{name}` is neither a named query nor a derivable name")
            }
            Self::UnsupportedKeyword { name, keyword } => {
                write!(f, "`{name}` uses unsupported keyword `{keyword}`")
            }
            Self::MissingProperty { name } => write!(f, "`{name}` has an empty criteria part"),
            Self::UnknownProperty { name, property } => {
                write!(f, "`{name}` references unknown property `{property}`")
            }
            Self::ArgumentCount { expected, actual } => {
                write!(f, "query expects {expected} argument(s), got {actual}")
            }
            Self::ArgumentKind { property, expected } => {
                write!(f, "argument for `{property}` must be a {expected}")
            }
        }
    }
}

impl Error for DeriveError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAction {
    Find,
    Count,
    Exists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    IsNull,
    IsNotNull,
}

impl OperatorKind {
    /// Number of arguments the operator consumes.
    pub fn arity(self) -> usize {
        match self {
            Self::IsNull | Self::IsNotNull => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedCondition<F> {
    pub field: F,
    pub kind: OperatorKind,
}

/// Parsed, argument-free form of a derived query name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedQuery<F> {
    pub action: QueryAction,
    pub limit: Option<u64>,
    pub conditions: Vec<DerivedCondition<F>>,
    pub sort: Sort<F>,
}

impl<F: Field> DerivedQuery<F> {
    pub fn parse(name: &str) -> Result<Self, DeriveError> {
        let caps = QUERY_NAME_RE
            .captures(name)
            .ok_or_else(|| DeriveError::UnrecognizedName(name.to_string()))?;

        let action = match &caps[1] {
            "count" => QueryAction::Count,
            "exists" => QueryAction::Exists,
            _ => QueryAction::Find,
        };
        let limit = caps.get(2).map(|limit| parse_limit(limit.as_str()));

        let words: Vec<&str> = WORD_RE
            .find_iter(&caps[4])
            .map(|word| word.as_str())
            .collect();
        let (criteria, orders) = split_order_by(&words);

        if criteria.contains(&"Or") {
            return Err(DeriveError::UnsupportedKeyword {
                name: name.to_string(),
                keyword: "Or",
            });
        }

        let mut conditions = Vec::new();
        if !criteria.is_empty() || orders.is_none() {
            for part in criteria.split(|word| *word == "And") {
                conditions.push(parse_condition(name, part)?);
            }
        }

        let sort = match orders {
            Some(orders) => parse_orders(name, orders)?,
            None => Sort::unsorted(),
        };

        Ok(Self {
            action,
            limit,
            conditions,
            sort,
        })
    }

    /// Number of positional arguments `bind` expects.
    pub fn arity(&self) -> usize {
        self.conditions
            .iter()
            .map(|condition| condition.kind.arity())
            .sum()
    }

    /// Binds positional arguments to the parsed conditions.
    pub fn bind(&self, args: &[QueryArg]) -> Result<Predicate<F>, DeriveError> {
        let expected = self.arity();
        if expected != args.len() {
            return Err(DeriveError::ArgumentCount {
                expected,
                actual: args.len(),
            });
        }

        let mut args = args.iter();
        let mut predicate = Predicate::all();
        for condition in &self.conditions {
            let property = condition.field.property();
            let op = match condition.kind {
                OperatorKind::IsNull => Operator::IsNull,
                OperatorKind::IsNotNull => Operator::IsNotNull,
                OperatorKind::In => match args.next() {
                    Some(QueryArg::List(values)) => Operator::In(values.clone()),
                    Some(QueryArg::Value(value)) => Operator::In(vec![value.clone()]),
                    None => return Err(DeriveError::ArgumentCount { expected, actual: 0 }),
                },
                kind => {
                    let value = match args.next() {
                        Some(QueryArg::Value(value)) => value.clone(),
                        Some(QueryArg::List(_)) => {
                            return Err(DeriveError::ArgumentKind {
                                property,
                                expected: "single value",
                            })
                        }
                        None => return Err(DeriveError::ArgumentCount { expected, actual: 0 }),
                    };
                    match kind {
                        OperatorKind::Gt => Operator::Gt(value),
                        OperatorKind::Ge => Operator::Ge(value),
                        OperatorKind::Lt => Operator::Lt(value),
                        OperatorKind::Le => Operator::Le(value),
                        _ => Operator::Eq(value),
                    }
                }
            };
            predicate = predicate.with(condition.field, op);
        }

        Ok(predicate)
    }
}

fn parse_limit(keyword: &str) -> u64 {
    keyword
        .strip_prefix("Top")
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(1)
        .max(1)
}

fn split_order_by<'w>(words: &'w [&'w str]) -> (&'w [&'w str], Option<&'w [&'w str]>) {
    let position = words
        .windows(2)
        .position(|pair| pair[0] == "Order" && pair[1] == "By");
    match position {
        Some(index) => (&words[..index], Some(&words[index + 2..])),
        None => (words, None),
    }
}

fn parse_condition<F: Field>(
    name: &str,
    part: &[&str],
) -> Result<DerivedCondition<F>, DeriveError> {
    let (property_words, kind) = OPERATOR_SUFFIXES
        .iter()
        .find(|(suffix, _)| part.len() > suffix.len() && part.ends_with(suffix))
        .map(|(suffix, kind)| (&part[..part.len() - suffix.len()], *kind))
        .unwrap_or((part, OperatorKind::Eq));

    let field = resolve_property(name, property_words)?;
    Ok(DerivedCondition { field, kind })
}

fn parse_orders<F: Field>(name: &str, words: &[&str]) -> Result<Sort<F>, DeriveError> {
    let mut sort = Sort::unsorted();
    let mut pending: Vec<&str> = Vec::new();
    for word in words {
        let direction = match *word {
            "Asc" => Direction::Asc,
            "Desc" => Direction::Desc,
            other => {
                pending.push(other);
                continue;
            }
        };
        sort = sort.then(resolve_property(name, &pending)?, direction);
        pending.clear();
    }
    if !pending.is_empty() || sort.is_unsorted() {
        sort = sort.then(resolve_property(name, &pending)?, Direction::Asc);
    }
    Ok(sort)
}

fn resolve_property<F: Field>(name: &str, words: &[&str]) -> Result<F, DeriveError> {
    if words.is_empty() {
        return Err(DeriveError::MissingProperty {
            name: name.to_string(),
        });
    }
    let property = words.concat();
    F::from_property(&property).ok_or_else(|| DeriveError::UnknownProperty {
        name: name.to_string(),
        property,
    })
}
