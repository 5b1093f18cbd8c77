//! Query name resolution: registered named queries first, derivation second.

use super::derive::{DeriveError, DerivedQuery, QueryAction};
use super::field::Field;
use super::predicate::Predicate;
use super::sort::Sort;
use super::value::{FieldValue, QueryArg};
use std::collections::HashMap;

/// Builds a predicate from positional arguments.
pub type NamedQueryBuilder<F> = fn(&[QueryArg]) -> Result<Predicate<F>, DeriveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrigin {
    Named,
    Derived,
}

/// Executable form of a resolved query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery<F> {
    pub origin: QueryOrigin,
    pub action: QueryAction,
    pub predicate: Predicate<F>,
    pub sort: Sort<F>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone)]
struct NamedQuery<F> {
    builder: NamedQueryBuilder<F>,
    sort: Sort<F>,
}

#[derive(Debug, Clone)]
pub struct QueryDispatcher<F> {
    named: HashMap<&'static str, NamedQuery<F>>,
}

impl<F: Field> Default for QueryDispatcher<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Field> QueryDispatcher<F> {
    pub fn new() -> Self {
        Self {
            named: HashMap::new(),
        }
    }

    /// Registers a named find query. A later registration replaces an earlier
    /// one with the same name.
    pub fn register(self, name: &'static str, builder: NamedQueryBuilder<F>) -> Self {
        self.register_sorted(name, builder, Sort::unsorted())
    }

    pub fn register_sorted(
        mut self,
        name: &'static str,
        builder: NamedQueryBuilder<F>,
        sort: Sort<F>,
    ) -> Self {
        self.named.insert(name, NamedQuery { builder, sort });
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    pub fn resolve(&self, name: &str, args: &[QueryArg]) -> Result<ResolvedQuery<F>, DeriveError> {
        if let Some(named) = self.named.get(name) {
            return Ok(ResolvedQuery {
                origin: QueryOrigin::Named,
                action: QueryAction::Find,
                predicate: (named.builder)(args)?,
                sort: named.sort.clone(),
                limit: None,
            });
        }

        let derived = DerivedQuery::<F>::parse(name)?;
        let predicate = derived.bind(args)?;
        Ok(ResolvedQuery {
            origin: QueryOrigin::Derived,
            action: derived.action,
            predicate,
            sort: derived.sort,
            limit: derived.limit,
        })
    }
}

/// Fails unless exactly `expected` arguments were supplied.
pub fn expect_args(args: &[QueryArg], expected: usize) -> Result<(), DeriveError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(DeriveError::ArgumentCount {
            expected,
            actual: args.len(),
        })
    }
}

/// Reads a scalar argument for `property`.
pub fn value_arg(
    args: &[QueryArg],
    index: usize,
    property: &'static str,
) -> Result<FieldValue, DeriveError> {
    match args.get(index) {
        Some(QueryArg::Value(value)) => Ok(value.clone()),
        Some(QueryArg::List(_)) => Err(DeriveError::ArgumentKind {
            property,
            expected: "single value",
        }),
        None => Err(DeriveError::ArgumentCount {
            expected: index + 1,
            actual: args.len(),
        }),
    }
}

/// Reads a collection argument for `property`; a scalar becomes a singleton.
pub fn list_arg(args: &[QueryArg], index: usize) -> Result<Vec<FieldValue>, DeriveError> {
    match args.get(index) {
        Some(QueryArg::List(values)) => Ok(values.clone()),
        Some(QueryArg::Value(value)) => Ok(vec![value.clone()]),
        None => Err(DeriveError::ArgumentCount {
            expected: index + 1,
            actual: args.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{expect_args, value_arg, QueryDispatcher, QueryOrigin};
    use crate::query::derive::{DeriveError, QueryAction};
    use crate::query::field::MemberField;
    use crate::query::predicate::Predicate;
    use crate::query::value::QueryArg;

    fn username_equals(args: &[QueryArg]) -> Result<Predicate<MemberField>, DeriveError> {
        expect_args(args, 1)?;
        let username = value_arg(args, 0, "username")?;
        Ok(Predicate::all().eq(MemberField::Username, username))
    }

    #[test]
    fn named_query_takes_precedence_over_derivation() {
        let dispatcher = QueryDispatcher::new().register("findByUsername", username_equals);
        let resolved = dispatcher
            .resolve("findByUsername", &[QueryArg::from("m1")])
            .unwrap();
        assert_eq!(resolved.origin, QueryOrigin::Named);

        let derived = QueryDispatcher::<MemberField>::new()
            .resolve("findByUsername", &[QueryArg::from("m1")])
            .unwrap();
        assert_eq!(derived.origin, QueryOrigin::Derived);
        assert_eq!(resolved.predicate, derived.predicate);
    }

    #[test]
    fn names_that_cannot_be_derived_resolve_only_when_registered() {
        let dispatcher = QueryDispatcher::new().register("findUser", username_equals);
        assert!(dispatcher.is_named("findUser"));
        assert!(dispatcher.resolve("findUser", &[QueryArg::from("a")]).is_ok());
        assert!(matches!(
            QueryDispatcher::<MemberField>::new().resolve("findUser", &[]),
            Err(DeriveError::UnrecognizedName(_))
        ));
    }

    #[test]
    fn derived_count_keeps_action_and_limit() {
        let resolved = QueryDispatcher::<MemberField>::new()
            .resolve("countByAgeGreaterThan", &[QueryArg::from(10)])
            .unwrap();
        assert_eq!(resolved.action, QueryAction::Count);
        assert_eq!(resolved.limit, None);
    }
}
