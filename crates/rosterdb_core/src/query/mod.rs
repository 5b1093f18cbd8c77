//! Query dispatch: typed predicates, ordering, name derivation and SQL plans.
//!
//! # Responsibility
//! - Describe record filters as typed conjunctions instead of SQL strings.
//! - Resolve named and derived query names into executable plans.
//!
//! # Invariants
//! - All SQL values are bound as parameters; field expressions are static.
//! - Predicates are conjunctions only.

pub mod derive;
pub mod dispatcher;
pub mod field;
pub mod plan;
pub mod predicate;
pub mod sort;
pub mod value;

pub use derive::{DeriveError, DerivedQuery, QueryAction};
pub use dispatcher::{
    expect_args, list_arg, value_arg, NamedQueryBuilder, QueryDispatcher, QueryOrigin,
    ResolvedQuery,
};
pub use field::{ColumnKind, Field, MemberField, TeamField};
pub use plan::{QueryPlan, Statement, TableSource, MEMBER_SOURCE, TEAM_SOURCE};
pub use predicate::{Condition, Operator, Predicate};
pub use sort::{Direction, Order, Sort};
pub use value::{FieldValue, QueryArg};
