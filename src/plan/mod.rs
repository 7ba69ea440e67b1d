//! Logical query plans and their validation
//!
//! A [`QueryPlan`] is the only input callers provide. It never names a
//! physical table or column; [`PlanValidator`] checks every name against the
//! mapping registry before the compiler runs.

mod ast;
mod errors;
mod validator;

pub use ast::{
    AggregateFunction, Aggregation, Filter, FilterOperator, Operation, OrderBy, QueryPlan,
    SortDirection, TimeRange, WILDCARD,
};
pub use errors::{PlanResult, QueryError, QueryErrorCode};
pub use validator::{PlanValidator, QueryLimits};
