//! SQL Compiler
//!
//! Turns a validated [`QueryPlan`] into parameterized SQL. Only identifiers
//! from the mapping registry are written into the SQL text; every caller
//! value (filter values, time bounds, limit, offset) becomes a `?` parameter.
//! Aliases are double-quoted so result keys keep the caller's exact case.
//!
//! Statement shapes:
//!
//! ```text
//! list/search: SELECT * FROM t [WHERE p] [ORDER BY o] LIMIT ? [OFFSET ?]
//! aggregate:   SELECT g AS "g", F(c) AS "a" FROM t [WHERE p] [GROUP BY g] [ORDER BY o] LIMIT ? [OFFSET ?]
//! count:       SELECT COUNT(*) FROM t [WHERE p]
//! agg count:   SELECT COUNT(*) FROM (SELECT ... GROUP BY g) AS grouped_rows
//! ```
//!
//! Compilation is pure: the same plan always yields the same text and parameters.

use std::sync::Arc;

use serde_json::Value;

use crate::mapping::{EntityMapping, MappingRegistry};
use crate::plan::{
    AggregateFunction, Aggregation, FilterOperator, Operation, QueryLimits, QueryPlan,
    SortDirection,
};

use super::errors::{CompileError, CompileResult};
use super::statement::{CompiledStatement, SqlValue};
use super::time::parse_time_bound;

/// Resolved inputs shared by every statement shape
struct Target<'p> {
    entity: &'p str,
    mapping: &'p EntityMapping,
    operation: &'p Operation,
}

pub struct SqlCompiler {
    registry: Arc<MappingRegistry>,
    limits: QueryLimits,
}

impl SqlCompiler {
    pub fn new(registry: Arc<MappingRegistry>, limits: QueryLimits) -> Self {
        Self { registry, limits }
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    /// Compiles the page statement for `plan`.
    pub fn compile(&self, plan: &QueryPlan) -> CompileResult<CompiledStatement> {
        let target = self.resolve(plan)?;
        let mut params = Vec::new();

        let mut sql = match target.operation {
            Operation::List | Operation::Search => {
                let predicate = self.build_predicate(&target, plan, &mut params)?;
                let mut sql = format!("SELECT * FROM {}", target.mapping.table);
                push_where(&mut sql, predicate);
                let order = match self.order_clause(&target, plan)? {
                    Some(order) => Some(order),
                    None => default_order(target.mapping),
                };
                if let Some(order) = order {
                    sql.push_str(" ORDER BY ");
                    sql.push_str(&order);
                }
                sql
            }
            Operation::Aggregate => {
                let mut sql = self.aggregate_select(&target, plan, &mut params)?;
                if let Some(order) = self.order_clause(&target, plan)? {
                    sql.push_str(" ORDER BY ");
                    sql.push_str(&order);
                }
                sql
            }
            Operation::Unsupported(op) => {
                return Err(CompileError::UnsupportedOperation(op.clone()))
            }
        };

        sql.push_str(" LIMIT ?");
        params.push(SqlValue::count(
            self.limits.effective_limit(plan, Some(target.mapping)),
        ));

        if let Some(offset) = plan.offset.filter(|o| *o > 0) {
            sql.push_str(" OFFSET ?");
            params.push(SqlValue::count(offset));
        }

        Ok(CompiledStatement::new(sql, params))
    }

    /// Compiles the total-row statement sharing `compile`'s WHERE clause.
    ///
    /// For aggregates the total is the number of result groups.
    pub fn compile_count(&self, plan: &QueryPlan) -> CompileResult<CompiledStatement> {
        let target = self.resolve(plan)?;
        let mut params = Vec::new();

        let sql = match target.operation {
            Operation::List | Operation::Search => {
                let predicate = self.build_predicate(&target, plan, &mut params)?;
                let mut sql = format!("SELECT COUNT(*) FROM {}", target.mapping.table);
                push_where(&mut sql, predicate);
                sql
            }
            Operation::Aggregate => {
                let inner = self.aggregate_select(&target, plan, &mut params)?;
                format!("SELECT COUNT(*) FROM ({}) AS grouped_rows", inner)
            }
            Operation::Unsupported(op) => {
                return Err(CompileError::UnsupportedOperation(op.clone()))
            }
        };

        Ok(CompiledStatement::new(sql, params))
    }

    fn resolve<'p>(&'p self, plan: &'p QueryPlan) -> CompileResult<Target<'p>> {
        let entity = plan
            .entity
            .as_deref()
            .ok_or(CompileError::Missing("entity"))?;
        let operation = plan
            .operation
            .as_ref()
            .ok_or(CompileError::Missing("operation"))?;
        let mapping = self
            .registry
            .entity(entity)
            .ok_or_else(|| CompileError::UnknownEntity(entity.to_string()))?;

        Ok(Target {
            entity,
            mapping,
            operation,
        })
    }

    fn column<'p>(&self, target: &Target<'p>, field: &str) -> CompileResult<&'p str> {
        target
            .mapping
            .column(field)
            .ok_or_else(|| CompileError::UnknownField {
                entity: target.entity.to_string(),
                field: field.to_string(),
            })
    }

    /// `SELECT <group cols>, <aggregates> FROM t [WHERE] [GROUP BY]`
    fn aggregate_select(
        &self,
        target: &Target<'_>,
        plan: &QueryPlan,
        params: &mut Vec<SqlValue>,
    ) -> CompileResult<String> {
        let mut select_list = Vec::with_capacity(plan.group_by.len() + plan.aggregations.len());
        let mut group_columns = Vec::with_capacity(plan.group_by.len());

        for field in &plan.group_by {
            let column = self.column(target, field)?;
            select_list.push(format!("{} AS {}", column, quote_alias(field)));
            group_columns.push(column);
        }
        for aggregation in &plan.aggregations {
            select_list.push(self.aggregate_expr(target, aggregation)?);
        }

        let predicate = self.build_predicate(target, plan, params)?;
        let mut sql = format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            target.mapping.table
        );
        push_where(&mut sql, predicate);
        if !group_columns.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_columns.join(", "));
        }
        Ok(sql)
    }

    fn aggregate_expr(&self, target: &Target<'_>, aggregation: &Aggregation) -> CompileResult<String> {
        let function = match &aggregation.function {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Unsupported(f) => {
                return Err(CompileError::InvalidValue {
                    field: aggregation.alias.clone(),
                    reason: format!("aggregate function '{}' is not supported", f),
                })
            }
        };
        let argument = if aggregation.is_wildcard() {
            "*"
        } else {
            self.column(target, &aggregation.field)?
        };
        Ok(format!(
            "{}({}) AS {}",
            function,
            argument,
            quote_alias(&aggregation.alias)
        ))
    }

    fn order_clause(&self, target: &Target<'_>, plan: &QueryPlan) -> CompileResult<Option<String>> {
        if plan.order_by.is_empty() {
            return Ok(None);
        }
        let mut terms = Vec::with_capacity(plan.order_by.len());
        for order in &plan.order_by {
            let column = self.column(target, &order.field)?;
            let direction = match &order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
                SortDirection::Unsupported(d) => {
                    return Err(CompileError::InvalidValue {
                        field: order.field.clone(),
                        reason: format!("sort direction '{}' is not supported", d),
                    })
                }
            };
            terms.push(format!("{} {}", column, direction));
        }
        Ok(Some(terms.join(", ")))
    }

    /// AND of all filter predicates plus the time range, or `None` when empty.
    fn build_predicate(
        &self,
        target: &Target<'_>,
        plan: &QueryPlan,
        params: &mut Vec<SqlValue>,
    ) -> CompileResult<Option<String>> {
        let mut predicates = Vec::with_capacity(plan.filters.len() + 2);

        for filter in &plan.filters {
            let column = self.column(target, &filter.field)?;
            let predicate = match &filter.operator {
                FilterOperator::Eq => comparison(column, "=", &filter.value, params),
                FilterOperator::Ne => comparison(column, "!=", &filter.value, params),
                FilterOperator::Gt => comparison(column, ">", &filter.value, params),
                FilterOperator::Gte => comparison(column, ">=", &filter.value, params),
                FilterOperator::Lt => comparison(column, "<", &filter.value, params),
                FilterOperator::Lte => comparison(column, "<=", &filter.value, params),
                FilterOperator::Like => {
                    let needle = match &filter.value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    params.push(SqlValue::Text(format!("%{}%", escape_like(&needle))));
                    format!("{} LIKE ? ESCAPE '{}'", column, LIKE_ESCAPE)
                }
                FilterOperator::In => {
                    let values = list_values(&filter.field, &filter.value, None)?;
                    let placeholders = vec!["?"; values.len()].join(", ");
                    params.extend(values.iter().map(SqlValue::from_json));
                    format!("{} IN ({})", column, placeholders)
                }
                FilterOperator::Between => {
                    let values = list_values(&filter.field, &filter.value, Some(2))?;
                    params.extend(values.iter().map(SqlValue::from_json));
                    format!("{} BETWEEN ? AND ?", column)
                }
                FilterOperator::Unsupported(op) => {
                    return Err(CompileError::UnsupportedOperator {
                        field: filter.field.clone(),
                        operator: op.clone(),
                    })
                }
            };
            predicates.push(predicate);
        }

        if let Some(range) = &plan.time_range {
            let field = target
                .mapping
                .timestamp_field(target.entity)
                .ok_or_else(|| CompileError::NoTimeField(target.entity.to_string()))?;
            let column = self.column(target, field)?;

            let start = time_bound("start", range.start.as_deref())?;
            let end = time_bound("end", range.end.as_deref())?;

            predicates.push(format!("{} >= ?", column));
            params.push(SqlValue::Timestamp(start));
            predicates.push(format!("{} <= ?", column));
            params.push(SqlValue::Timestamp(end));
        }

        if predicates.is_empty() {
            Ok(None)
        } else {
            Ok(Some(predicates.join(" AND ")))
        }
    }
}

fn comparison(column: &str, op: &str, value: &Value, params: &mut Vec<SqlValue>) -> String {
    params.push(SqlValue::from_json(value));
    format!("{} {} ?", column, op)
}

fn list_values<'v>(field: &str, value: &'v Value, arity: Option<usize>) -> CompileResult<&'v [Value]> {
    let values = match value {
        Value::Array(values) if !values.is_empty() => values.as_slice(),
        _ => {
            return Err(CompileError::InvalidValue {
                field: field.to_string(),
                reason: "expected a non-empty list".into(),
            })
        }
    };
    if let Some(n) = arity {
        if values.len() != n {
            return Err(CompileError::InvalidValue {
                field: field.to_string(),
                reason: format!("expected exactly {} values", n),
            });
        }
    }
    Ok(values)
}

fn time_bound(bound: &'static str, raw: Option<&str>) -> CompileResult<chrono::DateTime<chrono::Utc>> {
    let raw = raw.unwrap_or_default();
    parse_time_bound(raw).ok_or_else(|| CompileError::InvalidTimeBound {
        bound,
        value: raw.to_string(),
    })
}

/// Entity default order, else every mapped column ascending so that
/// LIMIT/OFFSET pages replayed from tokens stay stable.
fn default_order(mapping: &EntityMapping) -> Option<String> {
    if let Some(order) = &mapping.default_order_by {
        return Some(order.clone());
    }
    let mut columns: Vec<&str> = Vec::with_capacity(mapping.fields.len());
    for column in mapping.fields.values() {
        if !columns.contains(&column.as_str()) {
            columns.push(column);
        }
    }
    if columns.is_empty() {
        return None;
    }
    let terms: Vec<String> = columns.iter().map(|c| format!("{} ASC", c)).collect();
    Some(terms.join(", "))
}

const LIKE_ESCAPE: char = '\\';

/// Caller `%`, `_` and the escape character itself match literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn push_where(sql: &mut String, predicate: Option<String>) {
    if let Some(predicate) = predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate);
    }
}

/// Double-quoted identifier; embedded quotes are doubled.
pub fn quote_alias(alias: &str) -> String {
    format!("\"{}\"", alias.replace('"', "\"\""))
}
