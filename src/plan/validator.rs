//! Plan Validator
//!
//! Rejects malformed or out-of-policy plans before any SQL exists.
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. requestId, entity, operation present
//! 2. entity is mapped
//! 3. operation is list, aggregate or search
//! 4. every referenced field is mapped
//! 5. operators, aggregate functions and sort directions are supported
//! 6. filter values have the shape their operator needs
//! 7. limit within the ceiling
//! 8. mandatory time range present

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapping::{EntityMapping, MappingRegistry};

use super::ast::{AggregateFunction, FilterOperator, Operation, QueryPlan, SortDirection};
use super::errors::{PlanResult, QueryError};

/// Row-limit policy shared by the validator and compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    /// Limit applied when a plan has none
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    /// Global ceiling for `limit`
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

fn default_limit() -> u64 {
    10
}

fn default_max_limit() -> u64 {
    1000
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl QueryLimits {
    /// Ceiling for one entity; the entity's own ceiling wins when set
    pub fn ceiling_for(&self, mapping: &EntityMapping) -> u64 {
        mapping.max_limit.unwrap_or(self.max_limit)
    }

    /// Limit the compiler must use for `plan`
    pub fn effective_limit(&self, plan: &QueryPlan, mapping: Option<&EntityMapping>) -> u64 {
        let ceiling = mapping.map_or(self.max_limit, |m| self.ceiling_for(m));
        plan.limit
            .unwrap_or_else(|| self.default_limit.min(ceiling))
    }
}

pub struct PlanValidator<'a> {
    registry: &'a MappingRegistry,
    limits: QueryLimits,
}

impl<'a> PlanValidator<'a> {
    pub fn new(registry: &'a MappingRegistry, limits: QueryLimits) -> Self {
        Self { registry, limits }
    }

    pub fn validate(&self, plan: &QueryPlan) -> PlanResult<()> {
        // 1. Required fields
        let request_id = plan.request_id.as_deref().unwrap_or_default();
        if request_id.trim().is_empty() {
            return Err(QueryError::missing("requestId"));
        }
        let entity_name = plan.entity.as_deref().unwrap_or_default();
        if entity_name.trim().is_empty() {
            return Err(QueryError::missing("entity"));
        }
        let operation = plan
            .operation
            .as_ref()
            .ok_or_else(|| QueryError::missing("operation"))?;

        // 2. Entity whitelist
        let mapping = self
            .registry
            .entity(entity_name)
            .ok_or_else(|| QueryError::invalid_entity(entity_name))?;

        // 3. Operation
        match operation {
            Operation::List | Operation::Aggregate | Operation::Search => {}
            Operation::Unsupported(op) => return Err(QueryError::invalid_operation(op.as_str())),
        }

        // 4. Field whitelist
        self.check_fields(entity_name, mapping, plan)?;

        // 5. Operators, functions, directions
        self.check_operators(plan)?;

        // 6. Value shapes and aggregate structure
        self.check_values(plan)?;
        if *operation == Operation::Aggregate {
            self.check_aggregations(plan)?;
        }

        // 7. Limit
        if let Some(limit) = plan.limit {
            let ceiling = self.limits.ceiling_for(mapping);
            if limit == 0 {
                return Err(QueryError::validation("limit", "limit must be at least 1"));
            }
            if limit > ceiling {
                return Err(QueryError::validation(
                    "limit",
                    format!("limit {} exceeds maximum {}", limit, ceiling),
                ));
            }
        }

        // 8. Time range
        match &plan.time_range {
            Some(range) if !range.is_complete() => {
                return Err(QueryError::validation(
                    "timeRange",
                    "timeRange requires both start and end",
                ));
            }
            Some(_) => {
                if mapping.timestamp_field(entity_name).is_none() {
                    return Err(QueryError::validation(
                        "timeRange",
                        format!("Entity '{}' has no time field", entity_name),
                    ));
                }
            }
            None if mapping.time_range_required => {
                return Err(QueryError::validation(
                    "timeRange",
                    format!("Entity '{}' requires a timeRange with start and end", entity_name),
                ));
            }
            None => {}
        }

        Ok(())
    }

    /// Limit the compiler must use once `plan` has validated
    pub fn effective_limit(&self, plan: &QueryPlan) -> u64 {
        let mapping = plan.entity.as_deref().and_then(|e| self.registry.entity(e));
        self.limits.effective_limit(plan, mapping)
    }

    fn check_fields(&self, entity: &str, mapping: &EntityMapping, plan: &QueryPlan) -> PlanResult<()> {
        let referenced = plan
            .filters
            .iter()
            .map(|f| f.field.as_str())
            .chain(plan.group_by.iter().map(String::as_str))
            .chain(plan.order_by.iter().map(|o| o.field.as_str()))
            .chain(
                plan.aggregations
                    .iter()
                    .filter(|a| !a.is_wildcard())
                    .map(|a| a.field.as_str()),
            );

        for field in referenced {
            if !mapping.has_field(field) {
                return Err(QueryError::invalid_field(entity, field));
            }
        }
        Ok(())
    }

    fn check_operators(&self, plan: &QueryPlan) -> PlanResult<()> {
        for filter in &plan.filters {
            if let FilterOperator::Unsupported(op) = &filter.operator {
                return Err(QueryError::invalid_operator(&filter.field, op));
            }
        }
        for (i, aggregation) in plan.aggregations.iter().enumerate() {
            if let AggregateFunction::Unsupported(function) = &aggregation.function {
                return Err(QueryError::validation(
                    format!("aggregations[{}].function", i),
                    format!("Aggregate function '{}' is not supported", function),
                ));
            }
        }
        for (i, order) in plan.order_by.iter().enumerate() {
            if let SortDirection::Unsupported(direction) = &order.direction {
                return Err(QueryError::validation(
                    format!("orderBy[{}].direction", i),
                    format!("Sort direction '{}' is not supported", direction),
                ));
            }
        }
        Ok(())
    }

    fn check_values(&self, plan: &QueryPlan) -> PlanResult<()> {
        for filter in &plan.filters {
            match &filter.operator {
                FilterOperator::In => match &filter.value {
                    Value::Array(values) if !values.is_empty() && values.iter().all(is_scalar) => {}
                    _ => {
                        return Err(QueryError::validation(
                            &filter.field,
                            "'in' requires a non-empty list of scalar values",
                        ))
                    }
                },
                FilterOperator::Between => match &filter.value {
                    Value::Array(values) if values.len() == 2 && values.iter().all(is_scalar) => {}
                    _ => {
                        return Err(QueryError::validation(
                            &filter.field,
                            "'between' requires exactly two scalar values",
                        ))
                    }
                },
                FilterOperator::Like => {
                    if !filter.value.is_string() {
                        return Err(QueryError::validation(
                            &filter.field,
                            "'like' requires a string value",
                        ));
                    }
                }
                _ => {
                    if !is_scalar(&filter.value) {
                        return Err(QueryError::validation(
                            &filter.field,
                            format!("'{}' requires a single scalar value", filter.operator.as_str()),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_aggregations(&self, plan: &QueryPlan) -> PlanResult<()> {
        if plan.aggregations.is_empty() {
            return Err(QueryError::validation(
                "aggregations",
                "aggregate requires at least one aggregation",
            ));
        }
        for (i, aggregation) in plan.aggregations.iter().enumerate() {
            if aggregation.alias.trim().is_empty() {
                return Err(QueryError::validation(
                    format!("aggregations[{}].alias", i),
                    "aggregation alias must not be empty",
                ));
            }
            if aggregation.is_wildcard() && aggregation.function != AggregateFunction::Count {
                return Err(QueryError::validation(
                    format!("aggregations[{}].field", i),
                    "'*' is only valid for count",
                ));
            }
        }
        Ok(())
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}
