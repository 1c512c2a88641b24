use serde_json::{Map, Value};

use super::aggregate::aggregate_predicate;
use super::connection::connection_predicate;
use super::key::{classify, LogicalOperator, WhereKey};
use super::property::property_predicate;
use super::relationship::relationship_predicate;
use super::{as_object, as_object_list, PredicateResult, PredicateReturn, WhereScope};
use crate::cypher::CypherExpr;
use crate::translate::context::TranslationContext;

/// Compile a `where` input against the element in `scope`.
///
/// Keys are visited in input order, depth first, so pre-computed subqueries
/// come out in the order their predicates appear.
pub fn create_where_predicate(
    ctx: &mut TranslationContext<'_>,
    scope: WhereScope<'_>,
    where_input: &Map<String, Value>,
) -> PredicateResult<PredicateReturn> {
    let mut results = Vec::with_capacity(where_input.len());

    for (key, value) in where_input {
        let result = match classify(key, scope.element)? {
            WhereKey::Logical(operator) => logical_predicate(ctx, scope, key, operator, value)?,
            WhereKey::Property { field, operator } => PredicateReturn::from_predicate(
                property_predicate(ctx, scope, key, field, operator, value)?,
            ),
            WhereKey::Relationship { field, quantifier } => {
                relationship_predicate(ctx, scope, key, field, quantifier, value)?
            }
            WhereKey::Connection { field, quantifier } => {
                connection_predicate(ctx, scope, key, field, quantifier, value)?
            }
            WhereKey::Aggregate { field } => aggregate_predicate(ctx, scope, key, field, value)?,
        };
        results.push(result);
    }

    Ok(PredicateReturn::all(results))
}

fn logical_predicate(
    ctx: &mut TranslationContext<'_>,
    scope: WhereScope<'_>,
    key: &str,
    operator: LogicalOperator,
    value: &Value,
) -> PredicateResult<PredicateReturn> {
    if operator == LogicalOperator::Not {
        let inner = create_where_predicate(ctx, scope, as_object(key, value)?)?;
        return Ok(PredicateReturn {
            predicate: inner.predicate.map(CypherExpr::not),
            pre_computed_subqueries: inner.pre_computed_subqueries,
        });
    }

    let mut predicates = Vec::new();
    let mut pre_computed_subqueries = Vec::new();
    for input in as_object_list(key, value)? {
        let nested = create_where_predicate(ctx, scope, input)?;
        predicates.push(nested.predicate);
        pre_computed_subqueries.extend(nested.pre_computed_subqueries);
    }

    let predicate = match operator {
        LogicalOperator::Or => CypherExpr::or(predicates),
        _ => CypherExpr::and(predicates),
    };
    Ok(PredicateReturn {
        predicate,
        pre_computed_subqueries,
    })
}
