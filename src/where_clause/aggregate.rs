use serde_json::{Map, Value};

use super::errors::WhereError;
use super::key::is_logical;
use super::relationship::related_pattern;
use super::{as_object, as_object_list, PredicateResult, PredicateReturn, WhereScope};
use crate::cypher::{Clause, CypherExpr, ExistsSubquery, Operator, ProjectionItem};
use crate::graph_catalog::{RelationField, TargetKind};
use crate::translate::context::TranslationContext;

fn count_comparison(key: &str) -> Option<Operator> {
    match key {
        "count" => Some(Operator::Equal),
        "count_LT" => Some(Operator::LessThan),
        "count_LTE" => Some(Operator::LessThanEqual),
        "count_GT" => Some(Operator::GreaterThan),
        "count_GTE" => Some(Operator::GreaterThanEqual),
        _ => None,
    }
}

fn count_predicates(
    ctx: &mut TranslationContext<'_>,
    param_prefix: &str,
    count: &CypherExpr,
    input: &Map<String, Value>,
) -> PredicateResult<Option<CypherExpr>> {
    let mut predicates = Vec::new();
    for (key, value) in input {
        if is_logical(key) {
            let inputs = if key == "NOT" {
                vec![as_object(key, value)?]
            } else {
                as_object_list(key, value)?
            };
            let mut nested = Vec::new();
            for input in inputs {
                nested.push(count_predicates(ctx, param_prefix, count, input)?);
            }
            predicates.push(match key.as_str() {
                "OR" => CypherExpr::or(nested),
                "NOT" => CypherExpr::and(nested).map(CypherExpr::not),
                _ => CypherExpr::and(nested),
            });
            continue;
        }

        let operator = count_comparison(key)
            .ok_or_else(|| WhereError::invalid(key, "only count aggregations can be filtered"))?;
        if !value.is_i64() && !value.is_u64() {
            return Err(WhereError::invalid(key, "expected an integer"));
        }
        let param = ctx.bind(&format!("{}_{}", param_prefix, key), value.clone());
        predicates.push(Some(CypherExpr::binary(
            operator,
            count.clone(),
            CypherExpr::param(param),
        )));
    }
    Ok(CypherExpr::and(predicates))
}

/// Predicate for `<rel>Aggregate` count filters.
///
/// The size form counts in a pre-computed `CALL`; the existence form inlines
/// a `COUNT { MATCH ... }` expression.
pub fn aggregate_predicate(
    ctx: &mut TranslationContext<'_>,
    scope: WhereScope<'_>,
    key: &str,
    field: &RelationField,
    value: &Value,
) -> PredicateResult<PredicateReturn> {
    let schema = ctx.schema;
    let node = match schema.resolve_target(&field.target) {
        Ok(TargetKind::Node(node)) => node,
        Ok(_) => {
            return Err(WhereError::invalid(
                key,
                "aggregations are only supported on node targets",
            ))
        }
        Err(_) => {
            return Err(WhereError::UnknownNode {
                name: field.target.clone(),
            })
        }
    };
    let input = as_object(key, value)?;

    let target = ctx.fresh_var(&format!("{}_{}", scope.variable, field.field_name));
    let pattern = related_pattern(scope.variable, field, None, &target, node);
    let param_prefix = format!("{}_{}", scope.param_prefix, key);

    if scope.use_exist_expr {
        let count = CypherExpr::Count(Box::new(ExistsSubquery {
            pattern,
            subqueries: vec![],
            predicate: None,
        }));
        let predicate = count_predicates(ctx, &param_prefix, &count, input)?;
        return Ok(PredicateReturn {
            predicate,
            pre_computed_subqueries: vec![],
        });
    }

    let count_var = format!("{}_count", target);
    let subquery = Clause::Call {
        imports: vec![scope.variable.to_string()],
        body: vec![
            Clause::Match(pattern),
            Clause::Return(vec![ProjectionItem::aliased(
                CypherExpr::function("count", vec![CypherExpr::variable(&target)]),
                count_var.clone(),
            )]),
        ],
    };
    let predicate = count_predicates(
        ctx,
        &param_prefix,
        &CypherExpr::variable(count_var),
        input,
    )?;
    Ok(PredicateReturn {
        predicate,
        pre_computed_subqueries: vec![subquery],
    })
}
