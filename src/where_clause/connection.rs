use serde_json::{Map, Value};

use super::compiler::create_where_predicate;
use super::errors::WhereError;
use super::key::{is_logical, Quantifier, WhereElement};
use super::relationship::{quantify, related_candidates, related_pattern, RelatedMatch};
use super::{as_object, as_object_list, PredicateResult, PredicateReturn, WhereScope};
use crate::cypher::CypherExpr;
use crate::graph_catalog::{NodeSchema, RelationField, RelationshipPropertiesSchema, TargetKind};
use crate::translate::context::TranslationContext;

fn only_on_without(input: &Map<String, Value>, node: &NodeSchema) -> bool {
    input.len() == 1
        && input
            .get("_on")
            .and_then(Value::as_object)
            .is_some_and(|on| !on.contains_key(&node.name))
}

/// False when the `node` part of a connection filter is an `_on` block that
/// leaves `node` out
pub fn has_explicit_node_in_interface_where(where_input: &Map<String, Value>, node: &NodeSchema) -> bool {
    for (key, value) in where_input {
        if key.starts_with("node") || key.starts_with(node.name.as_str()) {
            return !value
                .as_object()
                .is_some_and(|input| only_on_without(input, node));
        }
    }
    true
}

/// Interface filter for one implementation: the shared keys with the
/// implementation's `_on` entries laid over them. `None` when `_on` is the
/// only key and does not mention the implementation.
pub fn interface_where_for(
    where_input: &Map<String, Value>,
    node: &NodeSchema,
) -> Option<Map<String, Value>> {
    if only_on_without(where_input, node) {
        return None;
    }
    let mut merged: Map<String, Value> = where_input
        .iter()
        .filter(|(key, _)| key.as_str() != "_on")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if let Some(specific) = where_input
        .get("_on")
        .and_then(|on| on.get(&node.name))
        .and_then(Value::as_object)
    {
        merged.extend(specific.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Some(merged)
}

/// Compile a connection filter (`node`, `edge` and logical keys) against a
/// node variable and its relationship variable
pub fn connection_where_predicate(
    ctx: &mut TranslationContext<'_>,
    where_input: &Map<String, Value>,
    node: &NodeSchema,
    node_variable: &str,
    edge: Option<&RelationshipPropertiesSchema>,
    edge_variable: &str,
    use_exist_expr: bool,
) -> PredicateResult<PredicateReturn> {
    let mut results = Vec::new();

    for (key, value) in where_input {
        if is_logical(key) {
            let mut nested = Vec::new();
            let inputs = if key == "NOT" {
                vec![as_object(key, value)?]
            } else {
                as_object_list(key, value)?
            };
            for input in inputs {
                nested.push(connection_where_predicate(
                    ctx,
                    input,
                    node,
                    node_variable,
                    edge,
                    edge_variable,
                    use_exist_expr,
                )?);
            }
            let subqueries = nested
                .iter_mut()
                .flat_map(|r| std::mem::take(&mut r.pre_computed_subqueries))
                .collect();
            let predicates = nested.into_iter().map(|r| r.predicate);
            let predicate = match key.as_str() {
                "OR" => CypherExpr::or(predicates),
                "NOT" => CypherExpr::and(predicates).map(CypherExpr::not),
                _ => CypherExpr::and(predicates),
            };
            results.push(PredicateReturn {
                predicate,
                pre_computed_subqueries: subqueries,
            });
            continue;
        }

        if key.starts_with("edge") {
            let edge = edge.ok_or_else(|| {
                WhereError::invalid(key, "relationship has no properties to filter on")
            })?;
            results.push(create_where_predicate(
                ctx,
                WhereScope {
                    element: WhereElement::Edge(edge),
                    variable: edge_variable,
                    param_prefix: edge_variable,
                    use_exist_expr,
                },
                as_object(key, value)?,
            )?);
            continue;
        }

        if key.starts_with("node") || key.starts_with(node.name.as_str()) {
            let input = as_object(key, value)?;
            if only_on_without(input, node) {
                return Err(WhereError::InvalidInterfaceDisambiguation {
                    node: node.name.clone(),
                });
            }
            let nested = interface_where_for(input, node).unwrap_or_default();
            results.push(create_where_predicate(
                ctx,
                WhereScope {
                    element: WhereElement::Node(node),
                    variable: node_variable,
                    param_prefix: node_variable,
                    use_exist_expr,
                },
                &nested,
            )?);
            continue;
        }

        return Err(WhereError::invalid(
            key,
            "connection filters accept `node`, `edge`, AND, OR and NOT",
        ));
    }

    Ok(PredicateReturn::all(results))
}

/// Predicate for `<rel>Connection` keys and their quantifier suffixes
pub fn connection_predicate(
    ctx: &mut TranslationContext<'_>,
    scope: WhereScope<'_>,
    key: &str,
    field: &RelationField,
    quantifier: Quantifier,
    value: &Value,
) -> PredicateResult<PredicateReturn> {
    let schema = ctx.schema;
    let edge = match &field.properties {
        Some(name) => Some(schema.relationship_properties(name).map_err(|_| {
            WhereError::UnknownRelationship { name: name.clone() }
        })?),
        None => None,
    };

    let mut candidates = related_candidates(schema, key, field, value)?;
    if let (Ok(TargetKind::Interface(interface)), Value::Object(input)) =
        (schema.resolve_target(&field.target), value)
    {
        candidates.retain(|(node, _)| has_explicit_node_in_interface_where(input, node));
        if candidates.is_empty() {
            return Err(WhereError::InvalidInterfaceDisambiguation {
                node: interface.name.clone(),
            });
        }
    }

    let mut matches = Vec::with_capacity(candidates.len());
    for (node, input) in candidates {
        let target = ctx.fresh_var(&format!("{}_{}", scope.variable, field.field_name));
        let edge_variable = format!("{}_relationship", target);
        let pattern = related_pattern(scope.variable, field, Some(&edge_variable), &target, node);
        let inner = match input {
            Some(input) => Some(connection_where_predicate(
                ctx,
                &input,
                node,
                &target,
                edge,
                &edge_variable,
                scope.use_exist_expr,
            )?),
            None => None,
        };
        matches.push(RelatedMatch {
            pattern,
            target,
            inner,
        });
    }

    Ok(quantify(
        scope.variable,
        matches,
        quantifier,
        value.is_null(),
        scope.use_exist_expr,
    ))
}
