use serde_json::{Map, Value};

use super::compiler::create_where_predicate;
use super::connection::interface_where_for;
use super::errors::WhereError;
use super::key::{Quantifier, WhereElement};
use super::{as_object, PredicateResult, PredicateReturn, WhereScope};
use crate::cypher::{
    Clause, CypherExpr, ExistsSubquery, NodePattern, Operator, Pattern, ProjectionItem,
    RelationshipPattern,
};
use crate::graph_catalog::{GraphSchema, NodeSchema, RelationField, TargetKind};
use crate::translate::context::TranslationContext;

/// One concrete node type a relationship filter ranges over
pub(crate) struct RelatedMatch {
    pub pattern: Pattern,
    pub target: String,
    /// `None` when the filter value was `null` (presence check only)
    pub inner: Option<PredicateReturn>,
}

/// `(<parent>)-[<edge>:TYPE]->(<target>:Label)`
pub(crate) fn related_pattern(
    parent: &str,
    field: &RelationField,
    edge: Option<&str>,
    target: &str,
    node: &NodeSchema,
) -> Pattern {
    Pattern::related(
        NodePattern::unlabeled(parent),
        RelationshipPattern {
            variable: edge.map(str::to_string),
            rel_type: field.rel_type.clone(),
            direction: field.direction,
        },
        NodePattern::new(target, node.label_string()),
    )
}

/// Concrete node types a relationship value filters, each with its own where
/// input. Union values are keyed by member type; interface values may carry
/// `_on` blocks.
pub(crate) fn related_candidates<'s>(
    schema: &'s GraphSchema,
    key: &str,
    field: &RelationField,
    value: &Value,
) -> PredicateResult<Vec<(&'s NodeSchema, Option<Map<String, Value>>)>> {
    let target = schema
        .resolve_target(&field.target)
        .map_err(|_| WhereError::UnknownNode {
            name: field.target.clone(),
        })?;

    match target {
        TargetKind::Node(node) => {
            let input = match value {
                Value::Null => None,
                other => Some(as_object(key, other)?.clone()),
            };
            Ok(vec![(node, input)])
        }
        TargetKind::Union(union) => {
            let members = schema
                .union_members(&union.name)
                .map_err(|_| WhereError::UnknownNode {
                    name: union.name.clone(),
                })?;
            if value.is_null() {
                return Ok(members.into_iter().map(|m| (m, None)).collect());
            }
            let by_type = as_object(key, value)?;
            by_type
                .iter()
                .map(|(type_name, input)| {
                    let member = members
                        .iter()
                        .find(|m| &m.name == type_name)
                        .ok_or_else(|| {
                            WhereError::invalid(
                                key,
                                format!("`{}` is not a member of `{}`", type_name, union.name),
                            )
                        })?;
                    Ok((*member, Some(as_object(key, input)?.clone())))
                })
                .collect()
        }
        TargetKind::Interface(interface) => {
            let implementations = schema.implementations(&interface.name);
            if value.is_null() {
                return Ok(implementations.into_iter().map(|n| (n, None)).collect());
            }
            let input = as_object(key, value)?;
            let candidates: Vec<_> = implementations
                .into_iter()
                .filter_map(|node| interface_where_for(input, node).map(|w| (node, Some(w))))
                .collect();
            if candidates.is_empty() {
                return Err(WhereError::InvalidInterfaceDisambiguation {
                    node: interface.name.clone(),
                });
            }
            Ok(candidates)
        }
    }
}

/// Normalizes `null` handling: a bare `null` asks for no related nodes and
/// `_NOT: null` for at least one
fn effective_quantifier(quantifier: Quantifier, is_null: bool) -> Quantifier {
    match (quantifier, is_null) {
        (Quantifier::Bare, false) => Quantifier::Some,
        (Quantifier::Not, false) => Quantifier::None,
        (Quantifier::Bare, true) => Quantifier::None,
        (Quantifier::Not, true) => Quantifier::Some,
        (other, _) => other,
    }
}

fn exists(pattern: &Pattern, subqueries: Vec<Clause>, predicate: Option<CypherExpr>) -> CypherExpr {
    CypherExpr::Exists(Box::new(ExistsSubquery {
        pattern: pattern.clone(),
        subqueries,
        predicate,
    }))
}

fn existence_form(matches: Vec<RelatedMatch>, quantifier: Quantifier) -> PredicateReturn {
    let predicate = match quantifier {
        Quantifier::Some | Quantifier::Bare | Quantifier::None | Quantifier::Not => {
            let any = CypherExpr::or(matches.into_iter().map(|m| {
                let inner = m.inner.unwrap_or_default();
                Some(exists(&m.pattern, inner.pre_computed_subqueries, inner.predicate))
            }));
            if quantifier.is_negative() {
                any.map(CypherExpr::not)
            } else {
                any
            }
        }
        Quantifier::All => {
            let mut any_related = Vec::new();
            let mut any_failing = Vec::new();
            for m in matches {
                let inner = m.inner.unwrap_or_default();
                let Some(predicate) = inner.predicate else {
                    continue;
                };
                any_related.push(Some(exists(&m.pattern, vec![], None)));
                any_failing.push(Some(exists(
                    &m.pattern,
                    inner.pre_computed_subqueries,
                    Some(CypherExpr::not(predicate)),
                )));
            }
            CypherExpr::and(vec![
                CypherExpr::or(any_related),
                CypherExpr::or(any_failing).map(CypherExpr::not),
            ])
        }
        Quantifier::Single => {
            let counts = matches
                .into_iter()
                .map(|m| {
                    let inner = m.inner.unwrap_or_default();
                    CypherExpr::Count(Box::new(ExistsSubquery {
                        pattern: m.pattern,
                        subqueries: inner.pre_computed_subqueries,
                        predicate: inner.predicate,
                    }))
                })
                .collect();
            CypherExpr::sum(counts).map(|sum| CypherExpr::eq(sum, CypherExpr::integer(1)))
        }
    };
    PredicateReturn {
        predicate,
        pre_computed_subqueries: Vec::new(),
    }
}

/// `CALL { WITH parent MATCH pattern ... RETURN count(target) AS <target>_count }`
fn count_subquery(
    parent: &str,
    pattern: Pattern,
    target: &str,
    filter: PredicateReturn,
) -> (Clause, String) {
    let count_var = format!("{}_count", target);
    let mut body = vec![Clause::Match(pattern)];
    body.extend(filter.into_clauses());
    body.push(Clause::Return(vec![ProjectionItem::aliased(
        CypherExpr::function("count", vec![CypherExpr::variable(target)]),
        count_var.clone(),
    )]));
    (
        Clause::Call {
            imports: vec![parent.to_string()],
            body,
        },
        count_var,
    )
}

fn size_form(parent: &str, matches: Vec<RelatedMatch>, quantifier: Quantifier) -> PredicateReturn {
    let mut subqueries = Vec::new();
    let mut counts = Vec::new();
    for m in matches {
        let inner = m.inner.unwrap_or_default();
        let filter = if quantifier == Quantifier::All {
            // rows failing the filter
            match inner.predicate {
                Some(predicate) => PredicateReturn {
                    predicate: Some(CypherExpr::not(predicate)),
                    pre_computed_subqueries: inner.pre_computed_subqueries,
                },
                None => continue,
            }
        } else {
            inner
        };
        let (subquery, count_var) = count_subquery(parent, m.pattern, &m.target, filter);
        subqueries.push(subquery);
        counts.push(CypherExpr::variable(count_var));
    }

    let compare = |operator: Operator, count: CypherExpr, n: i64| {
        CypherExpr::binary(operator, count, CypherExpr::integer(n))
    };
    let predicate = match quantifier {
        Quantifier::Some | Quantifier::Bare => CypherExpr::or(
            counts
                .into_iter()
                .map(|c| Some(compare(Operator::GreaterThan, c, 0))),
        ),
        Quantifier::None | Quantifier::Not | Quantifier::All => CypherExpr::and(
            counts
                .into_iter()
                .map(|c| Some(compare(Operator::Equal, c, 0))),
        ),
        Quantifier::Single => {
            CypherExpr::sum(counts).map(|sum| compare(Operator::Equal, sum, 1))
        }
    };
    PredicateReturn {
        predicate,
        pre_computed_subqueries: subqueries,
    }
}

/// Combine per-type matches under a quantifier in the requested form
pub(crate) fn quantify(
    parent: &str,
    matches: Vec<RelatedMatch>,
    quantifier: Quantifier,
    is_null: bool,
    use_exist_expr: bool,
) -> PredicateReturn {
    let quantifier = effective_quantifier(quantifier, is_null);
    if use_exist_expr {
        existence_form(matches, quantifier)
    } else {
        size_form(parent, matches, quantifier)
    }
}

/// Predicate for `<rel>`, `<rel>_NOT`, `<rel>_SOME`, `<rel>_NONE`, `<rel>_ALL`
/// and `<rel>_SINGLE`
pub fn relationship_predicate(
    ctx: &mut TranslationContext<'_>,
    scope: WhereScope<'_>,
    key: &str,
    field: &RelationField,
    quantifier: Quantifier,
    value: &Value,
) -> PredicateResult<PredicateReturn> {
    let schema = ctx.schema;
    let candidates = related_candidates(schema, key, field, value)?;

    let mut matches = Vec::with_capacity(candidates.len());
    for (node, input) in candidates {
        let target = ctx.fresh_var(&format!("{}_{}", scope.variable, field.field_name));
        let pattern = related_pattern(scope.variable, field, None, &target, node);
        let inner = match input {
            Some(input) => Some(create_where_predicate(
                ctx,
                WhereScope {
                    element: WhereElement::Node(node),
                    variable: &target,
                    param_prefix: &target,
                    use_exist_expr: scope.use_exist_expr,
                },
                &input,
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
