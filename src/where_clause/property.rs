use serde_json::Value;

use super::errors::WhereError;
use super::key::PropertyOperator;
use super::{PredicateResult, WhereScope};
use crate::cypher::{CypherExpr, Operator};
use crate::graph_catalog::PrimitiveField;
use crate::translate::context::TranslationContext;

fn point(param: &str) -> CypherExpr {
    CypherExpr::function("point", vec![CypherExpr::param(param)])
}

/// Predicate for one property comparison key, binding `value` as a parameter
pub fn property_predicate(
    ctx: &mut TranslationContext<'_>,
    scope: WhereScope<'_>,
    key: &str,
    field: &PrimitiveField,
    operator: PropertyOperator,
    value: &Value,
) -> PredicateResult<CypherExpr> {
    let property = CypherExpr::property(scope.variable, field.db_name());

    if value.is_null() {
        return match operator {
            PropertyOperator::Equal => Ok(CypherExpr::unary(Operator::IsNull, property)),
            PropertyOperator::Not => Ok(CypherExpr::unary(Operator::IsNotNull, property)),
            _ => Err(WhereError::invalid(key, "null is only allowed for equality")),
        };
    }

    if operator == PropertyOperator::Matches && !ctx.config.enable_regex {
        return Err(WhereError::RegexDisabled {
            key: key.to_string(),
        });
    }

    let param = ctx.bind(&format!("{}_{}", scope.param_prefix, key), value.clone());
    let spatial = field.field_type.is_spatial();

    let predicate = match operator {
        PropertyOperator::Equal | PropertyOperator::Not => {
            let right = if spatial {
                point(&param)
            } else {
                CypherExpr::param(&param)
            };
            let equal = CypherExpr::eq(property, right);
            if operator == PropertyOperator::Not {
                CypherExpr::not(equal)
            } else {
                equal
            }
        }
        PropertyOperator::In | PropertyOperator::NotIn => {
            let list = if spatial {
                CypherExpr::ListComprehension {
                    variable: "p".to_string(),
                    list: Box::new(CypherExpr::param(&param)),
                    projection: Box::new(CypherExpr::function(
                        "point",
                        vec![CypherExpr::variable("p")],
                    )),
                }
            } else {
                CypherExpr::param(&param)
            };
            let membership = CypherExpr::binary(Operator::In, property, list);
            if operator == PropertyOperator::NotIn {
                CypherExpr::not(membership)
            } else {
                membership
            }
        }
        PropertyOperator::LessThan
        | PropertyOperator::LessThanEqual
        | PropertyOperator::GreaterThan
        | PropertyOperator::GreaterThanEqual => {
            let comparison = match operator {
                PropertyOperator::LessThan => Operator::LessThan,
                PropertyOperator::LessThanEqual => Operator::LessThanEqual,
                PropertyOperator::GreaterThan => Operator::GreaterThan,
                _ => Operator::GreaterThanEqual,
            };
            if spatial {
                // { point, distance } input
                let distance = CypherExpr::function(
                    "point.distance",
                    vec![
                        property,
                        CypherExpr::function(
                            "point",
                            vec![CypherExpr::raw(format!("${}.point", param))],
                        ),
                    ],
                );
                CypherExpr::binary(
                    comparison,
                    distance,
                    CypherExpr::raw(format!("${}.distance", param)),
                )
            } else {
                CypherExpr::binary(comparison, property, CypherExpr::param(&param))
            }
        }
        PropertyOperator::Contains | PropertyOperator::NotContains => {
            let contains = CypherExpr::binary(Operator::Contains, property, CypherExpr::param(&param));
            if operator == PropertyOperator::NotContains {
                CypherExpr::not(contains)
            } else {
                contains
            }
        }
        PropertyOperator::StartsWith | PropertyOperator::NotStartsWith => {
            let starts = CypherExpr::binary(Operator::StartsWith, property, CypherExpr::param(&param));
            if operator == PropertyOperator::NotStartsWith {
                CypherExpr::not(starts)
            } else {
                starts
            }
        }
        PropertyOperator::EndsWith | PropertyOperator::NotEndsWith => {
            let ends = CypherExpr::binary(Operator::EndsWith, property, CypherExpr::param(&param));
            if operator == PropertyOperator::NotEndsWith {
                CypherExpr::not(ends)
            } else {
                ends
            }
        }
        PropertyOperator::Matches => {
            CypherExpr::binary(Operator::RegexMatch, property, CypherExpr::param(&param))
        }
        PropertyOperator::Includes | PropertyOperator::NotIncludes => {
            let item = if spatial {
                point(&param)
            } else {
                CypherExpr::param(&param)
            };
            let includes = CypherExpr::binary(Operator::In, item, property);
            if operator == PropertyOperator::NotIncludes {
                CypherExpr::not(includes)
            } else {
                includes
            }
        }
    };

    Ok(predicate)
}
