use graphql_cypher::auth::NoAuthorization;
use graphql_cypher::config::TranslatorConfig;
use graphql_cypher::cypher::{CypherExpr, ToCypher};
use graphql_cypher::translate::TranslationContext;
use graphql_cypher::where_clause::{
    create_where_predicate, PredicateReturn, WhereElement, WhereError, WhereScope,
};
use serde_json::{json, Value};
use test_case::test_case;

use super::movies_schema;

fn compile(where_input: Value, use_exist_expr: bool) -> Result<PredicateReturn, WhereError> {
    let schema = movies_schema();
    let config = TranslatorConfig::default();
    let mut ctx = TranslationContext::new(&schema, &NoAuthorization, &config);
    let node = schema.node("Movie").unwrap();
    create_where_predicate(
        &mut ctx,
        WhereScope {
            element: WhereElement::Node(node),
            variable: "this",
            param_prefix: "this",
            use_exist_expr,
        },
        where_input.as_object().unwrap(),
    )
}

#[test_case(json!({"title": "X"}) ; "equality")]
#[test_case(json!({"title_NOT": null}) ; "null check")]
#[test_case(json!({"released_GTE": 1999, "released_LT": 2010}) ; "range")]
#[test_case(json!({"OR": [{"title_STARTS_WITH": "The"}, {"tags_INCLUDES": "noir"}]}) ; "disjunction")]
#[test_case(json!({"NOT": {"title_IN": ["A", "B"]}}) ; "negated membership")]
#[test_case(json!({"AND": [{"plot_CONTAINS": "x"}, {"OR": [{"rating_GT": 5}]}]}) ; "nested logical")]
fn test_property_only_filters_are_pure(where_input: Value) {
    for use_exist_expr in [true, false] {
        let result = compile(where_input.clone(), use_exist_expr).unwrap();
        assert!(result.is_pure());
        assert!(result.predicate.is_some());
    }
}

#[test_case(json!({"title": "X"}) ; "single leaf")]
#[test_case(json!({"title": "X", "released": 1999}) ; "two leaves")]
fn test_not_negates_the_conjunction(inner: Value) {
    let negated = compile(json!({ "NOT": inner }), true).unwrap().predicate.unwrap();
    let conjunction = compile(inner, true).unwrap().predicate.unwrap();
    assert_eq!(negated, CypherExpr::not(conjunction));
}

#[test]
fn test_empty_logical_collapses() {
    let result = compile(json!({"AND": []}), true).unwrap();
    assert_eq!(result.predicate, None);
    assert!(result.is_pure());
}

#[test]
fn test_relationship_filter_forms() {
    let existence = compile(json!({"actors_SOME": {"name": "Keanu"}}), true).unwrap();
    assert!(existence.is_pure());
    assert!(existence.predicate.unwrap().to_cypher().starts_with("EXISTS { MATCH (this)<-[:ACTED_IN]-("));

    let size = compile(json!({"actorsConnection": {"node": {"name": "Keanu"}}}), false).unwrap();
    assert_eq!(size.pre_computed_subqueries.len(), 1);
    assert!(size.pre_computed_subqueries[0].to_cypher().starts_with("CALL {\nWITH this\n"));
}

#[test]
fn test_subqueries_keep_left_to_right_order() {
    let result = compile(
        json!({
            "genresConnection": {"node": {"name": "Drama"}},
            "actorsConnection_NOT": {"node": {"name": "Keanu"}}
        }),
        false,
    )
    .unwrap();
    let rendered: Vec<String> = result
        .pre_computed_subqueries
        .iter()
        .map(|c| c.to_cypher())
        .collect();
    assert_eq!(rendered.len(), 2);
    assert!(rendered[0].contains(":IN_GENRE"));
    assert!(rendered[1].contains(":ACTED_IN"));
}

#[test]
fn test_interface_on_without_self_is_rejected() {
    let schema = movies_schema();
    let config = TranslatorConfig::default();
    let mut ctx = TranslationContext::new(&schema, &NoAuthorization, &config);
    let actor = schema.node("Actor").unwrap();
    let err = create_where_predicate(
        &mut ctx,
        WhereScope {
            element: WhereElement::Node(actor),
            variable: "this",
            param_prefix: "this",
            use_exist_expr: true,
        },
        json!({"actedInConnection": {"node": {"_on": {"Genre": {"name": "X"}}}}})
            .as_object()
            .unwrap(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        WhereError::InvalidInterfaceDisambiguation {
            node: "Production".to_string()
        }
    );
}
