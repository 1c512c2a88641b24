use graphql_cypher::auth::NoAuthorization;
use graphql_cypher::config::TranslatorConfig;
use graphql_cypher::cypher::{Params, ToCypher};
use graphql_cypher::translate::{
    create_top_level_match, parse_fulltext, TopLevelMatch, TranslateError, TranslationContext,
};
use serde_json::{json, Value};
use test_case::test_case;

use super::movies_schema;

fn entry(node: &str, fulltext: Value) -> Result<(TopLevelMatch, Params), TranslateError> {
    let schema = movies_schema();
    let config = TranslatorConfig::default();
    let mut ctx = TranslationContext::new(&schema, &NoAuthorization, &config);
    let input = parse_fulltext(Some(&fulltext))?;
    let top = create_top_level_match(&mut ctx, schema.node(node)?, "this", &input)?;
    Ok((top, ctx.into_params()))
}

#[test]
fn test_two_indexes_are_rejected() {
    let err = entry(
        "Movie",
        json!({"MovieTitle": {"phrase": "a"}, "MoviePlot": {"phrase": "b"}}),
    )
    .unwrap_err();
    assert_eq!(err, TranslateError::MultipleFulltextIndex { count: 2 });
}

// (node, input, explicit threshold param, default threshold param)
#[test_case("Movie", json!({"MovieTitle": {"phrase": "matrix", "score_EQUAL": 0.9}}), Some(0.9), None ; "explicit wins")]
#[test_case("Movie", json!({"MovieTitle": {"phrase": "matrix"}}), None, Some(0.5) ; "index default")]
#[test_case("Movie", json!({"MoviePlot": {"phrase": "matrix"}}), None, None ; "no threshold")]
fn test_threshold_params(node: &str, input: Value, explicit: Option<f64>, default: Option<f64>) {
    let index = input.as_object().and_then(|o| o.keys().next().cloned()).unwrap();
    let (top, params) = entry(node, input).unwrap();
    let base = format!("this_fulltext_{}", index);

    assert_eq!(params.get(&format!("{}_phrase", base)), Some(&json!("matrix")));
    assert_eq!(params.get(&format!("{}_score_EQUAL", base)), explicit.map(|s| json!(s)).as_ref());
    assert_eq!(params.get(&format!("{}_defaultThreshold", base)), default.map(|s| json!(s)).as_ref());

    let scored = top.predicates.iter().any(|p| p.to_cypher().starts_with("score = $"));
    assert_eq!(scored, explicit.is_some() || default.is_some());
}

#[test]
fn test_additional_labels_are_rechecked() {
    let (top, _) = entry("Series", json!({"SeriesTitle": {"phrase": "office"}})).unwrap();
    let rendered: Vec<String> = top.predicates.iter().map(|p| p.to_cypher()).collect();
    assert_eq!(
        rendered,
        vec!["\"Series\" IN labels(this)", "\"Show\" IN labels(this)"]
    );
}

#[test]
fn test_no_fulltext_matches_labels() {
    let (top, params) = entry("Series", json!({})).unwrap();
    assert_eq!(top.clause.to_cypher(), "MATCH (this:Series:Show)");
    assert!(top.predicates.is_empty());
    assert!(params.is_empty());
}
