use graphql_cypher::auth::NoAuthorization;
use graphql_cypher::config::TranslatorConfig;
use graphql_cypher::execution::{ExecutionError, Record};
use graphql_cypher::selection::ResolveTree;
use graphql_cypher::{resolve_read, AccessMode, StatementExecutor, TranslatedQuery};
use mockall::mock;
use mockall::predicate::function;
use serde_json::{json, Value};

use super::load_movies_schema;

mock! {
    pub Driver {}
    impl StatementExecutor for Driver {
        fn execute(&self, query: &TranslatedQuery) -> Result<Vec<Record>, ExecutionError>;
    }
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn movies_by_title(title: &str) -> ResolveTree {
    ResolveTree::new("movies")
        .with_args(json!({"where": {"title": title}}))
        .with_fields("Movie", vec![ResolveTree::new("title"), ResolveTree::new("released")])
}

#[test]
fn test_executor_receives_statement_and_params() {
    let schema = load_movies_schema();
    let mut driver = MockDriver::new();
    driver
        .expect_execute()
        .with(function(|query: &TranslatedQuery| {
            query.access_mode == AccessMode::Read
                && query.params.get("this_title") == Some(&json!("Heat"))
                && query.cypher.ends_with("WITH this { .title, .released } AS this\nRETURN this")
        }))
        .times(1)
        .returning(|_| {
            Ok(vec![
                record(json!({"this": {"title": "Heat", "released": 1995}})),
                record(json!({"this": {"title": "Heat", "released": 1986}})),
            ])
        });

    let rows = resolve_read(
        &driver,
        &schema,
        &NoAuthorization,
        &TranslatorConfig::default(),
        &movies_by_title("Heat"),
        "Movie",
    )
    .unwrap();
    assert_eq!(
        rows,
        vec![
            json!({"title": "Heat", "released": 1995}),
            json!({"title": "Heat", "released": 1986})
        ]
    );
}

#[test]
fn test_store_errors_are_not_reinterpreted() {
    let schema = load_movies_schema();
    let mut driver = MockDriver::new();
    driver
        .expect_execute()
        .returning(|_| Err(ExecutionError::Executor("Neo.ClientError.Security.Forbidden".to_string())));

    let err = resolve_read(
        &driver,
        &schema,
        &NoAuthorization,
        &TranslatorConfig::default(),
        &movies_by_title("Heat"),
        "Movie",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::Executor(message) if message == "Neo.ClientError.Security.Forbidden"
    ));
}

#[test]
fn test_records_are_read_from_the_base_variable() {
    let schema = load_movies_schema();
    let config = TranslatorConfig {
        base_variable: "root".to_string(),
        ..Default::default()
    };
    let mut driver = MockDriver::new();
    driver
        .expect_execute()
        .returning(|_| Ok(vec![record(json!({"root": {"title": "Ronin"}}))]));

    let rows = resolve_read(
        &driver,
        &schema,
        &NoAuthorization,
        &config,
        &movies_by_title("Ronin"),
        "Movie",
    )
    .unwrap();
    assert_eq!(rows, vec![json!({"title": "Ronin"})]);
}
