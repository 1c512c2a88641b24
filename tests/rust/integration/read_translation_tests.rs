use graphql_cypher::auth::{NoAuthorization, RoleAuthorization};
use graphql_cypher::config::TranslatorConfig;
use graphql_cypher::graph_catalog::{GraphSchemaConfig, GraphSchemaError};
use graphql_cypher::selection::{ResolveTree, SelectionError};
use graphql_cypher::{translate_read, AccessMode, TranslateError};
use serde_json::json;

use super::load_movies_schema;

fn resolve_tree(value: serde_json::Value) -> ResolveTree {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_concrete_read_properties() {
    let schema = load_movies_schema();
    let tree = resolve_tree(json!({
        "name": "movies",
        "alias": "movies",
        "args": {"where": {"title": "X"}, "options": {"limit": 5, "sort": [{"title": "ASC"}]}},
        "fieldsByTypeName": {"Movie": {"title": {"name": "title", "alias": "title"}}}
    }));
    let query = translate_read(&schema, &NoAuthorization, &TranslatorConfig::default(), &tree, "Movie")
        .unwrap();

    assert_eq!(query.cypher.matches("LIMIT").count(), 1);
    assert_eq!(query.cypher.matches("ORDER BY this.title ASC").count(), 1);
    assert_eq!(query.params.get("this_limit"), Some(&json!(5)));
    assert_eq!(query.access_mode, AccessMode::Read);
}

#[test]
fn test_union_read_properties() {
    let schema = load_movies_schema();
    let tree = resolve_tree(json!({
        "name": "search",
        "alias": "search",
        "args": {"options": {"limit": 10, "offset": 0}},
        "fieldsByTypeName": {
            "Genre": {"name": {"name": "name", "alias": "name"}},
            "Movie": {"title": {"name": "title", "alias": "title"}}
        }
    }));
    let query = translate_read(&schema, &NoAuthorization, &TranslatorConfig::default(), &tree, "Search")
        .unwrap();
    let cypher = &query.cypher;

    assert_eq!(cypher.matches("UNION").count(), 1);
    let (first, second) = cypher.split_once("\nUNION\n").unwrap();
    assert!(first.contains("MATCH (this:Genre)"));
    assert!(second.contains("MATCH (this:Movie)"));
    assert_eq!(cypher.matches("LIMIT").count(), 1);
    assert_eq!(cypher.matches("SKIP").count(), 1);
    let merged = cypher.find("\n}\n").unwrap();
    assert!(cypher.find("SKIP").unwrap() > merged);
    assert!(cypher.find("LIMIT").unwrap() > merged);
}

#[test]
fn test_nested_selection_read() {
    let schema = load_movies_schema();
    let tree = resolve_tree(json!({
        "name": "actors",
        "alias": "actors",
        "args": {"where": {"movies_SOME": {"released_GT": 2000}}},
        "fieldsByTypeName": {"Actor": {
            "name": {"name": "name", "alias": "name"},
            "fullName": {"name": "fullName", "alias": "fullName"},
            "recent": {
                "name": "movies",
                "alias": "recent",
                "args": {"options": {"limit": 1, "sort": [{"released": "DESC"}]}},
                "fieldsByTypeName": {"Movie": {"title": {"name": "title", "alias": "title"}}}
            }
        }}
    }));
    let query = translate_read(&schema, &NoAuthorization, &TranslatorConfig::default(), &tree, "Actor")
        .unwrap();
    assert_eq!(
        query.cypher,
        "MATCH (this:Actor)\n\
         WHERE EXISTS { MATCH (this)-[:ACTED_IN]->(this_movies0:Movie) WHERE this_movies0.released > $this_movies0_released_GT }\n\
         WITH this { .name, recent: apoc.coll.sortMulti([(this)-[:ACTED_IN]->(this_recent:Movie) | this_recent { .title, .released }], [\"released\"])[..1], .firstName, .lastName } AS this\n\
         RETURN this"
    );
}

#[test]
fn test_conflicting_aliases_abort_translation() {
    let schema = GraphSchemaConfig::from_yaml_str(&super::MOVIES_YAML.replace(
        "depends_on: \"{ firstName lastName }\"",
        "depends_on: \"{ movies(options: { limit: 1 }) { title } }\"",
    ))
    .and_then(|config| config.to_graph_schema())
    .unwrap();
    let tree = resolve_tree(json!({
        "name": "actors",
        "alias": "actors",
        "fieldsByTypeName": {"Actor": {
            "fullName": {"name": "fullName", "alias": "fullName"},
            "movies": {
                "name": "movies",
                "alias": "movies",
                "args": {"options": {"limit": 3}},
                "fieldsByTypeName": {"Movie": {"title": {"name": "title", "alias": "title"}}}
            }
        }}
    }));
    let err = translate_read(&schema, &NoAuthorization, &TranslatorConfig::default(), &tree, "Actor")
        .unwrap_err();
    assert_eq!(
        err,
        TranslateError::Selection(SelectionError::ArgumentMismatch {
            field: "movies".to_string()
        })
    );
}

#[test]
fn test_custom_base_variable() {
    let schema = load_movies_schema();
    let config = TranslatorConfig {
        base_variable: "root".to_string(),
        ..Default::default()
    };
    let tree = resolve_tree(json!({
        "name": "genres",
        "alias": "genres",
        "args": {"where": {"name": "Drama"}},
        "fieldsByTypeName": {"Genre": {"name": {"name": "name", "alias": "name"}}}
    }));
    let query = translate_read(&schema, &NoAuthorization, &config, &tree, "Genre").unwrap();
    assert_eq!(
        query.cypher,
        "MATCH (root:Genre)\nWHERE root.name = $root_name\nWITH root { .name } AS root\nRETURN root"
    );
}

#[test]
fn test_role_rules_from_yaml() -> anyhow::Result<()> {
    let schema = load_movies_schema();
    let auth: RoleAuthorization = serde_yaml::from_str(
        r#"
roles: [viewer]
jwt: { sub: "user-1" }
rules:
  Actor:
    - { kind: owner, property: id, claim: sub }
"#,
    )?;
    let tree = resolve_tree(json!({
        "name": "actors",
        "alias": "actors",
        "fieldsByTypeName": {"Actor": {"name": {"name": "name", "alias": "name"}}}
    }));
    let query = translate_read(&schema, &auth, &TranslatorConfig::default(), &tree, "Actor")?;
    assert!(query.cypher.contains("WHERE this.id = $auth.jwt.sub\n"));
    assert_eq!(
        query.params.get("auth"),
        Some(&json!({"isAuthenticated": true, "roles": ["viewer"], "jwt": {"sub": "user-1"}}))
    );
    Ok(())
}

#[test]
fn test_invalid_schema_is_rejected_on_load() {
    let yaml = r#"
graph_schema:
  nodes:
    - name: Movie
      relationships:
        - { field_name: actors, type: ACTED_IN, direction: IN, target: Actor, is_list: true }
"#;
    let err = GraphSchemaConfig::from_yaml_str(yaml)
        .and_then(|config| config.to_graph_schema())
        .unwrap_err();
    assert!(matches!(err, GraphSchemaError::InvalidRelationshipTarget { .. }));
}
