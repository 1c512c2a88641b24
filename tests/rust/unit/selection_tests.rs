use graphql_cypher::selection::{
    check_args, merge_selection, parse_selection_set, resolve_aliased_by_name, selection_from,
    synthesize_missing, ResolveTree, SelectionError,
};
use serde_json::json;
use test_case::test_case;

#[test_case(&["title", "released"], &["title"], &[] ; "all present")]
#[test_case(&["title"], &["title", "released", "plot"], &["released", "plot"] ; "some absent")]
#[test_case(&[], &["a", "a", "b"], &["a", "b"] ; "duplicates collapse")]
fn test_synthesize_missing_returns_absent_names(selected: &[&str], deps: &[&str], expected: &[&str]) {
    let selection = selection_from(selected.iter().map(|name| ResolveTree::new(*name)));
    let missing = synthesize_missing(&selection, deps);
    assert_eq!(missing.keys().map(String::as_str).collect::<Vec<_>>(), expected);
    assert!(missing
        .values()
        .all(|tree| tree.args.is_empty() && tree.fields_by_type_name.is_empty() && !tree.is_aliased()));
}

#[test]
fn test_synthesize_missing_second_pass_is_empty() {
    let mut selection = selection_from(vec![ResolveTree::new("title")]);
    let deps = ["title", "released", "plot"];
    let first = synthesize_missing(&selection, &deps);
    merge_selection(&mut selection, first).unwrap();
    assert!(synthesize_missing(&selection, &deps).is_empty());
}

#[test]
fn test_aliased_dependency_is_refetched() {
    let selection = selection_from(vec![ResolveTree::aliased("firstName", "first")]);
    assert_eq!(
        resolve_aliased_by_name(&selection, "firstName").map(|t| t.alias.as_str()),
        Some("first")
    );
    assert!(synthesize_missing(&selection, &["firstName"]).contains_key("firstName"));
}

#[test]
fn test_same_alias_same_arguments_is_accepted() {
    let tree = || {
        ResolveTree::aliased("movies", "recent")
            .with_args(json!({"options": {"limit": 2, "sort": [{"released": "DESC"}]}}))
            .with_fields("Movie", vec![ResolveTree::new("title")])
    };
    let mut selection = selection_from(vec![tree()]);
    let incoming = selection_from(vec![tree()]);
    assert!(check_args(&selection, &incoming).is_ok());
    assert!(merge_selection(&mut selection, incoming).is_ok());
    assert_eq!(selection.len(), 1);
}

#[test_case(json!({"first": 1}), json!({"first": 2}) ; "top level")]
#[test_case(json!({"where": {"title": "A"}}), json!({}) ; "missing argument")]
fn test_same_alias_different_arguments_fails(a: serde_json::Value, b: serde_json::Value) {
    let existing = selection_from(vec![ResolveTree::new("movies").with_args(a)]);
    let incoming = selection_from(vec![ResolveTree::new("movies").with_args(b)]);
    assert_eq!(
        check_args(&existing, &incoming),
        Err(SelectionError::ArgumentMismatch {
            field: "movies".to_string()
        })
    );
}

#[test]
fn test_nested_argument_mismatch_fails_at_depth() {
    let tree = |limit: u64| {
        ResolveTree::new("actors").with_fields(
            "Actor",
            vec![ResolveTree::new("movies").with_fields(
                "Movie",
                vec![ResolveTree::new("genres").with_args(json!({"options": {"limit": limit}}))],
            )],
        )
    };
    let mut selection = selection_from(vec![tree(1)]);
    let err = merge_selection(&mut selection, selection_from(vec![tree(2)])).unwrap_err();
    assert_eq!(
        err,
        SelectionError::ArgumentMismatch {
            field: "genres".to_string()
        }
    );
}

#[test]
fn test_depends_on_selection_parses_into_fields() {
    let fields = parse_selection_set("{ firstName, lastName agent { name } }").unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[2].selection[0].name, "name");
    assert!(matches!(
        parse_selection_set("{ firstName"),
        Err(SelectionError::InvalidDependsOn { .. })
    ));
}
