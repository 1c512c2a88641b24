//! Relay-style connection fields.
//!
//! A connection is answered by one correlated subquery returning
//! `{ edges, totalCount }` under the field's result variable. Each edge maps
//! the related node (`node`) and the relationship properties selected on the
//! edge; `cursor` is derived from the edge's position.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{
    create_sub_clauses, flatten_fields, primitive_item, project_node, related_filter,
    sub_result_variable, validate_predicate,
};
use crate::cypher::{
    Clause, CypherExpr, MapProjectionItem, OrderByItem, ProjectionItem, SortDirection,
};
use crate::graph_catalog::{GraphSchema, NodeSchema, RelationField, TargetKind};
use crate::selection::{resolve_by_name, ResolveTree, Selection};
use crate::translate::context::TranslationContext;
use crate::translate::errors::TranslateError;
use crate::where_clause::relationship::related_pattern;
use crate::where_clause::{connection_where_predicate, has_explicit_node_in_interface_where, PredicateReturn};

/// One `sort` directive of a connection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConnectionSort {
    node: IndexMap<String, SortDirection>,
    edge: IndexMap<String, SortDirection>,
}

type Candidate<'s> = (&'s NodeSchema, Option<Map<String, Value>>);

/// Concrete node types behind the connection, each with its own filter
fn connection_candidates<'s>(
    schema: &'s GraphSchema,
    field: &RelationField,
    where_input: Option<&Map<String, Value>>,
) -> Result<Vec<Candidate<'s>>, TranslateError> {
    let candidates = match schema.resolve_target(&field.target)? {
        TargetKind::Node(node) => vec![(node, where_input.cloned())],
        TargetKind::Union(union) => schema
            .union_members(&union.name)?
            .into_iter()
            .filter_map(|member| match where_input {
                None => Some((member, None)),
                Some(by_type) => by_type
                    .get(&member.name)
                    .and_then(Value::as_object)
                    .map(|input| (member, Some(input.clone()))),
            })
            .collect(),
        TargetKind::Interface(interface) => schema
            .implementations(&interface.name)
            .into_iter()
            .filter(|node| where_input.is_none_or(|w| has_explicit_node_in_interface_where(w, node)))
            .map(|node| (node, where_input.cloned()))
            .collect(),
    };
    if candidates.is_empty() {
        return Err(TranslateError::NoCandidateTypes {
            type_name: field.target.clone(),
        });
    }
    Ok(candidates)
}

fn entry(item: MapProjectionItem, variable: &str) -> (String, CypherExpr) {
    match item {
        MapProjectionItem::Property(key) => {
            let value = CypherExpr::property(variable, key.as_str());
            (key, value)
        }
        MapProjectionItem::Entry(key, value) => (key, value),
    }
}

fn cursor_edges() -> CypherExpr {
    CypherExpr::raw(
        "[idx IN range(0, size(edges) - 1) | apoc.map.merge(edges[idx], { cursor: \"arrayconnection:\" + toString(idx) })]",
    )
}

/// `CALL { ... RETURN { edges: ..., totalCount: ... } AS <var>_<alias> }`
pub fn create_connection_and_params(
    ctx: &mut TranslationContext<'_>,
    tree: &ResolveTree,
    field: &RelationField,
    node_variable: &str,
) -> Result<Clause, TranslateError> {
    let schema = ctx.schema;
    let result_variable = sub_result_variable(node_variable, &tree.alias);
    let edge_variable = format!("{}_relationship", result_variable);
    let edge_schema = match &field.properties {
        Some(name) => Some(schema.relationship_properties(name)?),
        None => None,
    };

    let sort: Vec<ConnectionSort> = match tree.arg("sort") {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| TranslateError::invalid_argument("sort", e.to_string()))?,
        None => Vec::new(),
    };
    let first = match tree.arg("first") {
        Some(value) => Some(value.as_u64().ok_or_else(|| {
            TranslateError::invalid_argument("first", "expected a non-negative integer")
        })?),
        None => None,
    };
    let where_input = match tree.arg("where") {
        Some(value) => Some(value.as_object().ok_or_else(|| {
            TranslateError::invalid_argument("where", "expected an input object")
        })?),
        None => None,
    }
    .filter(|input| !input.is_empty());

    let connection = flatten_fields(tree)?;
    let edges = match resolve_by_name(&connection, "edges") {
        Some(edges) => flatten_fields(edges)?,
        None => Selection::new(),
    };
    let with_cursor = resolve_by_name(&edges, "cursor").is_some();
    let node_sort: Vec<String> = sort.iter().flat_map(|s| s.node.keys().cloned()).collect();
    let edge_sort: Vec<String> = sort.iter().flat_map(|s| s.edge.keys().cloned()).collect();
    let sort_only_node = ResolveTree::new("node");
    let node_tree = resolve_by_name(&edges, "node")
        .or_else(|| (!node_sort.is_empty()).then_some(&sort_only_node));

    let is_abstract = !matches!(schema.resolve_target(&field.target)?, TargetKind::Node(_));
    let candidates = connection_candidates(schema, field, where_input)?;
    log::trace!(
        "connection `{}` over {} candidate type(s)",
        tree.alias,
        candidates.len()
    );

    let mut branches = Vec::with_capacity(candidates.len());
    for (node, input) in candidates {
        let target_variable = if is_abstract {
            format!("{}_{}", result_variable, node.name)
        } else {
            format!("{}_node", result_variable)
        };
        let pattern = related_pattern(
            node_variable,
            field,
            Some(&edge_variable),
            &target_variable,
            node,
        );
        let filter = match &input {
            Some(input) => connection_where_predicate(
                ctx,
                input,
                node,
                &target_variable,
                edge_schema,
                &edge_variable,
                false,
            )?,
            None => PredicateReturn::default(),
        };
        let guards = related_filter(ctx, node, &target_variable, None, false)?;

        let mut entries = Vec::new();
        let mut nested_clauses = Vec::new();
        let mut field_guards = None;
        if let Some(node_tree) = node_tree {
            let projection =
                project_node(ctx, node_tree, node, &target_variable, is_abstract, &node_sort)?;
            nested_clauses = create_sub_clauses(ctx, node, &target_variable, &projection.meta)?;
            nested_clauses.extend(projection.subqueries);
            let error = ctx.config.forbidden_error.clone();
            field_guards = validate_predicate(projection.meta.auth_validate_strs, &error);
            entries.push(("node".to_string(), projection.expression));
        }
        if let Some(edge_schema) = edge_schema {
            for (alias, selected) in &edges {
                if let Some(property) = edge_schema.primitive_field(&selected.name) {
                    entries.push(entry(primitive_item(&edge_variable, alias, property), &edge_variable));
                }
            }
            for name in &edge_sort {
                let selected = edges.get(name).is_some_and(|t| &t.name == name);
                if let (false, Some(property)) = (selected, edge_schema.primitive_field(name)) {
                    entries.push((
                        name.clone(),
                        CypherExpr::property(&edge_variable, property.db_name()),
                    ));
                }
            }
        }

        let mut branch = vec![Clause::Match(pattern)];
        let mut filter = PredicateReturn::all([filter, guards]);
        filter.predicate = CypherExpr::and(vec![filter.predicate, field_guards]);
        branch.extend(filter.into_clauses());
        branch.extend(nested_clauses);
        branch.push(Clause::With(vec![ProjectionItem::aliased(
            CypherExpr::map(entries),
            "edge",
        )]));
        if is_abstract {
            branch.insert(0, Clause::With(vec![ProjectionItem::bare(CypherExpr::variable(node_variable))]));
            branch.push(Clause::Return(vec![ProjectionItem::bare(CypherExpr::variable("edge"))]));
        }
        branches.push(branch);
    }

    let mut body = match (is_abstract, branches.pop()) {
        (false, Some(branch)) => branch,
        (_, last) => {
            branches.extend(last);
            vec![Clause::Call {
                imports: vec![],
                body: vec![Clause::Union(branches)],
            }]
        }
    };

    if !sort.is_empty() {
        body.push(Clause::With(vec![ProjectionItem::bare(CypherExpr::variable("edge"))]));
        let items = sort
            .iter()
            .flat_map(|directive| {
                let node = directive.node.iter().map(|(f, d)| OrderByItem {
                    expression: CypherExpr::property("edge.node", f.as_str()),
                    direction: *d,
                });
                let edge = directive.edge.iter().map(|(f, d)| OrderByItem {
                    expression: CypherExpr::property("edge", f.as_str()),
                    direction: *d,
                });
                node.chain(edge).collect::<Vec<_>>()
            })
            .collect();
        body.push(Clause::OrderBy(items));
    }

    body.push(Clause::With(vec![ProjectionItem::aliased(
        CypherExpr::function("collect", vec![CypherExpr::variable("edge")]),
        "edges",
    )]));
    let edges_item = match first {
        Some(first) => {
            let param = ctx.bind(&format!("{}_first", result_variable), json!(first));
            ProjectionItem::aliased(
                CypherExpr::slice(CypherExpr::variable("edges"), None, Some(CypherExpr::param(param))),
                "edges",
            )
        }
        None => ProjectionItem::bare(CypherExpr::variable("edges")),
    };
    body.push(Clause::With(vec![
        ProjectionItem::aliased(
            CypherExpr::function("size", vec![CypherExpr::variable("edges")]),
            "totalCount",
        ),
        edges_item,
    ]));
    let returned_edges = if with_cursor {
        cursor_edges()
    } else {
        CypherExpr::variable("edges")
    };
    body.push(Clause::Return(vec![ProjectionItem::aliased(
        CypherExpr::map(vec![
            ("edges".to_string(), returned_edges),
            ("totalCount".to_string(), CypherExpr::variable("totalCount")),
        ]),
        result_variable,
    )]));

    Ok(Clause::Call {
        imports: vec![node_variable.to_string()],
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoAuthorization;
    use crate::config::TranslatorConfig;
    use crate::cypher::ToCypher;
    use crate::graph_catalog::testing::movies_schema;
    use crate::where_clause::WhereError;

    fn connection_tree(alias: &str, name: &str, args: Value, edges: Vec<ResolveTree>) -> ResolveTree {
        ResolveTree::aliased(name, alias).with_args(args).with_fields(
            "Connection",
            vec![
                ResolveTree::new("totalCount"),
                ResolveTree::new("edges").with_fields("Relationship", edges),
            ],
        )
    }

    fn translate(node: &str, tree: &ResolveTree) -> Result<(String, crate::cypher::Params), TranslateError> {
        let schema = movies_schema();
        let config = TranslatorConfig::default();
        let mut ctx = TranslationContext::new(&schema, &NoAuthorization, &config);
        let node = schema.node(node)?;
        let field = node.connection_field(&tree.name).unwrap();
        let clause = create_connection_and_params(&mut ctx, tree, field, "this")?;
        Ok((clause.to_cypher(), ctx.into_params()))
    }

    #[test]
    fn test_connection_with_edge_properties_and_filter() {
        let tree = connection_tree(
            "actorsConnection",
            "actorsConnection",
            json!({"where": {"node": {"name": "Keanu"}, "edge": {"screenTime_GT": 10}}, "first": 5}),
            vec![
                ResolveTree::new("screenTime"),
                ResolveTree::new("node").with_fields("Actor", vec![ResolveTree::new("name")]),
            ],
        );
        let (cypher, params) = translate("Movie", &tree).unwrap();
        assert_eq!(
            cypher,
            "CALL {\n\
             WITH this\n\
             MATCH (this)<-[this_actorsConnection_relationship:ACTED_IN]-(this_actorsConnection_node:Actor)\n\
             WHERE (this_actorsConnection_node.name = $this_actorsConnection_node_name AND this_actorsConnection_relationship.screenTime > $this_actorsConnection_relationship_screenTime_GT)\n\
             WITH { node: this_actorsConnection_node { .name }, screenTime: this_actorsConnection_relationship.screenTime } AS edge\n\
             WITH collect(edge) AS edges\n\
             WITH size(edges) AS totalCount, edges[..$this_actorsConnection_first] AS edges\n\
             RETURN { edges: edges, totalCount: totalCount } AS this_actorsConnection\n\
             }"
        );
        assert_eq!(params.get("this_actorsConnection_first"), Some(&json!(5)));
    }

    #[test]
    fn test_connection_sort_and_cursor() {
        let tree = connection_tree(
            "credits",
            "actorsConnection",
            json!({"sort": [{"node": {"name": "ASC"}}, {"edge": {"screenTime": "DESC"}}]}),
            vec![
                ResolveTree::new("cursor"),
                ResolveTree::new("node").with_fields("Actor", vec![ResolveTree::new("id")]),
            ],
        );
        let (cypher, _) = translate("Movie", &tree).unwrap();
        assert!(cypher.contains(
            "WITH { node: this_credits_node { .id, .name }, screenTime: this_credits_relationship.screenTime } AS edge\nWITH edge\nORDER BY edge.node.name ASC, edge.screenTime DESC\nWITH collect(edge) AS edges\nWITH size(edges) AS totalCount, edges\n"
        ));
        assert!(cypher.contains("apoc.map.merge(edges[idx], { cursor: \"arrayconnection:\" + toString(idx) })"));
        assert!(cypher.ends_with("AS this_credits\n}"));
    }

    #[test]
    fn test_interface_connection_branches() {
        let tree = connection_tree(
            "actedInConnection",
            "actedInConnection",
            json!({}),
            vec![ResolveTree::new("node")
                .with_fields("Production", vec![ResolveTree::new("title")])
                .with_fields("Series", vec![ResolveTree::new("episodes")])],
        );
        let (cypher, _) = translate("Actor", &tree).unwrap();
        assert!(cypher.starts_with("CALL {\nWITH this\nCALL {\nWITH this\nMATCH (this)-[this_actedInConnection_relationship:ACTED_IN]->(this_actedInConnection_Movie:Movie)\n"));
        assert!(cypher.contains(
            "WITH { node: this_actedInConnection_Movie { __resolveType: \"Movie\", .title } } AS edge\nRETURN edge\nUNION\nWITH this\n"
        ));
        assert!(cypher.contains(
            "this_actedInConnection_Series { __resolveType: \"Series\", .title, .episodes }"
        ));
        assert_eq!(cypher.matches("UNION").count(), 1);
    }

    #[test]
    fn test_interface_connection_filter_narrows_candidates() {
        let tree = connection_tree(
            "actedInConnection",
            "actedInConnection",
            json!({"where": {"node": {"_on": {"Series": {"episodes_GT": 3}}}}}),
            vec![ResolveTree::new("node").with_fields("Production", vec![ResolveTree::new("title")])],
        );
        let (cypher, _) = translate("Actor", &tree).unwrap();
        assert!(!cypher.contains(":Movie"));
        assert!(cypher.contains("this_actedInConnection_Series.episodes > $this_actedInConnection_Series_episodes_GT"));
    }

    #[test]
    fn test_union_connection_with_unknown_member_filter() {
        let tree = connection_tree(
            "favouritesConnection",
            "favouritesConnection",
            json!({"where": {"Genre": {"node": {"name": "Drama"}}}}),
            vec![ResolveTree::new("node").with_fields("Genre", vec![ResolveTree::new("name")])],
        );
        let (cypher, _) = translate("Actor", &tree).unwrap();
        assert!(cypher.contains("(this_favouritesConnection_Genre:Genre)"));
        assert!(!cypher.contains("UNION"));

        let bad = connection_tree(
            "actorsConnection",
            "actorsConnection",
            json!({"where": {"edge": {"unknown": 1}}}),
            vec![],
        );
        assert!(matches!(
            translate("Movie", &bad),
            Err(TranslateError::Where(WhereError::InvalidValue { .. }))
        ));
    }
}
