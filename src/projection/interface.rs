use serde_json::json;

use super::{
    create_projection_and_params, create_sub_clauses, related_filter, sub_result_variable,
    validate_predicate,
};
use crate::cypher::{Clause, CypherExpr, OrderByItem, ProjectionItem};
use crate::graph_catalog::RelationField;
use crate::selection::ResolveTree;
use crate::translate::context::TranslationContext;
use crate::translate::errors::TranslateError;
use crate::translate::options::QueryOptions;
use crate::where_clause::relationship::related_pattern;
use crate::where_clause::{interface_where_for, WhereError};

/// Relationship to an interface: one `UNION` branch per implementation that
/// the filter admits, collected under `<var>_<alias>`
pub fn create_interface_projection_and_params(
    ctx: &mut TranslationContext<'_>,
    tree: &ResolveTree,
    field: &RelationField,
    node_variable: &str,
) -> Result<Clause, TranslateError> {
    let schema = ctx.schema;
    let interface = schema.interface(&field.target)?;
    let result_variable = sub_result_variable(node_variable, &tree.alias);
    let options = QueryOptions::from_arg(tree.arg("options"))?;
    let where_input = match tree.arg("where") {
        Some(value) => Some(value.as_object().ok_or_else(|| {
            TranslateError::invalid_argument("where", "expected an input object")
        })?),
        None => None,
    };

    let mut branches = Vec::new();
    for node in schema.implementations(&interface.name) {
        let node_where = match where_input {
            Some(input) => match interface_where_for(input, node) {
                Some(narrowed) => Some(serde_json::Value::Object(narrowed)),
                None => continue,
            },
            None => None,
        };
        let target_variable = format!("{}_{}", node_variable, node.name);
        let pattern = related_pattern(node_variable, field, None, &target_variable, node);
        let mut filter = related_filter(ctx, node, &target_variable, node_where.as_ref(), true)?;
        let projection = create_projection_and_params(ctx, tree, node, &target_variable, true)?;
        let nested = create_sub_clauses(ctx, node, &target_variable, &projection.meta)?;
        let error = ctx.config.forbidden_error.clone();
        filter.predicate = CypherExpr::and(vec![
            filter.predicate,
            validate_predicate(projection.meta.auth_validate_strs, &error),
        ]);

        let mut branch = vec![
            Clause::With(vec![ProjectionItem::bare(CypherExpr::variable(node_variable))]),
            Clause::Match(pattern),
        ];
        branch.extend(filter.into_clauses());
        branch.extend(nested);
        branch.extend(projection.subqueries);
        branch.push(Clause::Return(vec![ProjectionItem::aliased(
            projection.expression,
            result_variable.clone(),
        )]));
        branches.push(branch);
    }

    if branches.is_empty() {
        return Err(WhereError::InvalidInterfaceDisambiguation {
            node: interface.name.clone(),
        }
        .into());
    }
    log::trace!(
        "interface field `{}` expands to {} branch(es)",
        tree.alias,
        branches.len()
    );

    let mut body = vec![Clause::Call {
        imports: vec![],
        body: vec![Clause::Union(branches)],
    }];

    let offset = options.offset.filter(|o| *o > 0);
    if !options.sort.is_empty() || offset.is_some() || options.limit.is_some() {
        body.push(Clause::With(vec![ProjectionItem::bare(CypherExpr::variable(
            &result_variable,
        ))]));
    }
    if !options.sort.is_empty() {
        body.push(Clause::OrderBy(
            options
                .sort_items()
                .map(|(f, direction)| OrderByItem {
                    expression: CypherExpr::property(&result_variable, f.as_str()),
                    direction,
                })
                .collect(),
        ));
    }
    if let Some(offset) = offset {
        let param = ctx.bind(&format!("{}_offset", result_variable), json!(offset));
        body.push(Clause::Skip(CypherExpr::param(param)));
    }
    if let Some(limit) = options.limit {
        let param = ctx.bind(&format!("{}_limit", result_variable), json!(limit));
        body.push(Clause::Limit(CypherExpr::param(param)));
    }

    let mut collected = CypherExpr::function("collect", vec![CypherExpr::variable(&result_variable)]);
    if !field.is_list {
        collected = CypherExpr::function("head", vec![collected]);
    }
    body.push(Clause::Return(vec![ProjectionItem::aliased(
        collected,
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
    use crate::cypher::{Params, ToCypher};
    use crate::graph_catalog::testing::movies_schema;

    fn translate(tree: &ResolveTree) -> Result<(String, Params), TranslateError> {
        let schema = movies_schema();
        let config = TranslatorConfig::default();
        let mut ctx = TranslationContext::new(&schema, &NoAuthorization, &config);
        let field = schema.node("Actor")?.relation_field(&tree.name).unwrap();
        let clause = create_interface_projection_and_params(&mut ctx, tree, field, "this")?;
        Ok((clause.to_cypher(), ctx.into_params()))
    }

    fn acted_in(args: serde_json::Value) -> ResolveTree {
        ResolveTree::new("actedIn")
            .with_args(args)
            .with_fields("Production", vec![ResolveTree::new("title")])
            .with_fields("Movie", vec![ResolveTree::new("released")])
    }

    #[test]
    fn test_branch_per_implementation() {
        let (cypher, params) = translate(&acted_in(json!({}))).unwrap();
        assert_eq!(
            cypher,
            "CALL {\n\
             WITH this\n\
             CALL {\n\
             WITH this\n\
             MATCH (this)-[:ACTED_IN]->(this_Movie:Movie)\n\
             RETURN this_Movie { __resolveType: \"Movie\", .title, .released } AS this_actedIn\n\
             UNION\n\
             WITH this\n\
             MATCH (this)-[:ACTED_IN]->(this_Series:Series:Show)\n\
             RETURN this_Series { __resolveType: \"Series\", .title } AS this_actedIn\n\
             }\n\
             RETURN collect(this_actedIn) AS this_actedIn\n\
             }"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_options_apply_after_the_union() {
        let tree = acted_in(json!({"options": {"sort": [{"title": "DESC"}], "limit": 3, "offset": 0}}));
        let (cypher, params) = translate(&tree).unwrap();
        assert!(cypher.ends_with(
            "}\nWITH this_actedIn\nORDER BY this_actedIn.title DESC\nLIMIT $this_actedIn_limit\nRETURN collect(this_actedIn) AS this_actedIn\n}"
        ));
        assert_eq!(params.get("this_actedIn_limit"), Some(&json!(3)));
        assert!(!params.contains_key("this_actedIn_offset"));
    }

    #[test]
    fn test_on_filter_selects_implementations() {
        let tree = acted_in(json!({"where": {"_on": {"Movie": {"released_GT": 2000}}}}));
        let (cypher, _) = translate(&tree).unwrap();
        assert!(!cypher.contains("UNION"));
        assert!(cypher.contains("WHERE this_Movie.released > $this_Movie_released_GT"));

        let shared = acted_in(json!({"where": {"title": "X", "_on": {"Series": {"episodes": 1}}}}));
        let (cypher, _) = translate(&shared).unwrap();
        assert!(cypher.contains("WHERE this_Movie.title = $this_Movie_title\n"));
        assert!(cypher.contains("WHERE (this_Series.title = $this_Series_title AND this_Series.episodes = $this_Series_episodes)"));
    }

    #[test]
    fn test_filter_matching_no_implementation_fails() {
        let tree = acted_in(json!({"where": {"_on": {"Unknown": {"title": "X"}}}}));
        assert_eq!(
            translate(&tree).unwrap_err(),
            TranslateError::Where(WhereError::InvalidInterfaceDisambiguation {
                node: "Production".to_string()
            })
        );
    }
}
