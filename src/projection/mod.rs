//! Projection builder
//!
//! Expands a selection into a map projection over a node variable. Scalar and
//! relationship-to-node fields are rendered inline; connection fields and
//! relationships to interfaces need correlated subqueries and are surfaced in
//! `ProjectionMeta` for the caller to translate.

use serde_json::Value;

use crate::auth::AuthRequest;
use crate::cypher::{
    Clause, CypherExpr, MapProjectionItem, OrderByItem, PatternComprehension, ProjectionItem,
};
use crate::graph_catalog::{GraphSchema, NodeSchema, PrimitiveField, PropertyType, RelationField, TargetKind};
use crate::selection::{
    check_args, merge_selection, parse_selection_set, selection_from, synthesize_missing,
    ResolveTree, Selection, SelectionField,
};
use crate::translate::context::TranslationContext;
use crate::translate::errors::TranslateError;
use crate::translate::options::QueryOptions;
use crate::where_clause::{create_where_predicate, PredicateReturn, WhereElement, WhereScope};

pub mod connection;
pub mod interface;

pub use connection::create_connection_and_params;
pub use interface::create_interface_projection_and_params;

/// Requests the projection could not render inline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionMeta {
    pub connection_fields: Vec<ResolveTree>,
    pub interface_fields: Vec<ResolveTree>,
    /// Field-level allow guards for the selected fields
    pub auth_validate_strs: Vec<CypherExpr>,
}

impl ProjectionMeta {
    pub fn has_subqueries(&self) -> bool {
        !self.connection_fields.is_empty() || !self.interface_fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// `<variable> { ... }`
    pub expression: CypherExpr,
    pub meta: ProjectionMeta,
    /// Relationship subqueries the expression references; they run before it
    pub subqueries: Vec<Clause>,
}

/// Variable a connection or interface subquery returns its result in
pub fn sub_result_variable(variable: &str, alias: &str) -> String {
    format!("{}_{}", variable, alias)
}

/// `apoc.util.validatePredicate(NOT (<a AND b>), "<error>", [0])`
pub fn validate_predicate(predicates: Vec<CypherExpr>, error: &str) -> Option<CypherExpr> {
    CypherExpr::and(predicates.into_iter().map(Some)).map(|all| {
        CypherExpr::function(
            "apoc.util.validatePredicate",
            vec![
                CypherExpr::not(all),
                CypherExpr::string(error),
                CypherExpr::List(vec![CypherExpr::integer(0)]),
            ],
        )
    })
}

/// Every selection group that applies to `node`: its interfaces' groups
/// first, then its own
pub(crate) fn selection_for(tree: &ResolveTree, node: &NodeSchema) -> Result<Selection, TranslateError> {
    let mut selection = Selection::new();
    for interface in &node.interfaces {
        if let Some(fields) = tree.fields_for(interface) {
            merge_selection(&mut selection, fields.clone())?;
        }
    }
    if let Some(fields) = tree.fields_for(&node.name) {
        merge_selection(&mut selection, fields.clone())?;
    }
    Ok(selection)
}

/// All selection groups merged, for wrapper types whose names the schema does
/// not track (connections, edges)
pub(crate) fn flatten_fields(tree: &ResolveTree) -> Result<Selection, TranslateError> {
    let mut selection = Selection::new();
    for fields in tree.fields_by_type_name.values() {
        merge_selection(&mut selection, fields.clone())?;
    }
    Ok(selection)
}

fn to_resolve_tree(schema: &GraphSchema, node: Option<&NodeSchema>, field: SelectionField) -> ResolveTree {
    let alias = field.response_key().to_string();
    let mut tree = ResolveTree::aliased(field.name.clone(), alias);
    tree.args = field.args;
    if !field.selection.is_empty() {
        let type_name = node
            .and_then(|n| n.relation_field(&field.name))
            .map(|rel| rel.target.clone())
            .unwrap_or_else(|| field.name.clone());
        let nested_node = schema.node_opt(&type_name);
        let nested = field
            .selection
            .into_iter()
            .map(|f| to_resolve_tree(schema, nested_node, f));
        tree.fields_by_type_name
            .insert(type_name, selection_from(nested));
    }
    tree
}

/// Add what computed fields depend on and what sorting needs
fn add_required_fields(
    schema: &GraphSchema,
    node: &NodeSchema,
    selection: &mut Selection,
    extra_fields: &[String],
) -> Result<(), TranslateError> {
    let mut required = Selection::new();
    for tree in selection.values() {
        let depends_on = node
            .primitive_field(&tree.name)
            .and_then(|f| f.ignore.as_ref())
            .and_then(|ignore| ignore.depends_on.as_deref());
        if let Some(depends_on) = depends_on {
            let fields = parse_selection_set(depends_on)?;
            let trees = fields
                .into_iter()
                .map(|f| to_resolve_tree(schema, Some(node), f));
            merge_selection(&mut required, selection_from(trees))?;
        }
    }
    check_args(selection, &required)?;
    merge_selection(selection, required)?;

    let missing = synthesize_missing(selection, extra_fields);
    merge_selection(selection, missing)?;
    Ok(())
}

fn date_time(value: CypherExpr) -> CypherExpr {
    CypherExpr::function(
        "apoc.date.convertFormat",
        vec![
            CypherExpr::function("toString", vec![value]),
            CypherExpr::string("iso_zoned_date_time"),
            CypherExpr::string("iso_offset_date_time"),
        ],
    )
}

fn point(value: &str) -> CypherExpr {
    CypherExpr::map(vec![
        ("point".to_string(), CypherExpr::raw(value)),
        ("crs".to_string(), CypherExpr::raw(format!("{}.crs", value))),
    ])
}

/// Projection entry for a stored property
pub(crate) fn primitive_item(variable: &str, alias: &str, field: &PrimitiveField) -> MapProjectionItem {
    let stored = format!("{}.{}", variable, field.db_name());
    let value = match (field.field_type, field.is_list) {
        (PropertyType::DateTime, false) => date_time(CypherExpr::raw(&stored)),
        (PropertyType::DateTime, true) => CypherExpr::ListComprehension {
            variable: "dt".to_string(),
            list: Box::new(CypherExpr::raw(&stored)),
            projection: Box::new(date_time(CypherExpr::variable("dt"))),
        },
        (PropertyType::Point | PropertyType::CartesianPoint, false) => point(&stored),
        (PropertyType::Point | PropertyType::CartesianPoint, true) => CypherExpr::ListComprehension {
            variable: "p".to_string(),
            list: Box::new(CypherExpr::raw(&stored)),
            projection: Box::new(point("p")),
        },
        _ if alias == field.field_name && field.db_name() == field.field_name => {
            return MapProjectionItem::Property(field.field_name.clone());
        }
        _ => CypherExpr::property(variable, field.db_name()),
    };
    MapProjectionItem::Entry(alias.to_string(), value)
}

/// Project `tree` over `node` bound to `variable`. With `resolve_type` the
/// projection names its concrete type in `__resolveType`.
pub fn create_projection_and_params(
    ctx: &mut TranslationContext<'_>,
    tree: &ResolveTree,
    node: &NodeSchema,
    variable: &str,
    resolve_type: bool,
) -> Result<Projection, TranslateError> {
    let sort_fields = QueryOptions::from_arg(tree.arg("options"))?.sort_fields();
    project_node(ctx, tree, node, variable, resolve_type, &sort_fields)
}

pub(crate) fn project_node(
    ctx: &mut TranslationContext<'_>,
    tree: &ResolveTree,
    node: &NodeSchema,
    variable: &str,
    resolve_type: bool,
    extra_fields: &[String],
) -> Result<Projection, TranslateError> {
    let schema = ctx.schema;
    let mut selection = selection_for(tree, node)?;
    add_required_fields(schema, node, &mut selection, extra_fields)?;

    let mut items = Vec::new();
    let mut meta = ProjectionMeta::default();
    let mut subqueries = Vec::new();

    if resolve_type {
        items.push(MapProjectionItem::Entry(
            "__resolveType".to_string(),
            CypherExpr::string(&node.name),
        ));
    }

    for (alias, field) in &selection {
        if field.name.starts_with("__") {
            continue;
        }

        if let Some(primitive) = node.primitive_field(&field.name) {
            if primitive.is_ignored() {
                continue;
            }
            let request = AuthRequest::read(node, variable).with_field(&primitive.field_name);
            let guard = ctx.auth.allow(&request);
            if let Some(predicate) = guard.predicate {
                meta.auth_validate_strs.push(predicate);
                ctx.merge_params(guard.params);
            }
            items.push(primitive_item(variable, alias, primitive));
            continue;
        }

        if let Some(relation) = node.relation_field(&field.name) {
            match schema.resolve_target(&relation.target)? {
                TargetKind::Node(target) => {
                    let (value, clauses) =
                        relationship_projection(ctx, variable, alias, field, relation, target)?;
                    items.push(MapProjectionItem::Entry(alias.clone(), value));
                    subqueries.extend(clauses);
                }
                TargetKind::Union(union) => {
                    let members = schema.union_members(&union.name)?;
                    let value = union_projection(ctx, variable, alias, field, relation, &members)?;
                    items.push(MapProjectionItem::Entry(alias.clone(), value));
                }
                TargetKind::Interface(_) => {
                    meta.interface_fields.push(field.clone());
                    items.push(MapProjectionItem::Entry(
                        alias.clone(),
                        CypherExpr::variable(sub_result_variable(variable, alias)),
                    ));
                }
            }
            continue;
        }

        if node.connection_field(&field.name).is_some() {
            meta.connection_fields.push(field.clone());
            items.push(MapProjectionItem::Entry(
                alias.clone(),
                CypherExpr::variable(sub_result_variable(variable, alias)),
            ));
            continue;
        }

        log::warn!(
            "Skipping `{}`: `{}` has no such field",
            field.name,
            node.name
        );
    }

    Ok(Projection {
        expression: CypherExpr::map_projection(variable, items),
        meta,
        subqueries,
    })
}

/// Translate the connection and interface requests a projection surfaced
pub fn create_sub_clauses(
    ctx: &mut TranslationContext<'_>,
    node: &NodeSchema,
    variable: &str,
    meta: &ProjectionMeta,
) -> Result<Vec<Clause>, TranslateError> {
    let mut clauses = Vec::new();
    for tree in &meta.connection_fields {
        let field = node.connection_field(&tree.name).ok_or_else(|| {
            TranslateError::invalid_argument(&tree.name, format!("not a connection on `{}`", node.name))
        })?;
        clauses.push(create_connection_and_params(ctx, tree, field, variable)?);
    }
    for tree in &meta.interface_fields {
        let field = node.relation_field(&tree.name).ok_or_else(|| {
            TranslateError::invalid_argument(&tree.name, format!("not a relationship on `{}`", node.name))
        })?;
        clauses.push(create_interface_projection_and_params(ctx, tree, field, variable)?);
    }
    Ok(clauses)
}

/// Filter, auth guards and validation for a related node bound to `variable`
pub(crate) fn related_filter(
    ctx: &mut TranslationContext<'_>,
    node: &NodeSchema,
    variable: &str,
    where_input: Option<&Value>,
    use_exist_expr: bool,
) -> Result<PredicateReturn, TranslateError> {
    let filter = match where_input {
        Some(value) => {
            let input = value
                .as_object()
                .ok_or_else(|| TranslateError::invalid_argument("where", "expected an input object"))?;
            create_where_predicate(
                ctx,
                WhereScope {
                    element: WhereElement::Node(node),
                    variable,
                    param_prefix: variable,
                    use_exist_expr,
                },
                input,
            )?
        }
        None => PredicateReturn::default(),
    };

    let request = AuthRequest::read(node, variable);
    let auth_where = ctx.auth.where_predicate(&request);
    ctx.merge_params(auth_where.params);
    let auth_allow = ctx.auth.allow(&request);
    ctx.merge_params(auth_allow.params);
    let error = ctx.config.forbidden_error.clone();
    let allow_guard = auth_allow
        .predicate
        .and_then(|allow| validate_predicate(vec![allow], &error));

    Ok(PredicateReturn {
        predicate: CypherExpr::and(vec![filter.predicate, auth_where.predicate, allow_guard]),
        pre_computed_subqueries: filter.pre_computed_subqueries,
    })
}

fn sort_keys(options: &QueryOptions) -> CypherExpr {
    CypherExpr::List(
        options
            .sort_items()
            .map(|(field, direction)| match direction {
                crate::cypher::SortDirection::Asc => CypherExpr::string(format!("^{}", field)),
                crate::cypher::SortDirection::Desc => CypherExpr::string(field.as_str()),
            })
            .collect(),
    )
}

/// `[offset..offset + limit]` with literal bounds
fn paginate(list: CypherExpr, options: &QueryOptions, limit: Option<u64>) -> CypherExpr {
    let offset = options.offset.unwrap_or(0);
    if offset == 0 && limit.is_none() {
        return list;
    }
    let from = (offset > 0).then(|| CypherExpr::integer(offset as i64));
    let to = limit.map(|limit| CypherExpr::integer((offset + limit) as i64));
    CypherExpr::slice(list, from, to)
}

/// Relationship to a concrete node: a pattern comprehension, or a correlated
/// subquery when the nested projection needs subqueries of its own
fn relationship_projection(
    ctx: &mut TranslationContext<'_>,
    parent: &str,
    alias: &str,
    tree: &ResolveTree,
    relation: &RelationField,
    target: &NodeSchema,
) -> Result<(CypherExpr, Vec<Clause>), TranslateError> {
    let target_var = format!("{}_{}", parent, alias);
    let options = QueryOptions::from_arg(tree.arg("options"))?;
    let limit = target.query_limit(options.limit);
    let pattern = crate::where_clause::relationship::related_pattern(
        parent, relation, None, &target_var, target,
    );

    let mut filter = related_filter(ctx, target, &target_var, tree.arg("where"), true)?;
    let nested = create_projection_and_params(ctx, tree, target, &target_var, false)?;
    let mut nested_clauses = create_sub_clauses(ctx, target, &target_var, &nested.meta)?;
    nested_clauses.extend(nested.subqueries);
    let error = ctx.config.forbidden_error.clone();
    filter.predicate = CypherExpr::and(vec![
        filter.predicate,
        validate_predicate(nested.meta.auth_validate_strs, &error),
    ]);

    if nested_clauses.is_empty() && filter.is_pure() {
        let mut value = CypherExpr::PatternComprehension(Box::new(PatternComprehension {
            pattern,
            predicate: filter.predicate,
            projection: nested.expression,
        }));
        if !options.sort.is_empty() {
            value = CypherExpr::function("apoc.coll.sortMulti", vec![value, sort_keys(&options)]);
        }
        value = paginate(value, &options, limit);
        if !relation.is_list {
            value = CypherExpr::function("head", vec![value]);
        }
        return Ok((value, vec![]));
    }

    let mut body = vec![Clause::Match(pattern)];
    body.extend(filter.into_clauses());
    body.extend(nested_clauses);
    body.push(Clause::With(vec![ProjectionItem::aliased(
        nested.expression,
        target_var.clone(),
    )]));
    if !options.sort.is_empty() {
        body.push(Clause::OrderBy(
            options
                .sort_items()
                .map(|(field, direction)| OrderByItem {
                    expression: CypherExpr::property(&target_var, field.as_str()),
                    direction,
                })
                .collect(),
        ));
    }
    if let Some(offset) = options.offset.filter(|o| *o > 0) {
        body.push(Clause::Skip(CypherExpr::integer(offset as i64)));
    }
    if let Some(limit) = limit {
        body.push(Clause::Limit(CypherExpr::integer(limit as i64)));
    }
    let mut collected = CypherExpr::function("collect", vec![CypherExpr::variable(&target_var)]);
    if !relation.is_list {
        collected = CypherExpr::function("head", vec![collected]);
    }
    body.push(Clause::Return(vec![ProjectionItem::aliased(
        collected,
        target_var.clone(),
    )]));

    Ok((
        CypherExpr::variable(&target_var),
        vec![Clause::Call {
            imports: vec![parent.to_string()],
            body,
        }],
    ))
}

/// Relationship to a union: one comprehension per member, concatenated
fn union_projection(
    ctx: &mut TranslationContext<'_>,
    parent: &str,
    alias: &str,
    tree: &ResolveTree,
    relation: &RelationField,
    members: &[&NodeSchema],
) -> Result<CypherExpr, TranslateError> {
    let target_var = format!("{}_{}", parent, alias);
    let where_input = tree.arg("where").and_then(Value::as_object);
    let options = QueryOptions::from_arg(tree.arg("options"))?;

    let mut branches = Vec::new();
    for member in members {
        let member_where = match where_input {
            Some(by_type) => match by_type.get(&member.name) {
                Some(input) => Some(input),
                None => continue,
            },
            None => None,
        };
        let member_var = format!("{}_{}", target_var, member.name);
        let pattern = crate::where_clause::relationship::related_pattern(
            parent, relation, None, &member_var, member,
        );
        let filter = related_filter(ctx, member, &member_var, member_where, true)?;
        let nested = create_projection_and_params(ctx, tree, member, &member_var, true)?;
        if nested.meta.has_subqueries() || !nested.subqueries.is_empty() {
            return Err(TranslateError::invalid_argument(
                alias,
                format!(
                    "`{}` members cannot select connection or interface fields",
                    relation.target
                ),
            ));
        }
        let error = ctx.config.forbidden_error.clone();
        branches.push(CypherExpr::PatternComprehension(Box::new(PatternComprehension {
            pattern,
            predicate: CypherExpr::and(vec![
                filter.predicate,
                validate_predicate(nested.meta.auth_validate_strs, &error),
            ]),
            projection: nested.expression,
        })));
    }

    let mut value = CypherExpr::sum(branches).unwrap_or_else(|| CypherExpr::List(vec![]));
    value = paginate(value, &options, options.limit);
    if !relation.is_list {
        value = CypherExpr::function("head", vec![value]);
    }
    Ok(value)
}
