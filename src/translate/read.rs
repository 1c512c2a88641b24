//! Read orchestrator
//!
//! Resolves the concrete types behind a root field, translates each one
//! (entry match, filter, auth guards, projection, nested subqueries) and
//! merges them into one statement. Abstract targets become a `UNION` inside a
//! `CALL` block; sorting and pagination are applied once, after the merge.

use serde_json::{json, Map, Value};

use super::context::TranslationContext;
use super::errors::TranslateError;
use super::options::{parse_fulltext, FulltextInput, QueryOptions};
use super::top_level_match::create_top_level_match;
use crate::auth::{AuthRequest, AuthorizationProvider};
use crate::config::TranslatorConfig;
use crate::cypher::{
    Clause, CypherExpr, OrderByItem, ProjectionItem, Statement, ToCypher,
};
use crate::execution::TranslatedQuery;
use crate::graph_catalog::{GraphSchema, NodeSchema, TargetKind};
use crate::projection::{create_projection_and_params, create_sub_clauses, validate_predicate};
use crate::selection::ResolveTree;
use crate::where_clause::{
    create_where_predicate, interface_where_for, PredicateReturn, WhereElement, WhereScope,
};

/// Concrete node types a root field reads
#[derive(Debug, Clone)]
pub enum ReadTarget<'a> {
    Node(&'a NodeSchema),
    Union {
        name: String,
        nodes: Vec<&'a NodeSchema>,
    },
    Interface {
        name: String,
        nodes: Vec<&'a NodeSchema>,
    },
}

impl<'a> ReadTarget<'a> {
    pub fn resolve(schema: &'a GraphSchema, type_name: &str) -> Result<Self, TranslateError> {
        let target = match schema.resolve_target(type_name)? {
            TargetKind::Node(node) => return Ok(ReadTarget::Node(node)),
            TargetKind::Union(union) => ReadTarget::Union {
                name: union.name.clone(),
                nodes: schema.union_members(&union.name)?,
            },
            TargetKind::Interface(interface) => ReadTarget::Interface {
                name: interface.name.clone(),
                nodes: schema.implementations(&interface.name),
            },
        };
        if target.nodes().is_empty() {
            return Err(TranslateError::NoCandidateTypes {
                type_name: type_name.to_string(),
            });
        }
        Ok(target)
    }

    pub fn nodes(&self) -> Vec<&'a NodeSchema> {
        match self {
            ReadTarget::Node(node) => vec![*node],
            ReadTarget::Union { nodes, .. } | ReadTarget::Interface { nodes, .. } => nodes.clone(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ReadTarget::Node(node) => &node.name,
            ReadTarget::Union { name, .. } | ReadTarget::Interface { name, .. } => name,
        }
    }

    pub fn is_abstract(&self) -> bool {
        !matches!(self, ReadTarget::Node(_))
    }

    /// Filter for one candidate. Union filters are keyed by member and a member
    /// without a key is read unfiltered. `None` drops an interface candidate
    /// that `_on` narrowing excludes.
    fn where_for(
        &self,
        node: &NodeSchema,
        where_input: Option<&Map<String, Value>>,
    ) -> Option<Option<Map<String, Value>>> {
        let Some(input) = where_input else {
            return Some(None);
        };
        match self {
            ReadTarget::Node(_) => Some(Some(input.clone())),
            ReadTarget::Union { .. } => Some(input.get(&node.name).and_then(Value::as_object).cloned()),
            ReadTarget::Interface { .. } => interface_where_for(input, node).map(Some),
        }
    }
}

/// One candidate's clauses up to, not including, its final projection
struct CandidateRead {
    clauses: Vec<Clause>,
    projection: CypherExpr,
}

fn translate_candidate(
    ctx: &mut TranslationContext<'_>,
    tree: &ResolveTree,
    node: &NodeSchema,
    param_prefix: &str,
    where_input: Option<&Map<String, Value>>,
    fulltext: &FulltextInput,
    resolve_type: bool,
) -> Result<CandidateRead, TranslateError> {
    let variable = ctx.base_variable().to_string();
    let top = create_top_level_match(ctx, node, &variable, fulltext)?;

    let filter = match where_input {
        Some(input) => create_where_predicate(
            ctx,
            WhereScope {
                element: WhereElement::Node(node),
                variable: &variable,
                param_prefix,
                use_exist_expr: true,
            },
            input,
        )?,
        None => PredicateReturn::default(),
    };

    let request = AuthRequest::read(node, &variable);
    let auth_where = ctx.auth.where_predicate(&request);
    ctx.merge_params(auth_where.params);
    let auth_allow = ctx.auth.allow(&request);
    ctx.merge_params(auth_allow.params);

    let projection = create_projection_and_params(ctx, tree, node, &variable, resolve_type)?;
    let sub_clauses = create_sub_clauses(ctx, node, &variable, &projection.meta)?;
    let error = ctx.config.forbidden_error.clone();

    let predicates = top
        .predicates
        .into_iter()
        .map(Some)
        .chain([
            filter.predicate,
            auth_where.predicate,
            validate_predicate(projection.meta.auth_validate_strs, &error),
        ]);
    let filter = PredicateReturn {
        predicate: CypherExpr::and(predicates),
        pre_computed_subqueries: filter.pre_computed_subqueries,
    };

    let mut clauses = vec![top.clause];
    clauses.extend(filter.into_clauses());
    if let Some(allow) = auth_allow.predicate {
        clauses.push(Clause::Validate {
            predicate: allow,
            error,
        });
    }
    clauses.extend(sub_clauses);
    clauses.extend(projection.subqueries);

    Ok(CandidateRead {
        clauses,
        projection: projection.expression,
    })
}

fn where_argument(tree: &ResolveTree) -> Result<Option<&Map<String, Value>>, TranslateError> {
    match tree.arg("where") {
        Some(value) => value
            .as_object()
            .map(Some)
            .ok_or_else(|| TranslateError::invalid_argument("where", "expected an input object")),
        None => Ok(None),
    }
}

/// Translate a root read of `type_name` into a statement and its parameters
pub fn translate_read(
    schema: &GraphSchema,
    auth: &dyn AuthorizationProvider,
    config: &TranslatorConfig,
    tree: &ResolveTree,
    type_name: &str,
) -> Result<TranslatedQuery, TranslateError> {
    let target = ReadTarget::resolve(schema, type_name)?;
    let mut ctx = TranslationContext::new(schema, auth, config);
    let variable = ctx.base_variable().to_string();
    let options = QueryOptions::from_arg(tree.arg("options"))?;
    let where_input = where_argument(tree)?;

    let mut statement = Statement::new();
    let limit = match &target {
        ReadTarget::Node(node) => {
            let fulltext = parse_fulltext(tree.arg("fulltext"))?;
            let read = translate_candidate(
                &mut ctx,
                tree,
                node,
                &variable,
                where_input,
                &fulltext,
                false,
            )?;
            statement.extend(read.clauses);
            statement.push(Clause::With(vec![ProjectionItem::aliased(
                read.projection,
                variable.clone(),
            )]));
            node.query_limit(options.limit)
        }
        _ => {
            let fulltext_by_type = tree.arg("fulltext").and_then(Value::as_object);
            let mut branches = Vec::new();
            for node in target.nodes() {
                let Some(node_where) = target.where_for(node, where_input) else {
                    log::trace!("{}: filter excludes {}", target.name(), node.name);
                    continue;
                };
                log::trace!("{}: translating candidate {}", target.name(), node.name);
                let fulltext = parse_fulltext(fulltext_by_type.and_then(|f| f.get(&node.name)))?;
                let prefix = format!("{}_{}", variable, node.name);
                let read = translate_candidate(
                    &mut ctx,
                    tree,
                    node,
                    &prefix,
                    node_where.as_ref(),
                    &fulltext,
                    true,
                )?;
                let mut branch = read.clauses;
                branch.push(Clause::Return(vec![ProjectionItem::aliased(
                    read.projection,
                    variable.clone(),
                )]));
                let branch_limit = node
                    .query_options
                    .as_ref()
                    .and_then(|limits| limits.get_limit(options.limit));
                if let Some(limit) = branch_limit {
                    let param = ctx.bind(&format!("{}_limit", prefix), json!(limit));
                    branch.push(Clause::Limit(CypherExpr::param(param)));
                }
                branches.push(branch);
            }
            if branches.is_empty() {
                return Err(TranslateError::NoCandidateTypes {
                    type_name: target.name().to_string(),
                });
            }
            statement.push(Clause::Call {
                imports: vec![],
                body: vec![Clause::Union(branches)],
            });
            options.limit
        }
    };

    statement.push(Clause::Return(vec![ProjectionItem::bare(CypherExpr::variable(
        &variable,
    ))]));
    if !options.sort.is_empty() {
        statement.push(Clause::OrderBy(
            options
                .sort_items()
                .map(|(field, direction)| OrderByItem {
                    expression: CypherExpr::property(&variable, field.as_str()),
                    direction,
                })
                .collect(),
        ));
    }
    if let Some(offset) = options.offset {
        let param = ctx.bind(&format!("{}_offset", variable), json!(offset));
        statement.push(Clause::Skip(CypherExpr::param(param)));
    }
    if let Some(limit) = limit {
        let param = ctx.bind(&format!("{}_limit", variable), json!(limit));
        statement.push(Clause::Limit(CypherExpr::param(param)));
    }

    let cypher = statement.to_cypher();
    log::debug!("Translated read of {}:\n{}", target.name(), cypher);
    Ok(TranslatedQuery::read(cypher, ctx.into_params()))
}
