use serde_json::json;

use super::context::TranslationContext;
use super::errors::TranslateError;
use super::options::FulltextInput;
use crate::cypher::{Clause, CypherExpr, NodePattern, Operator, Pattern};
use crate::graph_catalog::NodeSchema;

/// Entry clause for a root read plus the predicates it requires
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelMatch {
    pub clause: Clause,
    pub predicates: Vec<CypherExpr>,
}

/// Build the `MATCH` for `node`, or a full-text index query when `fulltext`
/// names an index.
///
/// Full-text lookups bypass label matching, so nodes with additional labels
/// get explicit label checks. The score threshold is the caller's
/// `score_EQUAL` when given, else the index default.
pub fn create_top_level_match(
    ctx: &mut TranslationContext<'_>,
    node: &NodeSchema,
    variable: &str,
    fulltext: &FulltextInput,
) -> Result<TopLevelMatch, TranslateError> {
    if fulltext.is_empty() {
        return Ok(TopLevelMatch {
            clause: Clause::Match(Pattern::node(NodePattern::new(variable, node.label_string()))),
            predicates: vec![],
        });
    }
    if fulltext.len() > 1 {
        return Err(TranslateError::MultipleFulltextIndex {
            count: fulltext.len(),
        });
    }

    let Some((index_name, input)) = fulltext.first() else {
        return Err(TranslateError::invalid_argument("fulltext", "empty input"));
    };
    let index = node.fulltext_index(index_name).ok_or_else(|| {
        TranslateError::invalid_argument(
            "fulltext",
            format!("`{}` has no full-text index `{}`", node.name, index_name),
        )
    })?;

    let base_param = format!("{}_fulltext_{}", variable, index_name);
    let phrase_param = ctx.bind(&format!("{}_phrase", base_param), json!(input.phrase));

    let mut predicates = Vec::new();
    if !node.additional_labels.is_empty() {
        for label in node.labels() {
            predicates.push(CypherExpr::binary(
                Operator::In,
                CypherExpr::string(label),
                CypherExpr::function("labels", vec![CypherExpr::variable(variable)]),
            ));
        }
    }

    let threshold = match (input.score_equal, index.default_threshold) {
        (Some(score), _) => Some((format!("{}_score_EQUAL", base_param), score)),
        (None, Some(default)) => Some((format!("{}_defaultThreshold", base_param), default)),
        (None, None) => None,
    };
    if let Some((name, score)) = threshold {
        let param = ctx.bind(&name, json!(score));
        predicates.push(CypherExpr::eq(
            CypherExpr::variable("score"),
            CypherExpr::param(param),
        ));
    }

    log::trace!(
        "Full-text entry for {} through index {} with {} predicates",
        node.name,
        index_name,
        predicates.len()
    );

    Ok(TopLevelMatch {
        clause: Clause::FulltextQuery {
            index: index_name.clone(),
            phrase_param,
            variable: variable.to_string(),
        },
        predicates,
    })
}
