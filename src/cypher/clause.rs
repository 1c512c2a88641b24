use serde::{Deserialize, Serialize};

use super::expr::CypherExpr;
use super::pattern::Pattern;
use super::{escape_string, ToCypher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl ToCypher for SortDirection {
    fn to_cypher(&self) -> String {
        match self {
            SortDirection::Asc => "ASC".to_string(),
            SortDirection::Desc => "DESC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: CypherExpr,
    pub direction: SortDirection,
}

/// `<expression> [AS <alias>]`
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub expression: CypherExpr,
    pub alias: Option<String>,
}

impl ProjectionItem {
    pub fn aliased(expression: CypherExpr, alias: impl Into<String>) -> Self {
        ProjectionItem {
            expression,
            alias: Some(alias.into()),
        }
    }

    pub fn bare(expression: CypherExpr) -> Self {
        ProjectionItem {
            expression,
            alias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match(Pattern),
    /// Entry point through a full-text index instead of label matching
    FulltextQuery {
        index: String,
        phrase_param: String,
        variable: String,
    },
    Where(CypherExpr),
    /// `CALL apoc.util.validate(NOT (<predicate>), "<error>", [0])`
    Validate {
        predicate: CypherExpr,
        error: String,
    },
    /// Correlated subquery importing the listed variables
    Call {
        imports: Vec<String>,
        body: Vec<Clause>,
    },
    /// Branches joined with `UNION`
    Union(Vec<Vec<Clause>>),
    /// `WITH *` when empty
    With(Vec<ProjectionItem>),
    Return(Vec<ProjectionItem>),
    OrderBy(Vec<OrderByItem>),
    Skip(CypherExpr),
    Limit(CypherExpr),
}

fn render_items(items: &[ProjectionItem]) -> String {
    if items.is_empty() {
        return "*".to_string();
    }
    items
        .iter()
        .map(|item| match &item.alias {
            Some(alias) => format!("{} AS {}", item.expression.to_cypher(), alias),
            None => item.expression.to_cypher(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_clauses(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(|c| c.to_cypher())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ToCypher for Clause {
    fn to_cypher(&self) -> String {
        match self {
            Clause::Match(pattern) => format!("MATCH {}", pattern.to_cypher()),
            Clause::FulltextQuery {
                index,
                phrase_param,
                variable,
            } => format!(
                "CALL db.index.fulltext.queryNodes(\"{}\", ${}) YIELD node AS {}, score AS score",
                escape_string(index),
                phrase_param,
                variable
            ),
            Clause::Where(predicate) => format!("WHERE {}", predicate.to_cypher()),
            Clause::Validate { predicate, error } => format!(
                "CALL apoc.util.validate(NOT ({}), \"{}\", [0])",
                predicate.to_cypher(),
                escape_string(error)
            ),
            Clause::Call { imports, body } => {
                let mut lines = vec!["CALL {".to_string()];
                if !imports.is_empty() {
                    lines.push(format!("WITH {}", imports.join(", ")));
                }
                lines.push(render_clauses(body));
                lines.push("}".to_string());
                lines.join("\n")
            }
            Clause::Union(branches) => branches
                .iter()
                .map(|b| render_clauses(b))
                .collect::<Vec<_>>()
                .join("\nUNION\n"),
            Clause::With(items) => format!("WITH {}", render_items(items)),
            Clause::Return(items) => format!("RETURN {}", render_items(items)),
            Clause::OrderBy(items) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|i| format!("{} {}", i.expression.to_cypher(), i.direction.to_cypher()))
                    .collect();
                format!("ORDER BY {}", items.join(", "))
            }
            Clause::Skip(expr) => format!("SKIP {}", expr.to_cypher()),
            Clause::Limit(expr) => format!("LIMIT {}", expr.to_cypher()),
        }
    }
}

/// Ordered clause list rendered one clause per line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub clauses: Vec<Clause>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) -> &mut Self {
        self.clauses.push(clause);
        self
    }

    pub fn extend(&mut self, clauses: impl IntoIterator<Item = Clause>) -> &mut Self {
        self.clauses.extend(clauses);
        self
    }
}

impl ToCypher for Statement {
    fn to_cypher(&self) -> String {
        render_clauses(&self.clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::pattern::NodePattern;

    #[test]
    fn test_call_subquery_with_imports() {
        let call = Clause::Call {
            imports: vec!["this".to_string()],
            body: vec![
                Clause::Match(Pattern::node(NodePattern::new("this", ":Movie"))),
                Clause::Return(vec![ProjectionItem::aliased(
                    CypherExpr::function("count", vec![CypherExpr::variable("this")]),
                    "total",
                )]),
            ],
        };
        assert_eq!(
            call.to_cypher(),
            "CALL {\nWITH this\nMATCH (this:Movie)\nRETURN count(this) AS total\n}"
        );
    }

    #[test]
    fn test_union_branches() {
        let union = Clause::Union(vec![
            vec![Clause::Match(Pattern::node(NodePattern::new("this", ":Genre")))],
            vec![Clause::Match(Pattern::node(NodePattern::new("this", ":Movie")))],
        ]);
        assert_eq!(
            union.to_cypher(),
            "MATCH (this:Genre)\nUNION\nMATCH (this:Movie)"
        );
    }

    #[test]
    fn test_with_star_and_order_by() {
        assert_eq!(Clause::With(vec![]).to_cypher(), "WITH *");
        let order = Clause::OrderBy(vec![
            OrderByItem {
                expression: CypherExpr::property("this", "title"),
                direction: SortDirection::Asc,
            },
            OrderByItem {
                expression: CypherExpr::property("this", "released"),
                direction: SortDirection::Desc,
            },
        ]);
        assert_eq!(order.to_cypher(), "ORDER BY this.title ASC, this.released DESC");
    }

    #[test]
    fn test_fulltext_and_validate() {
        let fulltext = Clause::FulltextQuery {
            index: "MovieTitle".to_string(),
            phrase_param: "this_fulltext_MovieTitle_phrase".to_string(),
            variable: "this".to_string(),
        };
        assert_eq!(
            fulltext.to_cypher(),
            "CALL db.index.fulltext.queryNodes(\"MovieTitle\", $this_fulltext_MovieTitle_phrase) YIELD node AS this, score AS score"
        );

        let validate = Clause::Validate {
            predicate: CypherExpr::raw("false"),
            error: "FORBIDDEN".to_string(),
        };
        assert_eq!(
            validate.to_cypher(),
            "CALL apoc.util.validate(NOT (false), \"FORBIDDEN\", [0])"
        );
    }
}
