//! Predicate compiler
//!
//! Turns a structured `where` object into a boolean predicate over the
//! variable it filters, plus the correlated subqueries that have to run before
//! the predicate can be evaluated.
//!
//! Relationship filters come in two forms. The existence form renders
//! `EXISTS { ... }` / `COUNT { ... }` subquery expressions inline and never
//! produces pre-computed subqueries. The size form counts matches in a
//! `CALL { ... }` ahead of the predicate and compares the count. Callers pick
//! the form through `WhereScope::use_exist_expr`.

use serde_json::{Map, Value};

use crate::cypher::{Clause, CypherExpr};

pub mod aggregate;
pub mod compiler;
pub mod connection;
pub mod errors;
pub mod key;
pub mod property;
pub mod relationship;

pub use compiler::create_where_predicate;
pub use connection::{
    connection_where_predicate, has_explicit_node_in_interface_where, interface_where_for,
};
pub use errors::WhereError;
pub use key::{classify, WhereElement, WhereKey};

/// Result type for predicate compilation
pub type PredicateResult<T> = Result<T, WhereError>;

/// Compiled predicate and the subqueries it depends on, in evaluation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateReturn {
    pub predicate: Option<CypherExpr>,
    pub pre_computed_subqueries: Vec<Clause>,
}

impl PredicateReturn {
    pub fn from_predicate(predicate: CypherExpr) -> Self {
        PredicateReturn {
            predicate: Some(predicate),
            pre_computed_subqueries: Vec::new(),
        }
    }

    /// No subqueries attached
    pub fn is_pure(&self) -> bool {
        self.pre_computed_subqueries.is_empty()
    }

    /// Clauses that follow a `MATCH`: the subqueries, `WITH *` to reopen
    /// filtering, then `WHERE`
    pub fn into_clauses(self) -> Vec<Clause> {
        let mut clauses = self.pre_computed_subqueries;
        if !clauses.is_empty() {
            clauses.push(Clause::With(vec![]));
        }
        if let Some(predicate) = self.predicate {
            clauses.push(Clause::Where(predicate));
        }
        clauses
    }

    /// Conjunction of several results, subqueries kept in input order
    pub fn all(results: impl IntoIterator<Item = PredicateReturn>) -> Self {
        let mut predicates = Vec::new();
        let mut pre_computed_subqueries = Vec::new();
        for result in results {
            predicates.push(result.predicate);
            pre_computed_subqueries.extend(result.pre_computed_subqueries);
        }
        PredicateReturn {
            predicate: CypherExpr::and(predicates),
            pre_computed_subqueries,
        }
    }
}

/// Where a filter is compiled: the element, the variable bound to it, the
/// prefix for parameter names and the relationship predicate form
#[derive(Debug, Clone, Copy)]
pub struct WhereScope<'s> {
    pub element: WhereElement<'s>,
    pub variable: &'s str,
    pub param_prefix: &'s str,
    pub use_exist_expr: bool,
}

pub(crate) fn as_object<'v>(key: &str, value: &'v Value) -> PredicateResult<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| WhereError::invalid(key, "expected an input object"))
}

/// `AND`/`OR` accept a single object as a one-element list
pub(crate) fn as_object_list<'v>(
    key: &str,
    value: &'v Value,
) -> PredicateResult<Vec<&'v Map<String, Value>>> {
    match value {
        Value::Array(items) => items.iter().map(|item| as_object(key, item)).collect(),
        other => Ok(vec![as_object(key, other)?]),
    }
}
