//! Statement builder.
//!
//! Translation assembles clause and expression objects; text is produced only
//! by the `ToCypher` impls in this module tree.

use lazy_static::lazy_static;
use regex::Regex;

pub mod clause;
pub mod expr;
pub mod params;
pub mod pattern;

pub use clause::{Clause, OrderByItem, ProjectionItem, SortDirection, Statement};
pub use expr::{
    CypherExpr, ExistsSubquery, Literal, MapProjection, MapProjectionItem, Operator,
    PatternComprehension,
};
pub use params::Params;
pub use pattern::{NodePattern, Pattern, RelationshipPattern};

lazy_static! {
    static ref PLAIN_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub trait ToCypher {
    fn to_cypher(&self) -> String;
}

/// Backtick-quote a label unless it is a plain identifier
pub fn escape_label(label: &str) -> String {
    if PLAIN_IDENTIFIER.is_match(label) {
        label.to_string()
    } else {
        format!("`{}`", label.replace('`', "``"))
    }
}

/// Escape a value for use inside a double-quoted string literal
pub fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
