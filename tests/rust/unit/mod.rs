//! Unit tests for the public translation API
//!
//! Exercise selection reconciliation, predicate compilation and the full-text
//! entry point against the shared movies schema, without an executor.

mod fulltext_tests;
mod predicate_tests;
mod selection_tests;

use graphql_cypher::graph_catalog::{GraphSchema, GraphSchemaConfig};

pub fn movies_schema() -> GraphSchema {
    GraphSchemaConfig::from_yaml_str(include_str!("../../fixtures/movies.yaml"))
        .and_then(|config| config.to_graph_schema())
        .unwrap()
}
