//! Shared schema fixture for unit tests.

use super::{GraphSchema, GraphSchemaConfig};

pub const MOVIES_YAML: &str = include_str!("../../tests/fixtures/movies.yaml");

pub fn movies_schema() -> GraphSchema {
    GraphSchemaConfig::from_yaml_str(MOVIES_YAML)
        .expect("fixture parses")
        .to_graph_schema()
        .expect("fixture validates")
}
