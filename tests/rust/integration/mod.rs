//! Integration tests - schema loaded from YAML, full read translation and the
//! executor boundary with a mocked collaborator.

mod executor_tests;
mod read_translation_tests;

use std::io::Write;

use graphql_cypher::graph_catalog::{GraphSchema, GraphSchemaConfig};

pub const MOVIES_YAML: &str = include_str!("../../fixtures/movies.yaml");

/// Load the movies schema through a file, the way a deployment would
pub fn load_movies_schema() -> GraphSchema {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MOVIES_YAML.as_bytes()).unwrap();
    GraphSchemaConfig::from_yaml_file(file.path())
        .and_then(|config| config.to_graph_schema())
        .unwrap()
}
