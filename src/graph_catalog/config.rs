//! Schema registry configuration.
//!
//! Entity descriptors are loaded from YAML with the following structure:
//!
//! ```yaml
//! name: movies                      # Optional configuration name
//! graph_schema:
//!   nodes:
//!     - name: Movie
//!       additional_labels: [Film]
//!       fields:
//!         - { field_name: title, type: String }
//!       relationships:
//!         - field_name: actors
//!           type: ACTED_IN
//!           direction: IN
//!           target: Actor
//!           is_list: true
//!           properties: ActedIn
//!       fulltext:
//!         - { name: MovieTitle, fields: [title], default_threshold: 0.5 }
//!       query_options: { default_limit: 10, max_limit: 100 }
//!   relationship_properties:
//!     - name: ActedIn
//!       fields:
//!         - { field_name: screenTime, type: Int }
//!   interfaces: []
//!   unions:
//!     - { name: Search, members: [Movie, Actor] }
//! ```
//!
//! The registry is validated once after loading; translation never mutates it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::errors::GraphSchemaError;
use super::graph_schema::{
    GraphSchema, InterfaceSchema, NodeSchema, RelationshipPropertiesSchema, UnionSchema,
};

/// Configuration for a graph schema loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSchemaConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub graph_schema: GraphSchemaDefinition,
}

/// Graph schema definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSchemaDefinition {
    pub nodes: Vec<NodeSchema>,
    #[serde(default)]
    pub relationship_properties: Vec<RelationshipPropertiesSchema>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceSchema>,
    #[serde(default)]
    pub unions: Vec<UnionSchema>,
}

impl GraphSchemaConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GraphSchemaError> {
        serde_yaml::from_str(yaml).map_err(|e| GraphSchemaError::ConfigParseError {
            error: e.to_string(),
        })
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, GraphSchemaError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GraphSchemaError::ConfigReadError {
                error: format!("{}: {}", path.as_ref().display(), e),
            })?;
        Self::from_yaml_str(&content)
    }

    /// Build and validate the registry
    pub fn to_graph_schema(&self) -> Result<GraphSchema, GraphSchemaError> {
        let definition = &self.graph_schema;
        if definition.nodes.is_empty() {
            return Err(GraphSchemaError::config_error_with_context(
                self.name.as_deref().unwrap_or("<unnamed>"),
                "Schema declares no nodes",
            ));
        }

        let schema = GraphSchema::build(
            definition.nodes.clone(),
            definition.relationship_properties.clone(),
            definition.interfaces.clone(),
            definition.unions.clone(),
        );
        schema.validate()?;

        log::debug!(
            "Loaded graph schema '{}' with {} nodes",
            self.name.as_deref().unwrap_or("<unnamed>"),
            definition.nodes.len()
        );
        Ok(schema)
    }
}
