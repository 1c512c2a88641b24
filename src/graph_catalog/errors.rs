//! # Graph Schema Error Types
//!
//! Errors raised while loading the schema registry and while the translator
//! looks up entity descriptors by name.
//!
//! ## Usage Patterns
//!
//! When returning schema errors, use context helpers to say where the lookup
//! happened:
//!
//! ```ignore
//! GraphSchemaError::node_error_with_context(
//!     "Movie",
//!     "Resolving target of relationship field `movies` on `Actor`"
//! )
//! ```

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphSchemaError {
    #[error("No node schema found for `{node_label}`")]
    Node { node_label: String },
    #[error("No relationship properties schema found for `{name}`.")]
    RelationshipProperties { name: String },
    #[error("No interface schema found for `{name}`")]
    Interface { name: String },
    #[error("No union schema found for `{name}`")]
    Union { name: String },
    #[error("Relationship field `{field}` on `{owner}` targets unknown type `{target}`")]
    InvalidRelationshipTarget {
        owner: String,
        field: String,
        target: String,
    },
    #[error("Failed to read configuration file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse configuration: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Helper methods for creating errors with context information
impl GraphSchemaError {
    /// Create a Node error with context information
    pub fn node_error_with_context(
        node_label: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        let label = node_label.into();
        let ctx = context.into();
        GraphSchemaError::Node {
            node_label: format!("{}\n  Context: {}", label, ctx),
        }
    }

    /// Configuration error naming the schema it came from
    pub fn config_error_with_context(
        schema_name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        GraphSchemaError::InvalidConfig {
            message: format!("schema '{}': {}", schema_name.into(), context.into()),
        }
    }
}
