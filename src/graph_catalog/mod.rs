pub mod config;
pub mod errors;
pub mod graph_schema;

#[cfg(test)]
pub mod testing;

pub use config::{GraphSchemaConfig, GraphSchemaDefinition};
pub use errors::GraphSchemaError;
pub use graph_schema::{
    Direction, FulltextIndex, GraphSchema, IgnoreMeta, InterfaceSchema, NodeSchema,
    PrimitiveField, PropertyType, QueryOptionsSchema, RelationField,
    RelationshipPropertiesSchema, TargetKind, UnionSchema,
};
