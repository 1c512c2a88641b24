use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::GraphSchemaError;
use crate::cypher::escape_label;

/// Semantic type of a stored property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    Int,
    Float,
    Boolean,
    #[serde(rename = "ID")]
    Id,
    BigInt,
    DateTime,
    Date,
    Time,
    LocalTime,
    LocalDateTime,
    Duration,
    Point,
    CartesianPoint,
}

impl PropertyType {
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            PropertyType::DateTime
                | PropertyType::Date
                | PropertyType::Time
                | PropertyType::LocalTime
                | PropertyType::LocalDateTime
                | PropertyType::Duration
        )
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, PropertyType::Point | PropertyType::CartesianPoint)
    }
}

/// Marks a field as computed outside the store.
///
/// `depends_on` is a selection set (e.g. `"{ firstName lastName }"`) naming the
/// stored fields the computed resolver reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgnoreMeta {
    #[serde(default)]
    pub depends_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveField {
    pub field_name: String,
    #[serde(rename = "type")]
    pub field_type: PropertyType,
    #[serde(default)]
    pub is_list: bool,
    /// Stored property name when it differs from the field name
    #[serde(default)]
    pub db_property: Option<String>,
    #[serde(default)]
    pub ignore: Option<IgnoreMeta>,
}

impl PrimitiveField {
    pub fn new(field_name: impl Into<String>, field_type: PropertyType) -> Self {
        PrimitiveField {
            field_name: field_name.into(),
            field_type,
            is_list: false,
            db_property: None,
            ignore: None,
        }
    }

    pub fn db_name(&self) -> &str {
        self.db_property.as_deref().unwrap_or(&self.field_name)
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
    Either,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "IN"),
            Direction::Out => write!(f, "OUT"),
            Direction::Either => write!(f, "EITHER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationField {
    pub field_name: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub direction: Direction,
    /// Node, union or interface name
    pub target: String,
    #[serde(default)]
    pub is_list: bool,
    /// Name of the relationship-properties entity carried by the edge
    #[serde(default)]
    pub properties: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulltextIndex {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub default_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptionsSchema {
    #[serde(default)]
    pub default_limit: Option<u64>,
    #[serde(default)]
    pub max_limit: Option<u64>,
}

impl QueryOptionsSchema {
    /// Effective row limit for a requested limit.
    ///
    /// A requested limit is capped at `max_limit`; without one, `default_limit`
    /// applies, then `max_limit`.
    pub fn get_limit(&self, requested: Option<u64>) -> Option<u64> {
        match requested {
            Some(limit) => Some(match self.max_limit {
                Some(max) => limit.min(max),
                None => limit,
            }),
            None => self.default_limit.or(self.max_limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    pub name: String,
    /// Overrides the main label, which otherwise equals `name`
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub additional_labels: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<PrimitiveField>,
    #[serde(default)]
    pub relationships: Vec<RelationField>,
    #[serde(default)]
    pub fulltext: Vec<FulltextIndex>,
    #[serde(default)]
    pub query_options: Option<QueryOptionsSchema>,
}

impl NodeSchema {
    pub fn new(name: impl Into<String>) -> Self {
        NodeSchema {
            name: name.into(),
            label: None,
            additional_labels: Vec::new(),
            interfaces: Vec::new(),
            fields: Vec::new(),
            relationships: Vec::new(),
            fulltext: Vec::new(),
            query_options: None,
        }
    }

    pub fn main_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn labels(&self) -> Vec<&str> {
        std::iter::once(self.main_label())
            .chain(self.additional_labels.iter().map(|l| l.as_str()))
            .collect()
    }

    /// Label suffix for a node pattern, e.g. `:Movie:Film`
    pub fn label_string(&self) -> String {
        self.labels()
            .iter()
            .map(|label| format!(":{}", escape_label(label)))
            .collect()
    }

    pub fn primitive_field(&self, field_name: &str) -> Option<&PrimitiveField> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    pub fn relation_field(&self, field_name: &str) -> Option<&RelationField> {
        self.relationships
            .iter()
            .find(|f| f.field_name == field_name)
    }

    /// Relationship behind a `<field>Connection` field
    pub fn connection_field(&self, field_name: &str) -> Option<&RelationField> {
        field_name
            .strip_suffix("Connection")
            .and_then(|name| self.relation_field(name))
    }

    pub fn fulltext_index(&self, index_name: &str) -> Option<&FulltextIndex> {
        self.fulltext.iter().find(|i| i.name == index_name)
    }

    pub fn query_limit(&self, requested: Option<u64>) -> Option<u64> {
        match &self.query_options {
            Some(options) => options.get_limit(requested),
            None => requested,
        }
    }

    pub fn implements(&self, interface_name: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface_name)
    }
}

/// Properties stored on a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipPropertiesSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<PrimitiveField>,
}

impl RelationshipPropertiesSchema {
    pub fn primitive_field(&self, field_name: &str) -> Option<&PrimitiveField> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<PrimitiveField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionSchema {
    pub name: String,
    pub members: Vec<String>,
}

/// What a relationship field points at
#[derive(Debug, Clone, Copy)]
pub enum TargetKind<'a> {
    Node(&'a NodeSchema),
    Union(&'a UnionSchema),
    Interface(&'a InterfaceSchema),
}

/// Immutable schema registry read by the translator
#[derive(Debug, Clone, Default)]
pub struct GraphSchema {
    nodes: IndexMap<String, NodeSchema>,
    relationship_properties: IndexMap<String, RelationshipPropertiesSchema>,
    interfaces: IndexMap<String, InterfaceSchema>,
    unions: IndexMap<String, UnionSchema>,
}

impl GraphSchema {
    pub fn build(
        nodes: Vec<NodeSchema>,
        relationship_properties: Vec<RelationshipPropertiesSchema>,
        interfaces: Vec<InterfaceSchema>,
        unions: Vec<UnionSchema>,
    ) -> Self {
        GraphSchema {
            nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
            relationship_properties: relationship_properties
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
            interfaces: interfaces
                .into_iter()
                .map(|i| (i.name.clone(), i))
                .collect(),
            unions: unions.into_iter().map(|u| (u.name.clone(), u)).collect(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeSchema> {
        self.nodes.values()
    }

    pub fn node(&self, name: &str) -> Result<&NodeSchema, GraphSchemaError> {
        self.nodes.get(name).ok_or_else(|| GraphSchemaError::Node {
            node_label: name.to_string(),
        })
    }

    pub fn node_opt(&self, name: &str) -> Option<&NodeSchema> {
        self.nodes.get(name)
    }

    pub fn relationship_properties(
        &self,
        name: &str,
    ) -> Result<&RelationshipPropertiesSchema, GraphSchemaError> {
        self.relationship_properties
            .get(name)
            .ok_or_else(|| GraphSchemaError::RelationshipProperties {
                name: name.to_string(),
            })
    }

    pub fn interface(&self, name: &str) -> Result<&InterfaceSchema, GraphSchemaError> {
        self.interfaces
            .get(name)
            .ok_or_else(|| GraphSchemaError::Interface {
                name: name.to_string(),
            })
    }

    pub fn union(&self, name: &str) -> Result<&UnionSchema, GraphSchemaError> {
        self.unions.get(name).ok_or_else(|| GraphSchemaError::Union {
            name: name.to_string(),
        })
    }

    /// Nodes implementing an interface, in registration order
    pub fn implementations(&self, interface_name: &str) -> Vec<&NodeSchema> {
        self.nodes
            .values()
            .filter(|n| n.implements(interface_name))
            .collect()
    }

    pub fn union_members(&self, union_name: &str) -> Result<Vec<&NodeSchema>, GraphSchemaError> {
        self.union(union_name)?
            .members
            .iter()
            .map(|m| self.node(m))
            .collect()
    }

    pub fn resolve_target(&self, name: &str) -> Result<TargetKind<'_>, GraphSchemaError> {
        if let Some(node) = self.nodes.get(name) {
            return Ok(TargetKind::Node(node));
        }
        if let Some(union) = self.unions.get(name) {
            return Ok(TargetKind::Union(union));
        }
        if let Some(interface) = self.interfaces.get(name) {
            return Ok(TargetKind::Interface(interface));
        }
        Err(GraphSchemaError::node_error_with_context(
            name,
            "Resolving relationship target",
        ))
    }

    /// Checks every cross reference in the registry
    pub fn validate(&self) -> Result<(), GraphSchemaError> {
        for node in self.nodes.values() {
            for interface in &node.interfaces {
                self.interface(interface)?;
            }
            for rel in &node.relationships {
                if self.resolve_target(&rel.target).is_err() {
                    return Err(GraphSchemaError::InvalidRelationshipTarget {
                        owner: node.name.clone(),
                        field: rel.field_name.clone(),
                        target: rel.target.clone(),
                    });
                }
                if let Some(properties) = &rel.properties {
                    self.relationship_properties(properties)?;
                }
            }
        }
        for union in self.unions.values() {
            for member in &union.members {
                self.node(member)?;
            }
        }
        Ok(())
    }
}
