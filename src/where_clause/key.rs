//! Classification of filter keys.
//!
//! Logical, property and relationship keys share one flat input object. Each
//! key is classified exactly once against the element being filtered, and the
//! compiler dispatches on the resulting variant.

use crate::graph_catalog::{NodeSchema, PrimitiveField, RelationField, RelationshipPropertiesSchema};

use super::errors::WhereError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOperator {
    Equal,
    Not,
    In,
    NotIn,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Matches,
    Includes,
    NotIncludes,
}

/// How many related nodes must satisfy the nested filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Bare key; at least one
    Bare,
    /// `_NOT`; none
    Not,
    Some,
    None,
    All,
    Single,
}

impl Quantifier {
    /// Whether the quantifier asks for the absence of matches
    pub fn is_negative(&self) -> bool {
        matches!(self, Quantifier::Not | Quantifier::None)
    }
}

// Longest suffixes first so `_NOT_IN` is not read as `_IN` on `title_NOT`
const PROPERTY_SUFFIXES: &[(&str, PropertyOperator)] = &[
    ("_NOT_STARTS_WITH", PropertyOperator::NotStartsWith),
    ("_NOT_ENDS_WITH", PropertyOperator::NotEndsWith),
    ("_NOT_CONTAINS", PropertyOperator::NotContains),
    ("_NOT_INCLUDES", PropertyOperator::NotIncludes),
    ("_STARTS_WITH", PropertyOperator::StartsWith),
    ("_ENDS_WITH", PropertyOperator::EndsWith),
    ("_CONTAINS", PropertyOperator::Contains),
    ("_INCLUDES", PropertyOperator::Includes),
    ("_MATCHES", PropertyOperator::Matches),
    ("_NOT_IN", PropertyOperator::NotIn),
    ("_NOT", PropertyOperator::Not),
    ("_LTE", PropertyOperator::LessThanEqual),
    ("_GTE", PropertyOperator::GreaterThanEqual),
    ("_LT", PropertyOperator::LessThan),
    ("_GT", PropertyOperator::GreaterThan),
    ("_IN", PropertyOperator::In),
];

const RELATIONSHIP_SUFFIXES: &[(&str, Quantifier)] = &[
    ("_SINGLE", Quantifier::Single),
    ("_SOME", Quantifier::Some),
    ("_NONE", Quantifier::None),
    ("_ALL", Quantifier::All),
    ("_NOT", Quantifier::Not),
];

/// Anything a filter can be compiled against
#[derive(Debug, Clone, Copy)]
pub enum WhereElement<'s> {
    Node(&'s NodeSchema),
    Edge(&'s RelationshipPropertiesSchema),
}

impl<'s> WhereElement<'s> {
    pub fn name(&self) -> &'s str {
        match self {
            WhereElement::Node(node) => &node.name,
            WhereElement::Edge(edge) => &edge.name,
        }
    }

    fn primitive_field(&self, name: &str) -> Option<&'s PrimitiveField> {
        let field = match self {
            WhereElement::Node(node) => node.primitive_field(name),
            WhereElement::Edge(edge) => edge.primitive_field(name),
        };
        field.filter(|f| !f.is_ignored())
    }

    fn node(&self) -> Option<&'s NodeSchema> {
        match self {
            WhereElement::Node(node) => Some(node),
            WhereElement::Edge(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WhereKey<'s> {
    Logical(LogicalOperator),
    Property {
        field: &'s PrimitiveField,
        operator: PropertyOperator,
    },
    Relationship {
        field: &'s RelationField,
        quantifier: Quantifier,
    },
    Connection {
        field: &'s RelationField,
        quantifier: Quantifier,
    },
    Aggregate {
        field: &'s RelationField,
    },
}

fn relationship_key<'s>(node: &'s NodeSchema, base: &str, quantifier: Quantifier) -> Option<WhereKey<'s>> {
    if let Some(field) = node.relation_field(base) {
        return Some(WhereKey::Relationship { field, quantifier });
    }
    node.connection_field(base)
        .map(|field| WhereKey::Connection { field, quantifier })
}

pub fn classify<'s>(key: &str, element: WhereElement<'s>) -> Result<WhereKey<'s>, WhereError> {
    match key {
        "AND" => return Ok(WhereKey::Logical(LogicalOperator::And)),
        "OR" => return Ok(WhereKey::Logical(LogicalOperator::Or)),
        "NOT" => return Ok(WhereKey::Logical(LogicalOperator::Not)),
        _ => {}
    }

    if let Some(field) = element.primitive_field(key) {
        return Ok(WhereKey::Property {
            field,
            operator: PropertyOperator::Equal,
        });
    }

    if let Some(node) = element.node() {
        if let Some(found) = relationship_key(node, key, Quantifier::Bare) {
            return Ok(found);
        }
        if let Some(field) = key
            .strip_suffix("Aggregate")
            .and_then(|base| node.relation_field(base))
        {
            return Ok(WhereKey::Aggregate { field });
        }
    }

    for (suffix, operator) in PROPERTY_SUFFIXES {
        if let Some(field) = key
            .strip_suffix(suffix)
            .and_then(|base| element.primitive_field(base))
        {
            return Ok(WhereKey::Property {
                field,
                operator: *operator,
            });
        }
    }

    if let Some(node) = element.node() {
        for (suffix, quantifier) in RELATIONSHIP_SUFFIXES {
            if let Some(found) = key
                .strip_suffix(suffix)
                .and_then(|base| relationship_key(node, base, *quantifier))
            {
                return Ok(found);
            }
        }
    }

    Err(WhereError::invalid(
        key,
        format!("no such filter on `{}`", element.name()),
    ))
}

pub fn is_logical(key: &str) -> bool {
    matches!(key, "AND" | "OR" | "NOT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_catalog::testing::movies_schema;
    use test_case::test_case;

    #[test_case("title", PropertyOperator::Equal; "equality")]
    #[test_case("title_NOT", PropertyOperator::Not; "negated equality")]
    #[test_case("title_IN", PropertyOperator::In; "membership")]
    #[test_case("title_NOT_IN", PropertyOperator::NotIn; "negated membership")]
    #[test_case("released_LT", PropertyOperator::LessThan; "less than")]
    #[test_case("released_GTE", PropertyOperator::GreaterThanEqual; "greater or equal")]
    #[test_case("title_NOT_STARTS_WITH", PropertyOperator::NotStartsWith; "negated prefix")]
    #[test_case("title_MATCHES", PropertyOperator::Matches; "regex")]
    #[test_case("tags_INCLUDES", PropertyOperator::Includes; "list includes")]
    fn test_property_keys(key: &str, expected: PropertyOperator) {
        let schema = movies_schema();
        let movie = schema.node("Movie").unwrap();
        match classify(key, WhereElement::Node(movie)).unwrap() {
            WhereKey::Property { operator, .. } => assert_eq!(operator, expected),
            other => panic!("expected property key, got {:?}", other),
        }
    }

    #[test_case("actors", Quantifier::Bare; "bare")]
    #[test_case("actors_NOT", Quantifier::Not; "not")]
    #[test_case("actors_SOME", Quantifier::Some; "some")]
    #[test_case("actors_NONE", Quantifier::None; "none")]
    #[test_case("actors_ALL", Quantifier::All; "all")]
    #[test_case("actors_SINGLE", Quantifier::Single; "single")]
    fn test_relationship_keys(key: &str, expected: Quantifier) {
        let schema = movies_schema();
        let movie = schema.node("Movie").unwrap();
        match classify(key, WhereElement::Node(movie)).unwrap() {
            WhereKey::Relationship { field, quantifier } => {
                assert_eq!(field.field_name, "actors");
                assert_eq!(quantifier, expected);
            }
            other => panic!("expected relationship key, got {:?}", other),
        }
    }

    #[test]
    fn test_connection_aggregate_and_logical_keys() {
        let schema = movies_schema();
        let movie = WhereElement::Node(schema.node("Movie").unwrap());
        assert!(matches!(
            classify("actorsConnection_NONE", movie).unwrap(),
            WhereKey::Connection {
                quantifier: Quantifier::None,
                ..
            }
        ));
        assert!(matches!(
            classify("actorsAggregate", movie).unwrap(),
            WhereKey::Aggregate { .. }
        ));
        assert_eq!(
            classify("OR", movie).unwrap(),
            WhereKey::Logical(LogicalOperator::Or)
        );
    }

    #[test]
    fn test_edge_elements_have_no_relationships() {
        let schema = movies_schema();
        let acted_in = WhereElement::Edge(schema.relationship_properties("ActedIn").unwrap());
        assert!(matches!(
            classify("screenTime_GT", acted_in).unwrap(),
            WhereKey::Property { .. }
        ));
        assert!(classify("actors", acted_in).is_err());
    }

    #[test]
    fn test_unknown_and_ignored_keys_are_rejected() {
        let schema = movies_schema();
        let movie = WhereElement::Node(schema.node("Movie").unwrap());
        assert!(matches!(
            classify("boxOffice", movie),
            Err(WhereError::InvalidValue { .. })
        ));
        assert!(classify("summary", movie).is_err());
    }
}
