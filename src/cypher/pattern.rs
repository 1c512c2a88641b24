use super::ToCypher;
use crate::graph_catalog::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    /// Rendered label suffix, e.g. `:Movie:Film`
    pub labels: String,
}

impl NodePattern {
    pub fn new(variable: impl Into<String>, labels: impl Into<String>) -> Self {
        NodePattern {
            variable: Some(variable.into()),
            labels: labels.into(),
        }
    }

    pub fn unlabeled(variable: impl Into<String>) -> Self {
        Self::new(variable, "")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<String>,
    pub rel_type: String,
    pub direction: Direction,
}

/// A node, optionally followed by one relationship hop
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub start: NodePattern,
    pub hop: Option<(RelationshipPattern, NodePattern)>,
}

impl Pattern {
    pub fn node(start: NodePattern) -> Self {
        Pattern { start, hop: None }
    }

    pub fn related(
        start: NodePattern,
        relationship: RelationshipPattern,
        end: NodePattern,
    ) -> Self {
        Pattern {
            start,
            hop: Some((relationship, end)),
        }
    }
}

impl ToCypher for NodePattern {
    fn to_cypher(&self) -> String {
        format!(
            "({}{})",
            self.variable.as_deref().unwrap_or_default(),
            self.labels
        )
    }
}

impl ToCypher for RelationshipPattern {
    fn to_cypher(&self) -> String {
        let body = format!(
            "[{}:{}]",
            self.variable.as_deref().unwrap_or_default(),
            self.rel_type
        );
        match self.direction {
            Direction::Out => format!("-{}->", body),
            Direction::In => format!("<-{}-", body),
            Direction::Either => format!("-{}-", body),
        }
    }
}

impl ToCypher for Pattern {
    fn to_cypher(&self) -> String {
        match &self.hop {
            None => self.start.to_cypher(),
            Some((rel, end)) => format!(
                "{}{}{}",
                self.start.to_cypher(),
                rel.to_cypher(),
                end.to_cypher()
            ),
        }
    }
}
