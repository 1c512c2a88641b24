//! Decoded `options` and `fulltext` arguments.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::TranslateError;
use crate::cypher::SortDirection;

/// `options: { limit, offset, sort }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Single-field directives; order is tie-breaking order
    pub sort: Vec<IndexMap<String, SortDirection>>,
}

impl QueryOptions {
    pub fn from_arg(value: Option<&Value>) -> Result<Self, TranslateError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| TranslateError::invalid_argument("options", e.to_string())),
        }
    }

    /// Sorted field names in directive order
    pub fn sort_fields(&self) -> Vec<String> {
        self.sort
            .iter()
            .flat_map(|directive| directive.keys().cloned())
            .collect()
    }

    pub fn sort_items(&self) -> impl Iterator<Item = (&String, SortDirection)> {
        self.sort
            .iter()
            .flat_map(|directive| directive.iter().map(|(field, dir)| (field, *dir)))
    }
}

/// `{ phrase, score_EQUAL }` for one full-text index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulltextArg {
    pub phrase: String,
    #[serde(rename = "score_EQUAL", default)]
    pub score_equal: Option<f64>,
}

/// Index name to query arguments; at most one entry may be queried
pub type FulltextInput = IndexMap<String, FulltextArg>;

pub fn parse_fulltext(value: Option<&Value>) -> Result<FulltextInput, TranslateError> {
    match value {
        None | Some(Value::Null) => Ok(FulltextInput::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| TranslateError::invalid_argument("fulltext", e.to_string())),
    }
}
