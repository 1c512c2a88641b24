use thiserror::Error;

use crate::graph_catalog::errors::GraphSchemaError;
use crate::selection::errors::SelectionError;
use crate::where_clause::errors::WhereError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslateError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Where(#[from] WhereError),

    #[error(transparent)]
    Schema(#[from] GraphSchemaError),

    #[error("Can only call one search at any given time (requested {count} full-text indexes)")]
    MultipleFulltextIndex { count: usize },

    #[error("Invalid `{argument}` argument: {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("No concrete types to query for `{type_name}`")]
    NoCandidateTypes { type_name: String },
}

impl TranslateError {
    pub fn invalid_argument(argument: &str, message: impl Into<String>) -> Self {
        TranslateError::InvalidArgument {
            argument: argument.to_string(),
            message: message.into(),
        }
    }
}
