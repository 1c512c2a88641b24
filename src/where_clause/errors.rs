use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WhereError {
    #[error("_on is used as the only argument and node `{node}` is not present within")]
    InvalidInterfaceDisambiguation { node: String },

    #[error("No node type named `{name}` in the schema")]
    UnknownNode { name: String },

    #[error("No relationship properties named `{name}` in the schema")]
    UnknownRelationship { name: String },

    #[error("Invalid filter `{key}`: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Filter `{key}` uses _MATCHES but regular expressions are disabled")]
    RegexDisabled { key: String },
}

impl WhereError {
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        WhereError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
