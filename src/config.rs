use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Error code embedded in authorization validation calls.
pub const AUTH_FORBIDDEN_ERROR: &str = "@neo4j/graphql/FORBIDDEN";

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Translator configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Root variable every statement is built around (`this`)
    #[validate(custom(function = "validate_identifier"))]
    pub base_variable: String,

    /// Whether the `_MATCHES` filter operator is allowed
    pub enable_regex: bool,

    /// Error code raised by `apoc.util.validate` when authorization fails
    #[validate(length(min = 1, message = "Forbidden error code cannot be empty"))]
    pub forbidden_error: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_variable: "this".to_string(),
            enable_regex: false,
            forbidden_error: AUTH_FORBIDDEN_ERROR.to_string(),
        }
    }
}

impl TranslatorConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            base_variable: env::var("GRAPHQL_CYPHER_BASE_VARIABLE")
                .unwrap_or_else(|_| "this".to_string()),
            enable_regex: parse_env_var("GRAPHQL_CYPHER_ENABLE_REGEX", "false")?,
            forbidden_error: env::var("GRAPHQL_CYPHER_FORBIDDEN_ERROR")
                .unwrap_or_else(|_| AUTH_FORBIDDEN_ERROR.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("identifier"))
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
