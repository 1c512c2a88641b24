//! Boundary to the statement executor.
//!
//! The executor owns connections and transactions; this module only hands it
//! a translated statement and maps the returned records back to result
//! objects.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::AuthorizationProvider;
use crate::config::TranslatorConfig;
use crate::cypher::Params;
use crate::graph_catalog::GraphSchema;
use crate::selection::ResolveTree;
use crate::translate::{translate_read, TranslateError};

/// Routing hint for the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessMode {
    Read,
}

/// Statement text, its parameters and the access mode it needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedQuery {
    pub cypher: String,
    pub params: Params,
    pub access_mode: AccessMode,
}

impl TranslatedQuery {
    pub fn read(cypher: String, params: Params) -> Self {
        TranslatedQuery {
            cypher,
            params,
            access_mode: AccessMode::Read,
        }
    }
}

/// One returned row, keyed by column
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Statement execution failed: {0}")]
    Executor(String),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

#[cfg_attr(test, mockall::automock)]
pub trait StatementExecutor {
    fn execute(&self, query: &TranslatedQuery) -> Result<Vec<Record>, ExecutionError>;
}

/// Translate, execute and return the `this` column of every record
pub fn resolve_read(
    executor: &dyn StatementExecutor,
    schema: &GraphSchema,
    auth: &dyn AuthorizationProvider,
    config: &TranslatorConfig,
    tree: &ResolveTree,
    type_name: &str,
) -> Result<Vec<Value>, ExecutionError> {
    let query = translate_read(schema, auth, config, tree, type_name)?;
    let records = executor.execute(&query)?;
    log::debug!("{} returned {} record(s)", tree.alias, records.len());
    Ok(records
        .into_iter()
        .map(|mut record| record.remove(&config.base_variable).unwrap_or(Value::Null))
        .collect())
}
