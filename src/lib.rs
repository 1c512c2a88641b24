//! graphql-cypher - GraphQL read translation for Neo4j-style graph stores
//!
//! This crate turns a resolved GraphQL selection into one parameterized Cypher
//! statement:
//! - Selection-tree reconciliation for computed-field dependencies
//! - `where` filters compiled into Cypher predicates and subqueries
//! - Map projections with nested relationships, connections and interfaces
//! - Union/interface fan-out with global sorting and pagination

pub mod auth;
pub mod config;
pub mod cypher;
pub mod execution;
pub mod graph_catalog;
pub mod projection;
pub mod selection;
pub mod translate;
pub mod where_clause;

pub use execution::{resolve_read, AccessMode, StatementExecutor, TranslatedQuery};
pub use translate::{translate_read, TranslateError};
