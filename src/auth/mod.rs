//! Authorization collaborator
//!
//! The translator treats authorization as an opaque contributor of predicates
//! and parameters. For each entity it asks twice: once for an "allow" guard,
//! evaluated through a fail-fast validation call, and once for a "where"
//! guard, merged into the WHERE clause. Field-level allow guards surface in
//! projections as validation predicates.

use std::fmt;

use crate::cypher::{CypherExpr, Params};
use crate::graph_catalog::NodeSchema;

pub mod roles;

pub use roles::{RoleAuthorization, RoleRule};

/// Operation being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Read,
}

impl fmt::Display for AuthOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthOperation::Read => write!(f, "READ"),
        }
    }
}

/// What the translator is asking about
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    pub operation: AuthOperation,
    pub node: &'a NodeSchema,
    /// Variable the node is bound to in the statement
    pub variable: &'a str,
    /// Set for field-level checks
    pub field: Option<&'a str>,
}

impl<'a> AuthRequest<'a> {
    pub fn read(node: &'a NodeSchema, variable: &'a str) -> Self {
        AuthRequest {
            operation: AuthOperation::Read,
            node,
            variable,
            field: None,
        }
    }

    pub fn with_field(self, field: &'a str) -> Self {
        AuthRequest {
            field: Some(field),
            ..self
        }
    }
}

/// Predicate plus the parameters it references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthPredicate {
    pub predicate: Option<CypherExpr>,
    pub params: Params,
}

impl AuthPredicate {
    pub fn none() -> Self {
        Self::default()
    }
}

pub trait AuthorizationProvider {
    /// Guard that must hold for the request to proceed at all
    fn allow(&self, request: &AuthRequest<'_>) -> AuthPredicate;

    /// Filter restricting which rows the request may see
    fn where_predicate(&self, request: &AuthRequest<'_>) -> AuthPredicate;
}

/// Contributes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthorization;

impl AuthorizationProvider for NoAuthorization {
    fn allow(&self, _request: &AuthRequest<'_>) -> AuthPredicate {
        AuthPredicate::none()
    }

    fn where_predicate(&self, _request: &AuthRequest<'_>) -> AuthPredicate {
        AuthPredicate::none()
    }
}
