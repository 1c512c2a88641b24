use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{AuthPredicate, AuthRequest, AuthorizationProvider};
use crate::cypher::{CypherExpr, Operator, Params};

/// One rule attached to a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleRule {
    /// Caller must hold one of `roles`. With `fields`, only reads of those
    /// fields are guarded.
    Allow {
        roles: Vec<String>,
        #[serde(default)]
        fields: Vec<String>,
    },
    /// Rows are visible only when `property` equals the named JWT claim
    Owner { property: String, claim: String },
}

/// Role and ownership rules evaluated against the caller's JWT.
///
/// Emitted predicates reference `$auth.roles`, `$auth.isAuthenticated` and
/// `$auth.jwt.<claim>`; the `auth` parameter is contributed alongside.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleAuthorization {
    pub roles: Vec<String>,
    #[serde(default)]
    pub jwt: Map<String, Value>,
    #[serde(default)]
    pub rules: IndexMap<String, Vec<RoleRule>>,
}

impl RoleAuthorization {
    pub fn new(roles: Vec<String>, jwt: Map<String, Value>) -> Self {
        RoleAuthorization {
            roles,
            jwt,
            rules: IndexMap::new(),
        }
    }

    pub fn with_rule(mut self, node_name: &str, rule: RoleRule) -> Self {
        self.rules.entry(node_name.to_string()).or_default().push(rule);
        self
    }

    fn auth_param(&self) -> Value {
        json!({
            "isAuthenticated": !self.jwt.is_empty(),
            "roles": self.roles,
            "jwt": self.jwt,
        })
    }

    fn rules_for(&self, request: &AuthRequest<'_>) -> &[RoleRule] {
        self.rules
            .get(&request.node.name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn finish(&self, predicates: Vec<Option<CypherExpr>>, mut params: Params) -> AuthPredicate {
        let predicate = CypherExpr::and(predicates);
        if predicate.is_some() {
            params.insert("auth", self.auth_param());
        }
        AuthPredicate { predicate, params }
    }
}

fn param_base(request: &AuthRequest<'_>, kind: &str) -> String {
    match request.field {
        Some(field) => format!("{}_{}_{}_{}", request.variable, request.node.name, field, kind),
        None => format!("{}_{}_{}", request.variable, request.node.name, kind),
    }
}

/// `any(r IN $auth.roles WHERE r IN $<param>)`
fn has_any_role(param: &str) -> CypherExpr {
    CypherExpr::function(
        "any",
        vec![CypherExpr::raw(format!("r IN $auth.roles WHERE r IN ${}", param))],
    )
}

impl AuthorizationProvider for RoleAuthorization {
    fn allow(&self, request: &AuthRequest<'_>) -> AuthPredicate {
        let mut params = Params::new();
        let mut predicates = Vec::new();
        for rule in self.rules_for(request) {
            let RoleRule::Allow { roles, fields } = rule else {
                continue;
            };
            let applies = match request.field {
                Some(field) => fields.iter().any(|f| f == field),
                None => fields.is_empty(),
            };
            if !applies {
                continue;
            }
            let name = params.insert_unique(&param_base(request, "allow_roles"), json!(roles));
            predicates.push(Some(has_any_role(&name)));
        }
        self.finish(predicates, params)
    }

    fn where_predicate(&self, request: &AuthRequest<'_>) -> AuthPredicate {
        if request.field.is_some() {
            return AuthPredicate::none();
        }
        let predicates = self
            .rules_for(request)
            .iter()
            .filter_map(|rule| match rule {
                RoleRule::Owner { property, claim } => Some(Some(CypherExpr::binary(
                    Operator::Equal,
                    CypherExpr::property(request.variable, property.as_str()),
                    CypherExpr::raw(format!("$auth.jwt.{}", claim)),
                ))),
                RoleRule::Allow { .. } => None,
            })
            .collect();
        self.finish(predicates, Params::new())
    }
}
