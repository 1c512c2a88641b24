use serde_json::Value;

use crate::auth::AuthorizationProvider;
use crate::config::TranslatorConfig;
use crate::cypher::Params;
use crate::graph_catalog::GraphSchema;

/// Per-translation accumulator.
///
/// Owns the parameter bag and the variable counter for one statement. It is
/// created by the read orchestrator and threaded by `&mut` through every
/// builder it calls; nothing in it outlives the translation.
pub struct TranslationContext<'a> {
    pub schema: &'a GraphSchema,
    pub auth: &'a dyn AuthorizationProvider,
    pub config: &'a TranslatorConfig,
    params: Params,
    next_var: usize,
}

impl<'a> TranslationContext<'a> {
    pub fn new(
        schema: &'a GraphSchema,
        auth: &'a dyn AuthorizationProvider,
        config: &'a TranslatorConfig,
    ) -> Self {
        TranslationContext {
            schema,
            auth,
            config,
            params: Params::new(),
            next_var: 0,
        }
    }

    pub fn base_variable(&self) -> &str {
        &self.config.base_variable
    }

    /// `<prefix><n>` with `n` increasing over the whole translation
    pub fn fresh_var(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.next_var);
        self.next_var += 1;
        name
    }

    /// Bind `value` under a statement-unique name derived from `base`
    pub fn bind(&mut self, base: &str, value: Value) -> String {
        self.params.insert_unique(base, value)
    }

    pub fn merge_params(&mut self, params: Params) {
        self.params.merge(params);
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}
