use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::SelectionError;

pub type Arguments = Map<String, Value>;

/// Requested sub-selections keyed by response alias
pub type Selection = IndexMap<String, ResolveTree>;

/// One requested field: schema name, response alias, decoded arguments and the
/// nested selections grouped by concrete type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveTree {
    pub name: String,
    pub alias: String,
    #[serde(default)]
    pub args: Arguments,
    #[serde(default)]
    pub fields_by_type_name: IndexMap<String, Selection>,
}

impl ResolveTree {
    /// Zero-argument, unaliased node for `name`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        ResolveTree {
            alias: name.clone(),
            name,
            args: Map::new(),
            fields_by_type_name: IndexMap::new(),
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        ResolveTree {
            alias: alias.into(),
            ..Self::new(name)
        }
    }

    /// Replace the arguments; non-object values are ignored
    pub fn with_args(mut self, args: Value) -> Self {
        if let Value::Object(map) = args {
            self.args = map;
        }
        self
    }

    pub fn with_fields(
        mut self,
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = ResolveTree>,
    ) -> Self {
        self.fields_by_type_name
            .insert(type_name.into(), selection_from(fields));
        self
    }

    pub fn is_aliased(&self) -> bool {
        self.alias != self.name
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key).filter(|v| !v.is_null())
    }

    pub fn fields_for(&self, type_name: &str) -> Option<&Selection> {
        self.fields_by_type_name.get(type_name)
    }
}

pub fn selection_from(trees: impl IntoIterator<Item = ResolveTree>) -> Selection {
    trees.into_iter().map(|t| (t.alias.clone(), t)).collect()
}

/// First entry requesting `field_name`, aliased or not
pub fn resolve_by_name<'a>(selection: &'a Selection, field_name: &str) -> Option<&'a ResolveTree> {
    selection.values().find(|tree| tree.name == field_name)
}

/// First entry requesting `field_name` under a different response key
pub fn resolve_aliased_by_name<'a>(
    selection: &'a Selection,
    field_name: &str,
) -> Option<&'a ResolveTree> {
    selection
        .values()
        .find(|tree| tree.name == field_name && tree.alias != field_name)
}

/// Zero-argument nodes for every dependency not already selected unaliased.
///
/// Names are deduplicated; an aliased occurrence does not count, so the
/// dependency is still fetched under its own name.
pub fn synthesize_missing<S: AsRef<str>>(selection: &Selection, field_names: &[S]) -> Selection {
    let mut missing = Selection::new();
    for field_name in field_names.iter().map(|f| f.as_ref()) {
        if missing.contains_key(field_name) {
            continue;
        }
        let present = selection
            .get(field_name)
            .is_some_and(|tree| tree.name == field_name);
        if !present {
            missing.insert(field_name.to_string(), ResolveTree::new(field_name));
        }
    }
    missing
}

/// Structural equality of argument values; object key order is irrelevant
pub fn args_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| args_equal(value, other)))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| args_equal(x, y))
        }
        _ => a == b,
    }
}

fn arguments_equal(a: &Arguments, b: &Arguments) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| args_equal(value, other)))
}

/// Fail when two occurrences of one response key carry different arguments,
/// at this level or in any shared nested selection
pub fn reconcile_arguments(
    existing: &ResolveTree,
    incoming: &ResolveTree,
) -> Result<(), SelectionError> {
    if !arguments_equal(&existing.args, &incoming.args) {
        return Err(SelectionError::ArgumentMismatch {
            field: existing.alias.clone(),
        });
    }
    for (type_name, nested) in &incoming.fields_by_type_name {
        if let Some(existing_nested) = existing.fields_by_type_name.get(type_name) {
            check_args(existing_nested, nested)?;
        }
    }
    Ok(())
}

/// `reconcile_arguments` over every response key present in both selections
pub fn check_args(selection: &Selection, merged: &Selection) -> Result<(), SelectionError> {
    for (alias, tree) in merged {
        if let Some(existing) = selection.get(alias) {
            reconcile_arguments(existing, tree)?;
        }
    }
    Ok(())
}

/// Merge `incoming` into `target`, keeping one entry per response key
pub fn merge_selection(target: &mut Selection, incoming: Selection) -> Result<(), SelectionError> {
    for (alias, tree) in incoming {
        match target.get_mut(&alias) {
            Some(existing) => {
                if !arguments_equal(&existing.args, &tree.args) {
                    return Err(SelectionError::ArgumentMismatch { field: alias });
                }
                for (type_name, nested) in tree.fields_by_type_name {
                    merge_selection(
                        existing.fields_by_type_name.entry(type_name).or_default(),
                        nested,
                    )?;
                }
            }
            None => {
                target.insert(alias, tree);
            }
        }
    }
    Ok(())
}
