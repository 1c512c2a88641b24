use serde::Serialize;
use serde_json::{Map, Value};

/// Parameter bag handed to the executor alongside the statement.
///
/// Names are unique within one statement; `insert_unique` appends a numeric
/// suffix when the requested name is taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn unique_name(&self, base: &str) -> String {
        if !self.0.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.0.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Insert under a fresh name derived from `base` and return that name
    pub fn insert_unique(&mut self, base: &str, value: Value) -> String {
        let name = self.unique_name(base);
        self.0.insert(name.clone(), value);
        name
    }

    /// Deep merge: nested objects are merged key by key, anything else is replaced
    pub fn merge(&mut self, other: Params) {
        for (key, value) in other.0 {
            match self.0.get_mut(&key) {
                Some(existing) => merge_value(existing, value),
                None => {
                    self.0.insert(key, value);
                }
            }
        }
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params(map)
    }
}
