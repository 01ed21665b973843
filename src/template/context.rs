//! Rendering context: a tree-shaped mapping from identifiers to values.
//!
//! [`Value`] is the dynamic value type templates see: strings, booleans,
//! integers, null, ordered sequences, nested mappings, and named string
//! transformers. Transformers live in the same keyspace as data so that a
//! `#name` lookup resolves through the ordinary path mechanism.

use std::collections::BTreeMap;

/// A named string-to-string function applied after resolving a variable.
pub type TransformerFn = fn(&str) -> String;

/// A value bound in a template context.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Transformer(TransformerFn),
    Null,
}

impl Value {
    /// Resolves a single mapping key on this value.
    ///
    /// Traversing anything that is not a mapping yields `Null`.
    pub fn get_property(&self, name: &str) -> Value {
        match self {
            Value::Map(entries) => entries.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Resolves a property chain (e.g. `["package", "name"]`).
    pub fn resolve_path(&self, path: &[String]) -> Value {
        let mut current = self.clone();
        for segment in path {
            current = current.get_property(segment);
            if matches!(current, Value::Null) {
                return Value::Null;
            }
        }
        current
    }

    /// Converts this value to its rendered string form. Null renders as
    /// the empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::List(items) => {
                let rendered: Vec<String> =
                    items.iter().map(Value::to_display_string).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(_) | Value::Transformer(_) | Value::Null => String::new(),
        }
    }

    /// Evaluates this value as a boolean. Only null and `false` are falsy;
    /// empty strings and empty sequences count as truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::String(n.to_string()),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Template rendering context with named bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    bindings: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn bindings(&self) -> &BTreeMap<String, Value> {
        &self.bindings
    }

    /// Resolves a path against this context. The empty path resolves to
    /// the root mapping itself.
    pub fn resolve(&self, path: &[String]) -> Value {
        match path.split_first() {
            None => Value::Map(self.bindings.clone()),
            Some((first, rest)) => match self.bindings.get(first) {
                Some(value) => value.resolve_path(rest),
                None => Value::Null,
            },
        }
    }

    /// A shadowed copy with one extra binding, scoped to a loop iteration.
    /// The parent context is never mutated.
    pub fn child_with(&self, name: &str, value: Value) -> Self {
        let mut child = self.clone();
        child.set(name, value);
        child
    }

    /// Merges `other`'s bindings over this context's, with `other` winning
    /// on collision.
    pub fn merged_with(&self, other: &Context) -> Self {
        let mut merged = self.clone();
        for (key, value) in &other.bindings {
            merged.set(key, value.clone());
        }
        merged
    }
}
