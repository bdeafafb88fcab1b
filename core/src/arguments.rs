//! Resolved arguments handed to command handlers.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::Serialize;

use crate::Value;

/// Parameter name to resolved value.
///
/// Optional parameters that received neither a token nor a default are
/// absent. Switches are always present.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Arguments, Value};
///
/// let mut args = Arguments::new();
/// args.insert("player", Value::from("mqzen"));
/// args.insert("silent", Value::Bool(true));
///
/// assert_eq!(args.text("player"), Some("mqzen"));
/// assert!(args.switch("silent"));
/// assert!(!args.switch("missing"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments {
    values: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn duration(&self, name: &str) -> Option<TimeDelta> {
        self.get(name).and_then(Value::as_duration)
    }

    /// `true` only if the switch resolved to `true`.
    pub fn switch(&self, name: &str) -> bool {
        self.boolean(name).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
