//! Value conversion and type-level suggestions.
//!
//! Built-in [`ValueType`]s convert here; `Custom` types are looked up in the
//! [`TypeRegistry`] by key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use command_grammar_core::{CommandSource, Value, ValueType, parse_duration};

use crate::error::ResolutionError;

const DURATION_SAMPLES: [&str; 5] = ["30s", "5m", "1h", "1d", "7d"];

/// Converter for a custom value type.
///
/// # Examples
///
/// ```
/// use command_grammar::{TypeRegistry, TypeResolver};
/// use command_grammar_core::{SimpleSource, Value, ValueType};
///
/// struct Color;
///
/// impl TypeResolver for Color {
///     fn parse(&self, token: &str) -> Result<Value, String> {
///         match token {
///             "red" | "green" | "blue" => Ok(Value::Text(token.to_string())),
///             _ => Err(format!("unknown color {token}")),
///         }
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register("color", Color);
/// let color = ValueType::Custom("color".into());
/// assert!(registry.parse(&color, "x", "green").is_ok());
/// assert!(registry.parse(&color, "x", "pink").is_err());
/// ```
pub trait TypeResolver: Send + Sync {
    /// Converts a token; the error message is informational.
    fn parse(&self, token: &str) -> Result<Value, String>;

    /// Candidates for a partial token.
    fn suggest(&self, _source: &dyn CommandSource, _partial: &str) -> Vec<String> {
        Vec::new()
    }

    /// Cheap shape check used while selecting a usage.
    fn accepts(&self, _token: &str) -> bool {
        true
    }
}

/// Custom type resolvers keyed by type name.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    custom: HashMap<String, Arc<dyn TypeResolver>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.custom.keys().collect();
        keys.sort();
        f.debug_struct("TypeRegistry").field("custom", &keys).finish()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the resolver for `ValueType::Custom(key)`.
    pub fn register(&mut self, key: &str, resolver: impl TypeResolver + 'static) {
        self.custom.insert(key.to_string(), Arc::new(resolver));
    }

    /// Token shape test, refined by custom resolvers.
    pub fn accepts(&self, value_type: &ValueType, token: &str) -> bool {
        match value_type {
            ValueType::Custom(key) => self.custom.get(key).is_none_or(|r| r.accepts(token)),
            other => other.accepts(token),
        }
    }

    /// Converts `token` for the parameter named `parameter`.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::TypeConversion`] when the token does not convert,
    /// [`ResolutionError::UnknownType`] for unregistered custom types.
    pub fn parse(
        &self,
        value_type: &ValueType,
        parameter: &str,
        token: &str,
    ) -> Result<Value, ResolutionError> {
        let mismatch = || ResolutionError::TypeConversion {
            parameter: parameter.to_string(),
            token: token.to_string(),
            expected: value_type.to_string(),
        };
        match value_type {
            ValueType::String => Ok(Value::Text(token.to_string())),
            ValueType::Word if value_type.accepts(token) => Ok(Value::Text(token.to_string())),
            ValueType::Word => Err(mismatch()),
            ValueType::Integer => token
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| mismatch()),
            ValueType::Float => token
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or_else(mismatch),
            ValueType::Boolean => parse_bool(token).map(Value::Bool).ok_or_else(mismatch),
            ValueType::Duration => parse_duration(token)
                .map(Value::Duration)
                .ok_or_else(mismatch),
            ValueType::Choice(words) => words
                .iter()
                .find(|w| w.eq_ignore_ascii_case(token))
                .map(|w| Value::Text(w.clone()))
                .ok_or_else(mismatch),
            ValueType::Custom(key) => {
                let resolver = self
                    .custom
                    .get(key)
                    .ok_or_else(|| ResolutionError::UnknownType(key.clone()))?;
                resolver.parse(token).map_err(|reason| {
                    tracing::debug!(parameter, token, %reason, "custom conversion failed");
                    mismatch()
                })
            }
        }
    }

    /// Candidates the type itself knows about.
    pub fn suggestions(
        &self,
        value_type: &ValueType,
        source: &dyn CommandSource,
        partial: &str,
    ) -> Vec<String> {
        match value_type {
            ValueType::Boolean => vec!["true".into(), "false".into()],
            ValueType::Choice(words) => words.clone(),
            ValueType::Duration => DURATION_SAMPLES.iter().map(|s| s.to_string()).collect(),
            ValueType::Custom(key) => self
                .custom
                .get(key)
                .map(|r| r.suggest(source, partial))
                .unwrap_or_default(),
            ValueType::String | ValueType::Word | ValueType::Integer | ValueType::Float => {
                Vec::new()
            }
        }
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
