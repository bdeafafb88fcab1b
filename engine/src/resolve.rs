//! Argument resolution for an already selected usage.

use command_grammar_core::{
    Arguments, Command, CommandSource, DefaultValue, FlagData, NumericRange, Parameter, Usage,
    Value, ValueType,
};

use crate::error::ResolutionError;
use crate::flags::{FlagScan, FlagValue, extract};
use crate::matcher::{Matcher, Slot, assign, usage_flags};

/// What to do with positional tokens left after the last parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailing {
    Reject,
    /// Used for default usages reached through an incomplete path.
    Ignore,
}

impl Matcher<'_> {
    /// Converts `tokens` into arguments for `usage`, an effective usage of
    /// `command`.
    ///
    /// Optionals back-fill: they take a token only when enough tokens remain
    /// for the required parameters after them. Flags resolve from their
    /// occurrences anywhere in `tokens`, falling back to defaults; absent
    /// switches resolve to `false`.
    ///
    /// # Errors
    ///
    /// Any [`ResolutionError`]. Errors never cause another usage to be tried.
    pub fn resolve(
        &self,
        source: &dyn CommandSource,
        command: &Command,
        usage: &Usage,
        tokens: &[String],
        trailing: Trailing,
    ) -> Result<Arguments, ResolutionError> {
        let flags = usage_flags(command, usage);
        let scan = extract(&flags, tokens);
        let positional = scan.positional();

        let params: Vec<&Parameter> = usage.positional().collect();
        let (slots, consumed) = assign(&params, positional.len());

        let mut arguments = Arguments::new();
        for (p, slot) in params.into_iter().zip(slots) {
            match slot {
                Slot::Token(i) if p.is_literal() => {
                    if !self.accepts(p, positional[i]) {
                        return Err(ResolutionError::UnknownSubcommand {
                            expected: p.name.clone(),
                            found: positional[i].to_string(),
                        });
                    }
                }
                Slot::Token(i) => {
                    let value = self.convert(p, positional[i])?;
                    arguments.insert(&p.name, value);
                }
                Slot::Greedy(range) if !range.is_empty() => {
                    arguments.insert(&p.name, Value::Text(positional[range].join(" ")));
                }
                Slot::Greedy(_) => match p.default_value() {
                    Some(default) => {
                        let value = self.default_value(source, &p.name, p.value_type(), default)?;
                        arguments.insert(&p.name, value);
                    }
                    None => return Err(ResolutionError::MissingRequiredArgument(p.name.clone())),
                },
                Slot::Skipped => {
                    if let Some(default) = p.default_value() {
                        let value = self.default_value(source, &p.name, p.value_type(), default)?;
                        arguments.insert(&p.name, value);
                    }
                }
                Slot::Missing => {
                    return Err(ResolutionError::MissingRequiredArgument(p.name.clone()));
                }
            }
        }

        if consumed < positional.len() && trailing == Trailing::Reject {
            return Err(ResolutionError::TooManyArguments(
                positional[consumed..].join(" "),
            ));
        }

        for flag in &flags {
            if let Some(value) = self.resolve_flag(source, flag, &scan)? {
                arguments.insert(&flag.name, value);
            }
        }
        Ok(arguments)
    }

    fn convert(&self, p: &Parameter, token: &str) -> Result<Value, ResolutionError> {
        let value_type = p.value_type().unwrap_or(&ValueType::String);
        let value = self.types().parse(value_type, &p.name, token)?;
        let outside = |range: &NumericRange| value.as_float().is_some_and(|n| !range.contains(n));
        if let Some(range) = p.range.filter(outside) {
            return Err(ResolutionError::OutOfRange {
                parameter: p.name.clone(),
                value: value.to_string(),
                range: range.to_string(),
            });
        }
        Ok(value)
    }

    fn default_value(
        &self,
        source: &dyn CommandSource,
        name: &str,
        value_type: Option<&ValueType>,
        default: &DefaultValue,
    ) -> Result<Value, ResolutionError> {
        match default {
            DefaultValue::Value(value) => Ok(value.clone()),
            DefaultValue::Raw(raw) => match value_type {
                Some(vt) => self.types().parse(vt, name, raw),
                None => Ok(Value::Text(raw.clone())),
            },
            DefaultValue::Supplier(supplier) => Ok(supplier(source)),
        }
    }

    fn resolve_flag(
        &self,
        source: &dyn CommandSource,
        flag: &FlagData,
        scan: &FlagScan<'_, '_>,
    ) -> Result<Option<Value>, ResolutionError> {
        let hit = scan.hit(&flag.name).map(|hit| hit.value);
        match (hit, &flag.value_type) {
            (Some(FlagValue::Present), _) => Ok(Some(Value::Bool(true))),
            (Some(FlagValue::Raw(token)), Some(vt)) => {
                self.types().parse(vt, &flag.name, token).map(Some)
            }
            (Some(FlagValue::Raw(token)), None) => Ok(Some(Value::Text(token.to_string()))),
            (Some(FlagValue::Missing), _) => {
                Err(ResolutionError::MissingFlagValue(flag.name.clone()))
            }
            (None, vt) => match &flag.default {
                Some(default) => {
                    let vt = vt.as_ref().unwrap_or(&ValueType::Boolean);
                    self.default_value(source, &flag.name, Some(vt), default)
                        .map(Some)
                }
                None if flag.is_switch() => Ok(Some(Value::Bool(false))),
                None => Ok(None),
            },
        }
    }
}
