//! Compact usage syntax.
//!
//! Every element is a single whitespace-free word:
//!
//! | Element | Meaning |
//! | --- | --- |
//! | `add` or `add\|a` | literal with aliases |
//! | `<name>` / `<name:type>` | required value |
//! | `[name]` / `[name:type=default]` | optional value |
//! | `<name...>` / `[name...]` | greedy text (bracketed: may be empty) |
//! | `[-name\|alias]` | switch |
//! | `[-name\|alias:type=default]` | valued flag |
//!
//! Types are `string`, `word`, `integer`, `float`, `boolean`, `duration`,
//! `{a,b,c}` for a choice, and any other identifier for a custom type.

use crate::validate::RegistrationError;
use crate::{DefaultValue, FlagData, Parameter, ParameterKind, Value, ValueType};

pub(crate) fn format_parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(format_parameter)
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_parameter(p: &Parameter) -> String {
    match &p.kind {
        ParameterKind::Literal { .. } => p.literal_names().join("|"),
        ParameterKind::Required(vt) => format!("<{}{}>", p.name, type_suffix(vt)),
        ParameterKind::Optional { value_type, default } => format!(
            "[{}{}{}]",
            p.name,
            type_suffix(value_type),
            default_suffix(default.as_ref())
        ),
        ParameterKind::Greedy { default: None } => format!("<{}...>", p.name),
        ParameterKind::Greedy { default: Some(_) } => format!("[{}...]", p.name),
        ParameterKind::Flag(flag) => {
            let names = flag.names().collect::<Vec<_>>().join("|");
            match &flag.value_type {
                None => format!("[-{names}]"),
                Some(vt) => format!(
                    "[-{names}:{vt}{}]",
                    default_suffix(flag.default.as_ref())
                ),
            }
        }
    }
}

fn type_suffix(vt: &ValueType) -> String {
    match vt {
        ValueType::String => String::new(),
        other => format!(":{other}"),
    }
}

fn default_suffix(default: Option<&DefaultValue>) -> String {
    let shown = match default {
        Some(DefaultValue::Value(v)) => v.to_string(),
        Some(DefaultValue::Raw(raw)) => raw.clone(),
        _ => return String::new(),
    };
    if shown.is_empty() || shown.contains(char::is_whitespace) {
        String::new()
    } else {
        format!("={shown}")
    }
}

pub(crate) fn parse_parameters(syntax: &str) -> Result<Vec<Parameter>, RegistrationError> {
    syntax.split_whitespace().map(parse_element).collect()
}

fn parse_element(element: &str) -> Result<Parameter, RegistrationError> {
    let invalid = || RegistrationError::InvalidSyntax(element.to_string());

    let (inner, required) = if let Some(inner) = element.strip_prefix('<') {
        (inner.strip_suffix('>').ok_or_else(invalid)?, true)
    } else if let Some(inner) = element.strip_prefix('[') {
        (inner.strip_suffix(']').ok_or_else(invalid)?, false)
    } else {
        let mut names = element.split('|');
        let name = names.next().filter(|n| !n.is_empty()).ok_or_else(invalid)?;
        return Ok(names.fold(Parameter::literal(name), |p, alias| p.with_alias(alias)));
    };

    let (head, default) = match inner.split_once('=') {
        Some((head, default)) => (head, Some(default)),
        None => (inner, None),
    };
    let (names, value_type) = match head.split_once(':') {
        Some((names, vt)) => (names, Some(parse_type(vt).ok_or_else(invalid)?)),
        None => (head, None),
    };

    if let Some(flag_names) = names.strip_prefix('-') {
        if required {
            return Err(invalid());
        }
        let flag_names = flag_names.trim_start_matches('-');
        let mut parts = flag_names.split('|');
        let name = parts.next().filter(|n| !n.is_empty()).ok_or_else(invalid)?;
        let mut flag = match value_type {
            Some(vt) => FlagData::valued(name, vt),
            None => FlagData::switch(name),
        };
        flag.aliases = parts.map(str::to_string).collect();
        if let Some(default) = default {
            flag.default = Some(DefaultValue::Raw(default.to_string()));
        }
        return Ok(Parameter::flag(flag));
    }

    if let Some(name) = names.strip_suffix("...") {
        if name.is_empty() || value_type.is_some() {
            return Err(invalid());
        }
        let greedy = Parameter::greedy(name);
        return Ok(match (required, default) {
            (true, _) => greedy,
            (false, Some(default)) => greedy.with_default(DefaultValue::Raw(default.to_string())),
            (false, None) => greedy.with_default(Value::Text(String::new())),
        });
    }

    if names.is_empty() || names.contains('|') {
        return Err(invalid());
    }
    let value_type = value_type.unwrap_or_default();
    if required {
        if default.is_some() {
            return Err(invalid());
        }
        Ok(Parameter::required(names, value_type))
    } else {
        let optional = Parameter::optional(names, value_type);
        Ok(match default {
            Some(default) => optional.with_default(DefaultValue::Raw(default.to_string())),
            None => optional,
        })
    }
}

fn parse_type(raw: &str) -> Option<ValueType> {
    let vt = match raw.to_ascii_lowercase().as_str() {
        "" => return None,
        "string" | "text" => ValueType::String,
        "word" => ValueType::Word,
        "integer" | "int" => ValueType::Integer,
        "float" | "number" => ValueType::Float,
        "boolean" | "bool" => ValueType::Boolean,
        "duration" => ValueType::Duration,
        _ => {
            if let Some(words) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                let words: Vec<String> = words
                    .split(',')
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect();
                if words.is_empty() {
                    return None;
                }
                ValueType::Choice(words)
            } else {
                ValueType::Custom(raw.to_string())
            }
        }
    };
    Some(vt)
}

#[cfg(test)]
mod tests {
    use crate::Usage;

    use super::*;

    #[test]
    fn test_parse_every_element_kind() {
        let usage =
            Usage::parse("set|s <key> [page:integer=1] [-force|f] [-time:duration=1h] [rest...]")
                .unwrap();
        let params = usage.parameters();

        assert_eq!(params[0].literal_names(), vec!["set", "s"]);
        assert!(matches!(params[1].kind, ParameterKind::Required(ValueType::String)));
        assert!(matches!(
            &params[2].kind,
            ParameterKind::Optional { value_type: ValueType::Integer, default: Some(DefaultValue::Raw(d)) } if d == "1"
        ));
        assert!(params[3].as_flag().unwrap().is_switch());
        assert_eq!(params[3].as_flag().unwrap().aliases, vec!["f"]);
        assert_eq!(
            params[4].as_flag().unwrap().value_type,
            Some(ValueType::Duration)
        );
        assert!(params[5].is_greedy());
        assert!(params[5].default_value().is_some());
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        let source = "ban <player> [-silent|s] <time:duration> [mode:{soft,hard}=soft] <reason...>";
        let usage = Usage::parse(source).unwrap();
        assert_eq!(usage.syntax(), source);
        assert_eq!(Usage::parse(&usage.syntax()).unwrap().syntax(), source);
    }

    #[test]
    fn test_custom_type_names_pass_through() {
        let usage = Usage::parse("<target:player>").unwrap();
        assert_eq!(
            usage.parameters()[0].value_type(),
            Some(&ValueType::Custom("player".into()))
        );
    }

    #[test]
    fn test_rejects_malformed_elements() {
        for bad in ["<open", "[close", "<-flag>", "<name=default>", "<:integer>", "[a|b]", "<x:{}>"] {
            assert!(
                matches!(Usage::parse(bad), Err(RegistrationError::InvalidSyntax(_))),
                "{bad} should be rejected"
            );
        }
    }
}
