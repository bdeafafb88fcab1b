//! Value types and resolved values.
//!
//! [`ValueType`] is the declared type of a parameter or flag value. Besides
//! naming a converter, every type carries a *token shape*: a cheap syntactic
//! test that tells whether a raw token could possibly convert. Shapes are what
//! the registration-time ambiguity check and the dispatch-time usage selection
//! reason about; actual conversion happens later in the argument resolver.

use std::fmt;
use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("static regex must compile"));
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[smhdwSMHDW])+$").expect("static regex must compile"));
static DURATION_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)([smhdwSMHDW])").expect("static regex must compile"));

const BOOLEAN_WORDS: [&str; 6] = ["true", "false", "yes", "no", "on", "off"];

/// Declared type of a parameter or flag value.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ValueType;
///
/// assert!(ValueType::Integer.accepts("42"));
/// assert!(!ValueType::Integer.accepts("forty-two"));
/// assert!(ValueType::Duration.accepts("2h30m"));
///
/// let mode = ValueType::Choice(vec!["fast".into(), "safe".into()]);
/// assert!(mode.accepts("SAFE"));
/// assert!(!mode.accepts("slow"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Any token (the default).
    #[default]
    String,
    /// A single non-empty token without whitespace.
    Word,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// `true/false`, `yes/no`, `on/off`.
    Boolean,
    /// Compact duration such as `1d`, `90s` or `2h30m`.
    Duration,
    /// One of a fixed set of words (case-insensitive).
    Choice(Vec<String>),
    /// Type resolved by a converter registered under this key.
    Custom(String),
}

impl ValueType {
    /// Returns `true` if `token` has the syntactic shape of this type.
    ///
    /// `Custom` types accept every token here; a registered resolver may be
    /// stricter at resolution time.
    pub fn accepts(&self, token: &str) -> bool {
        match self {
            ValueType::String | ValueType::Custom(_) => true,
            ValueType::Word => !token.is_empty() && !token.contains(char::is_whitespace),
            ValueType::Integer => INTEGER_RE.is_match(token),
            ValueType::Float => token.parse::<f64>().is_ok(),
            ValueType::Boolean => BOOLEAN_WORDS
                .iter()
                .any(|word| word.eq_ignore_ascii_case(token)),
            ValueType::Duration => DURATION_RE.is_match(token),
            ValueType::Choice(words) => words.iter().any(|w| w.eq_ignore_ascii_case(token)),
        }
    }

    /// Returns `true` if some token could satisfy both shapes.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::ValueType;
    ///
    /// assert!(ValueType::Integer.overlaps(&ValueType::Float));
    /// assert!(ValueType::String.overlaps(&ValueType::Boolean));
    /// assert!(!ValueType::Integer.overlaps(&ValueType::Duration));
    /// ```
    pub fn overlaps(&self, other: &ValueType) -> bool {
        use ValueType::*;

        match (self, other) {
            (String | Word | Custom(_), _) | (_, String | Word | Custom(_)) => true,
            (Choice(a), Choice(b)) => a
                .iter()
                .any(|x| b.iter().any(|y| x.eq_ignore_ascii_case(y))),
            (Choice(words), shape) | (shape, Choice(words)) => {
                words.iter().any(|word| shape.accepts(word))
            }
            (Integer | Float, Integer | Float) => true,
            (a, b) => a == b,
        }
    }

    /// Returns `true` for `Integer` and `Float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("string"),
            ValueType::Word => f.write_str("word"),
            ValueType::Integer => f.write_str("integer"),
            ValueType::Float => f.write_str("float"),
            ValueType::Boolean => f.write_str("boolean"),
            ValueType::Duration => f.write_str("duration"),
            ValueType::Choice(words) => write!(f, "{{{}}}", words.join(",")),
            ValueType::Custom(key) => f.write_str(key),
        }
    }
}

/// A resolved argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Duration(TimeDelta),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Duration(d) => f.write_str(&format_duration(*d)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Duration(d) => serializer.serialize_str(&format_duration(*d)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

/// Parses a compact duration such as `1d`, `90s` or `1w2d`.
///
/// # Examples
///
/// ```
/// use chrono::TimeDelta;
/// use command_grammar_core::parse_duration;
///
/// assert_eq!(parse_duration("2h30m"), Some(TimeDelta::minutes(150)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
pub fn parse_duration(token: &str) -> Option<TimeDelta> {
    if !DURATION_RE.is_match(token) {
        return None;
    }

    let mut total = TimeDelta::zero();
    for caps in DURATION_PART_RE.captures_iter(token) {
        let amount: i64 = caps[1].parse().ok()?;
        let part = match caps[2].to_ascii_lowercase().as_str() {
            "s" => TimeDelta::try_seconds(amount)?,
            "m" => TimeDelta::try_minutes(amount)?,
            "h" => TimeDelta::try_hours(amount)?,
            "d" => TimeDelta::try_days(amount)?,
            "w" => TimeDelta::try_weeks(amount)?,
            _ => return None,
        };
        total = total.checked_add(&part)?;
    }
    Some(total)
}

/// Formats a duration in the compact form accepted by [`parse_duration`].
pub fn format_duration(duration: TimeDelta) -> String {
    let mut secs = duration.num_seconds();
    if secs == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if secs < 0 {
        out.push('-');
        secs = -secs;
    }
    for (unit, size) in [("w", 604_800), ("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{unit}", secs / size));
            secs %= size;
        }
    }
    out
}
