//! Parameter descriptors: the alphabet every usage is written in.

use std::fmt;
use std::sync::Arc;

use crate::{CommandSource, Value, ValueType};

/// Produces a default value, possibly depending on who is running the command.
pub type Supplier = Arc<dyn Fn(&dyn CommandSource) -> Value + Send + Sync>;

/// Produces suggestions for a parameter given the source and the partial token.
pub type SuggestionFn = Arc<dyn Fn(&dyn CommandSource, &str) -> Vec<String> + Send + Sync>;

/// Value used when an optional parameter or flag receives no token.
#[derive(Clone)]
pub enum DefaultValue {
    /// A ready value.
    Value(Value),
    /// A raw token converted with the parameter's type at resolution time.
    Raw(String),
    /// Computed per invocation.
    Supplier(Supplier),
}

impl DefaultValue {
    pub fn supplier(f: impl Fn(&dyn CommandSource) -> Value + Send + Sync + 'static) -> Self {
        DefaultValue::Supplier(Arc::new(f))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultValue::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
            DefaultValue::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

macro_rules! default_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for DefaultValue {
                fn from(value: $ty) -> Self {
                    DefaultValue::Value(value.into())
                }
            }
        )*
    };
}

default_from!(Value, &str, String, i64, f64, bool, chrono::TimeDelta);

/// A flag or switch.
///
/// A flag without a value type is a *switch*: its presence resolves to
/// `true`. Aliases are matched after stripping a leading `-` or `--`.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{FlagData, ValueType};
///
/// let silent = FlagData::switch("silent").with_alias("s");
/// assert!(silent.is_switch());
/// assert!(silent.matches("s"));
///
/// let time = FlagData::valued("time", ValueType::Duration).free();
/// assert!(time.free);
/// assert!(!time.is_switch());
/// ```
#[derive(Debug, Clone)]
pub struct FlagData {
    pub name: String,
    pub aliases: Vec<String>,
    /// `None` for switches.
    pub value_type: Option<ValueType>,
    pub default: Option<DefaultValue>,
    /// Usable in every usage of the declaring command and its subcommands.
    pub free: bool,
}

impl FlagData {
    pub fn switch(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            value_type: None,
            default: None,
            free: false,
        }
    }

    pub fn valued(name: &str, value_type: ValueType) -> Self {
        Self {
            value_type: Some(value_type),
            ..Self::switch(name)
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the flag as usable anywhere in its command.
    pub fn free(mut self) -> Self {
        self.free = true;
        self
    }

    pub fn is_switch(&self) -> bool {
        self.value_type.is_none()
    }

    /// Name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Checks a prefix-stripped alias against the name and aliases.
    pub fn matches(&self, alias: &str) -> bool {
        self.names().any(|n| n == alias)
    }
}

/// Numeric bounds for `Integer` and `Float` parameters, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn contains(&self, n: f64) -> bool {
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min}..={max}"),
            (Some(min), None) => write!(f, ">= {min}"),
            (None, Some(max)) => write!(f, "<= {max}"),
            (None, None) => f.write_str("any"),
        }
    }
}

/// What a parameter matches.
#[derive(Debug, Clone)]
pub enum ParameterKind {
    /// A fixed word: a subcommand name or an inline keyword.
    Literal { aliases: Vec<String> },
    Required(ValueType),
    Optional {
        value_type: ValueType,
        default: Option<DefaultValue>,
    },
    /// Joins every remaining positional token. Always a string, always last.
    Greedy { default: Option<DefaultValue> },
    Flag(FlagData),
}

/// A named slot in a [`Usage`](crate::Usage).
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Parameter, ValueType};
///
/// let amount = Parameter::required("amount", ValueType::Integer).with_range(Some(1.0), Some(64.0));
/// assert!(amount.is_required());
/// assert!(amount.accepts("12", false));
/// assert!(!amount.accepts("twelve", false));
///
/// let add = Parameter::literal("add").with_alias("a");
/// assert!(add.accepts("A", false));
/// assert!(!add.accepts("A", true));
/// ```
#[derive(Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Static completions offered before the type's own.
    pub suggestions: Vec<String>,
    pub suggester: Option<SuggestionFn>,
    pub range: Option<NumericRange>,
    pub(crate) position: Option<usize>,
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("range", &self.range)
            .field("suggestions", &self.suggestions)
            .finish_non_exhaustive()
    }
}

impl Parameter {
    fn with_kind(name: &str, kind: ParameterKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            suggestions: Vec::new(),
            suggester: None,
            range: None,
            position: None,
        }
    }

    pub fn literal(name: &str) -> Self {
        Self::with_kind(name, ParameterKind::Literal { aliases: Vec::new() })
    }

    pub fn required(name: &str, value_type: ValueType) -> Self {
        Self::with_kind(name, ParameterKind::Required(value_type))
    }

    pub fn optional(name: &str, value_type: ValueType) -> Self {
        Self::with_kind(
            name,
            ParameterKind::Optional {
                value_type,
                default: None,
            },
        )
    }

    pub fn greedy(name: &str) -> Self {
        Self::with_kind(name, ParameterKind::Greedy { default: None })
    }

    pub fn flag(flag: FlagData) -> Self {
        let name = flag.name.clone();
        Self::with_kind(&name, ParameterKind::Flag(flag))
    }

    /// Shorthand for a switch parameter with optional aliases.
    pub fn switch(name: &str, aliases: &[&str]) -> Self {
        let flag = aliases
            .iter()
            .fold(FlagData::switch(name), |flag, alias| flag.with_alias(alias));
        Self::flag(flag)
    }

    /// Adds an alias to a literal or a flag. Other kinds have no aliases.
    pub fn with_alias(mut self, alias: &str) -> Self {
        match &mut self.kind {
            ParameterKind::Literal { aliases } => aliases.push(alias.to_string()),
            ParameterKind::Flag(flag) => flag.aliases.push(alias.to_string()),
            _ => {}
        }
        self
    }

    /// Sets the default of an optional, greedy or flag parameter.
    ///
    /// Has no effect on required and literal parameters.
    pub fn with_default(mut self, value: impl Into<DefaultValue>) -> Self {
        let value = value.into();
        match &mut self.kind {
            ParameterKind::Optional { default, .. } | ParameterKind::Greedy { default } => {
                *default = Some(value)
            }
            ParameterKind::Flag(flag) => flag.default = Some(value),
            _ => {}
        }
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions.extend(suggestions.into_iter().map(Into::into));
        self
    }

    pub fn with_suggester(
        mut self,
        f: impl Fn(&dyn CommandSource, &str) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.suggester = Some(Arc::new(f));
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.range = Some(NumericRange { min, max });
        self
    }

    /// Index among the non-flag parameters of the owning usage.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ParameterKind::Literal { .. })
    }

    /// Required values and literals must each consume a token.
    pub fn is_required(&self) -> bool {
        matches!(
            self.kind,
            ParameterKind::Required(_) | ParameterKind::Literal { .. }
        )
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, ParameterKind::Optional { .. })
    }

    pub fn is_greedy(&self) -> bool {
        matches!(self.kind, ParameterKind::Greedy { .. })
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, ParameterKind::Flag(_))
    }

    pub fn as_flag(&self) -> Option<&FlagData> {
        match &self.kind {
            ParameterKind::Flag(flag) => Some(flag),
            _ => None,
        }
    }

    /// Declared value type. Greedy parameters are strings; literals have none.
    pub fn value_type(&self) -> Option<&ValueType> {
        match &self.kind {
            ParameterKind::Required(vt) | ParameterKind::Optional { value_type: vt, .. } => {
                Some(vt)
            }
            ParameterKind::Greedy { .. } => Some(&ValueType::String),
            ParameterKind::Flag(flag) => flag.value_type.as_ref(),
            ParameterKind::Literal { .. } => None,
        }
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        match &self.kind {
            ParameterKind::Optional { default, .. } | ParameterKind::Greedy { default } => {
                default.as_ref()
            }
            ParameterKind::Flag(flag) => flag.default.as_ref(),
            _ => None,
        }
    }

    /// Literal name followed by its aliases; empty for other kinds.
    pub fn literal_names(&self) -> Vec<&str> {
        match &self.kind {
            ParameterKind::Literal { aliases } => std::iter::once(self.name.as_str())
                .chain(aliases.iter().map(String::as_str))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` if `token` could fill this parameter.
    ///
    /// Literals compare against their name and aliases; value parameters
    /// check the token shape of their type.
    pub fn accepts(&self, token: &str, case_sensitive: bool) -> bool {
        match &self.kind {
            ParameterKind::Literal { .. } => self.literal_names().into_iter().any(|name| {
                if case_sensitive {
                    name == token
                } else {
                    name.eq_ignore_ascii_case(token)
                }
            }),
            ParameterKind::Required(vt) | ParameterKind::Optional { value_type: vt, .. } => {
                vt.accepts(token)
            }
            ParameterKind::Greedy { .. } | ParameterKind::Flag(_) => true,
        }
    }
}
