//! Usages: one concrete syntax variant of a command.

use std::fmt;
use std::sync::Arc;

use crate::validate::RegistrationError;
use crate::{Arguments, CommandSource, FlagData, Parameter, syntax};

/// Runs a matched usage.
pub type Handler = Arc<dyn Fn(&ExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Everything a handler gets to see about its invocation.
pub struct ExecutionContext<'a> {
    pub source: &'a dyn CommandSource,
    /// The name or alias the command was invoked with.
    pub label: &'a str,
    /// Root-to-leaf command names.
    pub path: &'a [String],
    pub usage: &'a Usage,
    pub arguments: &'a Arguments,
}

/// An ordered parameter list plus the handler that runs when it matches.
///
/// Parameters are numbered by position among the non-flag parameters as they
/// are added; flags have no position.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Parameter, Usage, ValueType};
///
/// let usage = Usage::new()
///     .with_parameter(Parameter::required("player", ValueType::String))
///     .with_parameter(Parameter::switch("silent", &["s"]))
///     .with_parameter(Parameter::required("duration", ValueType::Duration))
///     .with_parameter(Parameter::greedy("reason"));
///
/// assert_eq!(usage.min_length(), 2);
/// assert_eq!(usage.max_length(), None);
/// assert_eq!(usage.syntax(), "<player> [-silent|s] <duration:duration> <reason...>");
/// ```
#[derive(Clone, Default)]
pub struct Usage {
    parameters: Vec<Parameter>,
    handler: Option<Handler>,
    pub permission: Option<String>,
    pub description: Option<String>,
}

impl fmt::Debug for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Usage")
            .field("syntax", &self.syntax())
            .field("permission", &self.permission)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Usage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a usage from a parameter list.
    pub fn of(parameters: impl IntoIterator<Item = Parameter>) -> Self {
        parameters
            .into_iter()
            .fold(Self::new(), |usage, p| usage.with_parameter(p))
    }

    /// Parses the compact syntax produced by [`Usage::syntax`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidSyntax`] for malformed elements.
    pub fn parse(syntax: &str) -> Result<Self, RegistrationError> {
        Ok(Self::of(syntax::parse_parameters(syntax)?))
    }

    pub fn with_parameter(mut self, mut parameter: Parameter) -> Self {
        parameter.position = (!parameter.is_flag()).then(|| self.positional_count());
        self.parameters.push(parameter);
        self
    }

    pub fn with_handler(
        mut self,
        handler: impl Fn(&ExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Installs an already shared handler.
    pub fn with_shared_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permission = Some(permission.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Non-flag parameters in order.
    pub fn positional(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| !p.is_flag())
    }

    pub fn flags(&self) -> impl Iterator<Item = &FlagData> {
        self.parameters.iter().filter_map(Parameter::as_flag)
    }

    pub fn positional_count(&self) -> usize {
        self.positional().count()
    }

    /// Number of tokens that must be present: required values and literals.
    pub fn min_length(&self) -> usize {
        self.positional().filter(|p| p.is_required()).count()
    }

    /// `None` when a trailing greedy parameter makes the usage unbounded.
    pub fn max_length(&self) -> Option<usize> {
        if self.positional().any(Parameter::is_greedy) {
            None
        } else {
            Some(self.positional_count())
        }
    }

    pub fn literal_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_literal()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// A copy of this usage with `prefix` placed in front of its parameters.
    pub fn with_prefix(&self, prefix: &[Parameter]) -> Usage {
        let mut combined = Usage {
            parameters: Vec::with_capacity(prefix.len() + self.parameters.len()),
            handler: self.handler.clone(),
            permission: self.permission.clone(),
            description: self.description.clone(),
        };
        for p in prefix.iter().chain(&self.parameters) {
            combined = combined.with_parameter(p.clone());
        }
        combined
    }

    /// Compact syntax string, e.g. `add <group> [page:integer] [-silent]`.
    pub fn syntax(&self) -> String {
        syntax::format_parameters(&self.parameters)
    }
}
