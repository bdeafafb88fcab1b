//! The command registry and its dispatch entry points.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use command_grammar_core::{
    Arguments, Command, CommandSource, ExecutionContext, Handler, RegistrationError,
    TreeDefinition, Usage, verify_command,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::DispatchError;
use crate::matcher::Matcher;
use crate::resolve::Trailing;
use crate::resolvers::{TypeRegistry, TypeResolver};
use crate::suggest::Suggester;
use crate::traverse::{MatchKind, Traversal};

/// Cooldown hook consulted before arguments are resolved.
pub trait ExecutionGate: Send + Sync {
    /// Returns `true` if `source` may not run `usage` of the command at
    /// `path` right now.
    fn on_cooldown(&self, source: &dyn CommandSource, path: &[String], usage: &Usage) -> bool;

    /// Called after a handler succeeded.
    fn record(&self, _source: &dyn CommandSource, _path: &[String], _usage: &Usage) {}
}

/// A resolved usage ready to run.
pub struct Invocation {
    kind: MatchKind,
    label: String,
    path: Vec<String>,
    usage: Usage,
    arguments: Arguments,
    gate: Option<Arc<dyn ExecutionGate>>,
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("path", &self.path)
            .field("usage", &self.usage)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl Invocation {
    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Runs the usage's handler, if it has one.
    ///
    /// # Errors
    ///
    /// [`DispatchError::HandlerFailed`] wrapping the handler's error.
    pub fn execute(&self, source: &dyn CommandSource) -> Result<(), DispatchError> {
        let Some(handler) = self.usage.handler() else {
            debug!(path = ?self.path, "usage has no handler");
            return Ok(());
        };
        let context = ExecutionContext {
            source,
            label: &self.label,
            path: &self.path,
            usage: &self.usage,
            arguments: &self.arguments,
        };
        handler(&context).map_err(|error| {
            warn!(path = ?self.path, error = %error, "handler failed");
            DispatchError::HandlerFailed {
                command: self.path.join(" "),
                error,
            }
        })?;
        if let Some(gate) = &self.gate {
            gate.record(source, &self.path, &self.usage);
        }
        Ok(())
    }
}

/// Why nothing matched.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub command: String,
    /// The deepest parameter a token was accepted for.
    pub last_matched: Option<String>,
    /// Every usage of the command, for a help message.
    pub usages: Vec<String>,
}

/// Result of [`Engine::dispatch`] and [`Engine::prepare`].
#[derive(Debug)]
pub enum DispatchOutcome {
    Complete(Invocation),
    /// A subcommand prefix matched; its default usage was selected.
    Incomplete(Invocation),
    Failure(Failure),
}

impl DispatchOutcome {
    pub fn kind(&self) -> MatchKind {
        match self {
            DispatchOutcome::Complete(_) => MatchKind::Complete,
            DispatchOutcome::Incomplete(_) => MatchKind::Incomplete,
            DispatchOutcome::Failure(_) => MatchKind::Failure,
        }
    }

    pub fn invocation(&self) -> Option<&Invocation> {
        match self {
            DispatchOutcome::Complete(inv) | DispatchOutcome::Incomplete(inv) => Some(inv),
            DispatchOutcome::Failure(_) => None,
        }
    }
}

/// Registered root commands plus everything needed to run them.
///
/// Registration mutates; dispatch and suggestions only read, so a built
/// engine can be shared across threads.
///
/// # Examples
///
/// ```
/// use command_grammar::{Engine, MatchKind};
/// use command_grammar_core::{Command, SimpleSource, Usage};
///
/// let mut engine = Engine::new();
/// engine
///     .register(Command::new("give").with_usage(Usage::parse("<player> [amount:integer=1]").unwrap()))
///     .unwrap();
///
/// let source = SimpleSource::console();
/// let tokens = vec!["mqzen".to_string()];
/// let outcome = engine.dispatch(&source, "give", &tokens).unwrap();
/// assert_eq!(outcome.kind(), MatchKind::Complete);
/// assert_eq!(outcome.invocation().unwrap().arguments().integer("amount"), Some(1));
/// ```
#[derive(Default)]
pub struct Engine {
    config: EngineConfig,
    commands: Vec<Command>,
    /// Lowercased names and aliases to indices into `commands`.
    labels: HashMap<String, usize>,
    types: TypeRegistry,
    gate: Option<Arc<dyn ExecutionGate>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("commands", &self.commands.len())
            .field("types", &self.types)
            .field("gate", &self.gate.is_some())
            .finish()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Registers the resolver for `ValueType::Custom(key)`.
    pub fn register_type(&mut self, key: &str, resolver: impl TypeResolver + 'static) {
        self.types.register(key, resolver);
    }

    pub fn set_gate(&mut self, gate: impl ExecutionGate + 'static) {
        self.gate = Some(Arc::new(gate));
    }

    /// Verifies, links and stores a root command.
    ///
    /// # Errors
    ///
    /// Any [`RegistrationError`] from [`verify_command`], or
    /// [`RegistrationError::DuplicateCommand`] if a name or alias is taken.
    /// A failed command is not stored.
    pub fn register(&mut self, mut command: Command) -> Result<(), RegistrationError> {
        verify_command(&command)?;
        if let Some(taken) = command
            .names()
            .find(|name| self.labels.contains_key(&name.to_lowercase()))
        {
            return Err(RegistrationError::DuplicateCommand(taken.to_string()));
        }

        command.link();
        let index = self.commands.len();
        for name in command.names() {
            self.labels.insert(name.to_lowercase(), index);
        }
        info!(
            command = %command.name,
            usages = command.usages.len(),
            subcommands = command.children.len(),
            "registered command"
        );
        self.commands.push(command);
        Ok(())
    }

    /// Builds and registers every command in `tree`, installing `handler` on
    /// all usages. Returns the failures; the other commands stay registered.
    pub fn register_tree(
        &mut self,
        tree: &TreeDefinition,
        handler: Option<&Handler>,
    ) -> Vec<RegistrationError> {
        let mut failures = Vec::new();
        for definition in &tree.commands {
            let result = definition
                .build(handler)
                .and_then(|command| self.register(command));
            if let Err(err) = result {
                warn!(command = %definition.name, error = %err, "registration failed");
                failures.push(err);
            }
        }
        failures
    }

    /// Looks a root command up by name or alias, ignoring case.
    pub fn command(&self, label: &str) -> Option<&Command> {
        self.labels
            .get(&label.to_lowercase())
            .map(|&index| &self.commands[index])
    }

    /// Root commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.types, self.config.case_sensitive_literals)
    }

    /// Selects a usage without resolving it.
    pub fn traverse(&self, label: &str, tokens: &[String]) -> Option<Traversal<'_>> {
        self.command(label)
            .map(|root| self.matcher().traverse(root, tokens))
    }

    /// Selects and resolves a usage without running it.
    ///
    /// Permissions along the command path and on the usage are checked, then
    /// the execution gate, then arguments are resolved.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownCommand`], [`DispatchError::PermissionDenied`],
    /// [`DispatchError::OnCooldown`] or [`DispatchError::Resolution`]. A token
    /// list that matches nothing is not an error but a
    /// [`DispatchOutcome::Failure`].
    pub fn prepare(
        &self,
        source: &dyn CommandSource,
        label: &str,
        tokens: &[String],
    ) -> Result<DispatchOutcome, DispatchError> {
        let root = self
            .command(label)
            .ok_or_else(|| DispatchError::UnknownCommand(label.to_string()))?;
        let matcher = self.matcher();
        let traversal = matcher.traverse(root, tokens);

        let (Some(usage), MatchKind::Complete | MatchKind::Incomplete) =
            (traversal.usage, traversal.kind)
        else {
            debug!(command = %root.name, ?tokens, "no usage matched");
            return Ok(DispatchOutcome::Failure(Failure {
                command: root.name.clone(),
                last_matched: traversal.last_matched.map(|p| p.name.clone()),
                usages: usage_lines(root),
            }));
        };
        let command = traversal.command;

        check_permissions(source, root, command.path(), usage)?;
        if self
            .gate
            .as_ref()
            .is_some_and(|gate| gate.on_cooldown(source, command.path(), usage))
        {
            return Err(DispatchError::OnCooldown(command.path().join(" ")));
        }

        let trailing = match traversal.kind {
            MatchKind::Incomplete => Trailing::Ignore,
            _ => Trailing::Reject,
        };
        let arguments = matcher.resolve(source, command, usage, tokens, trailing)?;
        debug!(
            path = ?command.path(),
            usage = %usage.syntax(),
            arguments = arguments.len(),
            "resolved usage"
        );

        let invocation = Invocation {
            kind: traversal.kind,
            label: label.to_string(),
            path: command.path().to_vec(),
            usage: usage.clone(),
            arguments,
            gate: self.gate.clone(),
        };
        Ok(match traversal.kind {
            MatchKind::Incomplete => DispatchOutcome::Incomplete(invocation),
            _ => DispatchOutcome::Complete(invocation),
        })
    }

    /// Selects, resolves and runs a usage.
    ///
    /// # Errors
    ///
    /// Everything [`Engine::prepare`] returns, plus
    /// [`DispatchError::HandlerFailed`].
    pub fn dispatch(
        &self,
        source: &dyn CommandSource,
        label: &str,
        tokens: &[String],
    ) -> Result<DispatchOutcome, DispatchError> {
        let outcome = self.prepare(source, label, tokens)?;
        if let Some(invocation) = outcome.invocation() {
            invocation.execute(source)?;
        }
        Ok(outcome)
    }

    /// Suggestions for the last of `tokens`, which follow `label`.
    ///
    /// Unknown labels and roots the source may not use yield nothing.
    pub fn suggest(&self, source: &dyn CommandSource, label: &str, tokens: &[String]) -> Vec<String> {
        let Some(root) = self.command(label) else {
            return Vec::new();
        };
        if !self.root_visible(source, root) {
            return Vec::new();
        }
        Suggester::new(self.matcher(), &self.config, source).suggest(root, tokens)
    }

    /// Root names and aliases starting with `partial`.
    pub fn suggest_labels(&self, source: &dyn CommandSource, partial: &str) -> Vec<String> {
        let mut labels: Vec<String> = self
            .commands
            .iter()
            .filter(|root| self.root_visible(source, root))
            .flat_map(|root| root.names())
            .filter(|name| {
                name.get(..partial.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(partial))
            })
            .map(str::to_string)
            .collect();
        self.config.truncate(&mut labels);
        labels
    }

    /// Suggestions for a raw input line such as `"group admins se"`.
    ///
    /// A trailing space starts a new, empty token.
    pub fn complete_line(&self, source: &dyn CommandSource, line: &str) -> Vec<String> {
        let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if line.is_empty() || line.ends_with(char::is_whitespace) {
            tokens.push(String::new());
        }
        match tokens.split_first() {
            Some((label, [])) => self.suggest_labels(source, label),
            Some((label, rest)) => self.suggest(source, label, rest),
            None => Vec::new(),
        }
    }

    /// Every usage of the command as `label <syntax>` lines, with `  # text`
    /// appended for usages that carry a description.
    pub fn usages(&self, label: &str) -> Vec<String> {
        self.command(label).map(usage_lines).unwrap_or_default()
    }

    fn root_visible(&self, source: &dyn CommandSource, root: &Command) -> bool {
        !self.config.filter_suggestions_by_permission
            || root.suggestions_ignore_permission
            || root
                .permission
                .as_deref()
                .is_none_or(|p| source.has_permission(p))
    }
}

fn check_permissions(
    source: &dyn CommandSource,
    root: &Command,
    path: &[String],
    usage: &Usage,
) -> Result<(), DispatchError> {
    let mut node = root;
    let mut required: Vec<&str> = node.permission.as_deref().into_iter().collect();
    for name in path.iter().skip(1) {
        match node.find_child(name, true) {
            Some(child) => node = child,
            None => break,
        }
        required.extend(node.permission.as_deref());
    }
    required.extend(usage.permission.as_deref());

    for permission in required {
        if !source.has_permission(permission) {
            debug!(source = source.name(), permission, "permission denied");
            return Err(DispatchError::PermissionDenied(permission.to_string()));
        }
    }
    Ok(())
}

fn usage_lines(root: &Command) -> Vec<String> {
    fn walk(node: &Command, label: &str, out: &mut Vec<String>) {
        let mut usages: Vec<_> = node.effective_usages().iter().collect();
        usages.sort_by_key(|e| e.declared_index);
        for effective in usages {
            let line = format!("{label} {}", effective.usage.syntax());
            let line = match &effective.usage.description {
                Some(description) => format!("{}  # {description}", line.trim_end()),
                None => line.trim_end().to_string(),
            };
            out.push(line);
        }
        for child in &node.children {
            walk(child, label, out);
        }
    }

    let mut out = Vec::new();
    walk(root, &root.name, &mut out);
    out
}
