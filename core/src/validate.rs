//! Registration-time verification.
//!
//! Rejects malformed usages (misplaced greedy parameters, duplicate names,
//! bad flag names) and pairs of usages that the dispatcher could not tell
//! apart. A command tree that passes [`verify_command`] never produces an
//! ambiguous dispatch.
//!
//! # Ambiguity policy
//!
//! Two usages of the same command are ambiguous when they have the same
//! number of non-flag parameters and, at every position, some token could
//! match both parameters:
//!
//! - literal vs value: always distinguishable;
//! - literal vs literal: ambiguous if their names or aliases intersect;
//! - value vs value: ambiguous if their token shapes overlap (see
//!   [`ValueType::overlaps`](crate::ValueType::overlaps)).
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::*;
//!
//! let by_name = Usage::of([Parameter::required("player", ValueType::String)]);
//! let by_id = Usage::of([Parameter::required("id", ValueType::Integer)]);
//! assert!(are_ambiguous(&by_name, &by_id));
//!
//! let list = Usage::of([Parameter::literal("list")]);
//! assert!(!are_ambiguous(&list, &by_id));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Attachment, Command, Parameter, ParameterKind, Usage};

/// Errors raised while registering a command.
///
/// A failing command is rejected as a whole; commands registered earlier are
/// unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A command, parameter or flag has an empty name.
    #[error("name cannot be empty")]
    EmptyName,
    /// A usage syntax element could not be parsed.
    #[error("invalid usage syntax element: {0}")]
    InvalidSyntax(String),
    /// Two parameters (or a parameter and an inherited one) share a name.
    #[error("duplicate parameter '{name}' in usage '{usage}'")]
    DuplicateParameter { usage: String, name: String },
    /// A usage declares more than one greedy parameter.
    #[error("usage '{0}' declares more than one greedy parameter")]
    MultipleGreedy(String),
    /// A greedy parameter is followed by another positional parameter.
    #[error("greedy parameter must be last in usage '{0}'")]
    GreedyNotLast(String),
    /// A flag name or alias is empty, starts with `-` or contains whitespace.
    #[error("invalid flag name: {0}")]
    InvalidFlagName(String),
    /// A range on a non-numeric parameter, or `min > max`.
    #[error("invalid range on parameter '{0}'")]
    InvalidRange(String),
    /// The default usage must not declare parameters.
    #[error("default usage of '{0}' must not declare parameters")]
    DefaultUsageNotEmpty(String),
    /// Two usages of one command accept the same token sequences.
    #[error("ambiguous usages in '{command}': '{first}' and '{second}'")]
    AmbiguousUsages {
        command: String,
        first: String,
        second: String,
    },
    /// Two subcommands in the same scope share a name or alias.
    #[error("duplicate subcommand '{name}' in '{command}'")]
    DuplicateSubcommand { command: String, name: String },
    /// A root command name or alias is already registered.
    #[error("command already registered: {0}")]
    DuplicateCommand(String),
    /// A subcommand attaches to a main usage that is missing or not fixed-width.
    #[error("subcommand '{0}' cannot attach after its parent's main usage")]
    UnsupportedAttachment(String),
}

/// Checks the internal consistency of one usage.
///
/// # Errors
///
/// Returns the first problem found: empty or duplicate names, more than one
/// greedy parameter, a greedy parameter that is not last, malformed flag
/// names, or a range on a non-numeric parameter.
pub fn verify_usage(usage: &Usage) -> Result<(), RegistrationError> {
    let syntax = usage.syntax();
    let mut seen: HashSet<&str> = HashSet::new();

    for p in usage.parameters() {
        if p.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let names: Vec<&str> = match &p.kind {
            ParameterKind::Flag(flag) => flag.names().collect(),
            _ => vec![p.name.as_str()],
        };
        for name in names {
            if !seen.insert(name) {
                return Err(RegistrationError::DuplicateParameter {
                    usage: syntax,
                    name: name.to_string(),
                });
            }
        }

        if let Some(flag) = p.as_flag() {
            for name in flag.names() {
                check_flag_name(name)?;
            }
        }

        if let Some(range) = &p.range {
            let numeric = p.value_type().is_some_and(|vt| vt.is_numeric());
            let ordered = match (range.min, range.max) {
                (Some(min), Some(max)) => min <= max,
                _ => true,
            };
            if !numeric || !ordered {
                return Err(RegistrationError::InvalidRange(p.name.clone()));
            }
        }
    }

    let positional: Vec<&Parameter> = usage.positional().collect();
    let greedy_count = positional.iter().filter(|p| p.is_greedy()).count();
    if greedy_count > 1 {
        return Err(RegistrationError::MultipleGreedy(syntax));
    }
    if greedy_count == 1 && !positional.last().is_some_and(|p| p.is_greedy()) {
        return Err(RegistrationError::GreedyNotLast(syntax));
    }

    Ok(())
}

/// Returns `true` if the dispatcher could not choose between `a` and `b`.
pub fn are_ambiguous(a: &Usage, b: &Usage) -> bool {
    a.positional_count() == b.positional_count()
        && a
            .positional()
            .zip(b.positional())
            .all(|(x, y)| parameters_overlap(x, y))
}

fn parameters_overlap(a: &Parameter, b: &Parameter) -> bool {
    match (a.is_literal(), b.is_literal()) {
        (true, true) => {
            let names_b = b.literal_names();
            a.literal_names()
                .into_iter()
                .any(|x| names_b.iter().any(|y| x.eq_ignore_ascii_case(y)))
        }
        (false, false) => match (a.value_type(), b.value_type()) {
            (Some(x), Some(y)) => x.overlaps(y),
            _ => true,
        },
        _ => false,
    }
}

fn check_flag_name(name: &str) -> Result<(), RegistrationError> {
    if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
        return Err(RegistrationError::InvalidFlagName(name.to_string()));
    }
    Ok(())
}

/// Verifies a whole command tree.
///
/// Besides [`verify_usage`] on every usage and pairwise [`are_ambiguous`]
/// checks, this rejects duplicate subcommand names or aliases, usages whose
/// parameter names clash with parameters inherited from a parent's main
/// usage or with free flags in scope, and `Main` attachments to parents whose
/// first usage is missing or not fixed-width.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
///
/// let ok = Command::new("group")
///     .with_usage(Usage::parse("<group>").unwrap())
///     .with_subcommand(
///         Command::new("setperm")
///             .attached(Attachment::Main)
///             .with_usage(Usage::parse("<permission>").unwrap()),
///     );
/// assert!(verify_command(&ok).is_ok());
///
/// let clash = Command::new("group")
///     .with_usage(Usage::parse("<group>").unwrap())
///     .with_subcommand(
///         Command::new("rename")
///             .attached(Attachment::Main)
///             .with_usage(Usage::parse("<group>").unwrap()),
///     );
/// assert!(matches!(
///     verify_command(&clash),
///     Err(RegistrationError::DuplicateParameter { .. })
/// ));
/// ```
pub fn verify_command(command: &Command) -> Result<(), RegistrationError> {
    verify_node(command, &[], &[])
}

fn verify_node(
    command: &Command,
    inherited: &[String],
    scope_flags: &[String],
) -> Result<(), RegistrationError> {
    if command.name.trim().is_empty() || command.aliases.iter().any(|a| a.trim().is_empty()) {
        return Err(RegistrationError::EmptyName);
    }
    if !command.default_usage.is_empty() {
        return Err(RegistrationError::DefaultUsageNotEmpty(command.name.clone()));
    }

    let mut scope_flags = scope_flags.to_vec();
    for flag in &command.free_flags {
        for name in flag.names() {
            check_flag_name(name)?;
            if scope_flags.iter().any(|f| f == name) {
                return Err(RegistrationError::DuplicateParameter {
                    usage: command.name.clone(),
                    name: name.to_string(),
                });
            }
            scope_flags.push(name.to_string());
        }
    }

    for usage in &command.usages {
        verify_usage(usage)?;
        for p in usage.parameters() {
            let clashes_inherited = !p.is_literal() && inherited.contains(&p.name);
            let clashes_flag = p
                .as_flag()
                .is_some_and(|f| f.names().any(|n| scope_flags.iter().any(|s| s == n)));
            if clashes_inherited || clashes_flag {
                return Err(RegistrationError::DuplicateParameter {
                    usage: usage.syntax(),
                    name: p.name.clone(),
                });
            }
        }
    }

    for (i, first) in command.usages.iter().enumerate() {
        for second in &command.usages[i + 1..] {
            if are_ambiguous(first, second) {
                return Err(RegistrationError::AmbiguousUsages {
                    command: command.name.clone(),
                    first: first.syntax(),
                    second: second.syntax(),
                });
            }
        }
    }

    let mut child_names: HashSet<String> = HashSet::new();
    for child in &command.children {
        for name in child.names() {
            if !child_names.insert(name.to_ascii_lowercase()) {
                return Err(RegistrationError::DuplicateSubcommand {
                    command: command.name.clone(),
                    name: name.to_string(),
                });
            }
        }

        let mut child_inherited = inherited.to_vec();
        if child.attachment == Attachment::Main {
            let main = command
                .usages
                .first()
                .filter(|u| u.positional().all(Parameter::is_required))
                .ok_or_else(|| RegistrationError::UnsupportedAttachment(child.name.clone()))?;
            child_inherited.extend(
                main.parameters()
                    .iter()
                    .filter(|p| !p.is_literal())
                    .map(|p| p.name.clone()),
            );
        }
        verify_node(child, &child_inherited, &scope_flags)?;
    }

    Ok(())
}
