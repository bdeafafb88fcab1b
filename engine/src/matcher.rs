//! Token tests and slot assignment shared by traversal, resolution and
//! suggestions.

use std::ops::Range;

use command_grammar_core::{Command, FlagData, Parameter, ParameterKind, Usage};

use crate::resolvers::TypeRegistry;

/// Decides whether a token can fill a parameter.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'e> {
    types: &'e TypeRegistry,
    case_sensitive: bool,
}

impl<'e> Matcher<'e> {
    pub fn new(types: &'e TypeRegistry, case_sensitive: bool) -> Self {
        Self {
            types,
            case_sensitive,
        }
    }

    pub fn types(&self) -> &'e TypeRegistry {
        self.types
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Literal names for literals, type shapes for values; greedy and flag
    /// parameters accept anything.
    pub fn accepts(&self, parameter: &Parameter, token: &str) -> bool {
        match &parameter.kind {
            ParameterKind::Literal { .. } => parameter.accepts(token, self.case_sensitive),
            ParameterKind::Required(vt) | ParameterKind::Optional { value_type: vt, .. } => {
                self.types.accepts(vt, token)
            }
            ParameterKind::Greedy { .. } | ParameterKind::Flag(_) => true,
        }
    }
}

/// Flags in effect for a usage of `command`: its own, then the free flags in
/// scope.
pub(crate) fn usage_flags<'c>(command: &'c Command, usage: &'c Usage) -> Vec<&'c FlagData> {
    usage.flags().chain(command.scope_flags()).collect()
}

/// Flags in effect while reaching `command`: prefix flags and free flags.
pub(crate) fn path_flags(command: &Command) -> Vec<&FlagData> {
    command
        .prefix()
        .iter()
        .filter_map(Parameter::as_flag)
        .chain(command.scope_flags())
        .collect()
}

/// Where a positional parameter gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Index into the positional tokens.
    Token(usize),
    /// An optional left for its default.
    Skipped,
    /// Everything a greedy parameter swallowed; may be empty.
    Greedy(Range<usize>),
    /// A required parameter with no token left.
    Missing,
}

/// Required parameters and greedy ones without a default each need a token.
fn needs_token(p: &Parameter) -> bool {
    p.is_required() || (p.is_greedy() && p.default_value().is_none())
}

/// Assigns `count` positional tokens to `params`, left to right.
///
/// An optional takes a token only if enough tokens remain for every required
/// parameter after it (a greedy without a default counts as one); otherwise it
/// is skipped and later tokens back-fill the
/// required ones. With `r1 o1 r2 o2` and two tokens, `r1` and `r2` get them.
/// Returns the slots and the number of tokens consumed.
pub(crate) fn assign(params: &[&Parameter], count: usize) -> (Vec<Slot>, usize) {
    let mut slots = Vec::with_capacity(params.len());
    let mut cursor = 0;
    for (i, p) in params.iter().enumerate() {
        let slot = match &p.kind {
            ParameterKind::Greedy { .. } => {
                let slot = Slot::Greedy(cursor..count.max(cursor));
                cursor = count.max(cursor);
                slot
            }
            ParameterKind::Optional { .. } => {
                let required_after = params[i + 1..].iter().filter(|p| needs_token(p)).count();
                if count.saturating_sub(cursor) > required_after {
                    cursor += 1;
                    Slot::Token(cursor - 1)
                } else {
                    Slot::Skipped
                }
            }
            _ if cursor < count => {
                cursor += 1;
                Slot::Token(cursor - 1)
            }
            _ => Slot::Missing,
        };
        slots.push(slot);
    }
    (slots, cursor)
}
