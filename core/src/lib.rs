//! Data model for token-level command grammars.
//!
//! This crate defines the building blocks a command grammar is written in:
//!
//! - [`ValueType`] and [`Value`]: declared parameter types (with the token
//!   shapes used to refute a match) and resolved values.
//! - [`Parameter`]: literals, required and optional values, greedy text and
//!   flags ([`FlagData`]).
//! - [`Usage`]: an ordered parameter list plus a [`Handler`].
//! - [`Command`]: a named set of usages with subcommands, free flags and a
//!   default usage.
//! - [`Arguments`]: the resolved name-to-value map handlers receive.
//!
//! Registration checks ([`verify_usage`], [`are_ambiguous`],
//! [`verify_command`]) reject malformed usages and pairs the dispatcher could
//! not tell apart. Declarative [`TreeDefinition`]s build commands from YAML or
//! JSON.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let ban = Command::new("ban")
//!     .with_usage(
//!         Usage::new()
//!             .with_parameter(Parameter::required("player", ValueType::String))
//!             .with_parameter(Parameter::switch("silent", &["s"]))
//!             .with_parameter(Parameter::required("duration", ValueType::Duration))
//!             .with_parameter(Parameter::greedy("reason")),
//!     )
//!     .with_usage(Usage::parse("list [page:integer=1]").unwrap());
//!
//! assert!(verify_command(&ban).is_ok());
//! assert_eq!(ban.usages[1].min_length(), 1);
//! ```

mod arguments;
mod command;
pub mod definition;
mod parameter;
mod source;
mod syntax;
mod types;
mod usage;
mod validate;

pub use arguments::Arguments;
pub use command::{Attachment, Command, EffectiveUsage};
pub use definition::{CommandDefinition, FlagDefinition, TreeDefinition, UsageDefinition};
pub use parameter::{
    DefaultValue, FlagData, NumericRange, Parameter, ParameterKind, SuggestionFn, Supplier,
};
pub use source::{CommandSource, SimpleSource};
pub use types::{Value, ValueType, format_duration, parse_duration};
pub use usage::{ExecutionContext, Handler, Usage};
pub use validate::{RegistrationError, are_ambiguous, verify_command, verify_usage};
