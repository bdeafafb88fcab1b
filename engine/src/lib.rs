//! Dispatch, argument resolution and suggestions for command grammars.
//!
//! An [`Engine`] holds registered root [`Command`](command_grammar_core::Command)s
//! and turns token lists into invocations:
//!
//! 1. [`flags::extract`] pulls flags out from anywhere among the tokens.
//! 2. Traversal ([`Matcher::traverse`]) picks one effective usage, or reports
//!    an incomplete subcommand path or a failure.
//! 3. Resolution ([`Matcher::resolve`]) converts the tokens of that usage,
//!    back-filling optionals and joining greedy text.
//! 4. The usage's handler runs with the resolved [`Arguments`](command_grammar_core::Arguments).
//!
//! [`Engine::suggest`] produces completions for a partially typed line using
//! the same matching rules.

pub mod config;
mod engine;
pub mod error;
pub mod flags;
mod matcher;
mod resolve;
mod resolvers;
mod suggest;
mod traverse;

pub use config::{EngineConfig, load_tree, save_tree};
pub use engine::{DispatchOutcome, Engine, ExecutionGate, Failure, Invocation};
pub use error::{ConfigError, DispatchError, ResolutionError};
pub use matcher::Matcher;
pub use resolve::Trailing;
pub use resolvers::{TypeRegistry, TypeResolver};
pub use traverse::{MatchKind, Traversal};
