//! Error types for dispatch, resolution and configuration.

use thiserror::Error;

/// Failure to turn the tokens of an already selected usage into values.
///
/// These never trigger selection of another usage: the usage was chosen by
/// traversal before resolution started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// A literal position holds a different word.
    #[error("unknown subcommand '{found}', expected '{expected}'")]
    UnknownSubcommand { expected: String, found: String },
    /// A token does not convert to the parameter's type.
    #[error("'{token}' is not a valid {expected} for '{parameter}'")]
    TypeConversion {
        parameter: String,
        token: String,
        expected: String,
    },
    /// A numeric value lies outside the declared range.
    #[error("{value} is out of range for '{parameter}' ({range})")]
    OutOfRange {
        parameter: String,
        value: String,
        range: String,
    },
    /// A required parameter received no token.
    #[error("missing required argument '{0}'")]
    MissingRequiredArgument(String),
    /// A valued flag is last, or followed by another flag.
    #[error("flag '-{0}' expects a value")]
    MissingFlagValue(String),
    /// Positional tokens left after every parameter was filled.
    #[error("too many arguments: {0}")]
    TooManyArguments(String),
    /// A custom value type has no registered resolver.
    #[error("no resolver registered for type '{0}'")]
    UnknownType(String),
}

/// Errors returned by [`Engine::dispatch`](crate::Engine::dispatch) and
/// [`Engine::prepare`](crate::Engine::prepare).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No command is registered under the label.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// The source lacks a permission required on the path or usage.
    #[error("missing permission: {0}")]
    PermissionDenied(String),
    /// The execution gate reported an active cooldown.
    #[error("command '{0}' is on cooldown")]
    OnCooldown(String),
    /// Argument resolution failed for the selected usage.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// The handler returned an error.
    #[error("handler for '{command}' failed: {error:#}")]
    HandlerFailed {
        command: String,
        error: anyhow::Error,
    },
}

/// Errors reading or writing configuration and definition files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
