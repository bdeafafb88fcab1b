//! Engine configuration and definition files.
//!
//! # Example YAML
//!
//! ```yaml
//! case_sensitive_literals: false
//! max_suggestions: 64
//! filter_suggestions_by_permission: true
//! suggest_flags: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use command_grammar_core::TreeDefinition;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for dispatch and suggestions.
///
/// Missing keys fall back to [`EngineConfig::default`].
///
/// # Examples
///
/// ```
/// use command_grammar::EngineConfig;
///
/// let config: EngineConfig = serde_yaml::from_str("max_suggestions: 10").unwrap();
/// assert_eq!(config.max_suggestions, 10);
/// assert!(!config.case_sensitive_literals);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Compare subcommand and inline literals case-sensitively.
    pub case_sensitive_literals: bool,
    /// Upper bound on returned suggestions; `0` means unlimited.
    pub max_suggestions: usize,
    /// Hide subcommands and usages the source may not run.
    pub filter_suggestions_by_permission: bool,
    /// Offer `-alias` candidates for flags not yet given.
    pub suggest_flags: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            case_sensitive_literals: false,
            max_suggestions: 64,
            filter_suggestions_by_permission: true,
            suggest_flags: true,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a YAML or JSON file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::ConfigError::Io) if the file cannot be read, or a
    /// parse error for malformed content.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_file(path.as_ref())
    }

    /// Saves the configuration as YAML or JSON, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::ConfigError::Io) if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_file(path.as_ref(), self)
    }

    /// Applies the limit to a suggestion list.
    pub(crate) fn truncate(&self, suggestions: &mut Vec<String>) {
        if self.max_suggestions > 0 {
            suggestions.truncate(self.max_suggestions);
        }
    }
}

/// Reads a command tree definition from YAML or JSON.
///
/// # Errors
///
/// Returns [`ConfigError`](crate::ConfigError) on I/O or parse failure.
pub fn load_tree(path: impl AsRef<Path>) -> Result<TreeDefinition> {
    read_file(path.as_ref())
}

/// Writes a command tree definition as YAML or JSON.
///
/// # Errors
///
/// Returns [`ConfigError`](crate::ConfigError) on I/O or serialization failure.
pub fn save_tree(tree: &TreeDefinition, path: impl AsRef<Path>) -> Result<()> {
    write_file(path.as_ref(), tree)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    if is_json(path) {
        Ok(serde_json::from_reader(reader)?)
    } else {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(std::fs::File::create(path)?);
    if is_json(path) {
        serde_json::to_writer_pretty(writer, value)?;
    } else {
        serde_yaml::to_writer(writer, value)?;
    }
    Ok(())
}
