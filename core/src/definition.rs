//! Declarative command definitions.
//!
//! Serializable descriptions of a command tree, suitable for YAML or JSON
//! files. [`CommandDefinition::build`] turns them into [`Command`] values,
//! parsing each usage with the compact syntax of [`Usage::parse`].
//!
//! # Example YAML
//!
//! ```yaml
//! commands:
//!   - name: ban
//!     aliases: [b]
//!     permission: mod.ban
//!     usages:
//!       - "<player> [-silent|s] <duration:duration> <reason...>"
//!     flags:
//!       - name: ip
//!   - name: group
//!     usages:
//!       - "<group>"
//!     subcommands:
//!       - name: setperm
//!         attachment: main
//!         usages:
//!           - syntax: "<permission> [value:boolean=true]"
//!             permission: group.setperm
//! ```

use serde::{Deserialize, Serialize};

use crate::validate::RegistrationError;
use crate::{Command, DefaultValue, FlagData, Handler, Usage, ValueType};

/// A file holding several command definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeDefinition {
    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
}

/// A command and, recursively, its subcommands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default)]
    pub usages: Vec<UsageDefinition>,
    /// Free flags.
    #[serde(default)]
    pub flags: Vec<FlagDefinition>,
    #[serde(default)]
    pub subcommands: Vec<CommandDefinition>,
    #[serde(default)]
    pub attachment: crate::Attachment,
    #[serde(default)]
    pub suggestions_ignore_permission: bool,
}

/// A usage given as bare syntax or with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsageDefinition {
    Syntax(String),
    Detailed {
        syntax: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permission: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Static suggestions per parameter name.
        #[serde(default)]
        suggestions: std::collections::BTreeMap<String, Vec<String>>,
    },
}

/// A free flag; omit `type` for a switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagDefinition {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl UsageDefinition {
    fn build(&self, handler: Option<&Handler>) -> Result<Usage, RegistrationError> {
        let mut usage = match self {
            UsageDefinition::Syntax(syntax) => Usage::parse(syntax)?,
            UsageDefinition::Detailed {
                syntax,
                permission,
                description,
                suggestions,
            } => {
                let parameters = crate::syntax::parse_parameters(syntax)?
                    .into_iter()
                    .map(|p| match suggestions.get(&p.name) {
                        Some(words) => p.with_suggestions(words.iter().cloned()),
                        None => p,
                    });
                let mut usage = Usage::of(parameters);
                usage.permission = permission.clone();
                usage.description = description.clone();
                usage
            }
        };
        if let Some(handler) = handler {
            usage = usage.with_shared_handler(handler.clone());
        }
        Ok(usage)
    }
}

impl FlagDefinition {
    fn build(&self) -> FlagData {
        let mut flag = match &self.value_type {
            Some(vt) => FlagData::valued(&self.name, vt.clone()),
            None => FlagData::switch(&self.name),
        };
        flag.aliases = self.aliases.clone();
        flag.default = self.default.clone().map(DefaultValue::Raw);
        flag.free()
    }
}

impl CommandDefinition {
    /// Builds the command tree, installing `handler` on every usage,
    /// including default usages.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidSyntax`] if any usage syntax is
    /// malformed. Structural checks happen at registration.
    pub fn build(&self, handler: Option<&Handler>) -> Result<Command, RegistrationError> {
        let mut command = Command::new(&self.name);
        command.aliases = self.aliases.clone();
        command.description = self.description.clone();
        command.permission = self.permission.clone();
        command.attachment = self.attachment;
        command.suggestions_ignore_permission = self.suggestions_ignore_permission;
        command.usages = self
            .usages
            .iter()
            .map(|u| u.build(handler))
            .collect::<Result<_, _>>()?;
        command.free_flags = self.flags.iter().map(FlagDefinition::build).collect();
        command.children = self
            .subcommands
            .iter()
            .map(|c| c.build(handler))
            .collect::<Result<_, _>>()?;
        if let Some(handler) = handler {
            command.default_usage = Usage::new().with_shared_handler(handler.clone());
        }
        Ok(command)
    }
}
