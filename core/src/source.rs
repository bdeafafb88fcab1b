//! The entity on whose behalf a command runs.

use std::collections::HashSet;

/// Whoever typed the command: a console, a player, a bot user.
///
/// Permission checks are delegated to the host through
/// [`has_permission`](CommandSource::has_permission); the default grants
/// everything.
pub trait CommandSource {
    fn name(&self) -> &str;

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}

/// A source with a fixed permission set.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandSource, SimpleSource};
///
/// let console = SimpleSource::console();
/// assert!(console.has_permission("anything"));
///
/// let user = SimpleSource::new("mqzen").with_permission("group.setperm");
/// assert!(user.has_permission("group.setperm"));
/// assert!(!user.has_permission("group.delete"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimpleSource {
    name: String,
    permissions: HashSet<String>,
    operator: bool,
}

impl SimpleSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A source holding every permission.
    pub fn console() -> Self {
        Self {
            name: "console".to_string(),
            permissions: HashSet::new(),
            operator: true,
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }
}

impl CommandSource for SimpleSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.operator || self.permissions.contains(permission)
    }
}
