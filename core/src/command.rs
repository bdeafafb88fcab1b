//! Commands and the subcommand tree.
//!
//! A [`Command`] owns its usages and its children. The tree is linked once,
//! at registration, by [`Command::link`]: every node learns its path from the
//! root (its non-owning handle to the parent) and gets its *effective*
//! usages, which are the declared usages prefixed with the parameters needed
//! to reach the node from the root.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ExecutionContext, FlagData, Parameter, Usage};

/// Where a subcommand's literal sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    /// `parent child ...`
    #[default]
    Direct,
    /// `parent <main usage arguments> child ...`
    Main,
}

/// A declared usage as seen from the root: inherited prefix plus own
/// parameters.
#[derive(Debug, Clone)]
pub struct EffectiveUsage {
    pub usage: Usage,
    /// Index into the owning command's declared usages.
    pub declared_index: usize,
    /// Literals declared by the usage itself, not inherited.
    pub own_literals: usize,
}

/// A named command with usages and subcommands.
///
/// # Examples
///
/// ```
/// use command_grammar_core::*;
///
/// let mut group = Command::new("group")
///     .with_alias("g")
///     .with_usage(Usage::parse("<group>").unwrap())
///     .with_subcommand(
///         Command::new("setperm")
///             .attached(Attachment::Main)
///             .with_usage(Usage::parse("<permission> [value:boolean]").unwrap()),
///     );
/// group.link();
///
/// let setperm = group.find_child("setperm", false).unwrap();
/// assert_eq!(setperm.path(), ["group", "setperm"]);
/// assert_eq!(setperm.parent_path(), Some(&["group".to_string()][..]));
/// assert_eq!(
///     setperm.effective_usages()[0].usage.syntax(),
///     "<group> setperm <permission> [value:boolean]"
/// );
/// ```
#[derive(Clone, Default)]
pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub permission: Option<String>,
    pub usages: Vec<Usage>,
    /// Runs when the command (or an incomplete subcommand path) is invoked
    /// without arguments. Must not declare parameters.
    pub default_usage: Usage,
    pub children: Vec<Command>,
    /// Flags accepted by every usage of this command and its subcommands.
    pub free_flags: Vec<FlagData>,
    pub attachment: Attachment,
    /// Offer subcommands and usages in suggestions regardless of permission.
    pub suggestions_ignore_permission: bool,
    path: Vec<String>,
    prefix: Vec<Parameter>,
    scope_flags: Vec<FlagData>,
    effective: Vec<EffectiveUsage>,
    effective_default: Usage,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("usages", &self.usages)
            .field("children", &self.children)
            .field("attachment", &self.attachment)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permission = Some(permission.to_string());
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usages.push(usage);
        self
    }

    pub fn with_default_handler(
        mut self,
        handler: impl Fn(&ExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.default_usage = std::mem::take(&mut self.default_usage).with_handler(handler);
        self
    }

    pub fn with_subcommand(mut self, child: Command) -> Self {
        self.children.push(child);
        self
    }

    /// Adds a flag usable in every usage; the flag is marked free.
    pub fn with_free_flag(mut self, flag: FlagData) -> Self {
        self.free_flags.push(flag.free());
        self
    }

    pub fn attached(mut self, attachment: Attachment) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn ignore_permission_in_suggestions(mut self) -> Self {
        self.suggestions_ignore_permission = true;
        self
    }

    /// Name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn matches(&self, token: &str, case_sensitive: bool) -> bool {
        self.names().any(|name| {
            if case_sensitive {
                name == token
            } else {
                name.eq_ignore_ascii_case(token)
            }
        })
    }

    /// Finds a direct subcommand by name or alias.
    pub fn find_child(&self, token: &str, case_sensitive: bool) -> Option<&Command> {
        self.children.iter().find(|c| c.matches(token, case_sensitive))
    }

    /// Follows a path of subcommand names below this command.
    pub fn descendant<S: AsRef<str>>(&self, path: &[S]) -> Option<&Command> {
        path.iter()
            .try_fold(self, |node, name| node.find_child(name.as_ref(), false))
    }

    /// Root-to-self command names. Empty until linked.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The parent's path, `None` for roots.
    pub fn parent_path(&self) -> Option<&[String]> {
        match self.path.len() {
            0 | 1 => None,
            n => Some(&self.path[..n - 1]),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.len() <= 1
    }

    /// Parameters needed to reach this command from the root.
    pub fn prefix(&self) -> &[Parameter] {
        &self.prefix
    }

    /// Positional index of this command's own literal; `None` for roots.
    pub fn literal_slot(&self) -> Option<usize> {
        self.prefix
            .iter()
            .filter(|p| !p.is_flag())
            .count()
            .checked_sub(1)
    }

    /// Declared usages prefixed for dispatch, ordered so that usages with
    /// literals of their own come first.
    pub fn effective_usages(&self) -> &[EffectiveUsage] {
        &self.effective
    }

    /// The default usage prefixed for dispatch.
    pub fn effective_default(&self) -> &Usage {
        &self.effective_default
    }

    /// Free flags of this command and all ancestors.
    pub fn scope_flags(&self) -> &[FlagData] {
        &self.scope_flags
    }

    /// Links the tree below this command, treating it as a root.
    ///
    /// Idempotent; call again after mutating the tree.
    pub fn link(&mut self) {
        self.link_under(&[], Vec::new(), &[]);
    }

    fn link_under(&mut self, parent_path: &[String], prefix: Vec<Parameter>, inherited: &[FlagData]) {
        self.path = parent_path.to_vec();
        self.path.push(self.name.clone());
        self.prefix = prefix;

        self.scope_flags = inherited.to_vec();
        self.scope_flags
            .extend(self.free_flags.iter().cloned().map(FlagData::free));

        let mut effective: Vec<EffectiveUsage> = self
            .usages
            .iter()
            .enumerate()
            .map(|(declared_index, usage)| EffectiveUsage {
                usage: usage.with_prefix(&self.prefix),
                declared_index,
                own_literals: usage.literal_count(),
            })
            .collect();
        effective.sort_by(|a, b| b.own_literals.cmp(&a.own_literals));
        self.effective = effective;
        self.effective_default = self.default_usage.with_prefix(&self.prefix);

        for child in &mut self.children {
            let mut child_prefix = self.prefix.clone();
            if child.attachment == Attachment::Main {
                if let Some(main) = self.usages.first() {
                    child_prefix.extend(main.parameters().iter().cloned());
                }
            }
            let literal = child
                .aliases
                .iter()
                .fold(Parameter::literal(&child.name), |p, alias| p.with_alias(alias));
            child_prefix.push(literal);
            child.link_under(&self.path, child_prefix, &self.scope_flags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Command {
        let mut cmd = Command::new("group")
            .with_usage(Usage::parse("<group>").unwrap())
            .with_usage(Usage::parse("list [page:integer]").unwrap())
            .with_free_flag(FlagData::switch("verbose").with_alias("v"))
            .with_subcommand(
                Command::new("member").with_subcommand(
                    Command::new("setperm")
                        .with_alias("sp")
                        .with_usage(Usage::parse("<permission>").unwrap()),
                ),
            );
        cmd.link();
        cmd
    }

    #[test]
    fn test_link_orders_literal_usages_first() {
        let cmd = tree();
        let syntaxes: Vec<String> = cmd
            .effective_usages()
            .iter()
            .map(|e| e.usage.syntax())
            .collect();
        assert_eq!(syntaxes, vec!["list [page:integer]", "<group>"]);
        assert_eq!(cmd.effective_usages()[0].declared_index, 1);
    }

    #[test]
    fn test_link_builds_prefixes_and_paths() {
        let cmd = tree();
        let setperm = cmd.descendant(&["member", "sp"]).unwrap();

        assert_eq!(setperm.path(), ["group", "member", "setperm"]);
        assert_eq!(setperm.literal_slot(), Some(1));
        assert_eq!(
            setperm.effective_usages()[0].usage.syntax(),
            "member setperm|sp <permission>"
        );
        assert_eq!(setperm.effective_default().syntax(), "member setperm|sp");
        assert_eq!(setperm.scope_flags().len(), 1);
        assert!(setperm.scope_flags()[0].free);
    }

    #[test]
    fn test_root_has_no_parent() {
        let cmd = tree();
        assert!(cmd.is_root());
        assert_eq!(cmd.parent_path(), None);
        assert_eq!(cmd.literal_slot(), None);
    }

    #[test]
    fn test_matches_case_insensitively_by_default() {
        let cmd = Command::new("Ban").with_alias("b");
        assert!(cmd.matches("ban", false));
        assert!(!cmd.matches("ban", true));
        assert!(cmd.matches("B", false));
        assert!(Command::new("x").find_child("y", false).is_none());
    }
}
