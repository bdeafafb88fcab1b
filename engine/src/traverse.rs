//! Usage selection.
//!
//! Walks the command tree and picks the usage a token list belongs to. At
//! every node, usages with literals of their own are tried first, then the
//! subcommand named at the node's literal slot, then pure value usages. The
//! first consistent candidate wins; selection never backtracks out of a
//! subcommand once its literal matched.

use command_grammar_core::{Command, Parameter, Usage};
use serde::Serialize;

use crate::flags::extract;
use crate::matcher::{Matcher, Slot, assign, path_flags, usage_flags};

/// How far the tokens got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// A usage matched.
    Complete,
    /// A subcommand literal matched but none of its usages did; its default
    /// usage applies.
    Incomplete,
    /// Nothing matched.
    Failure,
}

/// Outcome of [`Matcher::traverse`].
#[derive(Debug, Clone)]
pub struct Traversal<'c> {
    pub kind: MatchKind,
    /// Owner of the selected usage, the anchored subcommand, or the root on
    /// failure.
    pub command: &'c Command,
    /// Effective usage to resolve; `None` on failure.
    pub usage: Option<&'c Usage>,
    /// The deepest parameter some candidate accepted a token for.
    pub last_matched: Option<&'c Parameter>,
}

impl<'c> Traversal<'c> {
    fn new(kind: MatchKind, command: &'c Command, usage: Option<&'c Usage>) -> Self {
        Self {
            kind,
            command,
            usage,
            last_matched: None,
        }
    }
}

impl Matcher<'_> {
    /// Selects the usage of `root` (or a descendant) that `tokens` match.
    ///
    /// `tokens` excludes the root label. With no positional tokens and no
    /// match, the root's default usage is selected.
    pub fn traverse<'c>(&self, root: &'c Command, tokens: &[String]) -> Traversal<'c> {
        let mut best = None;
        let mut traversal = match self.walk(root, tokens, &mut best) {
            Some(found) => found,
            None if extract(&path_flags(root), tokens).positional().is_empty() => {
                Traversal::new(MatchKind::Complete, root, Some(root.effective_default()))
            }
            None => Traversal::new(MatchKind::Failure, root, None),
        };
        traversal.last_matched = best;
        tracing::debug!(
            command = %root.name,
            kind = ?traversal.kind,
            path = ?traversal.command.path(),
            usage = %traversal.usage.map(Usage::syntax).unwrap_or_default(),
            "traversal finished"
        );
        traversal
    }

    fn walk<'c>(
        &self,
        node: &'c Command,
        tokens: &[String],
        best: &mut Option<&'c Parameter>,
    ) -> Option<Traversal<'c>> {
        let usages = node.effective_usages();
        let split = usages.partition_point(|e| e.own_literals > 0);

        for effective in &usages[..split] {
            if self.usage_matches(node, &effective.usage, tokens, best) {
                return Some(Traversal::new(
                    MatchKind::Complete,
                    node,
                    Some(&effective.usage),
                ));
            }
        }

        for child in &node.children {
            if self.reaches(child, tokens, best) {
                return Some(self.walk(child, tokens, best).unwrap_or_else(|| {
                    Traversal::new(MatchKind::Incomplete, child, Some(child.effective_default()))
                }));
            }
        }

        usages[split..].iter().find_map(|effective| {
            self.usage_matches(node, &effective.usage, tokens, best)
                .then(|| Traversal::new(MatchKind::Complete, node, Some(&effective.usage)))
        })
    }

    /// Returns `true` if the prefix up to `child`'s literal matches.
    fn reaches<'c>(
        &self,
        child: &'c Command,
        tokens: &[String],
        best: &mut Option<&'c Parameter>,
    ) -> bool {
        let Some(slot) = child.literal_slot() else {
            return false;
        };
        let flags = path_flags(child);
        let scan = extract(&flags, tokens);
        let positional = scan.positional();
        if positional.len() <= slot {
            return false;
        }

        let prefix: Vec<&Parameter> = child.prefix().iter().filter(|p| !p.is_flag()).collect();
        let reached = prefix
            .iter()
            .zip(positional)
            .all(|(p, token)| self.accepts(p, token));
        if reached {
            note(best, prefix[slot]);
        }
        reached
    }

    fn usage_matches<'c>(
        &self,
        node: &'c Command,
        usage: &'c Usage,
        tokens: &[String],
        best: &mut Option<&'c Parameter>,
    ) -> bool {
        let flags = usage_flags(node, usage);
        let scan = extract(&flags, tokens);
        let positional = scan.positional();
        let count = positional.len();

        let params: Vec<&Parameter> = usage.positional().collect();
        let (slots, consumed) = assign(&params, count);
        for (p, slot) in params.into_iter().zip(slots) {
            match slot {
                Slot::Token(i) if self.accepts(p, positional[i]) => note(best, p),
                Slot::Token(_) | Slot::Missing => return false,
                Slot::Greedy(range) if range.is_empty() && p.default_value().is_none() => {
                    return false;
                }
                Slot::Greedy(_) => note(best, p),
                Slot::Skipped => {}
            }
        }
        consumed == count
    }
}

fn note<'c>(best: &mut Option<&'c Parameter>, p: &'c Parameter) {
    if best.is_none_or(|b| b.position() < p.position()) {
        *best = Some(p);
    }
}
