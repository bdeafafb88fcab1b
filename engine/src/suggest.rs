//! Completion candidates for a partially typed command.
//!
//! The last token is the one being completed. Every usage and subcommand the
//! preceding tokens are still consistent with contributes candidates for the
//! slot the partial token would fill.

use std::collections::{BTreeSet, HashSet};

use command_grammar_core::{Command, CommandSource, FlagData, Parameter, Usage};

use crate::config::EngineConfig;
use crate::flags::{FlagValue, extract};
use crate::matcher::{Matcher, path_flags, usage_flags};

/// Deduplicating, prefix-filtering candidate list.
struct Candidates<'p> {
    partial: &'p str,
    seen: HashSet<String>,
    list: Vec<String>,
}

impl<'p> Candidates<'p> {
    fn new(partial: &'p str) -> Self {
        Self {
            partial,
            seen: HashSet::new(),
            list: Vec::new(),
        }
    }

    fn push(&mut self, candidate: impl Into<String>) {
        let candidate = candidate.into();
        let matches = candidate
            .get(..self.partial.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(self.partial));
        if matches && self.seen.insert(candidate.clone()) {
            self.list.push(candidate);
        }
    }

    fn extend<I, S>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for candidate in candidates {
            self.push(candidate);
        }
    }
}

/// Suggestion walk over one command tree.
pub(crate) struct Suggester<'a> {
    matcher: Matcher<'a>,
    config: &'a EngineConfig,
    source: &'a dyn CommandSource,
}

impl<'a> Suggester<'a> {
    pub(crate) fn new(
        matcher: Matcher<'a>,
        config: &'a EngineConfig,
        source: &'a dyn CommandSource,
    ) -> Self {
        Self {
            matcher,
            config,
            source,
        }
    }

    /// Candidates for the last of `tokens` (the empty string if there are
    /// none), in first-seen order.
    pub(crate) fn suggest(&self, root: &Command, tokens: &[String]) -> Vec<String> {
        let (partial, done) = match tokens.split_last() {
            Some((last, done)) => (last.as_str(), done),
            None => ("", tokens),
        };
        let mut out = Candidates::new(partial);
        self.collect(root, done, &mut out);

        let mut list = out.list;
        self.config.truncate(&mut list);
        tracing::trace!(command = %root.name, partial, count = list.len(), "suggestions");
        list
    }

    fn filters(&self, node: &Command) -> bool {
        self.config.filter_suggestions_by_permission && !node.suggestions_ignore_permission
    }

    fn permitted(&self, permission: Option<&str>) -> bool {
        permission.is_none_or(|p| self.source.has_permission(p))
    }

    fn collect(&self, node: &Command, done: &[String], out: &mut Candidates<'_>) {
        let filter = self.filters(node);
        let usages: Vec<&Usage> = node
            .effective_usages()
            .iter()
            .map(|e| &e.usage)
            .filter(|u| !filter || self.permitted(u.permission.as_deref()))
            .collect();

        let pending = self.pending_flags(node, &usages, done);
        if !pending.is_empty() {
            let partial = out.partial;
            for vt in pending.iter().filter_map(|f| f.value_type.as_ref()) {
                out.extend(self.matcher.types().suggestions(vt, self.source, partial));
            }
            return;
        }

        for usage in usages {
            self.collect_usage(node, usage, done, out);
        }

        for child in &node.children {
            if filter && !self.permitted(child.permission.as_deref()) {
                continue;
            }
            let Some(slot) = child.literal_slot() else {
                continue;
            };
            let flags = path_flags(child);
            let scan = extract(&flags, done);
            let positional = scan.positional();
            let prefix: Vec<&Parameter> =
                child.prefix().iter().filter(|p| !p.is_flag()).collect();
            let consistent = prefix
                .iter()
                .zip(positional)
                .all(|(p, token)| self.matcher.accepts(p, token));
            if !consistent {
                continue;
            }
            if positional.len() == slot {
                out.extend(child.names());
            } else if positional.len() > slot {
                self.collect(child, done, out);
            }
        }
    }

    /// Valued flags that the token before the partial one names.
    fn pending_flags<'c>(
        &self,
        node: &'c Command,
        usages: &[&'c Usage],
        done: &[String],
    ) -> Vec<&'c FlagData> {
        let mut pending: Vec<&FlagData> = Vec::new();
        let flag_sets = usages
            .iter()
            .map(|&usage| usage_flags(node, usage))
            .chain(std::iter::once(path_flags(node)));
        for flags in flag_sets {
            let scan = extract(&flags, done);
            if let Some(hit) = scan.hits().last() {
                let waiting = hit.value == FlagValue::Missing && hit.token_index + 1 == done.len();
                if waiting && !pending.iter().any(|f| f.name == hit.flag.name) {
                    pending.push(hit.flag);
                }
            }
        }
        pending
    }

    fn collect_usage(
        &self,
        node: &Command,
        usage: &Usage,
        done: &[String],
        out: &mut Candidates<'_>,
    ) {
        let flags = usage_flags(node, usage);
        let scan = extract(&flags, done);
        let params: Vec<&Parameter> = usage.positional().collect();

        let states = self.advance(&params, scan.positional());
        if states.is_empty() {
            return;
        }
        for state in states {
            for p in &params[state..] {
                self.collect_parameter(p, out);
                if !p.is_optional() {
                    break;
                }
            }
        }

        if self.config.suggest_flags {
            for flag in flags.iter().filter(|f| scan.hit(&f.name).is_none()) {
                out.extend(flag.names().map(|name| format!("-{name}")));
            }
        }
    }

    /// Parameter indices the next token could fill after `tokens`.
    ///
    /// Optionals may be skipped, so several indices can be live at once. A
    /// greedy parameter keeps absorbing tokens.
    fn advance(&self, params: &[&Parameter], tokens: &[&str]) -> BTreeSet<usize> {
        let mut states = BTreeSet::from([0]);
        for token in tokens {
            let mut next = BTreeSet::new();
            for &state in &states {
                for (k, p) in params.iter().enumerate().skip(state) {
                    if self.matcher.accepts(p, token) {
                        next.insert(if p.is_greedy() { k } else { k + 1 });
                    }
                    if !p.is_optional() {
                        break;
                    }
                }
            }
            states = next;
            if states.is_empty() {
                break;
            }
        }
        states
    }

    fn collect_parameter(&self, p: &Parameter, out: &mut Candidates<'_>) {
        if p.is_literal() {
            out.extend(p.literal_names());
            return;
        }
        let partial = out.partial;
        out.extend(p.suggestions.iter().cloned());
        if let Some(suggester) = &p.suggester {
            out.extend(suggester(self.source, partial));
        }
        if let Some(vt) = p.value_type() {
            out.extend(self.matcher.types().suggestions(vt, self.source, partial));
        }
    }
}
