//! Flag extraction.
//!
//! Flags may appear anywhere among the tokens. [`extract`] pulls them out
//! against a known flag set and leaves the positional view the rest of the
//! engine works on.

use command_grammar_core::FlagData;

/// What a matched flag carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue<'t> {
    /// A switch was present.
    Present,
    /// The token following a valued flag.
    Raw(&'t str),
    /// A valued flag with nothing usable after it.
    Missing,
}

/// One flag occurrence.
#[derive(Debug, Clone)]
pub struct FlagHit<'f, 't> {
    pub flag: &'f FlagData,
    /// Index of the flag token in the input.
    pub token_index: usize,
    pub value: FlagValue<'t>,
}

/// Result of splitting tokens into flags and positional tokens.
#[derive(Debug, Clone, Default)]
pub struct FlagScan<'f, 't> {
    positional: Vec<&'t str>,
    hits: Vec<FlagHit<'f, 't>>,
}

impl<'f, 't> FlagScan<'f, 't> {
    /// Tokens that are neither flags nor flag values, in input order.
    pub fn positional(&self) -> &[&'t str] {
        &self.positional
    }

    /// Every matched occurrence, in input order.
    pub fn hits(&self) -> &[FlagHit<'f, 't>] {
        &self.hits
    }

    /// The last occurrence of the flag named `name`.
    pub fn hit(&self, name: &str) -> Option<&FlagHit<'f, 't>> {
        self.hits.iter().rev().find(|h| h.flag.name == name)
    }
}

/// Strips one leading `--` or `-`; `None` if the token is not flag-shaped.
pub fn flag_alias(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .filter(|alias| !alias.is_empty())
}

/// Finds the flag a token names, if any.
pub fn match_flag<'f>(flags: &[&'f FlagData], token: &str) -> Option<&'f FlagData> {
    let alias = flag_alias(token)?;
    flags.iter().copied().find(|f| f.matches(alias))
}

/// Splits `tokens` into flags from `flags` and positional tokens.
///
/// A `-`-prefixed token that names no known flag stays positional, so `-5`
/// reaches an integer parameter unless a flag is called `5`. A valued flag
/// consumes the next token unless that token is itself a known flag.
///
/// # Examples
///
/// ```
/// use command_grammar::flags::{FlagValue, extract};
/// use command_grammar_core::{FlagData, ValueType};
///
/// let silent = FlagData::switch("silent").with_alias("s");
/// let time = FlagData::valued("time", ValueType::Duration);
/// let tokens: Vec<String> = ["mqzen", "-s", "--time", "1d", "-3"]
///     .iter().map(|s| s.to_string()).collect();
///
/// let scan = extract(&[&silent, &time], &tokens);
/// assert_eq!(scan.positional(), ["mqzen", "-3"]);
/// assert_eq!(scan.hit("time").unwrap().value, FlagValue::Raw("1d"));
/// assert_eq!(scan.hit("silent").unwrap().value, FlagValue::Present);
/// ```
pub fn extract<'f, 't>(flags: &[&'f FlagData], tokens: &'t [String]) -> FlagScan<'f, 't> {
    let mut scan = FlagScan::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let Some(flag) = match_flag(flags, token) else {
            scan.positional.push(token);
            i += 1;
            continue;
        };

        let token_index = i;
        let value = if flag.is_switch() {
            FlagValue::Present
        } else {
            match tokens.get(i + 1) {
                Some(next) if match_flag(flags, next).is_none() => {
                    i += 1;
                    FlagValue::Raw(next.as_str())
                }
                _ => FlagValue::Missing,
            }
        };
        scan.hits.push(FlagHit {
            flag,
            token_index,
            value,
        });
        i += 1;
    }
    scan
}
