//! Route patterns
//!
//! A pattern is an ordered list of `(option, expression)` requirements. Each
//! expression must match the whole stringified option value. Expressions may
//! be written plain (`^delete$`, `[0-9]+`) or delimited with trailing flags
//! (`/^delete$/i`).

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

use crate::call::{Call, OptionKey};
use crate::{Result, RoutingError};

/// Flags accepted after a delimited expression.
const DELIMITER_FLAGS: &str = "imsxu";

/// Ordered set of option requirements for one route
///
/// An empty pattern matches every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    entries: Vec<(OptionKey, String)>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catch-all pattern with no requirements.
    pub fn any() -> Self {
        Self::default()
    }

    /// Require `key` to be present and fully match `expression`.
    pub fn require(mut self, key: impl Into<OptionKey>, expression: impl Into<String>) -> Self {
        self.entries.push((key.into(), expression.into()));
        self
    }

    pub fn entries(&self) -> &[(OptionKey, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, S> FromIterator<(K, S)> for Pattern
where
    K: Into<OptionKey>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Pattern::new(), |pattern, (key, expr)| pattern.require(key, expr))
    }
}

impl<K, S, const N: usize> From<[(K, S); N]> for Pattern
where
    K: Into<OptionKey>,
    S: Into<String>,
{
    fn from(entries: [(K, S); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Outcome of testing one requirement against a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Matched,
    /// Option not given
    Absent,
    /// Option given but the value does not match
    Mismatch,
}

/// One compiled (or lazily compiled) requirement owned by a route
#[derive(Debug)]
pub(crate) struct Requirement {
    key: OptionKey,
    source: String,
    case_insensitive: bool,
    regex: OnceLock<Regex>,
}

impl Requirement {
    pub(crate) fn new(key: OptionKey, source: String, case_insensitive: bool) -> Self {
        Self {
            key,
            source,
            case_insensitive,
            regex: OnceLock::new(),
        }
    }

    pub(crate) fn key(&self) -> &OptionKey {
        &self.key
    }

    /// Compile the expression, caching it on success.
    pub(crate) fn compile(&self) -> Result<&Regex> {
        if let Some(regex) = self.regex.get() {
            return Ok(regex);
        }

        let regex = compile_expression(&self.source, self.case_insensitive).map_err(|source| {
            RoutingError::InvalidPattern {
                key: self.key.clone(),
                pattern: self.source.clone(),
                source,
            }
        })?;
        Ok(self.regex.get_or_init(|| regex))
    }

    pub(crate) fn check(&self, call: &Call) -> Result<Check> {
        let Some(value) = call.opt(self.key.clone()) else {
            return Ok(Check::Absent);
        };

        if self.compile()?.is_match(&value.as_match_str()) {
            Ok(Check::Matched)
        } else {
            Ok(Check::Mismatch)
        }
    }
}

/// Compile an expression anchored to match a whole value.
pub fn compile_expression(
    expression: &str,
    case_insensitive: bool,
) -> std::result::Result<Regex, regex::Error> {
    let (body, flags) = split_delimited(expression);

    RegexBuilder::new(&format!(r"\A(?:{})\z", body))
        .case_insensitive(case_insensitive || flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
}

/// Split `/body/flags` into its parts; anything else is a plain expression.
fn split_delimited(expression: &str) -> (&str, &str) {
    if let Some(rest) = expression.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let flags = &rest[end + 1..];
            if flags.chars().all(|c| DELIMITER_FLAGS.contains(c)) {
                return (&rest[..end], flags);
            }
        }
    }
    (expression, "")
}
