//! Option keys and values
//!
//! Options are stored in the order they were parsed. A key is either a named
//! flag (parsed mode) or a positional index (raw mode). Values are tagged so
//! that a flag given with an empty value stays distinguishable from a flag
//! that is present without a value, and both from a flag that is absent.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Rendering of [`OptionValue::Flag`] when matched against a pattern.
pub const FLAG_MATCH_STR: &str = "1";

/// Key of a single option
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    /// Named flag such as `a` for `-a` or `action` for `--action`
    Name(String),
    /// Positional argument index, counted from the first argument after the command
    Index(usize),
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKey::Name(name) => f.write_str(name),
            OptionKey::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for OptionKey {
    fn from(name: &str) -> Self {
        OptionKey::Name(name.to_string())
    }
}

impl From<String> for OptionKey {
    fn from(name: String) -> Self {
        OptionKey::Name(name)
    }
}

impl From<&String> for OptionKey {
    fn from(name: &String) -> Self {
        OptionKey::Name(name.clone())
    }
}

impl From<usize> for OptionKey {
    fn from(index: usize) -> Self {
        OptionKey::Index(index)
    }
}

/// Value of an option that is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Option given with a value (possibly empty)
    Text(String),
    /// Option given without a value
    Flag,
    /// Option given more than once with values
    List(Vec<String>),
}

impl OptionValue {
    /// Returns the text value, if this is a single-valued option.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, OptionValue::Flag)
    }

    /// String form used when testing the value against a route pattern.
    pub fn as_match_str(&self) -> String {
        match self {
            OptionValue::Text(text) => text.clone(),
            OptionValue::Flag => FLAG_MATCH_STR.to_string(),
            OptionValue::List(items) => items.join(","),
        }
    }

    /// Add another occurrence of the same option.
    pub(crate) fn append(self, other: OptionValue) -> OptionValue {
        let mut items = self.into_items();
        items.extend(other.into_items());
        match items.len() {
            0 => OptionValue::Flag,
            _ => OptionValue::List(items),
        }
    }

    fn into_items(self) -> Vec<String> {
        match self {
            OptionValue::Text(text) => vec![text],
            OptionValue::Flag => Vec::new(),
            OptionValue::List(items) => items,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(text: &str) -> Self {
        OptionValue::Text(text.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(text: String) -> Self {
        OptionValue::Text(text)
    }
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            OptionValue::Text(text) => serializer.serialize_str(text),
            OptionValue::Flag => serializer.serialize_bool(true),
            OptionValue::List(items) => items.serialize(serializer),
        }
    }
}

/// Ordered collection of parsed options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: Vec<(OptionKey, OptionValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional options from raw arguments, keyed `0..n`.
    pub fn positional<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: args
                .into_iter()
                .enumerate()
                .map(|(index, arg)| (OptionKey::Index(index), OptionValue::Text(arg.into())))
                .collect(),
        }
    }

    /// Insert an option, merging repeated keys into a list.
    pub fn insert(&mut self, key: impl Into<OptionKey>, value: OptionValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                let previous = std::mem::replace(existing, OptionValue::Flag);
                *existing = previous.append(value);
            }
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &OptionKey) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}
