//! Build-log reference scanning
//!
//! A build tool prints the files it emitted (`main.a1b2c3.js`, `static/css/app.9f8e.css`, ...).
//! The deployment descriptor carries a pattern whose first capture group is a
//! stable key for each file and whose full match is the literal text that
//! appears in the entry point. Scanning the log yields a [`ReferenceMap`] from
//! key to literal.

use regex::{Regex, RegexBuilder};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Error, Result};

/// A compiled reference-extraction pattern
///
/// Matching is case-insensitive and multiline. The pattern must contain at
/// least one capture group; group 1 is used as the map key.
#[derive(Debug, Clone)]
pub struct ReferencePattern {
    regex: Regex,
}

impl ReferencePattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;

        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 2 {
            return Err(Error::invalid_pattern(
                pattern,
                "pattern needs a capture group identifying each reference",
            ));
        }

        Ok(Self { regex })
    }

    /// The source text of the pattern
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Scan `text` and build the reference map
    ///
    /// Matches whose first group did not participate are skipped. A key seen
    /// more than once keeps the literal of its last match.
    pub fn scan(&self, text: &str) -> ReferenceMap {
        let mut map = ReferenceMap::new();

        for caps in self.regex.captures_iter(text) {
            let (Some(full), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            map.insert(key.as_str(), full.as_str());
        }

        debug!(
            pattern = %self.regex.as_str(),
            references = map.len(),
            "scanned build log"
        );

        map
    }
}

/// Ordered mapping from reference key to the literal matched text
///
/// Iteration follows first-insertion order of the keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ReferenceMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the literal for `key`
    pub fn insert(&mut self, key: impl Into<String>, literal: impl Into<String>) {
        let key = key.into();
        let literal = literal.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = literal,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, literal));
            }
        }
    }

    /// Literal matched for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.entries[pos].1.as_str())
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of references
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no references
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, literal)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for ReferenceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, literal) in &self.entries {
            map.serialize_entry(key, literal)?;
        }
        map.end()
    }
}
