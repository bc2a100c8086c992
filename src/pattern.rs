//! Tail-glob ref patterns.
//!
//! A pattern matches a ref name when it lines up with the end of the name,
//! starting either at the beginning of the name or right after a `/`.
//! `*` is the only wildcard and matches any run of characters, `/` included.

use regex::Regex;

use crate::error::{Error, Result};

/// A single compiled tail-glob pattern
#[derive(Debug, Clone)]
pub struct TailMatcher {
    tail: Regex,
}

impl TailMatcher {
    /// Compile a raw pattern into an anchored matcher
    pub fn new(pattern: &str) -> Result<Self> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let expr = format!("(?:^|/){}$", body);

        let tail = Regex::new(&expr).map_err(|source| Error::PatternCompile {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self { tail })
    }

    /// Check whether `name` ends with this pattern on a segment boundary
    pub fn matches(&self, name: &str) -> bool {
        self.tail.is_match(name)
    }
}

/// The set of patterns given on the command line.
///
/// An empty set matches every name.
#[derive(Debug, Clone, Default)]
pub struct Patterns {
    matchers: Vec<TailMatcher>,
}

impl Patterns {
    /// Compile every non-empty pattern; empty strings are dropped
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matchers = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if pattern.is_empty() {
                continue;
            }
            matchers.push(TailMatcher::new(pattern)?);
        }

        Ok(Self { matchers })
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// True if no patterns were given or any pattern matches `name`
    pub fn matches(&self, name: &str) -> bool {
        self.matchers.is_empty() || self.matchers.iter().any(|m| m.matches(name))
    }
}
