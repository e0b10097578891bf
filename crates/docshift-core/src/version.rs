//! Migration version tokens and their ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Version token taken from a script name.
///
/// Tokens are totally ordered:
///
/// 1. the empty token sorts first,
/// 2. all-digit tokens come next and compare by numeric value, so `2 < 10`
///    and `0001 < 12`,
/// 3. every other token compares lexically.
///
/// Numeric tokens of equal value (`1` and `001`) are tie-broken by their raw
/// text so the ordering agrees with equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationVersion(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TokenClass {
    Empty,
    Numeric,
    Lexical,
}

impl MigrationVersion {
    /// Create a version from its textual token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Extract the version from a script name: the text before the first `_`.
    ///
    /// A name without a separator yields the empty version.
    pub fn from_script_name(name: &str) -> Self {
        match name.split_once('_') {
            Some((version, _)) => Self::new(version),
            None => Self::new(String::new()),
        }
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the degenerate empty token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn class(&self) -> TokenClass {
        if self.0.is_empty() {
            TokenClass::Empty
        } else if self.0.bytes().all(|b| b.is_ascii_digit()) {
            TokenClass::Numeric
        } else {
            TokenClass::Lexical
        }
    }

    fn significant_digits(&self) -> &str {
        self.0.trim_start_matches('0')
    }
}

impl Ord for MigrationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.class(), other.class()) {
            (TokenClass::Numeric, TokenClass::Numeric) => {
                let (a, b) = (self.significant_digits(), other.significant_digits());
                a.len()
                    .cmp(&b.len())
                    .then_with(|| a.cmp(b))
                    .then_with(|| self.0.cmp(&other.0))
            }
            (a, b) if a == b => self.0.cmp(&other.0),
            (a, b) => a.cmp(&b),
        }
    }
}

impl PartialOrd for MigrationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "<empty>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
