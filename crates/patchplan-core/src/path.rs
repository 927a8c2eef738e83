//! Structural paths.
//!
//! A [`FieldPath`] addresses a node by the field names leading to it. List
//! indices are never part of a path: every element of
//! `replicationSpecs` sits at the same path `replicationSpecs`, so policy
//! rules apply uniformly across elements.

use crate::errors::{PatchError, Result};
use std::fmt;

/// Field-name segments from the root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// The path of field `name` under this node.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True iff the trailing segments equal the pattern's segments.
    pub fn ends_with(&self, pattern: &PathPattern) -> bool {
        self.segments.ends_with(pattern.segments())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.segments.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A parsed, non-empty dotted rule pattern such as `diskSizeGB` or
/// `electableSpecs.diskSizeGB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<String>,
}

impl PathPattern {
    /// Parse a dotted pattern.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidRule` when the pattern is empty or has an
    /// empty segment (`"a..b"`, `".a"`, `"a."`). `rule` names the rule kind
    /// for the error message.
    pub fn parse(rule: &str, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PatchError::InvalidRule {
                rule: rule.to_string(),
                pattern: raw.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }
        let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PatchError::InvalidRule {
                rule: rule.to_string(),
                pattern: raw.to_string(),
                reason: "pattern has an empty segment".to_string(),
            });
        }
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
