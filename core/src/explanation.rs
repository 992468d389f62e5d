//! Explanation tree: path-keyed diff findings, flattened to lines on demand
//!
//! Explainers return a [`Diff`]: either flat lines, or an [`Explanation`] whose items are
//! keyed by a path fragment. Keeping the tree until the very end lets nested findings join
//! their keys into one path (`a.b[0]: 1 != 2`) instead of being indented level by level.
//!
//! # Flattening rules
//!
//! - a key whose diff is exactly one line renders inline: `path: line`
//! - a key with several lines renders `path:` followed by the lines indented two spaces
//! - a key holding a nested tree is flattened with the joined path
//! - [`PathKey::Index`] and [`PathKey::Item`] concatenate onto the parent path (`a[0]`),
//!   [`PathKey::Name`] joins with `.` and is quoted when it contains a dot (`a.'b.c'`)
//!
//! A tree appended to non-empty lines is rendered eagerly with its prefix line first. A tree
//! that reaches the top level untouched is flattened without its prefix.

use crate::repr::quote_str;
use crate::{ReprError, Value};
use std::fmt;
use std::ops::Add;

/// One fragment of a path into a compared structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    /// Sequence position, rendered `[i]`.
    Index(usize),
    /// Non-string mapping key, rendered `[repr]`.
    Item(String),
    /// Attribute name or string mapping key, joined with `.`.
    Name(String),
}

impl PathKey {
    /// Path key for a mapping key: strings become names, anything else is bracketed.
    ///
    /// # Errors
    ///
    /// Returns [`ReprError`] if a non-string key fails to render.
    pub fn for_key(key: &Value) -> Result<Self, ReprError> {
        match key {
            Value::Str(s) => Ok(Self::Name(s.clone())),
            other => Ok(Self::Item(other.repr()?)),
        }
    }

    fn join(&self, parent: Option<&str>) -> String {
        match (parent, self) {
            (None, key) => key.to_string(),
            (Some(parent), Self::Name(_)) => format!("{parent}.{self}"),
            (Some(parent), key) => format!("{parent}{key}"),
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Item(repr) => write!(f, "[{repr}]"),
            Self::Name(name) if name.contains('.') => f.write_str(&quote_str(name)),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for PathKey {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Explanation
// ═══════════════════════════════════════════════════════════════════════════════

/// Keyed sub-explanations under a heading such as `"Differing items:"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    prefix: String,
    items: Vec<(PathKey, Diff)>,
}

impl Explanation {
    /// Create an empty explanation with the given heading.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            items: Vec::new(),
        }
    }

    /// Add an item (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<PathKey>, diff: impl Into<Diff>) -> Self {
        self.push(key, diff);
        self
    }

    /// Add an item.
    pub fn push(&mut self, key: impl Into<PathKey>, diff: impl Into<Diff>) {
        self.items.push((key.into(), diff.into()));
    }

    /// The heading line.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[(PathKey, Diff)] {
        &self.items
    }

    /// Returns `true` if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flatten to lines, without the heading.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten(None, &mut out);
        out
    }

    /// Flatten to lines, heading first.
    #[must_use]
    pub fn render_prefixed(&self) -> Vec<String> {
        let mut out = vec![self.prefix.clone()];
        self.flatten(None, &mut out);
        out
    }

    fn flatten(&self, path: Option<&str>, out: &mut Vec<String>) {
        for (key, diff) in &self.items {
            let full_path = key.join(path);
            match diff {
                Diff::Tree(nested) => nested.flatten(Some(&full_path), out),
                Diff::Lines(lines) if lines.len() == 1 => {
                    out.push(format!("{full_path}: {}", lines[0]));
                }
                Diff::Lines(lines) => {
                    out.push(format!("{full_path}:"));
                    out.extend(lines.iter().map(|line| format!("  {line}")));
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Diff
// ═══════════════════════════════════════════════════════════════════════════════

/// What an explainer produces: flat lines, or a path-keyed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diff {
    /// Already rendered lines.
    Lines(Vec<String>),
    /// Unrendered tree.
    Tree(Explanation),
}

impl Diff {
    /// No findings.
    #[must_use]
    pub fn empty() -> Self {
        Self::Lines(Vec::new())
    }

    /// A single line.
    pub fn line(line: impl Into<String>) -> Self {
        Self::Lines(vec![line.into()])
    }

    /// Returns `true` if there is nothing to say.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Lines(lines) => lines.is_empty(),
            Self::Tree(tree) => tree.is_empty(),
        }
    }

    /// Concatenate two diffs.
    ///
    /// An empty side yields the other side unchanged (a tree stays a tree). Otherwise both
    /// sides are rendered, trees with their heading first.
    #[must_use]
    pub fn append(self, other: Diff) -> Diff {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        let mut lines = self.into_rendered();
        lines.extend(other.into_rendered());
        Self::Lines(lines)
    }

    /// Flatten to the final explanation lines. A tree is flattened without its heading.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Self::Lines(lines) => lines,
            Self::Tree(tree) => tree.to_lines(),
        }
    }

    fn into_rendered(self) -> Vec<String> {
        match self {
            Self::Lines(lines) => lines,
            Self::Tree(tree) => tree.render_prefixed(),
        }
    }
}

impl Default for Diff {
    fn default() -> Self {
        Self::empty()
    }
}

impl Add for Diff {
    type Output = Diff;

    fn add(self, rhs: Diff) -> Diff {
        self.append(rhs)
    }
}

impl From<Vec<String>> for Diff {
    fn from(lines: Vec<String>) -> Self {
        Self::Lines(lines)
    }
}

impl From<Explanation> for Diff {
    fn from(tree: Explanation) -> Self {
        Self::Tree(tree)
    }
}
