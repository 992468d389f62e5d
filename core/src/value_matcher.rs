//! Matcher kinds: one struct per matching strategy.
//!
//! Each struct implements [`ValueMatcher`] and is wrapped by a [`Matcher`](crate::Matcher)
//! variant. A missing attribute or key is a mismatch. Only order-insensitive comparisons can
//! fail once built, which [`ValueMatcher::try_matches`] reports and `matches` treats as unequal.

use crate::matcher::settle;
use crate::repr::{keyword_args, positional_args, quote_str};
use crate::value::try_sorted;
use crate::{
    Kind, MatchError, Mapping, ReprError, Value, ValueMatcher, CLASS_ATTR,
    MAX_REGEX_PATTERN_LENGTH,
};
use std::fmt;
use std::ops::BitOr;

/// Returns `true` if `name` can be written as a keyword argument.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

// ═══════════════════════════════════════════════════════════════════════════════
// AttrsMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches any value exposing every declared attribute with a matching value.
///
/// Unrelated attributes on the target are ignored. A declared [`CLASS_ATTR`] entry asserts the
/// runtime class name as well.
#[derive(Debug, Clone)]
pub struct AttrsMatcher {
    attrs: Vec<(String, Value)>,
}

impl AttrsMatcher {
    /// Create an attribute matcher. Later duplicates replace earlier ones.
    pub fn new<K: Into<String>, V: Into<Value>>(attrs: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut out: Vec<(String, Value)> = Vec::new();
        for (name, value) in attrs {
            let name = name.into();
            let value = value.into();
            match out.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => out.push((name, value)),
            }
        }
        Self { attrs: out }
    }

    /// Declared attributes in declaration order, including the class assertion if any.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// The asserted class name, if one was declared.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == CLASS_ATTR)
            .and_then(|(_, v)| v.as_str())
    }
}

impl ValueMatcher for AttrsMatcher {
    fn matches(&self, value: &Value) -> bool {
        settle(self.try_matches(value))
    }

    fn try_matches(&self, value: &Value) -> Result<bool, MatchError> {
        for (name, expected) in &self.attrs {
            match value.attr(name) {
                Some(actual) if actual.try_matches(expected)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn repr(&self) -> Result<String, ReprError> {
        let name = match self.class() {
            Some(class) => format!("M.{class}"),
            None => "M".to_owned(),
        };
        let args = keyword_args(
            self.attrs
                .iter()
                .filter(|(n, _)| n != CLASS_ATTR)
                .map(|(n, v)| (n.as_str(), v)),
        )?;
        Ok(format!("{name}({args})"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DictMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches any mapping containing every declared key with a matching value.
///
/// Extra keys on the target are ignored. Never matches another `DictMatcher`.
#[derive(Debug, Clone, Default)]
pub struct DictMatcher {
    entries: Mapping,
}

impl DictMatcher {
    /// Create a partial-dict matcher.
    #[must_use]
    pub fn new(entries: Mapping) -> Self {
        Self { entries }
    }

    /// Declared entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &Mapping {
        &self.entries
    }

    /// Number of declared keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no keys are declared (matches every mapping).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ValueMatcher for DictMatcher {
    fn matches(&self, value: &Value) -> bool {
        settle(self.try_matches(value))
    }

    fn try_matches(&self, value: &Value) -> Result<bool, MatchError> {
        let Some(target) = value.as_mapping() else {
            return Ok(false);
        };
        for (key, expected) in self.entries.iter() {
            match target.get(key) {
                Some(actual) if actual.try_matches(expected)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn repr(&self) -> Result<String, ReprError> {
        let (named, rest): (Vec<_>, Vec<_>) = self
            .entries
            .iter()
            .partition(|(k, _)| k.as_str().is_some_and(is_identifier));
        let mut args = keyword_args(
            named
                .iter()
                .filter_map(|(k, v)| k.as_str().map(|name| (name, *v))),
        )?;
        if !rest.is_empty() {
            let extra = Value::map(rest.into_iter().map(|(k, v)| (k.clone(), v.clone())));
            if !args.is_empty() {
                args.push_str(", ");
            }
            args.push_str("**");
            args.push_str(&extra.repr()?);
        }
        Ok(format!("M.dict({args})"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RegexMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Regex compilation flags, combinable with `|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegexFlags(u8);

impl RegexFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Case-insensitive matching.
    pub const IGNORECASE: Self = Self(1);
    /// `^` and `$` match at line boundaries.
    pub const MULTILINE: Self = Self(1 << 1);
    /// `.` matches newlines.
    pub const DOTALL: Self = Self(1 << 2);
    /// Whitespace and `#` comments in the pattern are ignored.
    pub const VERBOSE: Self = Self(1 << 3);

    const NAMED: [(Self, &'static str); 4] = [
        (Self::IGNORECASE, "IGNORECASE"),
        (Self::MULTILINE, "MULTILINE"),
        (Self::DOTALL, "DOTALL"),
        (Self::VERBOSE, "VERBOSE"),
    ];

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Resolve a flag by its long or single-letter name (`IGNORECASE` or `I`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "IGNORECASE" | "I" => Some(Self::IGNORECASE),
            "MULTILINE" | "M" => Some(Self::MULTILINE),
            "DOTALL" | "S" => Some(Self::DOTALL),
            "VERBOSE" | "X" => Some(Self::VERBOSE),
            _ => None,
        }
    }
}

impl BitOr for RegexFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for RegexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// Matches strings in which the pattern is found anywhere (search, not full match).
///
/// Uses Rust's `regex` crate, which guarantees linear-time matching.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: regex::Regex,
    pattern: String,
    flags: RegexFlags,
}

impl RegexMatcher {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::PatternTooLong`] if the pattern exceeds
    /// [`MAX_REGEX_PATTERN_LENGTH`], or [`MatchError::InvalidPattern`] if it does not compile.
    pub fn new(pattern: &str, flags: RegexFlags) -> Result<Self, MatchError> {
        if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
            return Err(MatchError::PatternTooLong {
                len: pattern.len(),
                max: MAX_REGEX_PATTERN_LENGTH,
            });
        }
        let regex = regex::RegexBuilder::new(pattern)
            .case_insensitive(flags.contains(RegexFlags::IGNORECASE))
            .multi_line(flags.contains(RegexFlags::MULTILINE))
            .dot_matches_new_line(flags.contains(RegexFlags::DOTALL))
            .ignore_whitespace(flags.contains(RegexFlags::VERBOSE))
            .build()
            .map_err(|e| MatchError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            regex,
            pattern: pattern.to_owned(),
            flags,
        })
    }

    /// The source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The compilation flags.
    #[must_use]
    pub fn flags(&self) -> RegexFlags {
        self.flags
    }
}

impl ValueMatcher for RegexMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.regex.is_match(s))
    }

    fn repr(&self) -> Result<String, ReprError> {
        let quote = if self.pattern.contains('\'') { '"' } else { '\'' };
        let literal = format!("r{quote}{}{quote}", self.pattern);
        if self.flags.is_empty() {
            Ok(literal)
        } else {
            Ok(format!("M.re({literal}, {})", self.flags))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AnyOfMatcher / UnorderedMatcher / IsaMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches any value equal to one of the candidates.
#[derive(Debug, Clone)]
pub struct AnyOfMatcher {
    items: Vec<Value>,
}

impl AnyOfMatcher {
    /// Create a matcher over the given candidates.
    pub fn new<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// The candidates in declaration order.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl ValueMatcher for AnyOfMatcher {
    fn matches(&self, value: &Value) -> bool {
        settle(self.try_matches(value))
    }

    fn try_matches(&self, value: &Value) -> Result<bool, MatchError> {
        value.try_contained_in(&self.items)
    }

    fn repr(&self) -> Result<String, ReprError> {
        Ok(format!("M.any_of({})", positional_args(&self.items)?))
    }
}

/// Matches any list, tuple or set whose sorted items equal the stored sorted items.
#[derive(Debug, Clone)]
pub struct UnorderedMatcher {
    items: Vec<Value>,
}

impl UnorderedMatcher {
    /// Create a matcher, sorting the expected items.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Unorderable`] if the items are not mutually orderable.
    pub fn new<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Result<Self, MatchError> {
        let items = try_sorted(items.into_iter().map(Into::into).collect())?;
        Ok(Self { items })
    }

    /// The expected items, sorted.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

}

impl ValueMatcher for UnorderedMatcher {
    fn matches(&self, value: &Value) -> bool {
        settle(self.try_matches(value))
    }

    /// Sorts the target's items before comparing, so unorderable items fail even when the
    /// lengths differ. Values that are not collections simply do not match.
    fn try_matches(&self, value: &Value) -> Result<bool, MatchError> {
        let items = match value {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => items,
            _ => return Ok(false),
        };
        let sorted = try_sorted(items.clone())?;
        if sorted.len() != self.items.len() {
            return Ok(false);
        }
        for (actual, expected) in sorted.iter().zip(&self.items) {
            if !actual.try_matches(expected)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn repr(&self) -> Result<String, ReprError> {
        Ok(format!("M.unordered({})", positional_args(&self.items)?))
    }
}

/// Matches any value whose runtime kind is one of the declared kinds.
#[derive(Debug, Clone)]
pub struct IsaMatcher {
    kinds: Vec<Kind>,
}

impl IsaMatcher {
    /// Create a type-check matcher.
    pub fn new(kinds: impl IntoIterator<Item = Kind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// The accepted kinds.
    #[must_use]
    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }
}

impl ValueMatcher for IsaMatcher {
    fn matches(&self, value: &Value) -> bool {
        let kind = value.kind();
        self.kinds.contains(&kind)
    }

    fn repr(&self) -> Result<String, ReprError> {
        let names: Vec<&str> = self.kinds.iter().map(Kind::name).collect();
        Ok(format!("M.isa({})", names.join(", ")))
    }
}

/// Quote a mapping key for display when it is not an identifier.
pub(crate) fn display_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_owned()
    } else {
        quote_str(key)
    }
}
