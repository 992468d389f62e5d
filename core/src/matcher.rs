//! `Matcher`: the closed set of matcher kinds, and the `M` builder facade
//!
//! Matchers are ordinary [`Value`]s (`Value::Matcher`), so they can be placed anywhere inside
//! expected data. Whichever side of a comparison a matcher is on, it decides the outcome.
//!
//! ```
//! use matchdiff::prelude::*;
//!
//! let errors = vlist![
//!     Object::new("Error").with("message", "Smth went wrong: boom").with("code", 523),
//! ];
//! let expected = vlist![M::attrs([
//!     ("message", M::re("^Smth went wrong:").unwrap()),
//!     ("code", M::any_of([500, 523])),
//! ])];
//! assert!(errors.matches(&expected));
//! ```

use crate::{
    AnyOfMatcher, ApproxDatetime, ApproxNumber, AttrsMatcher, DictMatcher, IsaMatcher, Kind,
    Mapping, MatchError, RegexFlags, RegexMatcher, ReprError, UnorderedMatcher, Value,
    CLASS_ATTR,
};
use std::fmt;

/// A comparison strategy usable as the expected side of an equality check.
///
/// Implementations must be pure: `matches` never mutates state and never panics on
/// well-formed input, and answers identically whichever side of `==` the matcher was on.
pub trait ValueMatcher: Send + Sync + fmt::Debug {
    /// Returns `true` if `value` satisfies this matcher.
    fn matches(&self, value: &Value) -> bool;

    /// Like [`matches`](Self::matches), but surfaces comparisons that cannot be carried out.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Unorderable`] when an order-insensitive comparison meets items
    /// that cannot be sorted.
    fn try_matches(&self, value: &Value) -> Result<bool, MatchError> {
        Ok(self.matches(value))
    }

    /// Evaluable representation, e.g. `M.dict(a=1)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReprError`] when a nested custom value fails to render.
    fn repr(&self) -> Result<String, ReprError>;
}

/// Every matcher kind.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Attribute matcher, `M(x=1)`.
    Attrs(AttrsMatcher),
    /// Partial mapping matcher, `M.dict(a=1)`.
    Dict(DictMatcher),
    /// Regex search on strings, `M.re(...)`.
    Regex(RegexMatcher),
    /// Wildcard, `M.any`.
    Any,
    /// Membership, `M.any_of(...)`.
    AnyOf(AnyOfMatcher),
    /// Order-insensitive sequence, `M.unordered(...)`.
    Unordered(UnorderedMatcher),
    /// Type check, `M.isa(...)`.
    Isa(IsaMatcher),
    /// Datetime within an absolute tolerance.
    ApproxDatetime(ApproxDatetime),
    /// Number (or container of numbers) within a tolerance.
    Approx(ApproxNumber),
}

impl Matcher {
    /// The partial-dict matcher, if this is one.
    #[must_use]
    pub fn as_dict(&self) -> Option<&DictMatcher> {
        match self {
            Self::Dict(m) => Some(m),
            _ => None,
        }
    }

    /// The attribute matcher, if this is one.
    #[must_use]
    pub fn as_attrs(&self) -> Option<&AttrsMatcher> {
        match self {
            Self::Attrs(m) => Some(m),
            _ => None,
        }
    }
}

impl ValueMatcher for Matcher {
    fn matches(&self, value: &Value) -> bool {
        settle(self.try_matches(value))
    }

    fn try_matches(&self, value: &Value) -> Result<bool, MatchError> {
        match self {
            Self::Attrs(m) => m.try_matches(value),
            Self::Dict(m) => m.try_matches(value),
            Self::Regex(m) => Ok(m.matches(value)),
            Self::Any => Ok(true),
            Self::AnyOf(m) => m.try_matches(value),
            Self::Unordered(m) => m.try_matches(value),
            Self::Isa(m) => Ok(m.matches(value)),
            Self::ApproxDatetime(m) => Ok(m.matches(value)),
            Self::Approx(m) => Ok(m.matches(value)),
        }
    }

    fn repr(&self) -> Result<String, ReprError> {
        match self {
            Self::Attrs(m) => m.repr(),
            Self::Dict(m) => m.repr(),
            Self::Regex(m) => m.repr(),
            Self::Any => Ok("M.any".to_owned()),
            Self::AnyOf(m) => m.repr(),
            Self::Unordered(m) => m.repr(),
            Self::Isa(m) => m.repr(),
            Self::ApproxDatetime(m) => m.repr(),
            Self::Approx(m) => m.repr(),
        }
    }
}

/// Collapse a fallible comparison into the `==` answer. A failed comparison is unequal.
pub(crate) fn settle(result: Result<bool, MatchError>) -> bool {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "comparison failed, treating as unequal");
        false
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// M facade
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder facade for every matcher kind. Each constructor returns a ready-to-nest [`Value`].
#[derive(Debug, Clone, Copy)]
pub struct M;

impl M {
    /// Attribute matcher: every declared attribute must be present and match.
    ///
    /// ```
    /// use matchdiff::prelude::*;
    ///
    /// let m = M::attrs([("foo", "foo")]);
    /// assert_eq!(m.repr().unwrap(), "M(foo='foo')");
    /// ```
    pub fn attrs<K: Into<String>, V: Into<Value>>(
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> Value {
        Matcher::Attrs(AttrsMatcher::new(attrs)).into()
    }

    /// Attribute matcher that also asserts the runtime class name.
    pub fn instance<K: Into<String>, V: Into<Value>>(
        class: impl Into<String>,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> Value {
        let class = (CLASS_ATTR.to_owned(), Value::Str(class.into()));
        let rest = attrs.into_iter().map(|(k, v)| (k.into(), v.into()));
        Matcher::Attrs(AttrsMatcher::new(std::iter::once(class).chain(rest))).into()
    }

    /// Partial-dict matcher: every declared key must be present and match.
    ///
    /// ```
    /// use matchdiff::prelude::*;
    ///
    /// let actual = vmap! { "base_url" => "url", "verify" => "bundle", "timeout" => 10 };
    /// let expected = M::dict([("verify", Value::from("bundle")), ("timeout", 10.into())]);
    /// assert!(actual.matches(&expected));
    /// ```
    pub fn dict<K: Into<Value>, V: Into<Value>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Value {
        Matcher::Dict(DictMatcher::new(entries.into_iter().collect())).into()
    }

    /// Partial-dict matcher starting from an existing mapping, with extra or replaced keys.
    pub fn dict_from<K: Into<Value>, V: Into<Value>>(
        base: &Mapping,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Value {
        let mut mapping = base.clone();
        for (k, v) in entries {
            mapping.insert(k.into(), v.into());
        }
        Matcher::Dict(DictMatcher::new(mapping)).into()
    }

    /// Regex matcher (search semantics).
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidPattern`] or [`MatchError::PatternTooLong`].
    pub fn re(pattern: &str) -> Result<Value, MatchError> {
        Self::re_with(pattern, RegexFlags::NONE)
    }

    /// Regex matcher with flags.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidPattern`] or [`MatchError::PatternTooLong`].
    pub fn re_with(pattern: &str, flags: RegexFlags) -> Result<Value, MatchError> {
        Ok(Matcher::Regex(RegexMatcher::new(pattern, flags)?).into())
    }

    /// Wildcard: equal to anything.
    #[must_use]
    pub fn any() -> Value {
        Matcher::Any.into()
    }

    /// Equal to any of the candidates.
    pub fn any_of<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Matcher::AnyOf(AnyOfMatcher::new(items)).into()
    }

    /// Equal to any permutation of `items`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Unorderable`] if the items cannot be sorted.
    pub fn unordered<T: Into<Value>>(
        items: impl IntoIterator<Item = T>,
    ) -> Result<Value, MatchError> {
        Ok(Matcher::Unordered(UnorderedMatcher::new(items)?).into())
    }

    /// Equal to any value of one of the given kinds.
    pub fn isa(kinds: impl IntoIterator<Item = Kind>) -> Value {
        Matcher::Isa(IsaMatcher::new(kinds)).into()
    }

    /// Approximate matcher with default tolerances; see [`crate::Approx`] for options.
    ///
    /// # Errors
    ///
    /// Mirrors [`crate::Approx::build`].
    pub fn approx(expected: impl Into<Value>) -> Result<Value, MatchError> {
        crate::approx(expected)
    }
}
