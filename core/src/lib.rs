//! matchdiff - matcher placeholders and structural diff explanations for test assertions
//!
//! Two cooperating halves:
//!
//! - **Matchers**: value-like objects that redefine equality as "matches". They nest
//!   anywhere inside ordinary expected data (lists, maps, objects) and are built through
//!   the [`M`] facade: wildcard, regex, type check, unordered list, partial dict,
//!   attribute matcher, numeric and temporal tolerance.
//! - **Explanations**: when `actual == expected` fails, [`assertrepr_compare`] walks both
//!   values and produces a short, path-annotated list of lines saying *why*.
//!
//! # Architecture
//!
//! - [`Value`]: the closed runtime value model (primitives, containers, objects, custom
//!   values, matchers). [`Value::matches`] is the polymorphic equality every container uses
//!   for its elements, so matchers work at any nesting depth.
//! - [`Matcher`]: closed set of matcher kinds, each implementing [`ValueMatcher`].
//! - [`Diff`] / [`Explanation`]: the lazily rendered, path-keyed explanation tree.
//! - [`ExplainerRegistry`]: ordered `(shape test, explainer)` table per [`Op`], frozen
//!   after build. [`Comparator`] runs the first explainer whose shape test accepts both
//!   operands and recurses through itself for nested values.
//! - [`Collaborators`]: swappable set-diff, text-diff, sequence-diff and safe-repr
//!   subroutines the explainers delegate to.
//!
//! # Example
//!
//! ```
//! use matchdiff::prelude::*;
//!
//! let actual = vmap! { "a" => 1, "b" => 2 };
//!
//! assert!(actual.matches(&M::dict([("b", 2)])));
//! assert_eq!(
//!     compare_eq(&actual, &M::dict([("a", 2)])).unwrap(),
//!     vec!["a: 1 != 2"],
//! );
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod approx;
mod collab;
mod compare;
mod config;
mod explain;
mod explanation;
mod hook;
mod matcher;
mod registry;
mod repr;
mod value;
mod value_matcher;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Value model
pub use value::{CustomValue, Kind, Mapping, Object, Value, CLASS_ATTR};

// Matchers
pub use approx::{approx, Approx, ApproxDatetime, ApproxNumber, Tolerance, DEFAULT_ABS, DEFAULT_REL};
pub use matcher::{Matcher, ValueMatcher, M};
pub use value_matcher::{
    AnyOfMatcher, AttrsMatcher, DictMatcher, IsaMatcher, RegexFlags, RegexMatcher,
    UnorderedMatcher,
};

// Explanations
pub use collab::{
    BoundedRepr, Collaborators, DefaultSequenceDiff, DefaultSetDiff, NdiffTextDiff, SafeRepr,
    SequenceDiff, SetDiff, TextDiff,
};
pub use compare::{compare, compare_eq, Comparator};
pub use explanation::{Diff, Explanation, PathKey};
pub use registry::{
    both, both_kind, either, is_attrs_matcher, is_dict_matcher, is_mapping, is_sequence, is_set,
    is_str, register_core_explainers, ExplainFn, ExplainerRegistry, ExplainerRegistryBuilder, Op,
    ShapeTest,
};

// Host integration
pub use config::{CompareConfig, KNOWN_TAGS};
pub use hook::{assertrepr_compare, assertrepr_compare_with, check_match};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use matchdiff::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        approx, assert_match, compare, compare_eq, vlist, vmap, Approx, CompareConfig, Diff,
        Explanation, Kind, MatchError, Matcher, Object, Op, RegexFlags, Value, M,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length for regex patterns accepted by [`M::re`].
///
/// Regex compilation is expensive even with the linear-time Rust `regex` crate.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;

/// Combined character count below which two differing strings are shown as a single
/// `'a' != 'b'` line instead of a line diff.
pub const SHORT_STRING_THRESHOLD: usize = 20;

/// Line width used when pretty-printing "extra items" blocks.
pub const PFORMAT_WIDTH: usize = 80;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from matcher construction and configuration loading.
///
/// Raised when the matcher is built. The one comparison-time error is
/// [`MatchError::Unorderable`], from `M::unordered` meeting items it cannot sort; missing
/// attributes or keys are plain mismatches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// A tolerance (absolute or relative) is negative.
    #[error("{kind} tolerance can't be negative: {tolerance}")]
    NegativeTolerance {
        /// `"absolute"` or `"relative"`.
        kind: &'static str,
        /// The rejected tolerance, rendered.
        tolerance: String,
    },
    /// A tolerance (absolute or relative) is NaN.
    #[error("{kind} tolerance can't be NaN")]
    NanTolerance {
        /// `"absolute"` or `"relative"`.
        kind: &'static str,
    },
    /// A tolerance in seconds does not fit a duration.
    #[error("tolerance of {tolerance} seconds is out of range for a duration")]
    ToleranceOutOfRange {
        /// The rejected tolerance, rendered.
        tolerance: String,
    },
    /// A relative tolerance was requested for a point-in-time value.
    #[error("rel doesn't make sense with a datetime")]
    RelativeTolerance,
    /// A tolerance of the wrong unit (e.g. a duration for a number).
    #[error("tolerance {tolerance} can't be used with {expected}")]
    ToleranceMismatch {
        /// The rejected tolerance, rendered.
        tolerance: String,
        /// Kind of the expected value.
        expected: String,
    },
    /// A regex pattern failed to compile.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },
    /// A regex pattern exceeds [`MAX_REGEX_PATTERN_LENGTH`].
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// Two values have no defined ordering (unordered-sequence matching).
    #[error("'<' not supported between instances of '{left}' and '{right}'")]
    Unorderable {
        /// Kind name of the left operand.
        left: String,
        /// Kind name of the right operand.
        right: String,
    },
    /// A pattern document is malformed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },
    /// A pattern document uses an unknown `$tag`.
    #[error("unknown matcher tag \"{name}\", known tags: {}", available.join(", "))]
    UnknownMatcher {
        /// The unknown tag.
        name: String,
        /// Tags that are understood.
        available: Vec<String>,
    },
    /// An operator symbol that is not recognised.
    #[error("unknown comparison operator \"{op}\"")]
    UnknownOperator {
        /// The rejected symbol.
        op: String,
    },
}

/// A value's representation could not be produced.
///
/// Only [`CustomValue`] implementations can fail; built-in values always render.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{type_name}.repr() failed: {message}")]
pub struct ReprError {
    /// Type name of the value whose representation failed.
    pub type_name: String,
    /// What went wrong.
    pub message: String,
}

impl ReprError {
    /// Create a representation error for the given type.
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// Failure while producing an explanation.
///
/// Never reaches the host: [`assertrepr_compare`] converts it into the crash fallback lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplainError {
    /// Rendering a value failed.
    #[error(transparent)]
    Repr(#[from] ReprError),
    /// A matcher or ordering error surfaced while explaining.
    #[error(transparent)]
    Match(#[from] MatchError),
    /// A registered explainer reported a failure of its own.
    #[error("explainer \"{name}\" failed: {reason}")]
    Explainer {
        /// Name the explainer was registered under.
        name: String,
        /// What went wrong.
        reason: String,
    },
}

/// Why [`check_match`] (and so [`assert_match!`]) failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// The values differ. Carries the failure body, newline separated.
    #[error("{0}")]
    Mismatch(String),
    /// The comparison itself could not be carried out.
    #[error(transparent)]
    Match(#[from] MatchError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Macros
// ═══════════════════════════════════════════════════════════════════════════════

/// Build a [`Value::List`] from expressions convertible into [`Value`].
///
/// ```
/// use matchdiff::prelude::*;
///
/// let v = vlist![1, "two", M::any()];
/// assert!(v.matches(&vlist![1, "two", 3.5]));
/// ```
#[macro_export]
macro_rules! vlist {
    () => { $crate::Value::List(::std::vec::Vec::new()) };
    ($($item:expr),+ $(,)?) => {
        $crate::Value::List(::std::vec![$($crate::Value::from($item)),+])
    };
}

/// Build a [`Value::Map`] from `key => value` pairs convertible into [`Value`].
///
/// ```
/// use matchdiff::prelude::*;
///
/// let v = vmap! { "x" => 1, "y" => vlist![2, 3] };
/// assert_eq!(v.repr().unwrap(), "{'x': 1, 'y': [2, 3]}");
/// ```
#[macro_export]
macro_rules! vmap {
    () => { $crate::Value::Map($crate::Mapping::new()) };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Value::map([$(($crate::Value::from($key), $crate::Value::from($value))),+])
    };
}

/// Assert that `left` matches `right`, panicking with a structural explanation otherwise.
///
/// Both operands are converted into [`Value`]. An optional third argument supplies a
/// [`CompareConfig`] (verbosity, terminal width).
///
/// ```
/// use matchdiff::prelude::*;
///
/// assert_match!(vmap! { "code" => 523, "message" => "boom" }, M::dict([("code", 523)]));
/// ```
///
/// ```should_panic
/// use matchdiff::prelude::*;
///
/// assert_match!(vlist![1, 2], vlist![1, 3]);
/// ```
#[macro_export]
macro_rules! assert_match {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_match!($left, $right, &$crate::CompareConfig::default())
    };
    ($left:expr, $right:expr, $config:expr $(,)?) => {{
        let left = $crate::Value::from($left);
        let right = $crate::Value::from($right);
        if let ::std::result::Result::Err(error) = $crate::check_match(&left, &right, $config) {
            ::std::panic!("{}", error);
        }
    }};
}
