//! Explainer registry: ordered `(shape test, explainer)` tables per comparison operator.
//!
//! # Architecture
//!
//! Explainers are plain functions erased behind `Box<dyn Fn>` at registration time. The
//! [`ExplainerRegistryBuilder`] appends them in order; [`build()`](ExplainerRegistryBuilder::build)
//! freezes the tables into an immutable [`ExplainerRegistry`]. No runtime registration is
//! possible afterwards.
//!
//! Dispatch is first-match: for a given operator, the first entry whose shape test accepts
//! both operands explains the pair. Registration order is therefore the tie-break contract,
//! and matcher-aware shapes must be registered before the generic shapes they overlap with.
//!
//! # Example
//!
//! ```
//! use matchdiff::{both, is_str, register_core_explainers, Diff, ExplainerRegistryBuilder, Op};
//!
//! let registry = register_core_explainers(ExplainerRegistryBuilder::new())
//!     .explainer(Op::Lt, "str_lt", both(is_str), |_cmp, _left, _right| {
//!         Ok(Diff::line("strings compare lexicographically"))
//!     })
//!     .build();
//!
//! assert_eq!(registry.explainer_names(Op::Lt), vec!["str_lt"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::{explain, Comparator, Diff, ExplainError, Kind, MatchError, Matcher, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// Op
// ═══════════════════════════════════════════════════════════════════════════════

/// Comparison operator an explainer is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

impl Op {
    /// All operators, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::In,
        Self::NotIn,
    ];

    /// The operator's symbol, as shown in assertion summaries.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Op {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s.trim())
            .ok_or_else(|| MatchError::UnknownOperator { op: s.to_owned() })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Type-erased entries
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-erased shape test over both operands.
pub type ShapeTest = Box<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Type-erased explainer. Recursion into nested values goes through the [`Comparator`].
pub type ExplainFn =
    Box<dyn Fn(&Comparator<'_>, &Value, &Value) -> Result<Diff, ExplainError> + Send + Sync>;

struct Entry {
    name: String,
    test: ShapeTest,
    explain: ExplainFn,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for an [`ExplainerRegistry`].
#[derive(Default)]
pub struct ExplainerRegistryBuilder {
    tables: HashMap<Op, Vec<Entry>>,
}

impl ExplainerRegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an explainer for `op`. Entries registered earlier take precedence.
    #[must_use]
    pub fn explainer<T, E>(mut self, op: Op, name: &str, test: T, explain: E) -> Self
    where
        T: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
        E: Fn(&Comparator<'_>, &Value, &Value) -> Result<Diff, ExplainError>
            + Send
            + Sync
            + 'static,
    {
        self.tables.entry(op).or_default().push(Entry {
            name: name.to_owned(),
            test: Box::new(test),
            explain: Box::new(explain),
        });
        self
    }

    /// Freeze the registry. No further registration is possible.
    #[must_use]
    pub fn build(self) -> ExplainerRegistry {
        ExplainerRegistry {
            tables: self.tables,
        }
    }
}

/// Register the built-in `==` explainers.
///
/// Order: partial-dict matcher, mapping, attribute matcher, set, string, sequence.
#[must_use]
pub fn register_core_explainers(builder: ExplainerRegistryBuilder) -> ExplainerRegistryBuilder {
    builder
        .explainer(Op::Eq, "dict_matcher", either(is_dict_matcher), explain::dict_matcher)
        .explainer(Op::Eq, "mapping", both(is_mapping), explain::mapping)
        .explainer(Op::Eq, "attrs_matcher", either(is_attrs_matcher), explain::attrs_matcher)
        .explainer(Op::Eq, "set", both(is_set), explain::set)
        .explainer(Op::Eq, "str", both(is_str), explain::text)
        .explainer(Op::Eq, "sequence", both(is_sequence), explain::sequence)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable explainer tables.
///
/// Constructed via [`ExplainerRegistryBuilder`], or shared process-wide through
/// [`ExplainerRegistry::global`].
pub struct ExplainerRegistry {
    tables: HashMap<Op, Vec<Entry>>,
}

impl ExplainerRegistry {
    /// The process-wide registry holding the built-in explainers, built on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<ExplainerRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| register_core_explainers(ExplainerRegistryBuilder::new()).build())
    }

    /// The first explainer for `op` whose shape test accepts both operands.
    #[must_use]
    pub fn select(&self, op: Op, left: &Value, right: &Value) -> Option<(&str, &ExplainFn)> {
        self.tables
            .get(&op)?
            .iter()
            .find(|entry| (entry.test)(left, right))
            .map(|entry| (entry.name.as_str(), &entry.explain))
    }

    /// Names of the explainers registered for `op`, in dispatch order.
    #[must_use]
    pub fn explainer_names(&self, op: Op) -> Vec<&str> {
        self.tables
            .get(&op)
            .map(|entries| entries.iter().map(|e| e.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Total number of registered explainers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ExplainerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for op in Op::ALL {
            if let Some(entries) = self.tables.get(&op) {
                let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
                map.entry(&op.symbol(), &names);
            }
        }
        map.finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Shape tests
// ═══════════════════════════════════════════════════════════════════════════════

/// Accept the pair when both operands satisfy `pred`.
pub fn both(pred: fn(&Value) -> bool) -> impl Fn(&Value, &Value) -> bool + Send + Sync + Copy {
    move |left, right| pred(left) && pred(right)
}

/// Accept the pair when either operand satisfies `pred`.
pub fn either(pred: fn(&Value) -> bool) -> impl Fn(&Value, &Value) -> bool + Send + Sync + Copy {
    move |left, right| pred(left) || pred(right)
}

/// Accept the pair when both operands are of `kind`.
pub fn both_kind(kind: Kind) -> impl Fn(&Value, &Value) -> bool + Send + Sync + Clone {
    move |left, right| left.kind() == kind && right.kind() == kind
}

/// Plain mapping (not a partial-dict matcher).
#[must_use]
pub fn is_mapping(value: &Value) -> bool {
    matches!(value, Value::Map(_))
}

/// Set.
#[must_use]
pub fn is_set(value: &Value) -> bool {
    matches!(value, Value::Set(_))
}

/// Text.
#[must_use]
pub fn is_str(value: &Value) -> bool {
    matches!(value, Value::Str(_))
}

/// Sequence shape: lists, tuples and bytes. Text is not a sequence here.
#[must_use]
pub fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::List(_) | Value::Tuple(_) | Value::Bytes(_))
}

/// Partial-dict matcher.
#[must_use]
pub fn is_dict_matcher(value: &Value) -> bool {
    matches!(value, Value::Matcher(m) if matches!(**m, Matcher::Dict(_)))
}

/// Attribute matcher.
#[must_use]
pub fn is_attrs_matcher(value: &Value) -> bool {
    matches!(value, Value::Matcher(m) if matches!(**m, Matcher::Attrs(_)))
}
