//! `Value`: the runtime value model compared by matchers and explained by the engine
//!
//! Every operand of a comparison is a [`Value`]. Containers compare their elements through
//! [`Value::matches`], which hands control to a matcher whenever either side is one, so a
//! matcher placed at any depth of an expected structure governs the comparison there.
//!
//! # Extensibility via `Custom`
//!
//! Domain types that should take part in comparisons implement [`CustomValue`] and are
//! wrapped in `Value::Custom(Arc::new(your_type))`. They expose attributes to attribute
//! matchers and render themselves for explanations (fallibly).

use crate::matcher::settle;
use crate::{MatchError, Matcher, ReprError, ValueMatcher};
use chrono::NaiveDateTime;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Attribute name reserved for the runtime class of a value.
///
/// [`Value::attr`] answers it with the class name, and an attribute matcher declaring it
/// asserts the class in addition to the other attributes.
pub const CLASS_ATTR: &str = "__class__";

// ═══════════════════════════════════════════════════════════════════════════════
// CustomValue
// ═══════════════════════════════════════════════════════════════════════════════

/// Extension trait for user-defined values.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use matchdiff::{CustomValue, ReprError, Value, M};
///
/// #[derive(Debug)]
/// struct Point { x: i64, y: i64 }
///
/// impl CustomValue for Point {
///     fn type_name(&self) -> &str { "Point" }
///     fn attr(&self, name: &str) -> Option<Value> {
///         match name {
///             "x" => Some(self.x.into()),
///             "y" => Some(self.y.into()),
///             _ => None,
///         }
///     }
///     fn repr(&self) -> Result<String, ReprError> {
///         Ok(format!("Point({}, {})", self.x, self.y))
///     }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let p = Value::Custom(Arc::new(Point { x: 1, y: 2 }));
/// assert!(p.matches(&M::attrs([("x", 1)])));
/// assert!(p.matches(&M::instance("Point", [("y", 2)])));
/// ```
pub trait CustomValue: Send + Sync + fmt::Debug {
    /// Runtime class name, answered for [`CLASS_ATTR`] and checked by `M::isa`.
    fn type_name(&self) -> &str;

    /// Best-effort attribute lookup. `None` means "no such attribute".
    fn attr(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Representation used in explanations. May fail; the failure is contained by the
    /// host hook.
    ///
    /// # Errors
    ///
    /// Returns [`ReprError`] when the value cannot be rendered.
    fn repr(&self) -> Result<String, ReprError>;

    /// Equality against any non-matcher value. Identical `Arc`s are always equal.
    fn eq_value(&self, other: &Value) -> bool {
        let _ = other;
        false
    }

    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Kind
// ═══════════════════════════════════════════════════════════════════════════════

/// Runtime type tag of a [`Value`], checked by `M::isa`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `None`.
    None,
    /// `bool`.
    Bool,
    /// `int`.
    Int,
    /// `float`.
    Float,
    /// `str`.
    Str,
    /// `bytes`.
    Bytes,
    /// `list`.
    List,
    /// `tuple`.
    Tuple,
    /// `set`.
    Set,
    /// `dict`.
    Map,
    /// `datetime`.
    DateTime,
    /// A matcher placeholder.
    Matcher,
    /// An object or custom value, identified by class name.
    Class(String),
}

impl Kind {
    /// The name used in representations and pattern documents.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::Map => "dict",
            Self::DateTime => "datetime",
            Self::Matcher => "matcher",
            Self::Class(name) => name,
        }
    }

    /// Resolve a kind name. Names that are not built-in kinds are class names.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "NoneType" | "None" => Self::None,
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "str" => Self::Str,
            "bytes" => Self::Bytes,
            "list" => Self::List,
            "tuple" => Self::Tuple,
            "set" => Self::Set,
            "dict" => Self::Map,
            "datetime" => Self::DateTime,
            "matcher" => Self::Matcher,
            other => Self::Class(other.to_owned()),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Mapping / Object
// ═══════════════════════════════════════════════════════════════════════════════

/// Insertion-ordered mapping with [`Value`] keys.
///
/// Key lookup uses [`Value::matches`], so the mapping never needs `Hash`.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(Value, Value)>,
}

impl Mapping {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, replacing the value of an equal key in place.
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k.matches(&key)) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a key. `None` is the "missing" sentinel.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.matches(key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (k, v) in iter {
            mapping.insert(k.into(), v.into());
        }
        mapping
    }
}

/// A generic object: a class name plus ordered attributes.
///
/// This is the "assembled" object used to stand in for arbitrary runtime objects, the way
/// a namespace object would.
///
/// ```
/// use matchdiff::{Object, Value, M};
///
/// let obj: Value = Object::new("Error").with("code", 523).with("message", "boom").into();
/// assert!(obj.matches(&M::attrs([("code", 523)])));
/// ```
#[derive(Debug, Clone)]
pub struct Object {
    class: String,
    attrs: Vec<(String, Value)>,
}

impl Object {
    /// Create an object of the given class with no attributes.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attrs: Vec::new(),
        }
    }

    /// Add or replace an attribute (builder pattern).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    /// The class name.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate over attributes in insertion order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Value
// ═══════════════════════════════════════════════════════════════════════════════

/// A runtime value: the operand of every comparison.
///
/// `PartialEq` delegates to [`Value::matches`]. Because matchers redefine equality
/// (`M::any()` equals everything), that relation is not transitive, and `Value`
/// deliberately implements neither `Eq` nor `Hash`.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value.
    None,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered, mutable-shaped sequence.
    List(Vec<Value>),
    /// Ordered, fixed-shaped sequence.
    Tuple(Vec<Value>),
    /// Unordered collection, deduplicated on construction via [`Value::set`].
    Set(Vec<Value>),
    /// Insertion-ordered mapping.
    Map(Mapping),
    /// Point in time (naive, no timezone).
    DateTime(NaiveDateTime),
    /// Generic attribute bag.
    Object(Object),
    /// User-defined value.
    Custom(Arc<dyn CustomValue>),
    /// Matcher placeholder.
    Matcher(Arc<Matcher>),
}

impl Value {
    /// Build a list.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a tuple.
    pub fn tuple<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a set, dropping items equal to an earlier one.
    pub fn set<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !item.contained_in(&unique) {
                unique.push(item);
            }
        }
        Self::Set(unique)
    }

    /// Build a mapping.
    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::Map(entries.into_iter().collect())
    }

    /// Build a generic object.
    pub fn object<V: Into<Value>>(
        class: impl Into<String>,
        attrs: impl IntoIterator<Item = (&'static str, V)>,
    ) -> Self {
        let object = attrs
            .into_iter()
            .fold(Object::new(class), |obj, (name, value)| obj.with(name, value));
        Self::Object(object)
    }

    // ── Matching ─────────────────────────────────────────────────────────────

    /// The polymorphic "matches" operation.
    ///
    /// If either side is a matcher, the matcher decides (left first). Containers recurse
    /// element-wise through `matches`, integers and floats compare numerically. A comparison
    /// that cannot be carried out (see [`try_matches`](Self::try_matches)) is unequal.
    ///
    /// ```
    /// use matchdiff::prelude::*;
    ///
    /// assert!(vmap! { "x" => 1, "y" => 2 }.matches(&vmap! { "x" => 1, "y" => M::any() }));
    /// assert!(Value::from(2).matches(&Value::from(2.0)));
    /// ```
    #[must_use]
    pub fn matches(&self, other: &Value) -> bool {
        settle(self.try_matches(other))
    }

    /// [`matches`](Self::matches), surfacing comparisons that cannot be carried out.
    ///
    /// ```
    /// use matchdiff::prelude::*;
    ///
    /// let ids = M::unordered([1, 2]).unwrap();
    /// assert_eq!(vlist![2, 1].try_matches(&ids), Ok(true));
    /// assert!(vlist![2, "x"].try_matches(&ids).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Unorderable`] when an `M::unordered` matcher at any depth meets
    /// items that cannot be sorted.
    pub fn try_matches(&self, other: &Value) -> Result<bool, MatchError> {
        match (self, other) {
            (Self::Matcher(m), _) => m.try_matches(other),
            (_, Self::Matcher(m)) => m.try_matches(self),
            (Self::Custom(a), Self::Custom(b)) => Ok(Arc::ptr_eq(a, b) || a.eq_value(other)),
            (Self::Custom(a), _) => Ok(a.eq_value(other)),
            (_, Self::Custom(b)) => Ok(b.eq_value(self)),
            (Self::None, Self::None) => Ok(true),
            (Self::Bool(a), Self::Bool(b)) => Ok(a == b),
            (Self::Int(a), Self::Int(b)) => Ok(a == b),
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => {
                Ok(int_eq_float(*i, *f))
            }
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => Ok(a == b),
            (Self::Str(a), Self::Str(b)) => Ok(a == b),
            (Self::Bytes(a), Self::Bytes(b)) => Ok(a == b),
            (Self::DateTime(a), Self::DateTime(b)) => Ok(a == b),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.try_matches(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Self::Set(a), Self::Set(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for x in a {
                    if !x.try_contained_in(b)? {
                        return Ok(false);
                    }
                }
                for y in b {
                    if !y.try_contained_in(a)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Self::Map(a), Self::Map(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (k, v) in a.iter() {
                    match b.get(k) {
                        Some(other) if v.try_matches(other)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            (Self::Object(a), Self::Object(b)) => {
                if a.class != b.class || a.attrs.len() != b.attrs.len() {
                    return Ok(false);
                }
                for (n, v) in &a.attrs {
                    match b.get(n) {
                        Some(other) if v.try_matches(other)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Membership test: is any item of `haystack` equal to `self`?
    ///
    /// Lets a matcher be looked up in a plain sequence (`M::any_of(3, 4)` is in `[0, 4]`).
    #[must_use]
    pub fn contained_in(&self, haystack: &[Value]) -> bool {
        settle(self.try_contained_in(haystack))
    }

    /// [`contained_in`](Self::contained_in), surfacing comparisons that cannot be carried out.
    ///
    /// # Errors
    ///
    /// Returns the first [`MatchError`] raised while comparing against an item.
    pub fn try_contained_in(&self, haystack: &[Value]) -> Result<bool, MatchError> {
        for item in haystack {
            if item.try_matches(self)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    /// Best-effort attribute lookup. `None` is the "missing" sentinel.
    ///
    /// [`CLASS_ATTR`] answers with the runtime class name of any value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<Value> {
        if name == CLASS_ATTR {
            return Some(Self::Str(self.kind().name().to_owned()));
        }
        match self {
            Self::Object(obj) => obj.get(name).cloned(),
            Self::Custom(custom) => custom.attr(name),
            _ => None,
        }
    }

    /// Best-effort key lookup on mappings. `None` is the "missing" sentinel.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Runtime type tag.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::None => Kind::None,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::Str(_) => Kind::Str,
            Self::Bytes(_) => Kind::Bytes,
            Self::List(_) => Kind::List,
            Self::Tuple(_) => Kind::Tuple,
            Self::Set(_) => Kind::Set,
            Self::Map(_) => Kind::Map,
            Self::DateTime(_) => Kind::DateTime,
            Self::Object(obj) => Kind::Class(obj.class.clone()),
            Self::Custom(custom) => Kind::Class(custom.type_name().to_owned()),
            Self::Matcher(_) => Kind::Matcher,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a number (integers widen to `f64`).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get the value as a mapping.
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get the items of a list or tuple.
    #[inline]
    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get the matcher inside a matcher value.
    #[inline]
    #[must_use]
    pub fn as_matcher(&self) -> Option<&Matcher> {
        match self {
            Self::Matcher(m) => Some(m),
            _ => None,
        }
    }

    // ── Ordering ─────────────────────────────────────────────────────────────

    /// Total order over numbers, booleans, strings, bytes, datetimes and
    /// (lexicographically) lists and tuples.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Unorderable`] for any other pair of kinds.
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering, MatchError> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Ok(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Ok(a.cmp(b)),
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                let (a, b) = (self.as_f64(), other.as_f64());
                Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
            }
            (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
            (Self::Bytes(a), Self::Bytes(b)) => Ok(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Ok(a.cmp(b)),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => {}
                        unequal => return Ok(unequal),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(MatchError::Unorderable {
                left: self.kind().name().to_owned(),
                right: other.kind().name().to_owned(),
            }),
        }
    }
}

/// Exact integer/float equality: the float must be integral and the values identical.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn int_eq_float(i: i64, f: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

/// Sort values with [`Value::try_cmp`], failing on the first unorderable pair.
pub(crate) fn try_sorted(mut items: Vec<Value>) -> Result<Vec<Value>, MatchError> {
    let mut failure = None;
    items.sort_by(|a, b| {
        a.try_cmp(b).unwrap_or_else(|e| {
            failure.get_or_insert(e);
            Ordering::Equal
        })
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(items),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl fmt::Display for Value {
    /// Renders the representation, substituting a marker when a custom value fails.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr() {
            Ok(repr) => f.write_str(&repr),
            Err(e) => write!(f, "<[{e}] {} object>", self.kind()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════════════════

impl Default for Value {
    fn default() -> Self {
        Self::None
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Self::Object(obj)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Self::Map(m)
    }
}

impl From<Matcher> for Value {
    fn from(m: Matcher) -> Self {
        Self::Matcher(Arc::new(m))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::None, Into::into)
    }
}
