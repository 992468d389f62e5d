//! Configuration: comparison settings and pattern documents.
//!
//! # Comparison settings
//!
//! [`CompareConfig`] carries the host-side knobs (verbosity, terminal width). It deserializes
//! from JSON/YAML and can be read from the environment.
//!
//! # Pattern documents
//!
//! [`Value::from_json`] loads an expected value written as JSON (or YAML converted to JSON).
//! Plain JSON maps onto plain values. An object with exactly one `$`-prefixed key is a tagged
//! constructor:
//!
//! | Tag | Payload | Builds |
//! |-----|---------|--------|
//! | `$any` | anything | `M::any()` |
//! | `$re` | `"pattern"` or `{pattern, flags?}` | `M::re_with` |
//! | `$dict` | object | `M::dict` |
//! | `$attrs` | object, or `{class?, attrs}` | `M::attrs` / `M::instance` |
//! | `$any_of` | array | `M::any_of` |
//! | `$unordered` | array | `M::unordered` |
//! | `$isa` | kind name or array of names | `M::isa` |
//! | `$approx` | number, array, or `{expected, rel?, abs?, nan_ok?}` | [`Approx`] |
//! | `$datetime` | ISO-8601 string | `Value::DateTime` |
//! | `$tuple` / `$set` | array | `Value::tuple` / `Value::set` |
//! | `$bytes` | string or array of bytes | `Value::Bytes` |
//! | `$object` | `{class, attrs?}` | `Value::Object` |
//!
//! A key starting with `$$` is an escaped literal: `{"$$ref": 1}` is the map `{'$ref': 1}`.
//!
//! ```
//! use matchdiff::prelude::*;
//!
//! let doc = serde_json::json!({
//!     "id": {"$isa": "int"},
//!     "name": {"$re": "^user-"},
//!     "tags": {"$unordered": ["a", "b"]},
//! });
//! let expected = Value::from_json(&doc).unwrap();
//! let actual = vmap! { "id" => 7, "name" => "user-7", "tags" => vlist!["b", "a"] };
//! assert!(actual.matches(&expected));
//! ```

use crate::{Approx, Kind, MatchError, Object, RegexFlags, Value, M};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::str::FromStr;

/// Tags understood by [`Value::from_json`].
pub const KNOWN_TAGS: &[&str] = &[
    "$any",
    "$any_of",
    "$approx",
    "$attrs",
    "$bytes",
    "$datetime",
    "$dict",
    "$isa",
    "$object",
    "$re",
    "$set",
    "$tuple",
    "$unordered",
];

/// Default terminal width when none is configured.
const DEFAULT_TERMINAL_WIDTH: usize = 80;

// ═══════════════════════════════════════════════════════════════════════════════
// CompareConfig
// ═══════════════════════════════════════════════════════════════════════════════

/// Host-side comparison settings.
///
/// ```
/// use matchdiff::CompareConfig;
///
/// let config: CompareConfig = serde_json::from_str(r#"{"verbose": 2}"#).unwrap();
/// assert_eq!(config.verbose, 2);
/// assert_eq!(config.terminal_width(), 80);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Verbosity: `0` truncates summaries and skips long identical text runs, `1` shows
    /// full text diffs, `2` and above also show unbounded summaries.
    pub verbose: u8,

    /// Terminal width used to bound the summary line.
    pub terminal_width: Option<usize>,
}

impl CompareConfig {
    /// Read `MATCHDIFF_VERBOSE` and `COLUMNS`. Unset or unparsable variables use defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            verbose: env_var("MATCHDIFF_VERBOSE").unwrap_or(0),
            terminal_width: env_var("COLUMNS"),
        }
    }

    /// The configured terminal width, or 80.
    #[must_use]
    pub fn terminal_width(&self) -> usize {
        self.terminal_width.unwrap_or(DEFAULT_TERMINAL_WIDTH)
    }
}

fn env_var<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Pattern documents
// ═══════════════════════════════════════════════════════════════════════════════

impl Value {
    /// Load a value (possibly containing matchers) from a JSON document.
    ///
    /// # Errors
    ///
    /// - [`MatchError::UnknownMatcher`] for an unknown `$tag`.
    /// - [`MatchError::InvalidConfig`] for a malformed payload.
    /// - Construction errors of the tagged matcher (bad regex, negative tolerance, ...).
    pub fn from_json(doc: &Json) -> Result<Value, MatchError> {
        match doc {
            Json::Null => Ok(Value::None),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => number(n),
            Json::String(s) => Ok(Value::Str(s.clone())),
            Json::Array(items) => Ok(Value::List(load_all(items)?)),
            Json::Object(map) => match single_tag(map) {
                Some((tag, payload)) => load_tagged(tag, payload),
                None => load_map(map),
            },
        }
    }
}

fn number(n: &serde_json::Number) -> Result<Value, MatchError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    n.as_f64().map(Value::Float).ok_or_else(|| MatchError::InvalidConfig {
        reason: format!("number {n} is out of range"),
    })
}

fn load_all(items: &[Json]) -> Result<Vec<Value>, MatchError> {
    items.iter().map(Value::from_json).collect()
}

fn load_map(map: &Map<String, Json>) -> Result<Value, MatchError> {
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let key = key.strip_prefix('$').filter(|k| k.starts_with('$')).unwrap_or(key);
        entries.push((Value::from(key), Value::from_json(value)?));
    }
    Ok(Value::map(entries))
}

/// `Some((tag, payload))` when the object is a single `$tag` (not an escaped `$$key`).
fn single_tag(map: &Map<String, Json>) -> Option<(&str, &Json)> {
    if map.len() != 1 {
        return None;
    }
    let (key, payload) = map.iter().next()?;
    (key.starts_with('$') && !key.starts_with("$$")).then_some((key.as_str(), payload))
}

fn invalid(tag: &str, expected: &str) -> MatchError {
    MatchError::InvalidConfig {
        reason: format!("{tag} expects {expected}"),
    }
}

fn array<'a>(tag: &str, payload: &'a Json) -> Result<&'a [Json], MatchError> {
    payload
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| invalid(tag, "an array"))
}

fn object<'a>(tag: &str, payload: &'a Json) -> Result<&'a Map<String, Json>, MatchError> {
    payload.as_object().ok_or_else(|| invalid(tag, "an object"))
}

fn string<'a>(tag: &str, payload: &'a Json) -> Result<&'a str, MatchError> {
    payload.as_str().ok_or_else(|| invalid(tag, "a string"))
}

fn load_tagged(tag: &str, payload: &Json) -> Result<Value, MatchError> {
    tracing::trace!(tag, "loading tagged value");
    match tag {
        "$any" => Ok(M::any()),
        "$re" => load_regex(payload),
        "$dict" => {
            let Value::Map(entries) = load_map(object(tag, payload)?)? else {
                return Err(invalid(tag, "an object"));
            };
            Ok(M::dict(entries.iter().map(|(k, v)| (k.clone(), v.clone()))))
        }
        "$attrs" => load_attrs(payload),
        "$any_of" => Ok(M::any_of(load_all(array(tag, payload)?)?)),
        "$unordered" => M::unordered(load_all(array(tag, payload)?)?),
        "$isa" => {
            let names: Vec<&str> = match payload {
                Json::String(name) => vec![name.as_str()],
                Json::Array(items) => items
                    .iter()
                    .map(|item| string(tag, item))
                    .collect::<Result<_, _>>()?,
                _ => return Err(invalid(tag, "a kind name or an array of kind names")),
            };
            Ok(M::isa(names.into_iter().map(Kind::from_name)))
        }
        "$approx" => load_approx(payload),
        "$datetime" => parse_datetime(string(tag, payload)?).map(Value::DateTime),
        "$tuple" => Ok(Value::Tuple(load_all(array(tag, payload)?)?)),
        "$set" => Ok(Value::set(load_all(array(tag, payload)?)?)),
        "$bytes" => load_bytes(payload),
        "$object" => {
            let spec = object(tag, payload)?;
            let class = spec
                .get("class")
                .and_then(Json::as_str)
                .ok_or_else(|| invalid(tag, "a \"class\" name"))?;
            let mut obj = Object::new(class);
            if let Some(attrs) = spec.get("attrs") {
                for (name, value) in object(tag, attrs)? {
                    obj = obj.with(name.as_str(), Value::from_json(value)?);
                }
            }
            Ok(obj.into())
        }
        unknown => Err(MatchError::UnknownMatcher {
            name: unknown.to_owned(),
            available: KNOWN_TAGS.iter().map(|t| (*t).to_owned()).collect(),
        }),
    }
}

fn load_regex(payload: &Json) -> Result<Value, MatchError> {
    match payload {
        Json::String(pattern) => M::re(pattern),
        Json::Object(spec) => {
            let pattern = spec
                .get("pattern")
                .and_then(Json::as_str)
                .ok_or_else(|| invalid("$re", "a \"pattern\" string"))?;
            let names: Vec<&str> = match spec.get("flags") {
                None | Some(Json::Null) => Vec::new(),
                Some(Json::String(s)) => s.split('|').map(str::trim).collect(),
                Some(Json::Array(items)) => items
                    .iter()
                    .map(|item| string("$re", item))
                    .collect::<Result<_, _>>()?,
                Some(_) => return Err(invalid("$re", "flags as a string or an array")),
            };
            let mut flags = RegexFlags::NONE;
            for name in names.into_iter().filter(|n| !n.is_empty()) {
                flags = flags
                    | RegexFlags::from_name(name).ok_or_else(|| MatchError::InvalidConfig {
                        reason: format!("unknown regex flag \"{name}\""),
                    })?;
            }
            M::re_with(pattern, flags)
        }
        _ => Err(invalid("$re", "a pattern string or an object")),
    }
}

fn load_attrs(payload: &Json) -> Result<Value, MatchError> {
    let spec = object("$attrs", payload)?;
    let structured =
        spec.contains_key("attrs") && spec.keys().all(|k| k == "attrs" || k == "class");
    let (class, attrs) = if structured {
        let class = match spec.get("class") {
            None | Some(Json::Null) => None,
            Some(Json::String(class)) => Some(class.as_str()),
            Some(_) => return Err(invalid("$attrs", "\"class\" as a string")),
        };
        let attrs = spec.get("attrs").map_or(Ok(spec), |a| object("$attrs", a))?;
        (class, attrs)
    } else {
        (None, spec)
    };
    let mut loaded = Vec::with_capacity(attrs.len());
    for (name, value) in attrs {
        loaded.push((name.clone(), Value::from_json(value)?));
    }
    Ok(match class {
        Some(class) => M::instance(class, loaded),
        None => M::attrs(loaded),
    })
}

fn load_approx(payload: &Json) -> Result<Value, MatchError> {
    let spec = match payload {
        Json::Object(spec) if spec.contains_key("expected") => spec,
        other => return Approx::new(Value::from_json(other)?).build(),
    };
    let expected = spec
        .get("expected")
        .map(Value::from_json)
        .transpose()?
        .unwrap_or_default();
    let mut approx = Approx::new(expected);
    if let Some(rel) = spec.get("rel").filter(|v| !v.is_null()) {
        approx = approx.rel(rel.as_f64().ok_or_else(|| invalid("$approx", "\"rel\" as a number"))?);
    }
    if let Some(abs) = spec.get("abs").filter(|v| !v.is_null()) {
        approx = approx.abs(abs.as_f64().ok_or_else(|| invalid("$approx", "\"abs\" as a number"))?);
    }
    if let Some(nan_ok) = spec.get("nan_ok").and_then(Json::as_bool) {
        approx = approx.nan_ok(nan_ok);
    }
    approx.build()
}

fn load_bytes(payload: &Json) -> Result<Value, MatchError> {
    match payload {
        Json::String(s) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| invalid("$bytes", "integers between 0 and 255"))
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Value::Bytes),
        _ => Err(invalid("$bytes", "a string or an array of integers")),
    }
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, MatchError> {
    text.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| MatchError::InvalidConfig {
            reason: format!("invalid datetime \"{text}\": {e}"),
        })
}
