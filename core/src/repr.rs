//! Representation notation for values and matchers.
//!
//! The notation is what explanation lines are made of: `'text'`, `[1, 2]`, `{'a': 1}`,
//! `(1,)`, `set()`, `b'raw'`, `Point(x=1)`, `M.dict(a=1)`. [`Value::pformat`] is the
//! width-aware variant used for multi-line "extra items" blocks.

use crate::{Mapping, ReprError, Value, ValueMatcher};
use chrono::TimeDelta;
use std::fmt::Write as _;

impl Value {
    /// Deterministic single-line representation.
    ///
    /// ```
    /// use matchdiff::prelude::*;
    ///
    /// assert_eq!(vlist![1, "a", 2.0, Value::None].repr().unwrap(), "[1, 'a', 2.0, None]");
    /// assert_eq!(Value::tuple([1]).repr().unwrap(), "(1,)");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ReprError`] when a nested custom value fails to render.
    pub fn repr(&self) -> Result<String, ReprError> {
        let mut out = String::new();
        write_repr(&mut out, self)?;
        Ok(out)
    }

    /// Pretty representation wrapped at `width` columns ([`crate::PFORMAT_WIDTH`] in explanations).
    ///
    /// Mapping keys are sorted when they are mutually orderable. Output that fits on one
    /// line stays on one line; otherwise containers put one item per line.
    ///
    /// # Errors
    ///
    /// Returns [`ReprError`] when a nested custom value fails to render.
    pub fn pformat(&self, width: usize) -> Result<String, ReprError> {
        let mut out = String::new();
        write_pretty(&mut out, self, 0, width)?;
        Ok(out)
    }
}

fn write_repr(out: &mut String, value: &Value) -> Result<(), ReprError> {
    match value {
        Value::None => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => out.push_str(&format_float(*f)),
        Value::Str(s) => out.push_str(&quote_str(s)),
        Value::Bytes(b) => out.push_str(&quote_bytes(b)),
        Value::List(items) => write_items(out, "[", items, "]")?,
        Value::Tuple(items) if items.len() == 1 => {
            out.push('(');
            write_repr(out, &items[0])?;
            out.push_str(",)");
        }
        Value::Tuple(items) => write_items(out, "(", items, ")")?,
        Value::Set(items) if items.is_empty() => out.push_str("set()"),
        Value::Set(items) => write_items(out, "{", items, "}")?,
        Value::Map(map) => {
            out.push('{');
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(out, k)?;
                out.push_str(": ");
                write_repr(out, v)?;
            }
            out.push('}');
        }
        Value::DateTime(dt) => {
            let _ = write!(out, "datetime({})", dt.format("%Y-%m-%dT%H:%M:%S%.f"));
        }
        Value::Object(obj) => {
            out.push_str(obj.class());
            out.push('(');
            for (i, (name, v)) in obj.attrs().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push('=');
                write_repr(out, v)?;
            }
            out.push(')');
        }
        Value::Custom(custom) => out.push_str(&custom.repr()?),
        Value::Matcher(matcher) => out.push_str(&matcher.repr()?),
    }
    Ok(())
}

fn write_items(
    out: &mut String,
    open: &str,
    items: &[Value],
    close: &str,
) -> Result<(), ReprError> {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(out, item)?;
    }
    out.push_str(close);
    Ok(())
}

/// Render comma-separated `key=repr` pairs, as used by matcher representations.
pub(crate) fn keyword_args<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a Value)>,
) -> Result<String, ReprError> {
    let mut out = String::new();
    for (i, (name, value)) in pairs.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(name);
        out.push('=');
        write_repr(&mut out, value)?;
    }
    Ok(out)
}

/// Render comma-separated reprs.
pub(crate) fn positional_args<'a>(
    items: impl IntoIterator<Item = &'a Value>,
) -> Result<String, ReprError> {
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(&mut out, item)?;
    }
    Ok(out)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Pretty printing
// ═══════════════════════════════════════════════════════════════════════════════

fn write_pretty(
    out: &mut String,
    value: &Value,
    indent: usize,
    width: usize,
) -> Result<(), ReprError> {
    let flat = flat_repr(value)?;
    if indent + flat.chars().count() <= width {
        out.push_str(&flat);
        return Ok(());
    }
    match value {
        Value::Map(map) if !map.is_empty() => {
            out.push('{');
            let entries = sorted_entries(map);
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                    push_spaces(out, indent + 1);
                }
                let key = k.repr()?;
                out.push_str(&key);
                out.push_str(": ");
                let item_indent = indent + 1 + key.chars().count() + 2;
                write_pretty(out, v, item_indent, width.saturating_sub(1))?;
            }
            out.push('}');
        }
        Value::List(items) | Value::Tuple(items) | Value::Set(items) if items.len() > 1 => {
            let (open, close) = match value {
                Value::List(_) => ('[', ']'),
                Value::Tuple(_) => ('(', ')'),
                _ => ('{', '}'),
            };
            out.push(open);
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                    push_spaces(out, indent + 1);
                }
                write_pretty(out, item, indent + 1, width.saturating_sub(1))?;
            }
            out.push(close);
        }
        _ => out.push_str(&flat),
    }
    Ok(())
}

/// Single-line representation with mapping keys sorted, matching the pretty form.
fn flat_repr(value: &Value) -> Result<String, ReprError> {
    match value {
        Value::Map(map) => {
            let mut out = String::from("{");
            for (i, (k, v)) in sorted_entries(map).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&k.repr()?);
                out.push_str(": ");
                out.push_str(&flat_repr(v)?);
            }
            out.push('}');
            Ok(out)
        }
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(flat_repr(item)?);
            }
            let inner = rendered.join(", ");
            Ok(match value {
                Value::List(_) => format!("[{inner}]"),
                Value::Tuple(_) if items.len() == 1 => format!("({inner},)"),
                Value::Tuple(_) => format!("({inner})"),
                _ if items.is_empty() => "set()".to_owned(),
                _ => format!("{{{inner}}}"),
            })
        }
        other => other.repr(),
    }
}

fn sorted_entries(map: &Mapping) -> Vec<(&Value, &Value)> {
    let mut entries: Vec<(&Value, &Value)> = map.iter().collect();
    let orderable = entries
        .windows(2)
        .all(|pair| pair[0].0.try_cmp(pair[1].0).is_ok());
    if orderable {
        entries.sort_by(|a, b| a.0.try_cmp(b.0).unwrap_or(std::cmp::Ordering::Equal));
    }
    entries
}

fn push_spaces(out: &mut String, n: usize) {
    out.extend(std::iter::repeat(' ').take(n));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Scalars
// ═══════════════════════════════════════════════════════════════════════════════

/// Quote a string: single quotes unless the text contains `'` and no `"`.
pub(crate) fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn quote_bytes(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };
    let mut out = String::from("b");
    out.push(char::from(quote));
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x20..=0x7e => out.push(char::from(b)),
            b => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push(char::from(quote));
    out
}

/// Shortest round-tripping float text, always with a fraction or exponent.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_owned();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return format_exponent(&format!("{f:e}"));
    }
    let text = format!("{f}");
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Normalise Rust's `1e-7` exponent form to `1e-07`.
pub(crate) fn format_exponent(text: &str) -> String {
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text.to_owned();
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Render a duration as `[D day[s], ]H:MM:SS[.ffffff]`.
///
/// Negative durations carry the sign on the day count only (`-1 day, 23:59:59`).
pub(crate) fn format_timedelta(delta: TimeDelta) -> String {
    const MICROS_PER_DAY: i64 = 86_400_000_000;
    let total = delta.num_microseconds().unwrap_or(i64::MAX);
    let days = total.div_euclid(MICROS_PER_DAY);
    let rem = total.rem_euclid(MICROS_PER_DAY);
    let micros = rem % 1_000_000;
    let secs = rem / 1_000_000;
    let mut out = String::new();
    if days != 0 {
        let plural = if days.abs() == 1 { "" } else { "s" };
        let _ = write!(out, "{days} day{plural}, ");
    }
    let _ = write!(out, "{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60);
    if micros > 0 {
        let _ = write!(out, ".{micros:06}");
    }
    out
}
