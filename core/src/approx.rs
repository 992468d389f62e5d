//! Approximate equality for numbers and points in time.
//!
//! [`approx`] (or the [`Approx`] builder for explicit tolerances) dispatches on the expected
//! value: a datetime yields an [`ApproxDatetime`], anything else an [`ApproxNumber`].
//! Tolerances are validated when the matcher is built.

use crate::repr::{format_exponent, format_float, format_timedelta};
use crate::{MatchError, Matcher, ReprError, Value, ValueMatcher};
use chrono::{NaiveDateTime, TimeDelta, Timelike};

/// Default relative tolerance for numeric comparisons.
pub const DEFAULT_REL: f64 = 1e-6;

/// Default absolute tolerance for numeric comparisons.
pub const DEFAULT_ABS: f64 = 1e-12;

/// An absolute tolerance: a number (seconds, for datetimes) or a duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Plain number. Interpreted as seconds when the expected value is a datetime.
    Seconds(f64),
    /// Duration. Only valid for datetimes.
    Duration(TimeDelta),
}

impl Tolerance {
    fn render(self) -> String {
        match self {
            Self::Seconds(s) => format_float(s),
            Self::Duration(d) => format_timedelta(d),
        }
    }
}

impl From<f64> for Tolerance {
    fn from(value: f64) -> Self {
        Self::Seconds(value)
    }
}

impl From<i64> for Tolerance {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Seconds(value as f64)
    }
}

impl From<i32> for Tolerance {
    fn from(value: i32) -> Self {
        Self::Seconds(f64::from(value))
    }
}

impl From<TimeDelta> for Tolerance {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for approximate matchers with explicit tolerances.
///
/// ```
/// use matchdiff::prelude::*;
///
/// let m = Approx::new(vlist![1, 2]).rel(0.01).build().unwrap();
/// assert!(vlist![1, 2.01].matches(&m));
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct Approx {
    expected: Value,
    rel: Option<f64>,
    abs: Option<Tolerance>,
    nan_ok: bool,
}

impl Approx {
    /// Start building an approximate matcher for `expected`.
    pub fn new(expected: impl Into<Value>) -> Self {
        Self {
            expected: expected.into(),
            rel: None,
            abs: None,
            nan_ok: false,
        }
    }

    /// Relative tolerance (numbers only).
    pub fn rel(mut self, rel: f64) -> Self {
        self.rel = Some(rel);
        self
    }

    /// Absolute tolerance.
    pub fn abs(mut self, abs: impl Into<Tolerance>) -> Self {
        self.abs = Some(abs.into());
        self
    }

    /// Whether NaN equals NaN.
    pub fn nan_ok(mut self, nan_ok: bool) -> Self {
        self.nan_ok = nan_ok;
        self
    }

    /// Validate the tolerances and build the matcher.
    ///
    /// # Errors
    ///
    /// - [`MatchError::RelativeTolerance`] if `rel` is given for a datetime.
    /// - [`MatchError::NegativeTolerance`] if a tolerance is negative.
    /// - [`MatchError::NanTolerance`] if a tolerance is NaN.
    /// - [`MatchError::ToleranceOutOfRange`] if seconds for a datetime don't fit a duration.
    /// - [`MatchError::ToleranceMismatch`] if a duration is given for a non-datetime.
    pub fn build(self) -> Result<Value, MatchError> {
        let matcher = match self.expected {
            Value::DateTime(expected) => {
                if self.rel.is_some() {
                    return Err(MatchError::RelativeTolerance);
                }
                let tolerance = match self.abs {
                    None => None,
                    Some(Tolerance::Duration(d)) => Some(d),
                    Some(Tolerance::Seconds(s)) => Some(seconds_to_delta(s)?),
                };
                Matcher::ApproxDatetime(ApproxDatetime::new(expected, tolerance)?)
            }
            expected => {
                let abs = match self.abs {
                    None => None,
                    Some(Tolerance::Seconds(s)) => Some(s),
                    Some(tolerance @ Tolerance::Duration(_)) => {
                        return Err(MatchError::ToleranceMismatch {
                            tolerance: tolerance.render(),
                            expected: expected.kind().to_string(),
                        });
                    }
                };
                Matcher::Approx(ApproxNumber::new(expected, self.rel, abs, self.nan_ok)?)
            }
        };
        Ok(matcher.into())
    }
}

/// Approximate matcher with default tolerances.
///
/// ```
/// use matchdiff::prelude::*;
///
/// assert!(Value::from(3).matches(&approx(3.0 + 1e-6).unwrap()));
/// ```
///
/// # Errors
///
/// Never fails for default tolerances; the `Result` mirrors [`Approx::build`].
pub fn approx(expected: impl Into<Value>) -> Result<Value, MatchError> {
    Approx::new(expected).build()
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_delta(seconds: f64) -> Result<TimeDelta, MatchError> {
    // 2^63 microseconds, the first value past i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if seconds.is_nan() {
        return Err(MatchError::NanTolerance { kind: "absolute" });
    }
    let micros = (seconds * 1e6).round();
    if !(-LIMIT..LIMIT).contains(&micros) {
        return Err(MatchError::ToleranceOutOfRange {
            tolerance: format_float(seconds),
        });
    }
    Ok(TimeDelta::microseconds(micros as i64))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ApproxDatetime
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches datetimes within an absolute tolerance of the expected one, boundary included.
#[derive(Debug, Clone)]
pub struct ApproxDatetime {
    expected: NaiveDateTime,
    tolerance: TimeDelta,
}

impl ApproxDatetime {
    /// Create a datetime matcher. `None` selects a tolerance of one second.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NegativeTolerance`] for a negative tolerance.
    pub fn new(expected: NaiveDateTime, tolerance: Option<TimeDelta>) -> Result<Self, MatchError> {
        let tolerance = tolerance.unwrap_or_else(|| TimeDelta::seconds(1));
        if tolerance < TimeDelta::zero() {
            return Err(MatchError::NegativeTolerance {
                kind: "absolute",
                tolerance: format_timedelta(tolerance),
            });
        }
        Ok(Self {
            expected,
            tolerance,
        })
    }

    /// The expected point in time.
    #[must_use]
    pub fn expected(&self) -> NaiveDateTime {
        self.expected
    }

    /// The absolute tolerance.
    #[must_use]
    pub fn tolerance(&self) -> TimeDelta {
        self.tolerance
    }
}

impl ValueMatcher for ApproxDatetime {
    fn matches(&self, value: &Value) -> bool {
        match value {
            Value::DateTime(actual) => (self.expected - *actual).abs() <= self.tolerance,
            _ => false,
        }
    }

    fn repr(&self) -> Result<String, ReprError> {
        Ok(format!(
            "approx({} ± {})",
            format_datetime(self.expected),
            format_timedelta(self.tolerance)
        ))
    }
}

/// `2023-03-31 00:00:00`, with `.ffffff` only when there are sub-second digits.
fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ApproxNumber
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches numbers, or lists, tuples and maps of numbers, within a tolerance.
///
/// The tolerance for an expected number `e` is `max(rel * |e|, abs)`, with `rel` defaulting
/// to [`DEFAULT_REL`] and `abs` to [`DEFAULT_ABS`]. If only `abs` is given, `rel` is ignored.
/// Non-numeric leaves compare with [`Value::matches`].
#[derive(Debug, Clone)]
pub struct ApproxNumber {
    expected: Value,
    rel: Option<f64>,
    abs: Option<f64>,
    nan_ok: bool,
}

impl ApproxNumber {
    /// Create a numeric matcher.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NegativeTolerance`] if `rel` or `abs` is negative, and
    /// [`MatchError::NanTolerance`] if either is NaN.
    pub fn new(
        expected: Value,
        rel: Option<f64>,
        abs: Option<f64>,
        nan_ok: bool,
    ) -> Result<Self, MatchError> {
        if abs.is_some_and(f64::is_nan) {
            return Err(MatchError::NanTolerance { kind: "absolute" });
        }
        if rel.is_some_and(f64::is_nan) {
            return Err(MatchError::NanTolerance { kind: "relative" });
        }
        if let Some(abs) = abs.filter(|a| *a < 0.0) {
            return Err(MatchError::NegativeTolerance {
                kind: "absolute",
                tolerance: format_float(abs),
            });
        }
        if let Some(rel) = rel.filter(|r| *r < 0.0) {
            return Err(MatchError::NegativeTolerance {
                kind: "relative",
                tolerance: format_float(rel),
            });
        }
        Ok(Self {
            expected,
            rel,
            abs,
            nan_ok,
        })
    }

    /// The expected value.
    #[must_use]
    pub fn expected(&self) -> &Value {
        &self.expected
    }

    fn tolerance(&self, expected: f64) -> f64 {
        let abs = self.abs.unwrap_or(DEFAULT_ABS);
        if self.rel.is_none() && self.abs.is_some() {
            return abs;
        }
        let rel = self.rel.unwrap_or(DEFAULT_REL) * expected.abs();
        rel.max(abs)
    }

    #[allow(clippy::float_cmp)]
    fn scalar_eq(&self, expected: f64, actual: f64) -> bool {
        if expected == actual {
            return true;
        }
        if expected.is_nan() || actual.is_nan() {
            return self.nan_ok && expected.is_nan() && actual.is_nan();
        }
        if expected.is_infinite() || actual.is_infinite() {
            return false;
        }
        (expected - actual).abs() <= self.tolerance(expected)
    }

    fn approx_eq(&self, expected: &Value, actual: &Value) -> bool {
        match (expected, actual) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                match (expected.as_f64(), actual.as_f64()) {
                    (Some(e), Some(a)) => self.scalar_eq(e, a),
                    _ => false,
                }
            }
            (Value::List(e) | Value::Tuple(e), Value::List(a) | Value::Tuple(a)) => {
                e.len() == a.len() && e.iter().zip(a).all(|(e, a)| self.approx_eq(e, a))
            }
            (Value::Map(e), Value::Map(a)) => {
                e.len() == a.len()
                    && e.iter()
                        .all(|(k, ev)| a.get(k).is_some_and(|av| self.approx_eq(ev, av)))
            }
            _ => expected.matches(actual),
        }
    }

    fn render(&self, expected: &Value) -> Result<String, ReprError> {
        match expected {
            Value::Int(_) | Value::Float(_) => {
                let number = expected.repr()?;
                match expected.as_f64() {
                    Some(e) if e.is_finite() => {
                        let tolerance = format_exponent(&format!("{:.1e}", self.tolerance(e)));
                        Ok(format!("{number} ± {tolerance}"))
                    }
                    _ => Ok(number),
                }
            }
            Value::List(items) | Value::Tuple(items) => {
                let rendered: Result<Vec<_>, _> = items.iter().map(|i| self.render(i)).collect();
                let inner = rendered?.join(", ");
                Ok(match expected {
                    Value::Tuple(_) if items.len() == 1 => format!("({inner},)"),
                    Value::Tuple(_) => format!("({inner})"),
                    _ => format!("[{inner}]"),
                })
            }
            Value::Map(map) => {
                let mut parts = Vec::with_capacity(map.len());
                for (k, v) in map.iter() {
                    parts.push(format!("{}: {}", k.repr()?, self.render(v)?));
                }
                Ok(format!("{{{}}}", parts.join(", ")))
            }
            other => other.repr(),
        }
    }
}

impl ValueMatcher for ApproxNumber {
    fn matches(&self, value: &Value) -> bool {
        self.approx_eq(&self.expected, value)
    }

    fn repr(&self) -> Result<String, ReprError> {
        Ok(format!("approx({})", self.render(&self.expected)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{vlist, vmap};
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, 31)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn test_approx_datetime_repr() {
        let m = approx(dt(0, 0, 0)).unwrap();
        assert_eq!(m.repr().unwrap(), "approx(2023-03-31 00:00:00 ± 0:00:01)");
    }

    #[test]
    fn test_approx_datetime_tolerance() {
        let now = dt(12, 0, 10);
        let earlier = dt(12, 0, 0);

        assert!(approx(now).unwrap().matches(&now.into()));
        assert!(!approx(earlier).unwrap().matches(&now.into()));
        assert!(Approx::new(earlier)
            .abs(TimeDelta::seconds(10))
            .build()
            .unwrap()
            .matches(&now.into()));
        assert!(Approx::new(earlier).abs(10).build().unwrap().matches(&now.into()));
        assert!(!Approx::new(earlier).abs(9.5).build().unwrap().matches(&now.into()));
        assert!(!approx(now).unwrap().matches(&"12:00:10".into()));
    }

    #[test]
    fn test_approx_datetime_rejects_rel() {
        let err = Approx::new(dt(0, 0, 0)).rel(1.0).build().unwrap_err();
        assert_eq!(err, MatchError::RelativeTolerance);
        assert!(err.to_string().contains("rel doesn't make sense"));
    }

    #[test]
    fn test_approx_datetime_rejects_negative() {
        let err = Approx::new(dt(0, 0, 0)).abs(-1).build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "absolute tolerance can't be negative: -1 day, 23:59:59"
        );
    }

    #[test]
    fn test_approx_number_defaults() {
        assert!(Value::from(3).matches(&approx(3.0 + 1e-6).unwrap()));
        assert!(!Value::from(3.1).matches(&approx(3.0).unwrap()));
        assert!(Value::from(1e-13).matches(&approx(0.0).unwrap()));
    }

    #[test]
    fn test_approx_number_sequences_and_maps() {
        let m = Approx::new(vlist![1, 2]).rel(0.01).build().unwrap();
        assert!(m.matches(&vlist![1, 2.01]));
        assert!(!m.matches(&vlist![1, 2.1]));
        assert!(!m.matches(&vlist![1]));

        let m = approx(vmap! { "a" => 1.0, "b" => "x" }).unwrap();
        assert!(m.matches(&vmap! { "a" => 1.000_000_1, "b" => "x" }));
        assert!(!m.matches(&vmap! { "a" => 1.0, "b" => "y" }));
    }

    #[test]
    fn test_approx_number_abs_only_ignores_rel() {
        let m = Approx::new(1000.0).abs(0.5).build().unwrap();
        assert!(m.matches(&1000.4.into()));
        assert!(!m.matches(&1000.6.into()));
    }

    #[test]
    fn test_approx_number_special_values() {
        assert!(!approx(f64::NAN).unwrap().matches(&f64::NAN.into()));
        assert!(Approx::new(f64::NAN).nan_ok(true).build().unwrap().matches(&f64::NAN.into()));
        assert!(approx(f64::INFINITY).unwrap().matches(&f64::INFINITY.into()));
        assert!(!approx(f64::INFINITY).unwrap().matches(&1e300.into()));
    }

    #[test]
    fn test_approx_number_rejects_bad_tolerances() {
        let err = Approx::new(1.0).abs(-0.1).build().unwrap_err();
        assert_eq!(err.to_string(), "absolute tolerance can't be negative: -0.1");
        let err = Approx::new(1.0).rel(-0.1).build().unwrap_err();
        assert_eq!(err.to_string(), "relative tolerance can't be negative: -0.1");
        let err = Approx::new(1.0).abs(TimeDelta::seconds(1)).build().unwrap_err();
        assert!(matches!(err, MatchError::ToleranceMismatch { .. }));
    }

    #[test]
    fn test_approx_rejects_nan_tolerances() {
        let err = Approx::new(1.0).abs(f64::NAN).build().unwrap_err();
        assert_eq!(err, MatchError::NanTolerance { kind: "absolute" });
        assert_eq!(err.to_string(), "absolute tolerance can't be NaN");
        let err = Approx::new(1.0).rel(f64::NAN).build().unwrap_err();
        assert_eq!(err, MatchError::NanTolerance { kind: "relative" });

        let err = Approx::new(dt(0, 0, 0)).abs(f64::NAN).build().unwrap_err();
        assert_eq!(err, MatchError::NanTolerance { kind: "absolute" });

        // infinite numeric tolerances are accepted and match everything finite
        let m = Approx::new(1.0).abs(f64::INFINITY).build().unwrap();
        assert!(Value::from(1e300).matches(&m));
    }

    #[test]
    fn test_approx_datetime_rejects_unrepresentable_seconds() {
        for seconds in [f64::INFINITY, f64::NEG_INFINITY, 1e20] {
            let err = Approx::new(dt(0, 0, 0)).abs(seconds).build().unwrap_err();
            assert!(matches!(err, MatchError::ToleranceOutOfRange { .. }), "{seconds}: {err}");
        }
        let m = Approx::new(dt(0, 0, 0)).abs(0.5).build().unwrap();
        assert!(Value::from(dt(0, 0, 0)).matches(&m));
    }

    #[test]
    fn test_approx_number_repr() {
        assert_eq!(
            approx(3.000_001).unwrap().repr().unwrap(),
            "approx(3.000001 ± 3.0e-06)"
        );
        assert_eq!(
            approx(vlist![1, 2]).unwrap().repr().unwrap(),
            "approx([1 ± 1.0e-06, 2 ± 2.0e-06])"
        );
    }
}
