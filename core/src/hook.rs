//! Host integration: the assertion-failure hook.
//!
//! A host calls [`assertrepr_compare`] after it has determined that `left <op> right` failed.
//! The result is the failure body: a one-line summary followed by the explanation lines, or
//! `None` when no explainer had anything to say and the host should use its own message.
//!
//! The explain engine runs behind a containment boundary. Explainer errors and panics (a
//! faulty custom representation, typically) become a fixed diagnostic instead of replacing the
//! original assertion failure.

use crate::{
    CheckError, Collaborators, Comparator, CompareConfig, ExplainerRegistry, Op, Value,
};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Width of the `E       AssertionError: assert` prefix hosts print before the summary.
const ASSERTION_PREFIX_LEN: usize = 30;

/// Minimum width the summary is sized for, however narrow the terminal.
const MIN_SUMMARY_WIDTH: usize = 80;

/// Explain a failed `left <op> right` with the global registry and default collaborators.
///
/// ```
/// use matchdiff::prelude::*;
/// use matchdiff::assertrepr_compare;
///
/// let lines = assertrepr_compare(
///     &CompareConfig::default(),
///     Op::Eq,
///     &vmap! { "a" => 1 },
///     &M::dict([("a", 2)]),
/// )
/// .unwrap();
/// assert_eq!(lines, vec!["{'a': 1} == M.dict(a=2)", "a: 1 != 2"]);
/// ```
#[must_use]
pub fn assertrepr_compare(
    config: &CompareConfig,
    op: Op,
    left: &Value,
    right: &Value,
) -> Option<Vec<String>> {
    assertrepr_compare_with(
        ExplainerRegistry::global(),
        Collaborators::shared(),
        config,
        op,
        left,
        right,
    )
}

/// [`assertrepr_compare`] over a custom registry and collaborator set.
#[must_use]
pub fn assertrepr_compare_with(
    registry: &ExplainerRegistry,
    collaborators: &Collaborators,
    config: &CompareConfig,
    op: Op,
    left: &Value,
    right: &Value,
) -> Option<Vec<String>> {
    let summary = summary_line(collaborators, config, op, left, right);
    let comparator = Comparator::new(registry, collaborators).with_verbose(config.verbose);

    let outcome = catch_unwind(AssertUnwindSafe(|| comparator.compare(op, left, right)));
    let explanation = match outcome {
        Ok(Ok(diff)) => diff.into_lines(),
        Ok(Err(err)) => crash_lines(&err.to_string()),
        Err(payload) => crash_lines(&panic_message(payload.as_ref())),
    };

    if explanation.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(explanation.len() + 1);
    lines.push(summary);
    lines.extend(explanation);
    Some(lines)
}

/// Check that `left` matches `right`.
///
/// # Errors
///
/// - [`CheckError::Mismatch`] with the rendered failure body (summary plus explanation lines,
///   newline separated) when the values do not match.
/// - [`CheckError::Match`] when the comparison cannot be carried out, such as an
///   `M::unordered` matcher meeting items that cannot be sorted.
///
/// ```
/// use matchdiff::prelude::*;
/// use matchdiff::{check_match, CheckError};
///
/// let config = CompareConfig::default();
/// assert!(check_match(&vlist![1, 2], &vlist![1, M::any()], &config).is_ok());
/// let err = check_match(&vlist![1, 2], &vlist![1, 3], &config).unwrap_err();
/// assert_eq!(err.to_string(), "[1, 2] == [1, 3]\n[1]: 2 != 3");
///
/// let ids = M::unordered([1, 2]).unwrap();
/// let err = check_match(&vlist![1, "x"], &ids, &config).unwrap_err();
/// assert!(matches!(err, CheckError::Match(MatchError::Unorderable { .. })));
/// ```
pub fn check_match(left: &Value, right: &Value, config: &CompareConfig) -> Result<(), CheckError> {
    if left.try_matches(right)? {
        return Ok(());
    }
    let body = match assertrepr_compare(config, Op::Eq, left, right) {
        Some(lines) => lines.join("\n"),
        None => {
            let repr = &Collaborators::shared().safe_repr;
            format!(
                "assertion `left == right` failed\n  left: {}\n right: {}",
                repr.repr(left, None),
                repr.repr(right, None)
            )
        }
    };
    Err(CheckError::Mismatch(body))
}

fn summary_line(
    collaborators: &Collaborators,
    config: &CompareConfig,
    op: Op,
    left: &Value,
    right: &Value,
) -> String {
    let repr = &collaborators.safe_repr;
    let symbol = op.symbol();
    if config.verbose > 1 {
        return format!("{} {symbol} {}", repr.repr(left, None), repr.repr(right, None));
    }
    let width = config.terminal_width().saturating_sub(10).max(MIN_SUMMARY_WIDTH);
    let hspace = width.saturating_sub(ASSERTION_PREFIX_LEN + symbol.len() + 2);
    let left_repr = repr.repr(left, Some(hspace / 2));
    let right_repr = repr.repr(right, Some(hspace.saturating_sub(left_repr.chars().count())));
    format!("{left_repr} {symbol} {right_repr}")
}

fn crash_lines(crash: &str) -> Vec<String> {
    tracing::warn!(crash, "explanation failed, falling back to crash diagnostic");
    vec![
        "matchdiff compare failed:".to_owned(),
        format!("  {crash}"),
        "Probably an object has a faulty repr.".to_owned(),
    ]
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "explainer panicked".to_owned()
    }
}
