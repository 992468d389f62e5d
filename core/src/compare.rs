//! Explain engine entry points.
//!
//! A [`Comparator`] bundles what one explanation run needs: the explainer registry, the
//! collaborators and the verbosity. Explainers recurse through it, so a custom registry or
//! collaborator set applies at every nesting level.

use crate::{Collaborators, Diff, ExplainError, ExplainerRegistry, Op, Value};

/// Per-call explanation context.
#[derive(Debug, Clone, Copy)]
pub struct Comparator<'a> {
    registry: &'a ExplainerRegistry,
    collaborators: &'a Collaborators,
    verbose: u8,
}

impl Default for Comparator<'static> {
    fn default() -> Self {
        Self::new(ExplainerRegistry::global(), Collaborators::shared())
    }
}

impl<'a> Comparator<'a> {
    /// Create a comparator over the given registry and collaborators, verbosity 0.
    #[must_use]
    pub fn new(registry: &'a ExplainerRegistry, collaborators: &'a Collaborators) -> Self {
        Self {
            registry,
            collaborators,
            verbose: 0,
        }
    }

    /// Set the verbosity level (builder pattern).
    #[must_use]
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// The verbosity level.
    #[must_use]
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// The collaborators explainers delegate to.
    #[must_use]
    pub fn collaborators(&self) -> &'a Collaborators {
        self.collaborators
    }

    /// Run the first explainer registered for `op` that accepts both operands.
    ///
    /// An empty [`Diff`] means no explainer claimed the pair, not that the values are equal.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError`] when an explainer fails, typically because a value's
    /// representation could not be produced.
    pub fn compare(&self, op: Op, left: &Value, right: &Value) -> Result<Diff, ExplainError> {
        match self.registry.select(op, left, right) {
            Some((name, explain)) => {
                tracing::debug!(%op, explainer = name, "dispatching explainer");
                explain(self, left, right)
            }
            None => {
                tracing::trace!(%op, left = %left.kind(), right = %right.kind(), "no explainer");
                Ok(Diff::empty())
            }
        }
    }

    /// [`compare`](Self::compare) for `==`, falling back to a `left != right` line.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError`] when an explainer or a representation fails.
    pub fn compare_eq(&self, left: &Value, right: &Value) -> Result<Diff, ExplainError> {
        let diff = self.compare(Op::Eq, left, right)?;
        if diff.is_empty() {
            return Ok(Diff::line(format!("{} != {}", left.repr()?, right.repr()?)));
        }
        Ok(diff)
    }
}

/// Explain `left <op> right` with the global registry and default collaborators.
///
/// ```
/// use matchdiff::prelude::*;
///
/// let lines = compare(Op::Eq, &vlist![1, 2, 3], &vlist![1, 2]).unwrap();
/// assert_eq!(lines, vec!["Left contains one more item: 3"]);
/// assert!(compare(Op::Eq, &1.into(), &2.into()).unwrap().is_empty());
/// ```
///
/// # Errors
///
/// Returns [`ExplainError`] when an explainer or a representation fails.
pub fn compare(op: Op, left: &Value, right: &Value) -> Result<Vec<String>, ExplainError> {
    Comparator::default()
        .compare(op, left, right)
        .map(Diff::into_lines)
}

/// Explain `left == right`, falling back to a `left != right` line.
///
/// # Errors
///
/// Returns [`ExplainError`] when an explainer or a representation fails.
pub fn compare_eq(left: &Value, right: &Value) -> Result<Vec<String>, ExplainError> {
    Comparator::default()
        .compare_eq(left, right)
        .map(Diff::into_lines)
}
