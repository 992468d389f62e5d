//! matchdiff-test: Test domain for conformance testing
//!
//! Provides custom values for exercising the extension points: a well-behaved [`Point`]
//! with its own explainer, and a [`FaultyRepr`] whose representation always fails.
//!
//! # Example
//!
//! ```
//! use matchdiff_test::prelude::*;
//!
//! let p = Point::new(1, 2).into_value();
//! assert!(p.matches(&M::instance("Point", [("x", 1)])));
//! assert!(!p.matches(&M::attrs([("z", 1)])));
//! ```

use matchdiff::prelude::*;
use matchdiff::{
    both_kind, Comparator, CustomValue, ExplainError, ExplainerRegistryBuilder, ReprError,
};
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// A 2D point exposing `x` and `y` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Wrap the point as a [`Value`].
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Custom(Arc::new(self))
    }
}

impl CustomValue for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn attr(&self, name: &str) -> Option<Value> {
        match name {
            "x" => Some(self.x.into()),
            "y" => Some(self.y.into()),
            _ => None,
        }
    }

    fn repr(&self) -> Result<String, ReprError> {
        Ok(format!("Point(x={}, y={})", self.x, self.y))
    }

    fn eq_value(&self, other: &Value) -> bool {
        match other {
            Value::Custom(custom) => custom.as_any().downcast_ref::<Point>() == Some(self),
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value whose representation always fails.
#[derive(Debug, Clone, Default)]
pub struct FaultyRepr;

impl FaultyRepr {
    /// Wrap as a [`Value`].
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Custom(Arc::new(self))
    }
}

impl CustomValue for FaultyRepr {
    fn type_name(&self) -> &str {
        "FaultyRepr"
    }

    fn repr(&self) -> Result<String, ReprError> {
        Err(ReprError::new("FaultyRepr", "repr is broken"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Explain two points coordinate by coordinate.
fn explain_points(cmp: &Comparator<'_>, left: &Value, right: &Value) -> Result<Diff, ExplainError> {
    let mut explanation = Explanation::new("Points differ:");
    for axis in ["x", "y"] {
        let (l, r) = (left.attr(axis).unwrap_or_default(), right.attr(axis).unwrap_or_default());
        if !l.matches(&r) {
            explanation.push(axis, cmp.compare_eq(&l, &r)?);
        }
    }
    Ok(explanation.into())
}

/// Register the test-domain explainers followed by the core explainers.
///
/// - `point` (for `==`) → coordinate-wise explanation of two [`Point`] values
#[must_use]
pub fn register(builder: ExplainerRegistryBuilder) -> ExplainerRegistryBuilder {
    let builder = builder.explainer(
        Op::Eq,
        "point",
        both_kind(Kind::Class("Point".to_owned())),
        explain_points,
    );
    matchdiff::register_core_explainers(builder)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{register, FaultyRepr, Point};
    pub use matchdiff::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchdiff::{assertrepr_compare, assertrepr_compare_with, Collaborators};

    #[test]
    fn test_point_equality() {
        assert!(Point::new(1, 2).into_value().matches(&Point::new(1, 2).into_value()));
        assert!(!Point::new(1, 2).into_value().matches(&Point::new(2, 1).into_value()));
        assert!(!Point::new(1, 2).into_value().matches(&vlist![1, 2]));
    }

    #[test]
    fn test_point_attrs() {
        let p = Point::new(3, 4).into_value();
        assert!(p.matches(&M::attrs([("x", 3), ("y", 4)])));
        assert!(p.matches(&M::isa([Kind::from_name("Point")])));
        assert!(!p.matches(&M::instance("Other", [("x", 3)])));
    }

    #[test]
    fn test_register_point_explainer() {
        let registry = register(ExplainerRegistryBuilder::new()).build();
        assert_eq!(registry.explainer_names(Op::Eq)[0], "point");

        let lines = assertrepr_compare_with(
            &registry,
            &Collaborators::default(),
            &CompareConfig::default(),
            Op::Eq,
            &Point::new(1, 2).into_value(),
            &Point::new(1, 5).into_value(),
        )
        .unwrap();
        assert_eq!(
            lines,
            vec!["Point(x=1, y=2) == Point(x=1, y=5)", "y: 2 != 5"]
        );
    }

    #[test]
    fn test_points_without_explainer() {
        let lines = assertrepr_compare(
            &CompareConfig::default(),
            Op::Eq,
            &Point::new(1, 2).into_value(),
            &Point::new(1, 5).into_value(),
        );
        assert!(lines.is_none());
    }

    #[test]
    fn test_faulty_repr_is_contained() {
        let lines = assertrepr_compare(
            &CompareConfig::default(),
            Op::Eq,
            &vmap! { "a" => FaultyRepr.into_value() },
            &vmap! { "a" => 1 },
        )
        .unwrap();
        assert_eq!(
            &lines[1..],
            [
                "matchdiff compare failed:",
                "  FaultyRepr.repr() failed: repr is broken",
                "Probably an object has a faulty repr.",
            ]
        );
    }
}
