//! Built-in `==` explainers.
//!
//! Each function receives two operands already known to differ and the [`Comparator`] to
//! recurse through. Registration order lives in
//! [`register_core_explainers`](crate::register_core_explainers).

use std::borrow::Cow;

use crate::{Comparator, Diff, ExplainError, Explanation, Mapping, PathKey, Value, PFORMAT_WIDTH};

/// Which operand a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// Partial-dict matcher on either side.
pub(crate) fn dict_matcher(
    cmp: &Comparator<'_>,
    left: &Value,
    right: &Value,
) -> Result<Diff, ExplainError> {
    let left_matcher = left.as_matcher().and_then(|m| m.as_dict());
    let right_matcher = right.as_matcher().and_then(|m| m.as_dict());
    let (side, matcher, target) = match (left_matcher, right_matcher) {
        (Some(_), Some(_)) => return Ok(Diff::line("Should not compare two M.dict() instances")),
        (Some(m), None) => (Side::Left, m, right),
        (None, Some(m)) => (Side::Right, m, left),
        (None, None) => return Ok(Diff::empty()),
    };
    let Some(target) = target.as_mapping() else {
        return Ok(Diff::empty());
    };

    let declared = matcher.entries();
    let extra = dict_extra(side, declared, target)?;
    let keys = declared.keys().filter(|k| target.contains_key(k));
    let diff = match side {
        Side::Left => dict_diff(cmp, keys, declared, target)?,
        Side::Right => dict_diff(cmp, keys, target, declared)?,
    };
    Ok(extra.append(diff))
}

/// Two plain mappings.
pub(crate) fn mapping(
    cmp: &Comparator<'_>,
    left: &Value,
    right: &Value,
) -> Result<Diff, ExplainError> {
    let (Some(l), Some(r)) = (left.as_mapping(), right.as_mapping()) else {
        return Ok(Diff::empty());
    };
    let extra = dict_extra(Side::Left, l, r)?.append(dict_extra(Side::Right, r, l)?);
    let keys = r.keys().filter(|k| l.contains_key(k));
    Ok(extra.append(dict_diff(cmp, keys, l, r)?))
}

/// `"{side} contains {n} more item(s):"` plus the pretty-printed extra entries.
fn dict_extra(side: Side, more: &Mapping, less: &Mapping) -> Result<Diff, ExplainError> {
    let extra: Mapping = more
        .iter()
        .filter(|(k, _)| !less.contains_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if extra.is_empty() {
        return Ok(Diff::empty());
    }
    let n = extra.len();
    let mut lines = vec![format!(
        "{} contains {n} more item{}:",
        side.label(),
        if n == 1 { "" } else { "s" }
    )];
    let pretty = Value::Map(extra).pformat(PFORMAT_WIDTH)?;
    lines.extend(pretty.lines().map(str::to_owned));
    Ok(Diff::Lines(lines))
}

/// `"Differing items:"` tree over `keys`, recursing into each differing pair.
fn dict_diff<'k>(
    cmp: &Comparator<'_>,
    keys: impl Iterator<Item = &'k Value>,
    left: &Mapping,
    right: &Mapping,
) -> Result<Diff, ExplainError> {
    let mut tree = Explanation::new("Differing items:");
    for key in keys {
        let (Some(l), Some(r)) = (left.get(key), right.get(key)) else {
            continue;
        };
        if !l.matches(r) {
            tree.push(PathKey::for_key(key)?, cmp.compare_eq(l, r)?);
        }
    }
    Ok(if tree.is_empty() {
        Diff::empty()
    } else {
        tree.into()
    })
}

/// Attribute matcher on either side.
///
/// Attributes the target does not expose render as `<missing>`; extra attributes on the
/// target are never reported.
pub(crate) fn attrs_matcher(
    cmp: &Comparator<'_>,
    left: &Value,
    right: &Value,
) -> Result<Diff, ExplainError> {
    let left_matcher = left.as_matcher().and_then(|m| m.as_attrs());
    let right_matcher = right.as_matcher().and_then(|m| m.as_attrs());
    let (side, matcher, target) = match (left_matcher, right_matcher) {
        (Some(_), Some(_)) => return Ok(Diff::line("Should not compare two M() instances")),
        (Some(m), None) => (Side::Left, m, right),
        (None, Some(m)) => (Side::Right, m, left),
        (None, None) => return Ok(Diff::empty()),
    };

    let mut tree = Explanation::new("Differing items:");
    for (name, expected) in matcher.attrs() {
        let diff = match target.attr(name) {
            None => {
                let expected = expected.repr()?;
                Diff::line(match side {
                    Side::Left => format!("{expected} != <missing>"),
                    Side::Right => format!("<missing> != {expected}"),
                })
            }
            Some(actual) if actual.matches(expected) => continue,
            Some(actual) => match side {
                Side::Left => cmp.compare_eq(expected, &actual)?,
                Side::Right => cmp.compare_eq(&actual, expected)?,
            },
        };
        tree.push(name, diff);
    }
    Ok(if tree.is_empty() {
        Diff::empty()
    } else {
        tree.into()
    })
}

/// Two sets: delegated to the set-diff collaborator.
pub(crate) fn set(cmp: &Comparator<'_>, left: &Value, right: &Value) -> Result<Diff, ExplainError> {
    let (Value::Set(l), Value::Set(r)) = (left, right) else {
        return Ok(Diff::empty());
    };
    let collab = cmp.collaborators();
    Ok(collab
        .set_diff
        .diff(l, r, collab.safe_repr.as_ref(), cmp.verbose())
        .into())
}

/// Two strings: a single line when short, otherwise the text-diff collaborator.
pub(crate) fn text(
    cmp: &Comparator<'_>,
    left: &Value,
    right: &Value,
) -> Result<Diff, ExplainError> {
    let (Some(l), Some(r)) = (left.as_str(), right.as_str()) else {
        return Ok(Diff::empty());
    };
    if l.is_empty()
        || r.is_empty()
        || l.chars().count() + r.chars().count() < crate::SHORT_STRING_THRESHOLD
    {
        return Ok(Diff::line(format!("{} != {}", left.repr()?, right.repr()?)));
    }
    Ok(cmp
        .collaborators()
        .text_diff
        .diff(l, r, cmp.verbose())
        .into())
}

/// Two sequences (lists, tuples, bytes).
///
/// Only the first mismatching position is explained; insertions and shifts are not detected.
pub(crate) fn sequence(
    cmp: &Comparator<'_>,
    left: &Value,
    right: &Value,
) -> Result<Diff, ExplainError> {
    if matches!((left, right), (Value::Bytes(_), Value::Bytes(_))) {
        let collab = cmp.collaborators();
        return Ok(collab
            .sequence_diff
            .diff(left, right, collab.safe_repr.as_ref(), cmp.verbose())
            .into());
    }
    let (Some(l), Some(r)) = (items(left), items(right)) else {
        return Ok(Diff::empty());
    };

    let mut diff = Diff::empty();
    if let Some(i) = l.iter().zip(r.iter()).position(|(a, b)| !a.matches(b)) {
        tracing::trace!(index = i, "first mismatch");
        diff = Explanation::new("First mismatch:")
            .with(PathKey::Index(i), cmp.compare_eq(&l[i], &r[i])?)
            .into();
    }

    let (side, longer, shorter) = if l.len() >= r.len() {
        (Side::Left, &l, &r)
    } else {
        (Side::Right, &r, &l)
    };
    let more = longer.len() - shorter.len();
    if more > 0 {
        let extra = longer[shorter.len()].repr()?;
        let line = if more == 1 {
            format!("{} contains one more item: {extra}", side.label())
        } else {
            format!(
                "{} contains {more} more items, first one: {extra}",
                side.label()
            )
        };
        diff = diff.append(Diff::line(line));
    }
    Ok(diff)
}

/// Sequence items; bytes are viewed as integers when compared against another sequence.
fn items(value: &Value) -> Option<Cow<'_, [Value]>> {
    match value {
        Value::List(items) | Value::Tuple(items) => Some(Cow::Borrowed(items)),
        Value::Bytes(bytes) => Some(Cow::Owned(
            bytes.iter().map(|b| Value::Int(i64::from(*b))).collect(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{compare_eq, vlist, vmap, Object, Value, M};

    fn explain(left: &Value, right: &Value) -> Vec<String> {
        compare_eq(left, right).unwrap()
    }

    #[test]
    fn test_sequence_first_mismatch() {
        assert_eq!(explain(&vlist![1, 2], &vlist![1, 3]), vec!["[1]: 2 != 3"]);
    }

    #[test]
    fn test_sequence_left_longer() {
        assert_eq!(
            explain(&vlist![1, 2, 3], &vlist![1, 2]),
            vec!["Left contains one more item: 3"]
        );
    }

    #[test]
    fn test_sequence_right_longer() {
        assert_eq!(
            explain(&vlist![1, 2], &vlist![1, 2, 3, 4]),
            vec!["Right contains 2 more items, first one: 3"]
        );
    }

    #[test]
    fn test_sequence_mismatch_and_length() {
        assert_eq!(
            explain(&vlist![1, 2], &vlist![1, 0, 2]),
            vec!["First mismatch:", "[1]: 2 != 0", "Right contains one more item: 2"]
        );
    }

    #[test]
    fn test_sequence_nested() {
        assert_eq!(
            explain(&vlist![1, vlist![2, 3]], &vlist![1, vlist![3, 3]]),
            vec!["[1][0]: 2 != 3"]
        );
    }

    #[test]
    fn test_dict_matcher_diff() {
        let actual = vmap! { "a" => 1, "b" => 2 };
        assert_eq!(explain(&actual, &M::dict([("a", 2)])), vec!["a: 1 != 2"]);
        assert_eq!(explain(&M::dict([("a", 2)]), &actual), vec!["a: 2 != 1"]);
    }

    #[test]
    fn test_dict_matcher_nested() {
        let actual = vmap! { "a" => vmap! { "b" => 1 } };
        let expected = M::dict([("a", vmap! { "b" => 2 })]);
        assert_eq!(explain(&actual, &expected), vec!["a.b: 1 != 2"]);
    }

    #[test]
    fn test_dict_matcher_nested_extra_items() {
        let actual = vmap! { "a" => vmap! {} };
        let expected = M::dict([("a", vmap! { "b" => 2, "c" => 3 })]);
        assert_eq!(
            explain(&actual, &expected),
            vec!["a:", "  Right contains 2 more items:", "  {'b': 2, 'c': 3}"]
        );
    }

    #[test]
    fn test_dict_matcher_dotted_key() {
        let actual = vmap! { "a" => vmap! { "b.c" => 1 } };
        let expected = M::dict([("a", vmap! { "b.c" => 2 })]);
        assert_eq!(explain(&actual, &expected), vec!["a.'b.c': 1 != 2"]);
    }

    #[test]
    fn test_dict_matcher_missing_key() {
        let actual = vmap! { "a" => 1 };
        let expected = M::dict([("a", 1), ("missing", 42)]);
        assert_eq!(
            explain(&actual, &expected),
            vec!["Right contains 1 more item:", "{'missing': 42}"]
        );
    }

    #[test]
    fn test_two_dict_matchers() {
        assert_eq!(
            explain(&M::dict([("a", 1)]), &M::dict([("a", 2)])),
            vec!["Should not compare two M.dict() instances"]
        );
    }

    #[test]
    fn test_dict_matcher_against_non_mapping_falls_back() {
        assert_eq!(explain(&5.into(), &M::dict([("a", 1)])), vec!["5 != M.dict(a=1)"]);
    }

    #[test]
    fn test_mapping_extras_both_sides() {
        let left = vmap! { "a" => 1, "x" => 1, "k" => 1 };
        let right = vmap! { "a" => 2, "y" => 2, "k" => 1 };
        assert_eq!(
            explain(&left, &right),
            vec![
                "Left contains 1 more item:",
                "{'x': 1}",
                "Right contains 1 more item:",
                "{'y': 2}",
                "Differing items:",
                "a: 1 != 2",
            ]
        );
    }

    #[test]
    fn test_mapping_non_string_key() {
        let left = Value::map([(1, "a")]);
        let right = Value::map([(1, "b")]);
        assert_eq!(explain(&left, &right), vec!["[1]: 'a' != 'b'"]);
    }

    #[test]
    fn test_attrs_matcher_diff() {
        let obj: Value = Object::new("Error").with("code", 500).with("message", "boom").into();
        let expected = M::attrs([("code", Value::from(523)), ("missing", 42.into())]);
        assert_eq!(
            explain(&obj, &expected),
            vec!["code: 500 != 523", "missing: <missing> != 42"]
        );
        assert_eq!(
            explain(&expected, &obj),
            vec!["code: 523 != 500", "missing: 42 != <missing>"]
        );
    }

    #[test]
    fn test_attrs_matcher_nested_list() {
        let obj: Value = Object::new("Resp").with("items", vlist![1, 2]).into();
        let expected = M::attrs([("items", vlist![1, 3])]);
        assert_eq!(explain(&obj, &expected), vec!["items[1]: 2 != 3"]);
    }

    #[test]
    fn test_two_attrs_matchers() {
        assert_eq!(
            explain(&M::attrs([("a", 1)]), &M::attrs([("a", 2)])),
            vec!["Should not compare two M() instances"]
        );
    }

    #[test]
    fn test_short_strings() {
        assert_eq!(explain(&"spam".into(), &"eggs".into()), vec!["'spam' != 'eggs'"]);
        assert_eq!(
            explain(&"".into(), &"a much longer string here".into()),
            vec!["'' != 'a much longer string here'"]
        );
    }

    #[test]
    fn test_long_strings_use_text_diff() {
        let lines = explain(
            &"first line\nsecond line".into(),
            &"first line\nsecond LINE".into(),
        );
        assert_eq!(lines, vec!["  first line", "- second LINE", "+ second line"]);
    }

    #[test]
    fn test_sets() {
        let lines = explain(&Value::set([1, 2]), &Value::set([2, 3]));
        assert_eq!(
            lines,
            vec![
                "Extra items in the left set:",
                "1",
                "Extra items in the right set:",
                "3"
            ]
        );
    }

    #[test]
    fn test_bytes() {
        assert_eq!(
            explain(&Value::from(&b"spam"[..]), &Value::from(&b"spat"[..])),
            vec!["At index 3 diff: b'm' != b't'"]
        );
    }

    #[test]
    fn test_fallback_line() {
        assert_eq!(explain(&1.into(), &2.into()), vec!["1 != 2"]);
        assert_eq!(explain(&"1".into(), &1.into()), vec!["'1' != 1"]);
    }
}
