// Property-based tests for the matcher equality laws.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use matchdiff::prelude::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Attribute or key names: identifiers, never starting with `extra_`.
fn arb_attrs() -> impl Strategy<Value = BTreeMap<String, i64>> {
    prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 1..6)
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn object_with(attrs: &BTreeMap<String, i64>) -> Object {
    attrs
        .iter()
        .fold(Object::new("Namespace"), |obj, (k, v)| obj.with(k.as_str(), *v))
}

fn base_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 3, 31)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Attribute matcher
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn attrs_match_object_with_same_attributes(attrs in arb_attrs()) {
        let matcher = M::attrs(attrs.iter().map(|(k, v)| (k.clone(), *v)));
        let obj: Value = object_with(&attrs).into();
        prop_assert!(obj.matches(&matcher));
        prop_assert!(matcher.matches(&obj));
    }

    #[test]
    fn attrs_missing_attribute_breaks_match(
        attrs in arb_attrs(),
        pick in any::<prop::sample::Index>()
    ) {
        let matcher = M::attrs(attrs.iter().map(|(k, v)| (k.clone(), *v)));
        let removed = pick.get(&attrs.keys().collect::<Vec<_>>()).to_string();
        let mut reduced = attrs.clone();
        reduced.remove(&removed);
        let obj: Value = object_with(&reduced).into();
        prop_assert!(!obj.matches(&matcher));
    }

    #[test]
    fn attrs_unrelated_attribute_keeps_match(attrs in arb_attrs(), extra in any::<i64>()) {
        let matcher = M::attrs(attrs.iter().map(|(k, v)| (k.clone(), *v)));
        let obj: Value = object_with(&attrs).with("extra_attr", extra).into();
        prop_assert!(obj.matches(&matcher));
    }
}

// ---------------------------------------------------------------------------
// Partial dict
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn dict_matches_own_mapping(entries in arb_attrs()) {
        let mapping = Value::map(entries.iter().map(|(k, v)| (k.as_str(), *v)));
        let matcher = M::dict(entries.iter().map(|(k, v)| (k.as_str(), *v)));
        prop_assert!(mapping.matches(&matcher));
        prop_assert!(matcher.matches(&mapping));
    }

    #[test]
    fn dict_matches_superset(entries in arb_attrs(), extra in arb_attrs()) {
        let matcher = M::dict(entries.iter().map(|(k, v)| (k.as_str(), *v)));
        let superset = Value::map(
            extra
                .iter()
                .map(|(k, v)| (format!("extra_{k}"), *v))
                .chain(entries.iter().map(|(k, v)| (k.clone(), *v))),
        );
        prop_assert!(superset.matches(&matcher));
        prop_assert!(matcher.matches(&superset));
    }
}

// ---------------------------------------------------------------------------
// Regex, any_of, isa
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn regex_searches_anywhere(
        prefix in "[0-9]{0,6}",
        needle in "[a-z]{1,5}",
        suffix in "[0-9]{0,6}"
    ) {
        let matcher = M::re(&needle).unwrap();
        let hit = Value::from(format!("{prefix}{needle}{suffix}"));
        let miss = Value::from(format!("{prefix}{suffix}"));
        prop_assert!(hit.matches(&matcher));
        prop_assert!(!miss.matches(&matcher));
    }

    #[test]
    fn any_of_equals_exactly_its_items(
        a in arb_scalar(),
        b in arb_scalar(),
        other in arb_scalar()
    ) {
        let matcher = M::any_of([a.clone(), b.clone()]);
        prop_assert!(a.matches(&matcher));
        prop_assert!(b.matches(&matcher));
        prop_assert_eq!(other.matches(&matcher), other.matches(&a) || other.matches(&b));
    }

    #[test]
    fn any_of_membership(
        a in arb_scalar(),
        b in arb_scalar(),
        seq in prop::collection::vec(arb_scalar(), 0..6)
    ) {
        let matcher = M::any_of([a.clone(), b.clone()]);
        prop_assert_eq!(
            matcher.contained_in(&seq),
            a.contained_in(&seq) || b.contained_in(&seq)
        );
    }

    #[test]
    fn isa_checks_runtime_kind(value in arb_scalar(), f in any::<f64>()) {
        let matcher = M::isa([Kind::Int, Kind::Str, Kind::Bool]);
        prop_assert!(value.matches(&matcher));
        prop_assert!(!Value::from(f).matches(&matcher));
        // chained: a == m == b
        let other = Value::from(0);
        prop_assert!(value.matches(&matcher) && matcher.matches(&other));
    }
}

// ---------------------------------------------------------------------------
// Unordered
// ---------------------------------------------------------------------------

fn arb_permutation() -> impl Strategy<Value = (Vec<i64>, Vec<i64>)> {
    prop::collection::vec(-50_i64..50, 0..10)
        .prop_flat_map(|items| (Just(items.clone()), Just(items).prop_shuffle()))
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn unordered_equals_permutations((items, shuffled) in arb_permutation()) {
        let matcher = M::unordered(items).unwrap();
        prop_assert!(Value::list(shuffled).matches(&matcher));
    }

    #[test]
    fn unordered_differs_from_non_permutations(
        (items, shuffled) in arb_permutation(),
        extra in -50_i64..50
    ) {
        let matcher = M::unordered(items).unwrap();
        let mut longer = shuffled;
        longer.push(extra);
        prop_assert!(!Value::list(longer).matches(&matcher));
    }
}

// ---------------------------------------------------------------------------
// Approximate datetimes
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn approx_datetime_is_inclusive(tolerance in 0_i64..3600, offset in -3600_i64..3600) {
        let expected = base_datetime();
        let matcher = Approx::new(expected)
            .abs(TimeDelta::seconds(tolerance))
            .build()
            .unwrap();
        let actual = Value::from(expected + TimeDelta::seconds(offset));
        prop_assert_eq!(actual.matches(&matcher), offset.abs() <= tolerance);

        let beyond = expected + TimeDelta::seconds(tolerance) + TimeDelta::microseconds(1);
        prop_assert!(!Value::from(beyond).matches(&matcher));
    }

    #[test]
    fn approx_datetime_rejects_negative_tolerance(tolerance in 1_i64..3600) {
        let err = Approx::new(base_datetime())
            .abs(TimeDelta::seconds(-tolerance))
            .build()
            .unwrap_err();
        let is_negative = matches!(err, MatchError::NegativeTolerance { .. });
        prop_assert!(is_negative);
    }
}

#[test]
fn approx_datetime_defaults_to_one_second() {
    let expected = base_datetime();
    let matcher = approx(expected).unwrap();
    assert!(Value::from(expected + TimeDelta::seconds(1)).matches(&matcher));
    assert!(!Value::from(expected + TimeDelta::milliseconds(1001)).matches(&matcher));
}

#[test]
fn approx_datetime_rejects_rel() {
    let err = Approx::new(base_datetime()).rel(0.1).build().unwrap_err();
    assert_eq!(err, MatchError::RelativeTolerance);
}

// ---------------------------------------------------------------------------
// End-to-end explanations
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_explanations() {
    assert_eq!(compare_eq(&vlist![1, 2], &vlist![1, 3]).unwrap(), ["[1]: 2 != 3"]);
    assert_eq!(
        compare_eq(&vlist![1, 2, 3], &vlist![1, 2]).unwrap(),
        ["Left contains one more item: 3"]
    );
    assert_eq!(
        compare_eq(&vlist![1, 2], &vlist![1, 2, 3, 4]).unwrap(),
        ["Right contains 2 more items, first one: 3"]
    );
    assert_eq!(
        compare_eq(&vmap! { "a" => 1, "b" => 2 }, &M::dict([("a", 2)])).unwrap(),
        ["a: 1 != 2"]
    );
    assert_eq!(
        compare_eq(
            &vmap! { "a" => vmap! {} },
            &M::dict([("a", vmap! { "b" => 2, "c" => 3 })])
        )
        .unwrap(),
        ["a:", "  Right contains 2 more items:", "  {'b': 2, 'c': 3}"]
    );
    assert_eq!(
        compare_eq(
            &vmap! { "a" => vmap! { "b.c" => 1 } },
            &M::dict([("a", vmap! { "b.c" => 2 })])
        )
        .unwrap(),
        ["a.'b.c': 1 != 2"]
    );
}
