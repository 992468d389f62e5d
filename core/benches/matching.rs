//! Matching benchmarks: the hot path.
//!
//! Measures: wildcard and partial-dict matching nested in containers, regex search,
//! unordered (sort-based) comparison at growing sizes, and approximate numbers.

use matchdiff::prelude::*;

fn main() {
    divan::main();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Test fixtures
// ═══════════════════════════════════════════════════════════════════════════════

fn record(id: i64) -> Value {
    vmap! {
        "id" => id,
        "name" => format!("user-{id}"),
        "tags" => vlist!["a", "b", "c"],
        "score" => 0.5,
    }
}

fn records(n: i64) -> Value {
    Value::list((0..n).map(record))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Core scenario: plain equality (baseline)
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 100, 1000])]
fn plain_list_equal(bencher: divan::Bencher, n: i64) {
    let left = records(n);
    let right = records(n);

    bencher.bench_local(|| left.matches(&right));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Core scenario: nested matchers
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 100, 1000])]
fn partial_dict_in_list(bencher: divan::Bencher, n: i64) {
    let actual = records(n);
    let expected = Value::list((0..n).map(|id| {
        M::dict([("id", Value::from(id)), ("name", M::re(r"^user-\d+$").unwrap())])
    }));

    bencher.bench_local(|| actual.matches(&expected));
}

#[divan::bench]
fn wildcard_fields(bencher: divan::Bencher) {
    let actual = record(7);
    let expected = vmap! {
        "id" => M::isa([Kind::Int]),
        "name" => M::any(),
        "tags" => M::any(),
        "score" => approx(0.5).unwrap(),
    };

    bencher.bench_local(|| actual.matches(&expected));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Core scenario: regex
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn regex_hit(bencher: divan::Bencher) {
    let matcher = M::re(r"^/api/v\d+/users/\d+$").unwrap();
    let actual = Value::from("/api/v2/users/12345");

    bencher.bench_local(|| actual.matches(&matcher));
}

/// Nested quantifiers stay linear with the `regex` crate.
#[divan::bench(args = [10, 25, 50, 100])]
fn regex_pathological(bencher: divan::Bencher, n: usize) {
    let matcher = M::re(r"(a+)+$").unwrap();
    let actual = Value::from("a".repeat(n) + "X");

    bencher.bench_local(|| actual.matches(&matcher));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Core scenario: unordered
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 100, 1000])]
fn unordered_reversed(bencher: divan::Bencher, n: i64) {
    let matcher = M::unordered(0..n).unwrap();
    let actual = Value::list((0..n).rev());

    bencher.bench_local(|| actual.matches(&matcher));
}

#[divan::bench(args = [10, 100, 1000])]
fn approx_list(bencher: divan::Bencher, n: i64) {
    let expected: Vec<Value> = (0..n).map(|i| Value::from(i as f64)).collect();
    let matcher = approx(expected).unwrap();
    let actual = Value::list((0..n).map(|i| i as f64 + 1e-9));

    bencher.bench_local(|| actual.matches(&matcher));
}
