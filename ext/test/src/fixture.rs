//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the matchdiff engine. Operands are pattern
//! documents, so matchers are written with `$tags` (see [`Value::from_json`]).
//!
//! ```yaml
//! name: partial dict
//! description: M.dict ignores undeclared keys
//! cases:
//!   - name: extra key ignored
//!     left: {a: 1, b: 2}
//!     right: {$dict: {a: 1}}
//!     equal: true
//!   - name: value differs
//!     left: {a: 1}
//!     right: {$dict: {a: 2}}
//!     equal: false
//!     explanation: ["a: 1 != 2"]
//! ```

use matchdiff::prelude::*;
use matchdiff::Comparator;
use serde::Deserialize;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cases: Vec<TestCase>,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub left: serde_json::Value,
    pub right: serde_json::Value,
    /// Whether `left == right` is expected to hold (checked in both orders).
    pub equal: bool,
    /// Expected explanation lines for `left == right`, without the summary.
    #[serde(default)]
    pub explanation: Option<Vec<String>>,
    #[serde(default)]
    pub verbose: u8,
    /// Expected fragment of the comparison error, when the comparison cannot be carried out.
    #[serde(default)]
    pub error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub failures: Vec<String>,
}

impl CaseResult {
    /// Returns `true` if every check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl TestCase {
    fn run(&self) -> CaseResult {
        let mut failures = Vec::new();
        let loaded = Value::from_json(&self.left)
            .and_then(|l| Ok((l, Value::from_json(&self.right)?)));
        let (left, right) = match loaded {
            Ok(pair) => pair,
            Err(e) => {
                failures.push(format!("failed to load operands: {e}"));
                return CaseResult {
                    case_name: self.name.clone(),
                    failures,
                };
            }
        };

        if left.matches(&right) != self.equal {
            failures.push(format!("left == right: expected {}", self.equal));
        }
        if right.matches(&left) != self.equal {
            failures.push(format!("right == left: expected {}", self.equal));
        }

        if let Some(expected) = &self.error {
            let orders = [("left == right", &left, &right), ("right == left", &right, &left)];
            for (label, a, b) in orders {
                let got = match a.try_matches(b) {
                    Err(e) if e.to_string().contains(expected.as_str()) => continue,
                    Err(e) => e.to_string(),
                    Ok(equal) => equal.to_string(),
                };
                failures.push(format!("{label}: expected error {expected:?}, got {got}"));
            }
        }

        if let Some(expected) = &self.explanation {
            match Comparator::default()
                .with_verbose(self.verbose)
                .compare(Op::Eq, &left, &right)
            {
                Ok(diff) => {
                    let actual = diff.into_lines();
                    if &actual != expected {
                        failures.push(format!(
                            "explanation: expected {expected:#?}, got {actual:#?}"
                        ));
                    }
                }
                Err(e) => failures.push(format!("explanation failed: {e}")),
            }
        }

        CaseResult {
            case_name: self.name.clone(),
            failures,
        }
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Vec<CaseResult> {
        self.cases.iter().map(TestCase::run).collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        for result in self.run() {
            assert!(
                result.passed(),
                "Fixture '{}' case '{}' failed:\n{}",
                self.name,
                result.case_name,
                result.failures.join("\n")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: lists
description: element-wise comparison
cases:
  - name: wildcard element
    left: [1, 2]
    right: [1, {$any: null}]
    equal: true
  - name: differing element
    left: [1, 2]
    right: [1, 3]
    equal: false
    explanation: ["[1]: 2 != 3"]
---
name: second
cases: []
"#;

    #[test]
    fn test_parse_multi() {
        let fixtures = Fixture::from_yaml_multi(YAML).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].cases.len(), 2);
        assert!(fixtures[1].description.is_empty());
        fixtures[0].run_and_assert();
    }

    #[test]
    fn test_failures_are_reported() {
        let fixture = Fixture::from_yaml(
            r#"
name: wrong
cases:
  - name: claims equal
    left: 1
    right: 2
    equal: true
    explanation: ["nothing"]
"#,
        )
        .unwrap();
        let results = fixture.run();
        assert!(!results[0].passed());
        assert_eq!(results[0].failures.len(), 3);
    }

    #[test]
    fn test_expected_errors() {
        let fixture = Fixture::from_yaml(
            r#"
name: ordering
cases:
  - name: mixed kinds
    left: [2, "b"]
    right: {$unordered: [1, 2]}
    equal: false
    error: "not supported"
  - name: sortable
    left: [2, 1]
    right: {$unordered: [1, 2]}
    equal: true
    error: "not supported"
"#,
        )
        .unwrap();
        let results = fixture.run();
        assert!(results[0].passed(), "{:?}", results[0].failures);
        assert_eq!(results[1].failures.len(), 2);
    }
}
