//! Turn failing test results into logical issues, attaching patches for
//! known failure families.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::issue::{IssueKind, LogicalIssue, SuggestedPatch, TestCase, TestResult};

static FACTORIAL_DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"def\s+factorial\s*\(").unwrap());
static FACTORIAL_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)def\s+factorial\s*\([^)]*\)\s*:(.*?)(?:\ndef\s|\z)").unwrap());
static RETURN_ZERO: Lazy<Regex> = Lazy::new(|| Regex::new(r"return\s+0\b").unwrap());

/// Convert failing results into issues. Results are zipped with the tests
/// that produced them.
pub fn analyze_results(
    tests: &[TestCase],
    results: &[TestResult],
    source: &str,
) -> Vec<LogicalIssue> {
    let mut issues = Vec::new();
    for (test, result) in tests.iter().zip(results) {
        if result.ok && result.observed.as_deref() == Some(test.expected.as_str()) {
            continue;
        }

        // The factorial family has a well-understood fix.
        if test.call.contains("factorial(") && factorial_returns_zero(source) {
            issues.push(LogicalIssue {
                kind: IssueKind::TestFailureFactorialBase,
                message: format!("factorial fails the check '{}'", test.description),
                location: None,
                evidence: format!(
                    "call {} expected {} observed {:?} error {:?}",
                    test.call, test.expected, result.observed, result.error
                ),
                hint: "Change the factorial base case to return 1".to_string(),
                suggested_patch: Some(SuggestedPatch::new(r"return\s+0\b", "return 1")),
            });
            continue;
        }

        issues.push(LogicalIssue {
            kind: IssueKind::TestFailure,
            message: format!("Check '{}' failed for call {}", test.description, test.call),
            location: None,
            evidence: format!(
                "expected {}, observed {:?}, error {:?}",
                test.expected, result.observed, result.error
            ),
            hint: "Inspect the function's logic against the expected value".to_string(),
            suggested_patch: None,
        });
    }
    issues
}

fn factorial_returns_zero(source: &str) -> bool {
    if !FACTORIAL_DEF.is_match(source) {
        return false;
    }
    FACTORIAL_BODY
        .captures(source)
        .is_some_and(|caps| RETURN_ZERO.is_match(&caps[1]))
}

#[cfg(test)]
mod tests {
    use crate::issue::{IssueKind, TestCase, TestResult};

    use super::analyze_results;

    fn case(call: &str, expected: &str) -> TestCase {
        TestCase {
            function_name: call.split('(').next().unwrap().to_string(),
            call: call.to_string(),
            expected: expected.to_string(),
            description: format!("check {call}"),
        }
    }

    fn failing(call: &str, expected: &str, observed: &str) -> TestResult {
        TestResult {
            call: Some(call.to_string()),
            expected: Some(expected.to_string()),
            ok: true,
            observed: Some(observed.to_string()),
            error: None,
            description: None,
        }
    }

    #[test]
    fn factorial_failure_gets_the_base_case_patch() {
        let source = "\
def factorial(n):
    if n == 0:
        return 0
    return n * factorial(n - 1)
";
        let tests = vec![case("factorial(5)", "120")];
        let results = vec![failing("factorial(5)", "120", "0")];
        let issues = analyze_results(&tests, &results, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::TestFailureFactorialBase);
        let patched = issues[0].suggested_patch.as_ref().unwrap().apply(source);
        assert!(patched.contains("return 1"));
    }

    #[test]
    fn generic_failure_has_no_patch() {
        let source = "def helper(x):\n    return x\n";
        let tests = vec![case("helper(1)", "2")];
        let results = vec![failing("helper(1)", "2", "1")];
        let issues = analyze_results(&tests, &results, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::TestFailure);
        assert!(issues[0].suggested_patch.is_none());
    }

    #[test]
    fn passing_results_yield_nothing() {
        let tests = vec![case("f(1)", "1")];
        let results = vec![failing("f(1)", "1", "1")];
        assert!(analyze_results(&tests, &results, "def f(x):\n    return x\n").is_empty());
    }

    #[test]
    fn mismatched_repr_counts_as_failure_even_when_ok() {
        // The call evaluated without raising but produced the wrong value.
        let tests = vec![case("f(1)", "2")];
        let results = vec![failing("f(1)", "2", "1")];
        let issues = analyze_results(&tests, &results, "def f(x):\n    return x\n");
        assert_eq!(issues.len(), 1);
    }
}
