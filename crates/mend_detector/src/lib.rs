pub mod analyze;
pub mod harness;
pub mod issue;
pub mod known;
pub mod static_rules;
pub mod tests_gen;

use std::time::Duration;

use log::debug;
use serde::Serialize;

use mend_python_ast::parse_suite;
use mend_runtime::Executor;

pub use issue::{apply_patches, IssueKind, LogicalIssue, SuggestedPatch, TestCase, TestResult};

/// Everything one detector run produced.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Inspection {
    pub issues: Vec<LogicalIssue>,
    pub tests: Vec<TestCase>,
    pub test_results: Vec<TestResult>,
    pub note: Option<String>,
}

impl Inspection {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    fn noted(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Inspect the source for silent semantic bugs.
///
/// Stages run in confidence order and the first stage that yields issues
/// wins: known textual patterns, then the static AST detectors, then
/// synthesized checks executed dynamically through `executor`.
pub fn inspect_and_test(source: &str, executor: &dyn Executor, timeout: Duration) -> Inspection {
    let mut inspection = Inspection::default();

    inspection.issues = known::detect_known_patterns(source);
    if inspection.has_issues() {
        return inspection.noted("known logical pattern detected");
    }

    let Ok(suite) = parse_suite(source) else {
        return inspection.noted("source does not parse; nothing to inspect");
    };

    inspection.issues = static_rules::run_static_detectors(&suite, source);
    if inspection.has_issues() {
        return inspection.noted("static logical issues detected");
    }

    inspection.tests = tests_gen::generate_tests(&suite);
    if inspection.tests.is_empty() {
        return inspection.noted("no checks generated and no static issues found");
    }

    debug!("running {} synthesized check(s)", inspection.tests.len());
    inspection.test_results = harness::run_tests(source, &inspection.tests, executor, timeout);
    inspection.issues = analyze::analyze_results(&inspection.tests, &inspection.test_results, source);

    if inspection.has_issues() {
        inspection.noted("dynamic checks identified logical issues")
    } else {
        inspection.noted("no logical issues detected statically or dynamically")
    }
}
