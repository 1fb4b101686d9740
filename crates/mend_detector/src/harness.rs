//! Dynamic verification: generate a driver around the user source, run it
//! through the executor, and parse the JSON it prints.

use std::time::Duration;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use mend_errors::Language;
use mend_runtime::{Executor, TIMEOUT_SENTINEL};

use crate::issue::{TestCase, TestResult};

static TRAILING_JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(\[.*\])").unwrap());

/// Build a standalone Python driver that inlines the user source, evaluates
/// each call, and prints one JSON array of results on stdout. JSON object
/// literals double as Python literals because every test field is a string.
pub fn build_driver(source: &str, tests: &[TestCase]) -> String {
    let mut driver = String::new();
    driver.push_str("import json, traceback\n");
    driver.push_str("results = []\n");
    driver.push_str("def _run_test(fn_call):\n");
    driver.push_str("    try:\n");
    driver.push_str("        val = eval(fn_call, globals())\n");
    driver.push_str("        return {'ok': True, 'result': repr(val), 'error': None}\n");
    driver.push_str("    except Exception:\n");
    driver.push_str(
        "        return {'ok': False, 'result': None, 'error': traceback.format_exc()}\n",
    );
    driver.push('\n');
    driver.push_str("# --- begin user code ---\n");
    driver.push_str(source);
    if !source.ends_with('\n') {
        driver.push('\n');
    }
    driver.push_str("# --- end user code ---\n");
    driver.push('\n');
    driver.push_str("tests = []\n");
    for test in tests {
        let encoded = serde_json::to_string(test).expect("test cases serialize");
        driver.push_str(&format!("tests.append({encoded})\n"));
    }
    driver.push_str("for t in tests:\n");
    driver.push_str("    res = _run_test(t['call'])\n");
    driver.push_str(
        "    results.append({'call': t['call'], 'expected': t['expected'], 'ok': res['ok'], \
         'result': res['result'], 'error': res['error'], 'description': t['description']})\n",
    );
    driver.push_str("print(json.dumps(results))\n");
    driver
}

/// Run the synthesized checks through the executor and parse the results.
pub fn run_tests(
    source: &str,
    tests: &[TestCase],
    executor: &dyn Executor,
    timeout: Duration,
) -> Vec<TestResult> {
    if tests.is_empty() {
        return Vec::new();
    }
    let driver = build_driver(source, tests);
    let output = match executor.run(&driver, Language::Python, timeout) {
        Ok(output) => output,
        Err(error) => {
            debug!("test harness execution failed: {error}");
            return Vec::new();
        }
    };

    if output.stderr == TIMEOUT_SENTINEL {
        return vec![TestResult {
            call: None,
            expected: None,
            ok: false,
            observed: None,
            error: Some(TIMEOUT_SENTINEL.to_string()),
            description: None,
        }];
    }

    parse_results(&output.stdout)
}

/// Parse the driver's stdout. User code may print before the JSON line, so
/// fall back to the outermost bracketed span.
fn parse_results(stdout: &str) -> Vec<TestResult> {
    if let Ok(results) = serde_json::from_str::<Vec<TestResult>>(stdout.trim()) {
        return results;
    }
    if let Some(caps) = TRAILING_JSON_ARRAY.captures(stdout) {
        if let Ok(results) = serde_json::from_str::<Vec<TestResult>>(&caps[1]) {
            return results;
        }
    }
    debug!("test harness produced unparseable output");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mend_errors::Language;
    use mend_runtime::{Executor, RunOutput, RuntimeError};

    use crate::issue::TestCase;

    use super::{build_driver, parse_results, run_tests};

    struct CannedExecutor {
        stdout: String,
        stderr: String,
    }

    impl Executor for CannedExecutor {
        fn run(
            &self,
            _source: &str,
            _language: Language,
            _timeout: Duration,
        ) -> Result<RunOutput, RuntimeError> {
            Ok(RunOutput {
                stdout: self.stdout.clone(),
                stderr: self.stderr.clone(),
            })
        }
    }

    fn factorial_case() -> TestCase {
        TestCase {
            function_name: "factorial".to_string(),
            call: "factorial(5)".to_string(),
            expected: "120".to_string(),
            description: "factorial of 5".to_string(),
        }
    }

    #[test]
    fn driver_embeds_source_and_tests() {
        let driver = build_driver("def factorial(n):\n    return 1\n", &[factorial_case()]);
        assert!(driver.contains("def factorial(n):"));
        assert!(driver.contains("factorial(5)"));
        assert!(driver.contains("print(json.dumps(results))"));
    }

    #[test]
    fn results_parse_from_clean_stdout() {
        let stdout = r#"[{"call": "factorial(5)", "expected": "120", "ok": false, "result": "0", "error": null, "description": "factorial of 5"}]"#;
        let results = parse_results(stdout);
        assert_eq!(results.len(), 1);
        assert!(!results[0].ok);
        assert_eq!(results[0].observed.as_deref(), Some("0"));
    }

    #[test]
    fn user_prints_before_json_are_tolerated() {
        let stdout = "computing...\n[{\"call\": \"f(1)\", \"expected\": \"1\", \"ok\": true, \"result\": \"1\", \"error\": null, \"description\": \"d\"}]\n";
        let results = parse_results(stdout);
        assert_eq!(results.len(), 1);
        assert!(results[0].ok);
    }

    #[test]
    fn timeout_produces_a_single_sentinel_result() {
        let executor = CannedExecutor {
            stdout: String::new(),
            stderr: "TIMEOUT".to_string(),
        };
        let results = run_tests(
            "while True: pass",
            &[factorial_case()],
            &executor,
            Duration::from_secs(1),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error.as_deref(), Some("TIMEOUT"));
    }

    #[test]
    fn no_tests_means_no_execution() {
        let executor = CannedExecutor {
            stdout: "should never be read".to_string(),
            stderr: String::new(),
        };
        assert!(run_tests("x = 1", &[], &executor, Duration::from_secs(1)).is_empty());
    }
}
