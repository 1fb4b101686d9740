//! Synthesize small fixed checks for entry points with recognizable names.

use rustpython_ast::{self as ast, Stmt};
use rustpython_parser::ast::Suite;

use crate::issue::TestCase;

/// Generate checks for every recognized top-level function.
pub fn generate_tests(suite: &Suite) -> Vec<TestCase> {
    let mut tests = Vec::new();
    for stmt in suite {
        let Stmt::FunctionDef(ast::StmtFunctionDef { name, .. }) = stmt else {
            continue;
        };
        tests.extend(tests_for_function(name.as_str()));
    }
    tests
}

fn tests_for_function(name: &str) -> Vec<TestCase> {
    let case = |call: String, expected: &str, description: &str| TestCase {
        function_name: name.to_string(),
        call,
        expected: expected.to_string(),
        description: description.to_string(),
    };

    match name.to_lowercase().as_str() {
        "factorial" => vec![
            case(format!("{name}(0)"), "1", "factorial base case"),
            case(format!("{name}(1)"), "1", "factorial of 1"),
            case(format!("{name}(5)"), "120", "factorial of 5"),
        ],
        "fib" | "fibonacci" => vec![
            case(format!("{name}(0)"), "0", "fib of 0"),
            case(format!("{name}(1)"), "1", "fib of 1"),
            case(format!("{name}(6)"), "8", "fib of 6"),
        ],
        "sum_list" | "sumarr" | "sumarray" | "sum" => vec![case(
            format!("{name}([1,2,3])"),
            "6",
            "sum of a short list",
        )],
        "is_palindrome" | "ispalindrome" => vec![
            case(format!("{name}('a')"), "True", "single char palindrome"),
            case(format!("{name}('aba')"), "True", "odd palindrome"),
            case(format!("{name}('ab')"), "False", "not a palindrome"),
        ],
        "max_in_list" | "maxlist" | "max" => vec![case(
            format!("{name}([1,5,3])"),
            "5",
            "max of a short list",
        )],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use mend_python_ast::parse_suite;

    use super::generate_tests;

    #[test]
    fn factorial_gets_three_checks() {
        let suite = parse_suite("def factorial(n):\n    return 1\n").unwrap();
        let tests = generate_tests(&suite);
        assert_eq!(tests.len(), 3);
        assert_eq!(tests[2].call, "factorial(5)");
        assert_eq!(tests[2].expected, "120");
    }

    #[test]
    fn unrecognized_names_get_nothing() {
        let suite = parse_suite("def helper(x):\n    return x\n").unwrap();
        assert!(generate_tests(&suite).is_empty());
    }

    #[test]
    fn nested_functions_are_not_entry_points() {
        let suite = parse_suite(
            "def outer():\n    def factorial(n):\n        return 1\n    return 0\n",
        )
        .unwrap();
        assert!(generate_tests(&suite).is_empty());
    }

    #[test]
    fn alternate_spellings_are_recognized() {
        let suite = parse_suite("def fibonacci(n):\n    return n\n").unwrap();
        let tests = generate_tests(&suite);
        assert_eq!(tests.len(), 3);
        assert!(tests[0].call.starts_with("fibonacci("));
    }
}
