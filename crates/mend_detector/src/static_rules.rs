//! Static AST detectors. Every detector has the same signature and the
//! registry at the top drives them uniformly.

use rustc_hash::FxHashMap;
use rustpython_ast::{self as ast, Expr, Ranged, Stmt};
use rustpython_parser::ast::Suite;
use rustpython_parser::text_size::TextRange;

use mend_python_ast::builtins::is_builtin;
use mend_python_ast::visitor::{walk_expr, walk_stmt, Visitor};
use mend_python_ast::{node_text, range_text, source_location};

use crate::issue::{IssueKind, LogicalIssue, SuggestedPatch};

pub type StaticDetector = fn(&Suite, &str) -> Vec<LogicalIssue>;

/// All static detectors, in the order they run.
pub const STATIC_DETECTORS: &[StaticDetector] = &[
    detect_factorial_base_case,
    detect_recursion_without_progress,
    detect_mutable_default_args,
    detect_off_by_one_subscript,
    detect_constant_index_out_of_range,
    detect_boolean_compare,
    detect_builtin_shadowing,
    detect_unreachable_code,
];

/// Run the whole registry, concatenating findings.
pub fn run_static_detectors(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    STATIC_DETECTORS
        .iter()
        .flat_map(|detector| detector(suite, source))
        .collect()
}

fn location_of(source: &str, node: &impl Ranged) -> Option<(usize, usize)> {
    Some(source_location(source, node.range().start()))
}

fn is_zero_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Constant(ast::ExprConstant { value, .. }) => match value {
            ast::Constant::Int(value) => value.to_string() == "0",
            ast::Constant::Float(value) => *value == 0.0,
            _ => false,
        },
        _ => false,
    }
}

/// Every function definition in the module, at any nesting depth.
fn functions(suite: &Suite) -> Vec<&ast::StmtFunctionDef> {
    struct Functions<'a> {
        found: Vec<&'a ast::StmtFunctionDef>,
    }
    impl<'a> Visitor<'a> for Functions<'a> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            if let Stmt::FunctionDef(function) = stmt {
                self.found.push(function);
            }
            walk_stmt(self, stmt);
        }
    }
    let mut collector = Functions { found: Vec::new() };
    collector.visit_body(suite);
    collector.found
}

/// `factorial` returning literal 0 as a base case.
pub fn detect_factorial_base_case(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    let mut issues = Vec::new();
    for function in functions(suite) {
        if function.name.as_str().to_lowercase() != "factorial" {
            continue;
        }
        let mut returns = ReturnCollector { found: Vec::new() };
        returns.visit_body(&function.body);
        for stmt in returns.found {
            let ast::StmtReturn {
                value: Some(value), ..
            } = stmt
            else {
                continue;
            };
            if is_zero_constant(value) {
                issues.push(LogicalIssue {
                    kind: IssueKind::FactorialBaseCase,
                    message: "factorial() returns 0 for its base case; factorial(0) is 1"
                        .to_string(),
                    location: location_of(source, stmt),
                    evidence: node_text(source, stmt).to_string(),
                    hint: "Change the base-case return to 1".to_string(),
                    suggested_patch: Some(SuggestedPatch::new(r"return\s+0", "return 1")),
                });
            }
        }
    }
    issues
}

/// A self-calling function where no recursive argument moves toward a base
/// case and no comparison suggests one exists.
pub fn detect_recursion_without_progress(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    let mut issues = Vec::new();
    for function in functions(suite) {
        let name = function.name.as_str();
        let mut calls = CallCollector {
            callee: name,
            found: Vec::new(),
        };
        calls.visit_body(&function.body);
        if calls.found.is_empty() {
            continue;
        }

        let progress = calls.found.iter().any(|call| {
            call.args.iter().any(|arg| {
                matches!(
                    arg,
                    Expr::BinOp(ast::ExprBinOp { op, .. })
                        if matches!(
                            op,
                            ast::Operator::Sub | ast::Operator::Div | ast::Operator::FloorDiv
                        )
                )
            })
        });
        if progress {
            continue;
        }

        let mut compares = CompareFound { found: false };
        compares.visit_body(&function.body);
        if compares.found {
            // A comparison in the body reads as a base case; give the
            // function the benefit of the doubt.
            continue;
        }

        issues.push(LogicalIssue {
            kind: IssueKind::RecursionNoProgress,
            message: format!(
                "Function '{name}' is recursive but no call argument moves toward a base case"
            ),
            location: Some(source_location(source, function.range.start())),
            evidence: format!(
                "{} recursive call(s); no decrement or division in arguments",
                calls.found.len()
            ),
            hint: "Make recursive calls shrink their arguments (e.g. n - 1)".to_string(),
            suggested_patch: None,
        });
    }
    issues
}

/// Mutable default argument values.
pub fn detect_mutable_default_args(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    let mut issues = Vec::new();
    for function in functions(suite) {
        for arg in function
            .args
            .posonlyargs
            .iter()
            .chain(&function.args.args)
            .chain(&function.args.kwonlyargs)
        {
            let Some(default) = &arg.default else {
                continue;
            };
            if matches!(
                default.as_ref(),
                Expr::List(_) | Expr::Dict(_) | Expr::Set(_) | Expr::Call(_)
            ) {
                issues.push(LogicalIssue {
                    kind: IssueKind::MutableDefaultArg,
                    message: format!(
                        "Parameter '{}' has a mutable default shared across calls",
                        arg.def.arg
                    ),
                    location: location_of(source, default.as_ref()),
                    evidence: node_text(source, default.as_ref()).to_string(),
                    hint: "Default to None and construct the value inside the body".to_string(),
                    suggested_patch: None,
                });
            }
        }
    }
    issues
}

/// `x[i + 1]` inside a `for` loop body.
pub fn detect_off_by_one_subscript(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    struct ForFinder<'a> {
        source: &'a str,
        issues: Vec<LogicalIssue>,
    }
    impl<'a> Visitor<'a> for ForFinder<'_> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            if let Stmt::For(ast::StmtFor { body, .. }) = stmt {
                let mut subscripts = SubscriptCollector { plus_one: Vec::new() };
                subscripts.visit_body(body);
                for subscript in subscripts.plus_one {
                    self.issues.push(LogicalIssue {
                        kind: IssueKind::OffByOneIndex,
                        message: "Subscript with `+ 1` inside a loop may run past the end"
                            .to_string(),
                        location: Some(source_location(self.source, subscript.start())),
                        evidence: range_text(self.source, subscript).to_string(),
                        hint: "Check the loop bound against the sequence length".to_string(),
                        suggested_patch: None,
                    });
                }
            }
            walk_stmt(self, stmt);
        }
    }

    let mut finder = ForFinder {
        source,
        issues: Vec::new(),
    };
    finder.visit_body(suite);
    finder.issues
}

/// A constant subscript on a literal list or tuple that is out of bounds.
pub fn detect_constant_index_out_of_range(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    let mut lengths = LiteralLengths {
        lengths: FxHashMap::default(),
    };
    lengths.visit_body(suite);
    let lengths = lengths.lengths;

    struct ConstIndexes<'a> {
        source: &'a str,
        lengths: FxHashMap<String, i64>,
        issues: Vec<LogicalIssue>,
    }
    impl<'a> Visitor<'a> for ConstIndexes<'_> {
        fn visit_expr(&mut self, expr: &'a Expr) {
            if let Expr::Subscript(ast::ExprSubscript { value, slice, .. }) = expr {
                if let (
                    Expr::Name(ast::ExprName { id, .. }),
                    Expr::Constant(ast::ExprConstant {
                        value: ast::Constant::Int(index),
                        ..
                    }),
                ) = (value.as_ref(), slice.as_ref())
                {
                    if let (Some(length), Ok(index)) = (
                        self.lengths.get(id.as_str()),
                        index.to_string().parse::<i64>(),
                    ) {
                        if index >= *length || index < -length {
                            self.issues.push(LogicalIssue {
                                kind: IssueKind::IndexOutOfRange,
                                message: format!(
                                    "Index {index} on literal '{id}' of length {length} is out of range"
                                ),
                                location: Some(source_location(
                                    self.source,
                                    expr.range().start(),
                                )),
                                evidence: format!("{id}[{index}]"),
                                hint: format!("Use an index below {length} or guard the access"),
                                suggested_patch: None,
                            });
                        }
                    }
                }
            }
            walk_expr(self, expr);
        }
    }

    let mut finder = ConstIndexes {
        source,
        lengths,
        issues: Vec::new(),
    };
    finder.visit_body(suite);
    finder.issues
}

/// Comparison against a boolean constant inside an `if` test.
pub fn detect_boolean_compare(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    struct IfFinder<'a> {
        source: &'a str,
        issues: Vec<LogicalIssue>,
    }
    impl<'a> Visitor<'a> for IfFinder<'_> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            if let Stmt::If(ast::StmtIf { test, .. }) = stmt {
                let mut compares = BoolCompares { ranges: Vec::new() };
                compares.visit_expr(test);
                for compare in compares.ranges {
                    self.issues.push(LogicalIssue {
                        kind: IssueKind::BooleanCompare,
                        message: "Comparison against a boolean constant".to_string(),
                        location: Some(source_location(self.source, compare.start())),
                        evidence: range_text(self.source, compare).to_string(),
                        hint: "Test truthiness directly (`if x:`)".to_string(),
                        suggested_patch: None,
                    });
                }
            }
            walk_stmt(self, stmt);
        }
    }

    let mut finder = IfFinder {
        source,
        issues: Vec::new(),
    };
    finder.visit_body(suite);
    finder.issues
}

/// Assignment to a name that shadows a builtin.
pub fn detect_builtin_shadowing(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    struct AssignFinder<'a> {
        source: &'a str,
        issues: Vec<LogicalIssue>,
    }
    impl<'a> Visitor<'a> for AssignFinder<'_> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            if let Stmt::Assign(ast::StmtAssign { targets, .. }) = stmt {
                for target in targets {
                    if let Expr::Name(ast::ExprName { id, range, .. }) = target {
                        if is_builtin(id.as_str()) {
                            self.issues.push(LogicalIssue {
                                kind: IssueKind::ShadowedBuiltin,
                                message: format!("Assignment shadows builtin '{id}'"),
                                location: Some(source_location(self.source, range.start())),
                                evidence: id.to_string(),
                                hint: "Rename the variable".to_string(),
                                suggested_patch: None,
                            });
                        }
                    }
                }
            }
            walk_stmt(self, stmt);
        }
    }

    let mut finder = AssignFinder {
        source,
        issues: Vec::new(),
    };
    finder.visit_body(suite);
    finder.issues
}

/// Statements after a `return` in the same function body.
pub fn detect_unreachable_code(suite: &Suite, source: &str) -> Vec<LogicalIssue> {
    let mut issues = Vec::new();
    for function in functions(suite) {
        for window in function.body.windows(2) {
            if matches!(window[0], Stmt::Return(_)) {
                issues.push(LogicalIssue {
                    kind: IssueKind::UnreachableCode,
                    message: "Code after a return statement never runs".to_string(),
                    location: location_of(source, &window[1]),
                    evidence: node_text(source, &window[1]).to_string(),
                    hint: "Delete it or move it above the return".to_string(),
                    suggested_patch: None,
                });
            }
        }
    }
    issues
}

// --- shared collectors ----------------------------------------------------

struct ReturnCollector<'a> {
    found: Vec<&'a ast::StmtReturn>,
}

impl<'a> Visitor<'a> for ReturnCollector<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if let Stmt::Return(ret) = stmt {
            self.found.push(ret);
        }
        walk_stmt(self, stmt);
    }
}

struct CallCollector<'a> {
    callee: &'a str,
    found: Vec<&'a ast::ExprCall>,
}

impl<'a> Visitor<'a> for CallCollector<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Call(call) = expr {
            if let Expr::Name(ast::ExprName { id, .. }) = call.func.as_ref() {
                if id.as_str() == self.callee {
                    self.found.push(call);
                }
            }
        }
        walk_expr(self, expr);
    }
}

struct CompareFound {
    found: bool,
}

impl<'a> Visitor<'a> for CompareFound {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if matches!(expr, Expr::Compare(_)) {
            self.found = true;
        }
        walk_expr(self, expr);
    }
}

struct SubscriptCollector {
    plus_one: Vec<TextRange>,
}

impl<'a> Visitor<'a> for SubscriptCollector {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Subscript(ast::ExprSubscript { slice, range, .. }) = expr {
            if matches!(
                slice.as_ref(),
                Expr::BinOp(ast::ExprBinOp {
                    op: ast::Operator::Add,
                    ..
                })
            ) {
                self.plus_one.push(*range);
            }
        }
        walk_expr(self, expr);
    }
}

struct LiteralLengths {
    lengths: FxHashMap<String, i64>,
}

impl<'a> Visitor<'a> for LiteralLengths {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if let Stmt::Assign(ast::StmtAssign { targets, value, .. }) = stmt {
            if let [Expr::Name(ast::ExprName { id, .. })] = targets.as_slice() {
                let length = match value.as_ref() {
                    Expr::List(ast::ExprList { elts, .. })
                    | Expr::Tuple(ast::ExprTuple { elts, .. }) => Some(elts.len() as i64),
                    _ => None,
                };
                if let Some(length) = length {
                    self.lengths.insert(id.to_string(), length);
                }
            }
        }
        walk_stmt(self, stmt);
    }
}

struct BoolCompares {
    ranges: Vec<TextRange>,
}

impl<'a> Visitor<'a> for BoolCompares {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Compare(ast::ExprCompare {
            comparators, range, ..
        }) = expr
        {
            let against_bool = comparators.iter().any(|comparator| {
                matches!(
                    comparator,
                    Expr::Constant(ast::ExprConstant {
                        value: ast::Constant::Bool(_),
                        ..
                    })
                )
            });
            if against_bool {
                self.ranges.push(*range);
            }
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use mend_python_ast::parse_suite;

    use crate::issue::IssueKind;

    use super::*;

    fn detect(detector: StaticDetector, source: &str) -> Vec<LogicalIssue> {
        let suite = parse_suite(source).unwrap();
        detector(&suite, source)
    }

    #[test]
    fn factorial_base_case_zero_return() {
        let source = "\
def factorial(n):
    if n == 0:
        return 0
    return n * factorial(n - 1)
";
        let issues = detect(detect_factorial_base_case, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::FactorialBaseCase);
        assert_eq!(issues[0].location, Some((3, 9)));
        let patched = issues[0].suggested_patch.as_ref().unwrap().apply(source);
        assert!(patched.contains("return 1"));
    }

    #[test]
    fn correct_factorial_is_clean() {
        let source = "\
def factorial(n):
    if n == 0:
        return 1
    return n * factorial(n - 1)
";
        assert!(detect(detect_factorial_base_case, source).is_empty());
    }

    #[test]
    fn recursion_without_progress_or_base_case() {
        let source = "def loop(n):\n    return loop(n)\n";
        let issues = detect(detect_recursion_without_progress, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::RecursionNoProgress);
    }

    #[test]
    fn recursion_with_decrement_is_clean() {
        let source = "def countdown(n):\n    return countdown(n - 1)\n";
        assert!(detect(detect_recursion_without_progress, source).is_empty());
    }

    #[test]
    fn recursion_with_base_case_compare_is_tolerated() {
        let source = "\
def walk(node):
    if node is None:
        return 0
    return walk(node.next)
";
        assert!(detect(detect_recursion_without_progress, source).is_empty());
    }

    #[test]
    fn mutable_defaults_are_flagged() {
        let source = "def push(item, bucket=[]):\n    bucket.append(item)\n";
        let issues = detect(detect_mutable_default_args, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "[]");
    }

    #[test]
    fn none_default_is_clean() {
        let source = "def push(item, bucket=None):\n    pass\n";
        assert!(detect(detect_mutable_default_args, source).is_empty());
    }

    #[test]
    fn plus_one_subscript_in_loop() {
        let source = "\
for i in range(len(xs)):
    total += xs[i + 1]
";
        let issues = detect(detect_off_by_one_subscript, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "xs[i + 1]");
    }

    #[test]
    fn constant_index_beyond_literal_length() {
        let source = "xs = [1, 2, 3]\nprint(xs[5])\n";
        let issues = detect(detect_constant_index_out_of_range, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "xs[5]");
    }

    #[test]
    fn negative_index_within_bounds_is_clean() {
        let source = "xs = [1, 2, 3]\nprint(xs[-3])\n";
        assert!(detect(detect_constant_index_out_of_range, source).is_empty());
    }

    #[test]
    fn boolean_comparison_in_if() {
        let source = "if done == True:\n    print('x')\n";
        let issues = detect(detect_boolean_compare, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "done == True");
    }

    #[test]
    fn builtin_shadowing_assignment() {
        let source = "list = [1, 2]\n";
        let issues = detect(detect_builtin_shadowing, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "list");
    }

    #[test]
    fn statement_after_return() {
        let source = "\
def f():
    return 1
    print('never')
";
        let issues = detect(detect_unreachable_code, source);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].evidence, "print('never')");
    }

    #[test]
    fn registry_runs_everything() {
        let source = "\
def factorial(n):
    if n == 0:
        return 0
    return n * factorial(n - 1)

list = [1, 2]
";
        let suite = parse_suite(source).unwrap();
        let issues = run_static_detectors(&suite, source);
        let kinds: Vec<IssueKind> = issues.iter().map(|issue| issue.kind).collect();
        assert!(kinds.contains(&IssueKind::FactorialBaseCase));
        assert!(kinds.contains(&IssueKind::ShadowedBuiltin));
    }
}
