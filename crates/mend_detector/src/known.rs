//! High-confidence textual patterns, checked before any other analysis.
//! A hit here short-circuits the whole detector.

use crate::issue::{IssueKind, LogicalIssue, SuggestedPatch};

/// Scan for the seeded known-bug patterns.
pub fn detect_known_patterns(source: &str) -> Vec<LogicalIssue> {
    let mut issues = Vec::new();

    // A function advertised as preorder whose body appends the node value
    // after recursing left, which is an in-order traversal.
    if source.contains("preorder(") && source.contains("res.append") {
        let left_before_visit = source
            .find("preorder(root.left")
            .zip(source.find("res.append(root.val)"))
            .is_some_and(|(left, visit)| left < visit);
        if left_before_visit {
            issues.push(LogicalIssue {
                kind: IssueKind::TraversalOrderMismatch,
                message: "Function is named preorder but its body performs an in-order traversal"
                    .to_string(),
                location: None,
                evidence: "preorder(root.left) runs before res.append(root.val)".to_string(),
                hint: "Append the node value before recursing into the left subtree".to_string(),
                suggested_patch: None,
            });
        }
    }

    // Memoized function returning the wrong key.
    if source.contains("return memo[0]") {
        issues.push(LogicalIssue {
            kind: IssueKind::MemoKeyMismatch,
            message: "Memoization lookup returns memo[0] instead of the entry for n".to_string(),
            location: None,
            evidence: "return memo[0]".to_string(),
            hint: "Return the memo entry keyed by the argument".to_string(),
            suggested_patch: Some(SuggestedPatch::new(r"memo\[0\]", "memo[n]")),
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use crate::issue::IssueKind;

    use super::detect_known_patterns;

    const MISLABELLED_PREORDER: &str = "\
def preorder(root, res):
    if root:
        preorder(root.left, res)
        res.append(root.val)
        preorder(root.right, res)
";

    const MEMO_BUG: &str = "\
def fib(n, memo={}):
    if n <= 1:
        return n
    if n in memo:
        return memo[0]
    memo[n] = fib(n - 1, memo) + fib(n - 2, memo)
    return memo[n]
";

    #[test]
    fn inorder_body_behind_preorder_name() {
        let issues = detect_known_patterns(MISLABELLED_PREORDER);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::TraversalOrderMismatch);
        assert!(issues[0].suggested_patch.is_none());
    }

    #[test]
    fn memo_zero_return_carries_a_patch() {
        let issues = detect_known_patterns(MEMO_BUG);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MemoKeyMismatch);
        let patch = issues[0].suggested_patch.as_ref().unwrap();
        let patched = patch.apply(MEMO_BUG);
        assert!(patched.contains("return memo[n]"));
        assert!(!patched.contains("memo[0]"));
    }

    #[test]
    fn correct_preorder_is_not_flagged() {
        let source = "\
def preorder(root, res):
    if root:
        res.append(root.val)
        preorder(root.left, res)
        preorder(root.right, res)
";
        assert!(detect_known_patterns(source).is_empty());
    }

    #[test]
    fn clean_source_yields_nothing() {
        assert!(detect_known_patterns("print('ok')\n").is_empty());
    }
}
