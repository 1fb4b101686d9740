//! Semantic-intent conflicts: high-confidence mismatches between what a
//! function is called and what its body does. A hit sends the controller
//! straight to the generative path before the first normal iteration.

use once_cell::sync::Lazy;
use regex::Regex;

static FLOAT_MIDPOINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"mid\s*=\s*\(\s*\w+\s*\+\s*\w+\s*\)\s*/\s*2\b").unwrap());
static POINTER_TO_MID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:left|right|low|high|lo|hi)\s*=\s*mid\s*$").unwrap());

/// Describe every intent conflict found in the source. Empty means the
/// normal repair loop should run.
pub fn detect_intent_conflicts(source: &str) -> Vec<String> {
    let mut conflicts = Vec::new();

    if let Some(conflict) = traversal_conflict(source) {
        conflicts.push(conflict);
    }

    if source.contains("return memo[0]") {
        conflicts.push(
            "memoized function returns memo[0] instead of the entry for its argument".to_string(),
        );
    }

    if source.contains("mid") {
        if FLOAT_MIDPOINT.is_match(source) {
            conflicts
                .push("binary search computes its midpoint with true division".to_string());
        }
        if POINTER_TO_MID.is_match(source) {
            conflicts.push(
                "binary search moves a pointer to mid without the +/- 1 step".to_string(),
            );
        }
    }

    conflicts
}

/// A traversal function whose visit order contradicts its name.
fn traversal_conflict(source: &str) -> Option<String> {
    let recurse_left = |name: &str| source.find(format!("{name}(root.left").as_str());
    let visit = source.find("res.append(root.val)");

    if source.contains("def preorder") {
        if let (Some(left), Some(visit)) = (recurse_left("preorder"), visit) {
            if left < visit {
                return Some(
                    "function named preorder visits the node after recursing left".to_string(),
                );
            }
        }
    }
    if source.contains("def inorder") {
        if let (Some(left), Some(visit)) = (recurse_left("inorder"), visit) {
            if visit < left {
                return Some(
                    "function named inorder visits the node before recursing left".to_string(),
                );
            }
        }
    }
    if source.contains("def postorder") {
        if let (Some(left), Some(visit)) = (recurse_left("postorder"), visit) {
            if visit < left {
                return Some(
                    "function named postorder visits the node before its subtrees".to_string(),
                );
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::detect_intent_conflicts;

    #[test]
    fn mislabelled_preorder_is_a_conflict() {
        let source = "\
def preorder(root, res):
    if root:
        preorder(root.left, res)
        res.append(root.val)
        preorder(root.right, res)
";
        let conflicts = detect_intent_conflicts(source);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].contains("preorder"));
    }

    #[test]
    fn correct_preorder_is_quiet() {
        let source = "\
def preorder(root, res):
    if root:
        res.append(root.val)
        preorder(root.left, res)
        preorder(root.right, res)
";
        assert!(detect_intent_conflicts(source).is_empty());
    }

    #[test]
    fn memo_zero_return_is_a_conflict() {
        let source = "def fib(n, memo={}):\n    if n in memo:\n        return memo[0]\n    return n\n";
        assert_eq!(detect_intent_conflicts(source).len(), 1);
    }

    #[test]
    fn binary_search_pointer_without_step() {
        let source = "\
def search(xs, target):
    left, right = 0, len(xs) - 1
    while left <= right:
        mid = (left + right) // 2
        if xs[mid] < target:
            left = mid
        else:
            right = mid - 1
    return -1
";
        let conflicts = detect_intent_conflicts(source);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].contains("pointer"));
    }

    #[test]
    fn float_midpoint_is_a_conflict() {
        let source = "mid = (left + right) / 2\n";
        let conflicts = detect_intent_conflicts(source);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].contains("division"));
    }

    #[test]
    fn floor_division_midpoint_with_steps_is_quiet() {
        let source = "\
def search(xs, target):
    left, right = 0, len(xs) - 1
    while left <= right:
        mid = (left + right) // 2
        if xs[mid] < target:
            left = mid + 1
        else:
            right = mid - 1
    return -1
";
        assert!(detect_intent_conflicts(source).is_empty());
    }
}
