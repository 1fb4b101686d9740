//! The detector's output data model. Everything here is plain data so the
//! controller can serialize it into reports and prompts.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    FactorialBaseCase,
    RecursionNoProgress,
    MutableDefaultArg,
    OffByOneIndex,
    IndexOutOfRange,
    BooleanCompare,
    ShadowedBuiltin,
    UnreachableCode,
    TraversalOrderMismatch,
    MemoKeyMismatch,
    TestFailureFactorialBase,
    TestFailure,
}

/// A textual regex patch. Patches are data, not closures, so detector
/// output stays serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPatch {
    pub pattern: String,
    pub replacement: String,
}

impl SuggestedPatch {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Apply the patch everywhere it matches. An invalid pattern or a
    /// no-match leaves the source unchanged.
    pub fn apply(&self, source: &str) -> String {
        match Regex::new(&self.pattern) {
            Ok(regex) => regex.replace_all(source, self.replacement.as_str()).into_owned(),
            Err(error) => {
                debug!("suggested patch has invalid pattern: {error}");
                source.to_string()
            }
        }
    }
}

/// A silent semantic bug the detector believes is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalIssue {
    pub kind: IssueKind,
    pub message: String,
    /// One-based `(row, column)`, when the finding is anchored to a node.
    pub location: Option<(usize, usize)>,
    pub evidence: String,
    pub hint: String,
    pub suggested_patch: Option<SuggestedPatch>,
}

/// A synthesized check: call an entry point, compare the `repr` of the
/// result. Data, not code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(rename = "function")]
    pub function_name: String,
    pub call: String,
    pub expected: String,
    pub description: String,
}

/// The outcome of one synthesized check, as reported by the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(default)]
    pub call: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    pub ok: bool,
    #[serde(rename = "result")]
    pub observed: Option<String>,
    #[serde(rename = "error")]
    pub error: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Apply every suggested patch carried by `issues`, in order.
pub fn apply_patches(source: &str, issues: &[LogicalIssue]) -> String {
    let mut patched = source.to_string();
    for issue in issues {
        if let Some(patch) = &issue.suggested_patch {
            let next = patch.apply(&patched);
            if next != patched {
                debug!("applied suggested patch for {}", issue.kind);
                patched = next;
            }
        }
    }
    patched
}

#[cfg(test)]
mod tests {
    use super::{apply_patches, IssueKind, LogicalIssue, SuggestedPatch};

    fn issue_with_patch(patch: SuggestedPatch) -> LogicalIssue {
        LogicalIssue {
            kind: IssueKind::FactorialBaseCase,
            message: String::new(),
            location: None,
            evidence: String::new(),
            hint: String::new(),
            suggested_patch: Some(patch),
        }
    }

    #[test]
    fn patch_applies_everywhere() {
        let patch = SuggestedPatch::new(r"return\s+0", "return 1");
        assert_eq!(patch.apply("return 0\nreturn  0\n"), "return 1\nreturn 1\n");
    }

    #[test]
    fn group_references_expand() {
        let patch = SuggestedPatch::new(r"(memo)\[0\]", "${1}[n]");
        assert_eq!(patch.apply("return memo[0]"), "return memo[n]");
    }

    #[test]
    fn invalid_pattern_is_a_no_op() {
        let patch = SuggestedPatch::new(r"(((", "x");
        assert_eq!(patch.apply("return 0"), "return 0");
    }

    #[test]
    fn patches_apply_in_order() {
        let issues = vec![
            issue_with_patch(SuggestedPatch::new("a", "b")),
            issue_with_patch(SuggestedPatch::new("b", "c")),
        ];
        assert_eq!(apply_patches("a", &issues), "c");
    }

    #[test]
    fn issue_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&IssueKind::FactorialBaseCase).unwrap();
        assert_eq!(json, "\"FACTORIAL_BASE_CASE\"");
        assert_eq!(IssueKind::MemoKeyMismatch.to_string(), "MEMO_KEY_MISMATCH");
    }
}
