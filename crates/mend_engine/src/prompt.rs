//! Prompt construction for the generative fixer.

use mend_detector::LogicalIssue;

/// Most issues ever summarized into one prompt.
const MAX_PROMPT_ISSUES: usize = 6;

/// Render the fixed prompt template. The model is asked for the corrected
/// file and nothing else.
pub fn build_prompt(code: &str, error: &str, logic: &str, user_instructions: &str) -> String {
    let error = if error.trim().is_empty() {
        "<none>"
    } else {
        error
    };

    format!(
        "You are a local code assistant. The user provided the following code:\n\
         \n\
         ###\n\
         {code}\n\
         ###\n\
         \n\
         It produced this error:\n\
         \n\
         ###\n\
         {error}\n\
         ###\n\
         \n\
         Detected logical issues (if any):\n\
         ###\n\
         {logic}\n\
         ###\n\
         \n\
         User instructions:\n\
         {user_instructions}\n\
         \n\
         Please return only the corrected Python file contents (no explanation, no markdown, no fences).\n\
         If you cannot safely fix the program, return an empty string.\n"
    )
}

/// One line per issue, bounded to [`MAX_PROMPT_ISSUES`].
pub fn summarize_issues(issues: &[LogicalIssue]) -> String {
    issues
        .iter()
        .take(MAX_PROMPT_ISSUES)
        .map(|issue| format!("- {}: {}", issue.kind, issue.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per detected intent conflict.
pub fn summarize_conflicts(conflicts: &[String]) -> String {
    conflicts
        .iter()
        .map(|conflict| format!("- INTENT_CONFLICT: {conflict}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use mend_detector::{IssueKind, LogicalIssue};

    use super::{build_prompt, summarize_conflicts, summarize_issues};

    fn issue(message: &str) -> LogicalIssue {
        LogicalIssue {
            kind: IssueKind::TestFailure,
            message: message.to_string(),
            location: None,
            evidence: String::new(),
            hint: String::new(),
            suggested_patch: None,
        }
    }

    #[test]
    fn prompt_carries_all_slots() {
        let logic = summarize_issues(&[issue("wrong sum")]);
        let prompt = build_prompt("x = 1\n", "NameError: boom", &logic, "make it add");
        assert!(prompt.contains("x = 1"));
        assert!(prompt.contains("NameError: boom"));
        assert!(prompt.contains("- TEST_FAILURE: wrong sum"));
        assert!(prompt.contains("make it add"));
        assert!(prompt.contains("only the corrected Python file contents"));
    }

    #[test]
    fn empty_error_renders_a_placeholder() {
        let prompt = build_prompt("x = 1\n", "  ", "", "");
        assert!(prompt.contains("###\n<none>\n###"));
    }

    #[test]
    fn issue_list_is_bounded() {
        let issues: Vec<_> = (0..10).map(|i| issue(&format!("issue {i}"))).collect();
        let logic = summarize_issues(&issues);
        assert!(logic.contains("issue 5"));
        assert!(!logic.contains("issue 6"));
    }

    #[test]
    fn conflicts_render_with_their_own_tag() {
        let logic = summarize_conflicts(&["preorder visits late".to_string()]);
        assert_eq!(logic, "- INTENT_CONFLICT: preorder visits late");
    }
}
